//! Error types shared across the API boundary
//!
//! The command API reports failures as a JSON body with a structured code
//! and a human-readable message; [`AppError`] is that body on both sides of
//! the wire.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Standardized error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    ValidationFailed,
    NotFound,
    /// The requested state change is not allowed from the current state
    InvalidTransition,
    Conflict,
    PermissionDenied,
    InternalError,
}

impl ErrorCode {
    /// Default human-readable message for the code
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "Invalid request",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::InvalidTransition => "State transition not allowed",
            Self::Conflict => "Conflict with current state",
            Self::PermissionDenied => "Permission denied",
            Self::InternalError => "Internal error",
        }
    }

    /// HTTP status the code maps to
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest | Self::ValidationFailed => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidTransition | Self::Conflict => StatusCode::CONFLICT,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application error with structured code and optional details
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidTransition, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_round_trip() {
        let err = AppError::not_found("pedido o-1");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"NOT_FOUND\""));

        let parsed: AppError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.code, ErrorCode::NotFound);
        assert_eq!(parsed.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn transition_errors_map_to_conflict() {
        let err = AppError::invalid_transition("ENTREGADO -> EN_PROCESO");
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
    }
}
