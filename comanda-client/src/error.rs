//! Client error types

use crate::channel::ChannelError;
use http::StatusCode;
use serde::de::DeserializeOwned;
use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Known prefix the command API puts on unhandled internal failures
const INTERNAL_ERROR_PREFIX: &str = "Error interno: ";

/// Shown when the server message is unusable
const GENERIC_ERROR_MESSAGE: &str = "Ha ocurrido un error inesperado";

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (network, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The command API reported a failure
    #[error("API error ({status}): {message}")]
    Api {
        status: StatusCode,
        message: String,
        code: Option<ErrorCode>,
    },

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local validation failed before issuing a command
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Push channel error
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// UI-facing message.
    ///
    /// Server failures carrying the internal prefix are stripped down to
    /// their payload; anything else falls back to a generic message so raw
    /// internals never reach the user. Local validation messages pass
    /// through as written.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message
                .strip_prefix(INTERNAL_ERROR_PREFIX)
                .map(|rest| rest.trim().to_string())
                .filter(|rest| !rest.is_empty())
                .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
            ClientError::Validation(msg) => msg.clone(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Decode a command API response, mapping failure bodies onto
/// [`ClientError::Api`]. Structured [`AppError`] bodies keep their code;
/// anything else is carried verbatim.
pub(crate) async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<AppError>(&body) {
        Ok(app) => Err(ClientError::Api {
            status,
            message: app.message,
            code: Some(app.code),
        }),
        Err(_) => Err(ClientError::Api {
            status,
            message: body,
            code: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(message: &str) -> ClientError {
        ClientError::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
            code: None,
        }
    }

    #[test]
    fn internal_prefix_is_stripped() {
        let err = api_error("Error interno: la mesa ya tiene un pedido abierto");
        assert_eq!(err.user_message(), "la mesa ya tiene un pedido abierto");
    }

    #[test]
    fn unprefixed_server_messages_fall_back_to_generic() {
        assert_eq!(
            api_error("java.sql.SQLException: boom").user_message(),
            GENERIC_ERROR_MESSAGE
        );
        assert_eq!(api_error("").user_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(api_error("Error interno: ").user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn validation_messages_pass_through() {
        let err = ClientError::Validation("la cantidad debe ser positiva".to_string());
        assert_eq!(err.user_message(), "la cantidad debe ser positiva");
    }
}
