//! User-facing notification types
//!
//! Short-lived alerts derived from store/channel events. The queue that
//! bounds and deduplicates them lives in the client; these are just the
//! records it carries.

use crate::message::StockAlert;
use crate::order::{Order, OrderLine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    NewOrder,
    ItemsReady,
    LowStock,
    Generic,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewOrder => write!(f, "new_order"),
            Self::ItemsReady => write!(f, "items_ready"),
            Self::LowStock => write!(f, "low_stock"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// One user-facing alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Arbitrary extra data for the consuming view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    /// Equal tags within an open window are delivered once
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup_tag: Option<String>,
}

impl Notification {
    pub fn generic(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Generic,
            title: title.into(),
            message: message.into(),
            payload: None,
            timestamp: Utc::now(),
            dedup_tag: None,
        }
    }

    pub fn new_order(order: &Order) -> Self {
        let table = order.table_name.clone().unwrap_or_else(|| order.table_id.clone());
        Self {
            kind: NotificationKind::NewOrder,
            title: "Nuevo pedido".to_string(),
            message: format!("Pedido nuevo en {table}"),
            payload: serde_json::to_value(order).ok(),
            timestamp: Utc::now(),
            dedup_tag: Some(format!("nuevo:{}", order.id)),
        }
    }

    pub fn items_ready(order: &Order, line: &OrderLine) -> Self {
        let table = order.table_name.clone().unwrap_or_else(|| order.table_id.clone());
        Self {
            kind: NotificationKind::ItemsReady,
            title: "Listo para entregar".to_string(),
            message: format!("{} listo para {table}", line.name),
            payload: serde_json::to_value(line).ok(),
            timestamp: Utc::now(),
            dedup_tag: Some(Self::ready_tag(&order.id, &line.id)),
        }
    }

    pub fn low_stock(alert: &StockAlert) -> Self {
        Self {
            kind: NotificationKind::LowStock,
            title: "Stock bajo".to_string(),
            message: format!("Quedan {} unidades de {}", alert.remaining, alert.name),
            payload: serde_json::to_value(alert).ok(),
            timestamp: Utc::now(),
            dedup_tag: Some(format!("stock:{}", alert.product_id)),
        }
    }

    /// Dedup tag for a line's open "ready" window
    pub fn ready_tag(order_id: &str, line_id: &str) -> String {
        format!("listo:{order_id}:{line_id}")
    }
}
