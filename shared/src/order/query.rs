//! Order list filters
//!
//! Filter shape for the list endpoint. Field names follow the wire
//! parameters (`texto`, `estado`, `desde`, `hasta`).

use super::{Order, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filters for listing orders
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    /// Free-text search over table, waiter and line names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desde: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hasta: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn text(mut self, texto: impl Into<String>) -> Self {
        self.texto = Some(texto.into());
        self
    }

    pub fn status(mut self, estado: OrderStatus) -> Self {
        self.estado = Some(estado);
        self
    }

    pub fn between(mut self, desde: DateTime<Utc>, hasta: DateTime<Utc>) -> Self {
        self.desde = Some(desde);
        self.hasta = Some(hasta);
        self
    }

    /// Local predicate mirroring the server-side filter, used by store queries
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(estado) = self.estado
            && order.status != estado
        {
            return false;
        }
        if let Some(desde) = self.desde
            && order.created_at < desde
        {
            return false;
        }
        if let Some(hasta) = self.hasta
            && order.created_at > hasta
        {
            return false;
        }
        if let Some(texto) = &self.texto {
            let needle = texto.to_lowercase();
            let hit = order
                .table_name
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
                || order
                    .waiter_name
                    .as_deref()
                    .is_some_and(|w| w.to_lowercase().contains(&needle))
                || order
                    .lines
                    .iter()
                    .any(|l| l.name.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}
