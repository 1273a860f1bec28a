//! Push-channel message types
//!
//! Shared between the sync client and the push endpoint: the named-event
//! envelope plus the topic and event-name constants both sides agree on.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub mod payload;
pub use payload::*;

/// Kitchen topic - one physical connection shared by every kitchen viewer
pub const TOPIC_COCINA: &str = "cocina";

/// Named events observed on the kitchen topic
pub mod events {
    /// A new order was created
    pub const NUEVO_PEDIDO: &str = "nuevo-pedido";
    /// An existing order changed (lines added, cancelled, info edited)
    pub const PEDIDO_ACTUALIZADO: &str = "pedido-actualizado";
    /// Kitchen-side state progress for an order or its lines
    pub const ESTADO_COCINA: &str = "estado-cocina";
    /// A product dropped below its stock threshold
    pub const STOCK_BAJO: &str = "stock-bajo";
}

/// One named event received on a push connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushEvent {
    /// Event name (e.g. "nuevo-pedido")
    pub event: String,
    /// JSON payload matching the event's documented shape
    pub data: serde_json::Value,
}

impl PushEvent {
    /// Build an event from a serializable payload.
    ///
    /// Only used by tests and in-process publishers; real events arrive
    /// already encoded.
    pub fn new<T: Serialize>(event: impl Into<String>, data: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_value(data)?,
        })
    }

    /// Decode the payload into its expected shape
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{Order, OrderStatus};
    use chrono::Utc;

    #[test]
    fn push_event_round_trips_an_order() {
        let order = Order {
            id: "o-7".to_string(),
            table_id: "t-1".to_string(),
            table_name: None,
            waiter_id: "w-1".to_string(),
            waiter_name: None,
            created_at: Utc::now(),
            status: OrderStatus::Ordenado,
            lines: vec![],
            note: None,
        };

        let ev = PushEvent::new(events::NUEVO_PEDIDO, &order).unwrap();
        assert_eq!(ev.event, "nuevo-pedido");

        let parsed: Order = ev.parse().unwrap();
        assert_eq!(parsed.id, "o-7");
        assert_eq!(parsed.status, OrderStatus::Ordenado);
    }

    #[test]
    fn parse_rejects_wrong_shape() {
        let ev = PushEvent {
            event: events::NUEVO_PEDIDO.to_string(),
            data: serde_json::json!({ "unexpected": true }),
        };
        assert!(ev.parse::<Order>().is_err());
    }
}
