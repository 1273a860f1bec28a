//! Event payloads that are not the full order representation

use serde::{Deserialize, Serialize};

/// Payload of `stock-bajo`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockAlert {
    /// Product reference (String ID)
    pub product_id: String,
    pub name: String,
    /// Units remaining when the alert fired
    pub remaining: i64,
    /// Threshold that was crossed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,
}
