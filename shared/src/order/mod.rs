//! Order model
//!
//! The order aggregate exchanged with the command API and carried by push
//! events. The computed total is derived on demand and never serialized.

mod query;
mod status;

pub use query::OrderFilter;
pub use status::{ALL_LINE_STATUSES, ALL_ORDER_STATUSES, LineStatus, OrderStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Item reference
// ============================================================================

/// What kind of catalog entry a line points at.
///
/// The kind is tagged explicitly at creation time; it is never inferred
/// from the referenced entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Dish,
    Menu,
    Product,
}

/// Reference to a catalog item, tagged by kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemRef {
    pub kind: ItemKind,
    /// Catalog identifier (String ID)
    pub id: String,
}

impl ItemRef {
    pub fn dish(id: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Dish,
            id: id.into(),
        }
    }

    pub fn menu(id: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Menu,
            id: id.into(),
        }
    }

    pub fn product(id: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Product,
            id: id.into(),
        }
    }
}

// ============================================================================
// Order line
// ============================================================================

/// One item-and-quantity entry, independently trackable through preparation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Line identifier - stable across reconciliation
    pub id: String,
    /// Referenced catalog item
    pub item: ItemRef,
    /// Display name snapshot
    pub name: String,
    /// Quantity (> 0)
    pub quantity: u32,
    /// Price per unit in currency units
    pub unit_price: f64,
    pub status: LineStatus,
    /// Added during the current editing session; scopes partial updates
    #[serde(default)]
    pub is_new: bool,
}

impl OrderLine {
    /// Line total; cancelled lines contribute nothing
    pub fn total(&self) -> f64 {
        if self.status == LineStatus::Cancelado {
            0.0
        } else {
            self.quantity as f64 * self.unit_price
        }
    }
}

// ============================================================================
// Order
// ============================================================================

/// A customer's tab tied to one table and one staff member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier - stable for the lifetime of the order
    pub id: String,
    pub table_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub waiter_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiter_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    /// Insertion order = serving order
    pub lines: Vec<OrderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Order {
    /// Computed total: sum over non-cancelled lines. Derived, never stored.
    pub fn total(&self) -> f64 {
        self.lines.iter().map(OrderLine::total).sum()
    }

    pub fn line(&self, line_id: &str) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// An order may only move to FINALIZADO when every non-cancelled line
    /// has been delivered.
    pub fn can_finalize(&self) -> bool {
        self.status.can_transition(OrderStatus::Finalizado)
            && self
                .lines
                .iter()
                .filter(|l| l.status != LineStatus::Cancelado)
                .all(|l| l.status == LineStatus::Entregado)
    }

    /// Eligible for the explicit whole-order cancel command
    pub fn all_lines_cancelled(&self) -> bool {
        !self.lines.is_empty()
            && self
                .lines
                .iter()
                .all(|l| l.status == LineStatus::Cancelado)
    }

    /// Still interesting to the kitchen board
    pub fn needs_kitchen_attention(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Ordenado | OrderStatus::EnProceso | OrderStatus::ListoParaEntregar
        )
    }
}

// ============================================================================
// Command payloads
// ============================================================================

/// Line input for create/update commands (server assigns the line id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub item: ItemRef,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// Create order payload - all initial lines start PENDIENTE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub table_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub waiter_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiter_name: Option<String>,
    pub lines: Vec<NewOrderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Add lines to an existing order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddLines {
    pub lines: Vec<NewOrderLine>,
}

/// Line selection for mark-ready / deliver commands; empty = whole order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineSelection {
    #[serde(default)]
    pub line_ids: Vec<String>,
}
