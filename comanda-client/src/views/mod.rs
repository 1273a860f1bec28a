//! Consumer views
//!
//! Read-only subscribers over the store plus command issuers against the
//! order API. Views never cache order data; they re-derive from
//! `OrderStore::query` on every change.

mod editor;
mod kitchen;
mod tables;

pub use editor::{OrderEditor, OrderHeader};
pub use kitchen::KitchenBoard;
pub use tables::{TableMap, TableStatus};
