//! Shared domain types for the Comanda order-sync core
//!
//! These types are shared between the sync client and any server-side
//! component: the order model and its state machines, the push-event
//! envelope, notification types and the structured error type.

pub mod error;
pub mod message;
pub mod notification;
pub mod order;

pub use error::{AppError, ErrorCode};
