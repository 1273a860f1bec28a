//! Comanda sync client
//!
//! Order lifecycle and real-time synchronization core for restaurant
//! viewers (order entry, kitchen display, table map). Keeps every viewer
//! consistent with the true state of in-flight orders:
//!
//! - [`channel::EventChannel`] - one push connection per topic, fan-out by
//!   event name, fixed-delay reconnect
//! - [`store::OrderStore`] - guarded reconciliation cache tolerant of
//!   duplicate and out-of-order events
//! - [`notify::NotificationQueue`] - bounded, deduplicated alert feed
//! - [`api::OrderApi`] - the `/pedido` command API
//! - [`views`] - kitchen board, table map and order editor
//!
//! The moving parts are wired by [`ComandaClient`]:
//!
//! ```no_run
//! # async fn example() -> Result<(), comanda_client::ClientError> {
//! use comanda_client::{ClientConfig, ComandaClient};
//!
//! let config = ClientConfig::builder()
//!     .api_url("https://edge.local/api")
//!     .token("token")
//!     .build()?;
//!
//! let client = ComandaClient::new(config)?;
//! client.start_sync();
//!
//! let board = client.kitchen_board();
//! for order in board.orders() {
//!     println!("{} - {}", order.id, order.status.label());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod channel;
pub mod config;
pub mod error;
pub mod logger;
pub mod notify;
pub mod store;
pub mod sync;
pub mod views;

mod client;

pub use client::ComandaClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
