//! Command API clients

mod orders;

pub use orders::OrderApi;
