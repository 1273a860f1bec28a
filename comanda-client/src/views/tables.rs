//! Table map view

use crate::store::OrderStore;
use shared::order::{Order, OrderStatus};
use std::sync::Arc;

/// Summary of one occupied table
#[derive(Debug, Clone)]
pub struct TableStatus {
    pub table_id: String,
    pub table_name: Option<String>,
    pub order_id: String,
    pub status: OrderStatus,
    pub total: f64,
}

/// Table map: which tables have an open order, derived live from the store
pub struct TableMap {
    store: Arc<OrderStore>,
}

impl TableMap {
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self { store }
    }

    /// The active order on a table, if any
    pub fn order_for_table(&self, table_id: &str) -> Option<Order> {
        self.store
            .active_orders()
            .into_iter()
            .find(|o| o.table_id == table_id)
    }

    /// Occupied tables, sorted by table id
    pub fn occupied_tables(&self) -> Vec<TableStatus> {
        let mut tables: Vec<TableStatus> = self
            .store
            .active_orders()
            .into_iter()
            .map(|o| TableStatus {
                table_id: o.table_id.clone(),
                table_name: o.table_name.clone(),
                order_id: o.id.clone(),
                status: o.status,
                total: o.total(),
            })
            .collect();
        tables.sort_by(|a, b| a.table_id.cmp(&b.table_id));
        tables
    }

    pub fn is_occupied(&self, table_id: &str) -> bool {
        self.order_for_table(table_id).is_some()
    }
}
