//! Order entry / editing view

use crate::api::OrderApi;
use crate::error::{ClientError, ClientResult};
use crate::store::OrderStore;
use shared::order::{CreateOrder, NewOrderLine, Order};
use std::collections::HashSet;
use std::sync::Arc;

/// Header fields for opening a new order
#[derive(Debug, Clone)]
pub struct OrderHeader {
    pub table_id: String,
    pub table_name: Option<String>,
    pub waiter_id: String,
    pub waiter_name: Option<String>,
    pub note: Option<String>,
}

/// Order editor: stages lines locally, submits them as commands, and feeds
/// every response back through the store.
///
/// When editing an existing order only the staged lines are sent; lines the
/// server hands back that were not known before are flagged `is_new` so the
/// session can tell its own additions apart.
pub struct OrderEditor {
    api: Arc<OrderApi>,
    store: Arc<OrderStore>,
    order_id: Option<String>,
    staged: Vec<NewOrderLine>,
}

impl OrderEditor {
    /// Editor for a brand-new order
    pub fn new(api: Arc<OrderApi>, store: Arc<OrderStore>) -> Self {
        Self {
            api,
            store,
            order_id: None,
            staged: Vec::new(),
        }
    }

    /// Editor over an order that already exists
    pub fn for_order(api: Arc<OrderApi>, store: Arc<OrderStore>, order_id: impl Into<String>) -> Self {
        Self {
            api,
            store,
            order_id: Some(order_id.into()),
            staged: Vec::new(),
        }
    }

    pub fn order_id(&self) -> Option<&str> {
        self.order_id.as_deref()
    }

    /// Stage a line for the next submit
    pub fn stage_line(&mut self, line: NewOrderLine) -> ClientResult<()> {
        if line.quantity == 0 {
            return Err(ClientError::Validation(
                "la cantidad debe ser positiva".to_string(),
            ));
        }
        self.staged.push(line);
        Ok(())
    }

    pub fn staged_lines(&self) -> &[NewOrderLine] {
        &self.staged
    }

    pub fn clear_staged(&mut self) {
        self.staged.clear();
    }

    /// Create the order with the staged lines as its initial contents
    pub async fn open(&mut self, header: OrderHeader) -> ClientResult<Order> {
        if self.order_id.is_some() {
            return Err(ClientError::Validation(
                "el editor ya tiene un pedido abierto".to_string(),
            ));
        }
        if self.staged.is_empty() {
            return Err(ClientError::Validation(
                "un pedido necesita al menos una línea".to_string(),
            ));
        }

        let request = CreateOrder {
            table_id: header.table_id,
            table_name: header.table_name,
            waiter_id: header.waiter_id,
            waiter_name: header.waiter_name,
            lines: std::mem::take(&mut self.staged),
            note: header.note,
        };

        let order = self.api.create(&request).await?;
        self.order_id = Some(order.id.clone());
        self.store.upsert(order.clone());
        Ok(order)
    }

    /// Send the staged lines to the open order
    pub async fn submit_new_lines(&mut self) -> ClientResult<Order> {
        let order_id = self.require_order()?;
        if self.staged.is_empty() {
            return Err(ClientError::Validation(
                "no hay líneas nuevas que enviar".to_string(),
            ));
        }

        let known: HashSet<String> = self
            .store
            .get(&order_id)
            .map(|o| o.lines.iter().map(|l| l.id.clone()).collect())
            .unwrap_or_default();

        let lines = std::mem::take(&mut self.staged);
        let mut order = self.api.add_lines(&order_id, lines).await?;
        for line in &mut order.lines {
            line.is_new = !known.contains(&line.id);
        }
        self.store.upsert(order.clone());
        Ok(order)
    }

    /// Cancel one line of the open order
    pub async fn cancel_line(&self, line_id: &str) -> ClientResult<Order> {
        let order_id = self.require_order()?;
        let order = self.api.cancel_line(&order_id, line_id).await?;
        self.store.upsert(order.clone());
        Ok(order)
    }

    /// Cancel the whole order and drop it from active views
    pub async fn cancel_order(&self) -> ClientResult<Order> {
        let order_id = self.require_order()?;
        let order = self.api.cancel(&order_id).await?;
        self.store.upsert(order.clone());
        self.store.remove(&order_id);
        Ok(order)
    }

    /// Line ids added during this editing session
    pub fn new_line_ids(&self) -> Vec<String> {
        self.order_id
            .as_deref()
            .and_then(|id| self.store.get(id))
            .map(|o| {
                o.lines
                    .iter()
                    .filter(|l| l.is_new)
                    .map(|l| l.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn require_order(&self) -> ClientResult<String> {
        self.order_id
            .clone()
            .ok_or_else(|| ClientError::Validation("no hay pedido abierto".to_string()))
    }
}
