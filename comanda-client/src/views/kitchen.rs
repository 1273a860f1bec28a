//! Kitchen display board

use crate::api::OrderApi;
use crate::error::ClientResult;
use crate::store::OrderStore;
use shared::order::Order;
use std::sync::Arc;
use std::time::Duration;

/// Kitchen board: orders needing attention, plus the preparation commands.
///
/// Every command response is fed back through the store's guarded upsert,
/// the same path push events take.
pub struct KitchenBoard {
    api: Arc<OrderApi>,
    store: Arc<OrderStore>,
    ready_delivery_delay: Duration,
}

impl KitchenBoard {
    pub fn new(api: Arc<OrderApi>, store: Arc<OrderStore>, ready_delivery_delay: Duration) -> Self {
        Self {
            api,
            store,
            ready_delivery_delay,
        }
    }

    /// Orders on the board, oldest first (serving order)
    pub fn orders(&self) -> Vec<Order> {
        let mut orders = self.store.needs_kitchen_attention();
        orders.sort_by_key(|o| o.created_at);
        orders
    }

    /// Pick the order up (→ EN_PROCESO)
    pub async fn start_order(&self, order_id: &str) -> ClientResult<Order> {
        let order = self.api.start(order_id).await?;
        self.store.upsert(order.clone());
        Ok(order)
    }

    /// Mark lines ready for pickup
    pub async fn mark_lines_ready(
        &self,
        order_id: &str,
        line_ids: &[String],
    ) -> ClientResult<Order> {
        let order = self.api.mark_ready(order_id, line_ids).await?;
        self.store.upsert(order.clone());
        Ok(order)
    }

    /// Deliver lines to the table
    pub async fn deliver_lines(&self, order_id: &str, line_ids: &[String]) -> ClientResult<Order> {
        let order = self.api.deliver(order_id, line_ids).await?;
        self.store.upsert(order.clone());
        Ok(order)
    }

    /// Mark ready, then deliver after a fixed pause.
    ///
    /// Two separate transitions, each pushed to every other client: the
    /// intermediate LISTO_PARA_ENTREGAR state stays observable during the
    /// pause. Used when the operator wants the line off the board right
    /// after plating.
    pub async fn mark_ready_then_deliver(
        &self,
        order_id: &str,
        line_ids: &[String],
    ) -> ClientResult<Order> {
        self.mark_lines_ready(order_id, line_ids).await?;
        tokio::time::sleep(self.ready_delivery_delay).await;
        self.deliver_lines(order_id, line_ids).await
    }

    /// Close a fully delivered order (→ FINALIZADO)
    pub async fn finalize_order(&self, order_id: &str) -> ClientResult<Order> {
        let order = self.api.finalize(order_id).await?;
        self.store.upsert(order.clone());
        Ok(order)
    }
}
