//! Order synchronization loop
//!
//! Binds the kitchen topic's push events to the store and the notification
//! queue:
//!
//! ```text
//! EventChannel ──► nuevo-pedido ───────┐
//!              ──► pedido-actualizado ─┤──► OrderStore::upsert (guarded)
//!              ──► estado-cocina ──────┘         │
//!              ──► stock-bajo ──────────────► NotificationQueue
//! ```
//!
//! Alerts are derived from the reconciled store state, not from the raw
//! payload: a stale event that the guard rejects must not re-alert.

use crate::channel::EventChannel;
use crate::notify::NotificationQueue;
use crate::store::{OrderStore, UpsertOutcome};
use shared::message::{PushEvent, TOPIC_COCINA, StockAlert, events};
use shared::notification::Notification;
use shared::order::{LineStatus, Order};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Reconciles pushed order events into the store and derives alerts
pub struct OrderSync {
    channel: Arc<EventChannel>,
    store: Arc<OrderStore>,
    queue: Arc<NotificationQueue>,
    cancel: CancellationToken,
}

impl OrderSync {
    pub fn new(
        channel: Arc<EventChannel>,
        store: Arc<OrderStore>,
        queue: Arc<NotificationQueue>,
    ) -> Self {
        Self {
            channel,
            store,
            queue,
            cancel: CancellationToken::new(),
        }
    }

    /// Register the kitchen topic and spawn the reconciliation loop
    pub fn start(&self) -> JoinHandle<()> {
        self.channel.connect(
            TOPIC_COCINA,
            [
                events::NUEVO_PEDIDO,
                events::PEDIDO_ACTUALIZADO,
                events::ESTADO_COCINA,
                events::STOCK_BAJO,
            ],
        );

        let mut nuevo = self.channel.on(events::NUEVO_PEDIDO);
        let mut actualizado = self.channel.on(events::PEDIDO_ACTUALIZADO);
        let mut cocina = self.channel.on(events::ESTADO_COCINA);
        let mut stock = self.channel.on(events::STOCK_BAJO);

        let store = Arc::clone(&self.store);
        let queue = Arc::clone(&self.queue);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    ev = nuevo.recv() => match pump(ev) {
                        Pump::Event(ev) => on_new_order(&store, &queue, ev),
                        Pump::Skip => {}
                        Pump::Stop => break,
                    },
                    ev = actualizado.recv() => match pump(ev) {
                        Pump::Event(ev) => on_order_update(&store, &queue, ev),
                        Pump::Skip => {}
                        Pump::Stop => break,
                    },
                    ev = cocina.recv() => match pump(ev) {
                        Pump::Event(ev) => on_order_update(&store, &queue, ev),
                        Pump::Skip => {}
                        Pump::Stop => break,
                    },
                    ev = stock.recv() => match pump(ev) {
                        Pump::Event(ev) => on_stock_alert(&queue, ev),
                        Pump::Skip => {}
                        Pump::Stop => break,
                    },
                }
            }
            tracing::debug!("Order sync loop stopped");
        })
    }

    /// Stop the loop; the channel connection is left to its owner
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

enum Pump {
    Event(PushEvent),
    Skip,
    Stop,
}

fn pump(result: Result<PushEvent, broadcast::error::RecvError>) -> Pump {
    match result {
        Ok(ev) => Pump::Event(ev),
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "Sync loop lagged, push events skipped");
            Pump::Skip
        }
        Err(broadcast::error::RecvError::Closed) => Pump::Stop,
    }
}

fn on_new_order(store: &OrderStore, queue: &NotificationQueue, ev: PushEvent) {
    let order: Order = match ev.parse() {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!(event = %ev.event, error = %e, "Malformed order payload dropped");
            return;
        }
    };

    let order_id = order.id.clone();
    let outcome = store.upsert(order);
    if outcome == UpsertOutcome::Inserted
        && let Some(order) = store.get(&order_id)
    {
        queue.push(Notification::new_order(&order));
    }
    derive_ready_alerts(store, queue, &order_id);
}

fn on_order_update(store: &OrderStore, queue: &NotificationQueue, ev: PushEvent) {
    let order: Order = match ev.parse() {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!(event = %ev.event, error = %e, "Malformed order payload dropped");
            return;
        }
    };

    let order_id = order.id.clone();
    store.upsert(order);
    derive_ready_alerts(store, queue, &order_id);
}

/// Alert on lines sitting in LISTO_PARA_ENTREGAR; close each line's ready
/// window once it leaves that state so it may alert again later.
fn derive_ready_alerts(store: &OrderStore, queue: &NotificationQueue, order_id: &str) {
    let Some(order) = store.get(order_id) else {
        return;
    };
    for line in &order.lines {
        match line.status {
            LineStatus::ListoParaEntregar => {
                queue.push(Notification::items_ready(&order, line));
            }
            LineStatus::Entregado | LineStatus::Cancelado => {
                queue.close_window(&Notification::ready_tag(&order.id, &line.id));
            }
            _ => {}
        }
    }
}

fn on_stock_alert(queue: &NotificationQueue, ev: PushEvent) {
    let alert: StockAlert = match ev.parse() {
        Ok(alert) => alert,
        Err(e) => {
            tracing::warn!(event = %ev.event, error = %e, "Malformed stock payload dropped");
            return;
        }
    };
    queue.push(Notification::low_stock(&alert));
}
