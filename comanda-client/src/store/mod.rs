//! Order store - client-side reconciliation cache
//!
//! Single source of truth for every order visible to the session. Local
//! optimistic mutations, command responses and push events all funnel
//! through the same guarded [`OrderStore::upsert`], so there is one
//! mutation discipline regardless of origin.
//!
//! The guard is state-ordinal, not last-write-wins: an incoming status is
//! applied only when it is reachable from the stored one, which makes the
//! more advanced state win under duplicate or out-of-order delivery.

use parking_lot::RwLock;
use shared::order::{Order, OrderFilter};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tokio::sync::broadcast;

const CHANGE_BUFFER: usize = 256;

/// Emitted after every accepted mutation so views re-derive
#[derive(Debug, Clone)]
pub struct StoreChange {
    pub order_id: String,
}

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Unknown id inserted wholesale (discovery of a pre-existing order)
    Inserted,
    /// At least one field was accepted
    Updated,
    /// Nothing changed - duplicate or fully stale payload
    Unchanged,
}

struct StoredOrder {
    order: Order,
    /// Filtered out of active queries; the record itself is retained
    removed: bool,
}

/// Authoritative client-side cache of orders
pub struct OrderStore {
    orders: RwLock<HashMap<String, StoredOrder>>,
    change_tx: broadcast::Sender<StoreChange>,
}

impl OrderStore {
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            orders: RwLock::new(HashMap::new()),
            change_tx,
        }
    }

    /// Change feed for consumers; they re-derive their view via [`query`]
    /// rather than caching their own copy.
    ///
    /// [`query`]: OrderStore::query
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.change_tx.subscribe()
    }

    /// Reconcile an incoming order representation into the cache.
    ///
    /// Unknown ids insert wholesale. Known ids merge field-by-field with
    /// the status guard applied to the order and to each line
    /// independently. Idempotent: replaying a payload is `Unchanged`.
    pub fn upsert(&self, incoming: Order) -> UpsertOutcome {
        let order_id = incoming.id.clone();
        let outcome = {
            let mut orders = self.orders.write();
            match orders.entry(order_id.clone()) {
                Entry::Vacant(slot) => {
                    tracing::debug!(order_id = %order_id, "Order discovered, inserting");
                    slot.insert(StoredOrder {
                        order: incoming,
                        removed: false,
                    });
                    UpsertOutcome::Inserted
                }
                Entry::Occupied(mut slot) => {
                    if merge_order(&mut slot.get_mut().order, incoming) {
                        UpsertOutcome::Updated
                    } else {
                        UpsertOutcome::Unchanged
                    }
                }
            }
        };
        if outcome != UpsertOutcome::Unchanged {
            let _ = self.change_tx.send(StoreChange { order_id });
        }
        outcome
    }

    /// Hide an order from active queries. The record is retained.
    pub fn remove(&self, order_id: &str) {
        let removed = {
            let mut orders = self.orders.write();
            match orders.get_mut(order_id) {
                Some(stored) if !stored.removed => {
                    stored.removed = true;
                    true
                }
                _ => false,
            }
        };
        if removed {
            let _ = self.change_tx.send(StoreChange {
                order_id: order_id.to_string(),
            });
        }
    }

    /// Fetch a single order, removed or not
    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.orders.read().get(order_id).map(|s| s.order.clone())
    }

    /// Live derived list of non-removed orders matching the predicate
    pub fn query<P>(&self, predicate: P) -> Vec<Order>
    where
        P: Fn(&Order) -> bool,
    {
        self.orders
            .read()
            .values()
            .filter(|s| !s.removed && predicate(&s.order))
            .map(|s| s.order.clone())
            .collect()
    }

    /// Orders still in flight (non-terminal, not removed)
    pub fn active_orders(&self) -> Vec<Order> {
        self.query(|o| !o.status.is_terminal())
    }

    /// Orders the kitchen board cares about
    pub fn needs_kitchen_attention(&self) -> Vec<Order> {
        self.query(Order::needs_kitchen_attention)
    }

    /// Local evaluation of a list filter
    pub fn filtered(&self, filter: &OrderFilter) -> Vec<Order> {
        self.query(|o| filter.matches(o))
    }

    /// Drop terminal orders; called when the owning view unsubscribes
    pub fn clear_terminal(&self) {
        self.orders
            .write()
            .retain(|_, s| !s.order.status.is_terminal());
    }

    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge an incoming full representation into the stored order.
/// Returns whether anything was accepted.
fn merge_order(stored: &mut Order, incoming: Order) -> bool {
    let mut changed = false;

    if stored.status != incoming.status {
        if stored.status.is_reachable(incoming.status) {
            stored.status = incoming.status;
            changed = true;
        } else {
            // Expected under at-least-once / out-of-order delivery
            tracing::debug!(
                order_id = %stored.id,
                from = %stored.status,
                to = %incoming.status,
                "Stale order status ignored"
            );
        }
    }

    if stored.table_id != incoming.table_id {
        stored.table_id = incoming.table_id;
        changed = true;
    }
    if incoming.table_name.is_some() && stored.table_name != incoming.table_name {
        stored.table_name = incoming.table_name;
        changed = true;
    }
    if stored.waiter_id != incoming.waiter_id {
        stored.waiter_id = incoming.waiter_id;
        changed = true;
    }
    if incoming.waiter_name.is_some() && stored.waiter_name != incoming.waiter_name {
        stored.waiter_name = incoming.waiter_name;
        changed = true;
    }
    if incoming.note.is_some() && stored.note != incoming.note {
        stored.note = incoming.note;
        changed = true;
    }

    // Line ids are stable; unknown lines append in payload order, known
    // lines merge under their own status guard. Lines absent from the
    // payload are kept untouched.
    for line in incoming.lines {
        match stored.lines.iter_mut().find(|l| l.id == line.id) {
            None => {
                stored.lines.push(line);
                changed = true;
            }
            Some(existing) => {
                changed |= merge_line(existing, line);
            }
        }
    }

    changed
}

fn merge_line(stored: &mut shared::order::OrderLine, incoming: shared::order::OrderLine) -> bool {
    let mut changed = false;

    if stored.status != incoming.status {
        if stored.status.is_reachable(incoming.status) {
            stored.status = incoming.status;
            changed = true;
        } else {
            tracing::debug!(
                line_id = %stored.id,
                from = %stored.status,
                to = %incoming.status,
                "Stale line status ignored"
            );
        }
    }

    if stored.name != incoming.name {
        stored.name = incoming.name;
        changed = true;
    }
    if stored.quantity != incoming.quantity {
        stored.quantity = incoming.quantity;
        changed = true;
    }
    if stored.unit_price != incoming.unit_price {
        stored.unit_price = incoming.unit_price;
        changed = true;
    }
    if stored.item != incoming.item {
        stored.item = incoming.item;
        changed = true;
    }
    if stored.is_new != incoming.is_new {
        stored.is_new = incoming.is_new;
        changed = true;
    }

    changed
}
