//! Event channel - push connection registry
//!
//! One physical push connection per topic, shared by every consumer
//! interested in that topic, with per-event-name fan-out:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    EventChannel                       │
//! │   topics: topic ──► connection task (reconnecting)    │
//! │   streams: event name ──► broadcast::Sender<PushEvent>│
//! └──────────────────────────────────────────────────────┘
//!                │                          │
//!        PushConnector (dial)        on("nuevo-pedido")
//!                │                          │
//!        SSE / MemoryHub            every subscriber gets
//!                                   every event once
//! ```
//!
//! The registry is explicit and keyed by topic; no component holds an
//! ambient connection object. Connection lifecycle lives entirely here.

mod sse;
mod transport;

pub use sse::SseConnector;
pub use transport::{ChannelError, MemoryHub, MemoryTransport, PushConnector, PushTransport};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use shared::message::PushEvent;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

/// Fixed delay between reconnect attempts
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Per-event-name fan-out buffer
const EVENT_BUFFER: usize = 256;

struct TopicHandle {
    /// Event names registered for this topic; re-subscribed on reconnect
    event_names: Arc<RwLock<HashSet<String>>>,
    connected: watch::Receiver<bool>,
    cancel: CancellationToken,
}

/// Push connection registry keyed by topic
pub struct EventChannel {
    connector: Arc<dyn PushConnector>,
    reconnect_delay: Duration,
    topics: DashMap<String, TopicHandle>,
    streams: Arc<DashMap<String, broadcast::Sender<PushEvent>>>,
}

impl EventChannel {
    pub fn new(connector: Arc<dyn PushConnector>) -> Self {
        Self {
            connector,
            reconnect_delay: RECONNECT_DELAY,
            topics: DashMap::new(),
            streams: Arc::new(DashMap::new()),
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Register interest in `event_names` on `topic`.
    ///
    /// Idempotent: if a connection for the topic already exists the names
    /// are merged into its registered set; otherwise the connection task is
    /// spawned now (first call opens the connection).
    pub fn connect<I, S>(&self, topic: &str, event_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: HashSet<String> = event_names.into_iter().map(Into::into).collect();

        match self.topics.entry(topic.to_string()) {
            Entry::Occupied(handle) => {
                handle.get().event_names.write().extend(names);
            }
            Entry::Vacant(slot) => {
                let event_names = Arc::new(RwLock::new(names));
                let (connected_tx, connected_rx) = watch::channel(false);
                let cancel = CancellationToken::new();

                tokio::spawn(run_topic(
                    Arc::clone(&self.connector),
                    topic.to_string(),
                    Arc::clone(&event_names),
                    Arc::clone(&self.streams),
                    connected_tx,
                    cancel.clone(),
                    self.reconnect_delay,
                ));

                slot.insert(TopicHandle {
                    event_names,
                    connected: connected_rx,
                    cancel,
                });
            }
        }
    }

    /// Multicast stream for a named event.
    ///
    /// Every call with the same name observes the same underlying events;
    /// each subscriber receives every event once. Delivery additionally
    /// requires the name to be registered on a connected topic.
    pub fn on(&self, event_name: &str) -> broadcast::Receiver<PushEvent> {
        self.streams
            .entry(event_name.to_string())
            .or_insert_with(|| broadcast::channel(EVENT_BUFFER).0)
            .subscribe()
    }

    /// Tear down the topic's connection and complete its event streams.
    /// No-op when the topic is not connected.
    pub fn disconnect(&self, topic: &str) {
        if let Some((_, handle)) = self.topics.remove(topic) {
            handle.cancel.cancel();
            for name in handle.event_names.read().iter() {
                self.streams.remove(name);
            }
            tracing::info!(topic = %topic, "Push channel disconnected");
        }
    }

    /// Current connection flag for the topic
    pub fn is_connected(&self, topic: &str) -> bool {
        self.topics
            .get(topic)
            .map(|h| *h.connected.borrow())
            .unwrap_or(false)
    }

    /// Observable connection flag; `None` when the topic was never connected
    pub fn watch_connected(&self, topic: &str) -> Option<watch::Receiver<bool>> {
        self.topics.get(topic).map(|h| h.connected.clone())
    }

    /// Disconnect every topic
    pub fn shutdown(&self) {
        let topics: Vec<String> = self.topics.iter().map(|e| e.key().clone()).collect();
        for topic in topics {
            self.disconnect(&topic);
        }
    }
}

/// Connection task: dial, pump events, reconnect after the fixed delay.
/// Runs until the topic's cancellation token fires.
async fn run_topic(
    connector: Arc<dyn PushConnector>,
    topic: String,
    event_names: Arc<RwLock<HashSet<String>>>,
    streams: Arc<DashMap<String, broadcast::Sender<PushEvent>>>,
    connected: watch::Sender<bool>,
    cancel: CancellationToken,
    reconnect_delay: Duration,
) {
    loop {
        // Snapshot of the registered set; re-subscribed on each (re)dial
        let names: Vec<String> = event_names.read().iter().cloned().collect();

        let dialed = tokio::select! {
            _ = cancel.cancelled() => return,
            dialed = connector.dial(&topic, &names) => dialed,
        };

        match dialed {
            Ok(mut transport) => {
                let _ = connected.send(true);
                tracing::info!(topic = %topic, "Push channel connected");

                let mut stopped = false;
                loop {
                    let next = tokio::select! {
                        _ = cancel.cancelled() => {
                            stopped = true;
                            break;
                        }
                        next = transport.next_event() => next,
                    };
                    match next {
                        Ok(Some(event)) => dispatch(&event_names, &streams, event),
                        Ok(None) => {
                            tracing::warn!(topic = %topic, "Push stream ended by server");
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(topic = %topic, error = %e, "Push channel error");
                            break;
                        }
                    }
                }
                let _ = connected.send(false);
                if stopped {
                    let _ = transport.close().await;
                    return;
                }
            }
            Err(e) => {
                let _ = connected.send(false);
                tracing::warn!(topic = %topic, error = %e, "Push channel connect failed");
            }
        }

        // Fixed-delay reconnect; retries are unbounded until disconnect
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
        tracing::info!(topic = %topic, "Reconnecting push channel");
    }
}

/// Fan an event out to its name's subscribers. Events without a registered
/// name are ignored (the topic never asked for them).
fn dispatch(
    event_names: &RwLock<HashSet<String>>,
    streams: &DashMap<String, broadcast::Sender<PushEvent>>,
    event: PushEvent,
) {
    if !event_names.read().contains(&event.event) {
        tracing::debug!(event = %event.event, "Unregistered event ignored");
        return;
    }
    if let Some(sender) = streams.get(&event.event) {
        // No subscribers yet is fine; the event is simply unobserved
        let _ = sender.send(event);
    }
}
