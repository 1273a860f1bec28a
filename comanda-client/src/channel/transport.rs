//! Push transport abstraction
//!
//! The channel owns reconnection and fan-out; transports only dial and
//! decode. Two implementations: SSE over HTTP (production) and an
//! in-process memory hub for tests and same-process wiring.

use async_trait::async_trait;
use serde::Serialize;
use shared::message::PushEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;

/// Transport-level errors. Malformed payloads are not errors: transports
/// log and drop them so one bad event never stalls the stream.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

/// One live push connection for a topic
#[async_trait]
pub trait PushTransport: Send {
    /// Next event, `Ok(None)` on orderly end-of-stream.
    ///
    /// Implementations skip malformed payloads internally.
    async fn next_event(&mut self) -> Result<Option<PushEvent>, ChannelError>;

    /// Release the underlying connection
    async fn close(&mut self) -> Result<(), ChannelError>;
}

/// Dials push connections. Re-dialed with the full registered event-name
/// set on every reconnect.
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn dial(
        &self,
        topic: &str,
        event_names: &[String],
    ) -> Result<Box<dyn PushTransport>, ChannelError>;
}

// ============================================================================
// Memory hub
// ============================================================================

#[derive(Debug, Clone)]
enum HubFrame {
    Event { topic: String, event: PushEvent },
    /// Raw payload line, decoded by the transport (malformed input testing)
    Raw { topic: String, line: String },
    /// Simulated connection error for the topic
    Drop { topic: String },
}

const HUB_BUFFER: usize = 256;

/// In-process push hub for tests and same-process wiring.
///
/// Acts as its own connector: every dial subscribes a new transport to the
/// hub's broadcast channel.
#[derive(Debug, Clone)]
pub struct MemoryHub {
    tx: broadcast::Sender<HubFrame>,
    dials: Arc<AtomicUsize>,
}

impl MemoryHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(HUB_BUFFER);
        Self {
            tx,
            dials: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish a named event on a topic
    pub fn publish<T: Serialize>(
        &self,
        topic: &str,
        event: &str,
        payload: &T,
    ) -> Result<(), serde_json::Error> {
        let event = PushEvent::new(event, payload)?;
        let _ = self.tx.send(HubFrame::Event {
            topic: topic.to_string(),
            event,
        });
        Ok(())
    }

    /// Publish a raw payload line; transports decode (and may drop) it
    pub fn publish_raw(&self, topic: &str, line: &str) {
        let _ = self.tx.send(HubFrame::Raw {
            topic: topic.to_string(),
            line: line.to_string(),
        });
    }

    /// Simulate a connection error on every live transport for the topic
    pub fn drop_connections(&self, topic: &str) {
        let _ = self.tx.send(HubFrame::Drop {
            topic: topic.to_string(),
        });
    }

    /// How many times the hub has been dialed (reconnect assertions)
    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

impl Default for MemoryHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushConnector for MemoryHub {
    async fn dial(
        &self,
        topic: &str,
        _event_names: &[String],
    ) -> Result<Box<dyn PushTransport>, ChannelError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryTransport {
            topic: topic.to_string(),
            rx: self.tx.subscribe(),
        }))
    }
}

/// Transport side of [`MemoryHub`]
pub struct MemoryTransport {
    topic: String,
    rx: broadcast::Receiver<HubFrame>,
}

#[async_trait]
impl PushTransport for MemoryTransport {
    async fn next_event(&mut self) -> Result<Option<PushEvent>, ChannelError> {
        loop {
            match self.rx.recv().await {
                Ok(HubFrame::Event { topic, event }) if topic == self.topic => {
                    return Ok(Some(event));
                }
                Ok(HubFrame::Raw { topic, line }) if topic == self.topic => {
                    match serde_json::from_str::<PushEvent>(&line) {
                        Ok(event) => return Ok(Some(event)),
                        Err(e) => {
                            tracing::warn!(
                                topic = %self.topic,
                                error = %e,
                                "Malformed push payload dropped"
                            );
                        }
                    }
                }
                Ok(HubFrame::Drop { topic }) if topic == self.topic => {
                    return Err(ChannelError::ConnectionLost(
                        "connection dropped by hub".to_string(),
                    ));
                }
                Ok(_) => {} // other topic
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        topic = %self.topic,
                        skipped,
                        "Memory transport lagged, events skipped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }
}
