//! Client facade
//!
//! Wires the pieces together for a consuming application: one store, one
//! notification queue, one event channel and the command API, plus
//! constructors for the three views.

use crate::api::OrderApi;
use crate::channel::{EventChannel, PushConnector, SseConnector};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::notify::{NoopNotifier, NotificationQueue, PlatformNotifier};
use crate::store::OrderStore;
use crate::sync::OrderSync;
use crate::views::{KitchenBoard, OrderEditor, TableMap};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Everything a viewer process needs, built from one config
pub struct ComandaClient {
    config: ClientConfig,
    api: Arc<OrderApi>,
    channel: Arc<EventChannel>,
    store: Arc<OrderStore>,
    queue: Arc<NotificationQueue>,
    sync: OrderSync,
}

impl ComandaClient {
    /// Production wiring: SSE push transport, no platform notifier
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let connector = Arc::new(SseConnector::new(
            config.events_url.clone(),
            config.token.clone(),
        ));
        Self::with_parts(config, connector, Arc::new(NoopNotifier))
    }

    /// Custom transport and notifier (tests, embedded hosts)
    pub fn with_parts(
        config: ClientConfig,
        connector: Arc<dyn PushConnector>,
        notifier: Arc<dyn PlatformNotifier>,
    ) -> ClientResult<Self> {
        let api = Arc::new(OrderApi::new(&config)?);
        let channel = Arc::new(
            EventChannel::new(connector).with_reconnect_delay(config.reconnect_delay),
        );
        let store = Arc::new(OrderStore::new());
        let queue = Arc::new(NotificationQueue::with_notifier(notifier));
        let sync = OrderSync::new(Arc::clone(&channel), Arc::clone(&store), Arc::clone(&queue));

        Ok(Self {
            config,
            api,
            channel,
            store,
            queue,
            sync,
        })
    }

    /// Open the kitchen topic and start reconciling push events
    pub fn start_sync(&self) -> JoinHandle<()> {
        self.sync.start()
    }

    /// Stop syncing and close every push connection
    pub fn shutdown(&self) {
        self.sync.stop();
        self.channel.shutdown();
    }

    pub fn store(&self) -> Arc<OrderStore> {
        Arc::clone(&self.store)
    }

    pub fn notifications(&self) -> Arc<NotificationQueue> {
        Arc::clone(&self.queue)
    }

    pub fn channel(&self) -> Arc<EventChannel> {
        Arc::clone(&self.channel)
    }

    pub fn api(&self) -> Arc<OrderApi> {
        Arc::clone(&self.api)
    }

    pub fn kitchen_board(&self) -> KitchenBoard {
        KitchenBoard::new(
            Arc::clone(&self.api),
            Arc::clone(&self.store),
            self.config.ready_delivery_delay,
        )
    }

    pub fn table_map(&self) -> TableMap {
        TableMap::new(Arc::clone(&self.store))
    }

    pub fn order_editor(&self) -> OrderEditor {
        OrderEditor::new(Arc::clone(&self.api), Arc::clone(&self.store))
    }
}
