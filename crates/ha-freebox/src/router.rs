//! Freebox router
//!
//! The router keeps the registry of Freebox Home nodes, refreshes it from
//! the gateway and tells the platforms about new nodes through the
//! dispatcher.

use dashmap::DashMap;
use ha_dispatcher::{Dispatcher, DispatcherConnection};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api::HomeApi;
use crate::config::FreeboxConfig;
use crate::error::FreeboxResult;
use crate::home::{CommandId, HomeNode, NodeId};
use crate::DOMAIN;

/// Connection to one Freebox gateway and its Home nodes
pub struct FreeboxRouter {
    config: FreeboxConfig,
    api: Arc<dyn HomeApi>,
    dispatcher: Arc<Dispatcher>,
    /// Known nodes keyed by node id
    home_devices: DashMap<NodeId, HomeNode>,
    signal_home_device_new: String,
    signal_home_device_update: String,
    /// Dispatcher connections owned by the platforms, dropped on close
    listeners: Mutex<Vec<DispatcherConnection>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl FreeboxRouter {
    pub fn new(config: FreeboxConfig, api: Arc<dyn HomeApi>, dispatcher: Arc<Dispatcher>) -> Self {
        let signal_home_device_new = format!("{}-{}-home-device-new", DOMAIN, config.host);
        let signal_home_device_update = format!("{}-{}-home-device-update", DOMAIN, config.host);

        Self {
            config,
            api,
            dispatcher,
            home_devices: DashMap::new(),
            signal_home_device_new,
            signal_home_device_update,
            listeners: Mutex::new(Vec::new()),
            poller: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &FreeboxConfig {
        &self.config
    }

    /// MAC address of the gateway
    pub fn mac(&self) -> &str {
        &self.config.mac
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Signal sent when at least one unseen node was found
    pub fn signal_home_device_new(&self) -> &str {
        &self.signal_home_device_new
    }

    /// Signal sent after every refresh of the nodes
    pub fn signal_home_device_update(&self) -> &str {
        &self.signal_home_device_update
    }

    /// Registry of known nodes
    pub fn home_devices(&self) -> &DashMap<NodeId, HomeNode> {
        &self.home_devices
    }

    /// Get a copy of one node
    pub fn home_device(&self, node_id: &NodeId) -> Option<HomeNode> {
        self.home_devices.get(node_id).map(|node| node.clone())
    }

    /// Refresh the nodes from the gateway
    ///
    /// Nodes of unsupported categories are ignored. Sends the update signal,
    /// then the new-device signal if any node was not known before. Returns
    /// the number of new nodes.
    #[instrument(skip(self), fields(host = %self.config.host))]
    pub async fn update_home_devices(&self) -> FreeboxResult<usize> {
        let nodes = self.api.get_home_nodes().await?;

        let mut new_devices = 0;
        for node in nodes {
            if !node.category.is_supported() {
                continue;
            }
            if !self.home_devices.contains_key(&node.id) {
                debug!(node_id = %node.id, category = ?node.category, "Found new home node");
                new_devices += 1;
            }
            self.home_devices.insert(node.id.clone(), node);
        }

        self.dispatcher
            .send(&self.signal_home_device_update, &Value::Null);
        if new_devices > 0 {
            info!("Found {} new Freebox Home nodes", new_devices);
            self.dispatcher.send(&self.signal_home_device_new, &Value::Null);
        }
        Ok(new_devices)
    }

    /// Write an endpoint of a node
    pub async fn set_home_endpoint_value(
        &self,
        node_id: &NodeId,
        command_id: CommandId,
        value: Value,
    ) -> FreeboxResult<()> {
        debug!(
            node_id = %node_id,
            command_id = %command_id,
            value = %value,
            "Setting endpoint value"
        );
        self.api
            .set_home_endpoint_value(node_id, command_id, &json!({ "value": value }))
            .await
    }

    /// Read an endpoint of a node
    pub async fn get_home_endpoint_value(
        &self,
        node_id: &NodeId,
        command_id: CommandId,
    ) -> FreeboxResult<Option<Value>> {
        let reading = self.api.get_home_endpoint_value(node_id, command_id).await?;
        Ok(reading.value)
    }

    /// Keep a dispatcher connection until the router is closed
    pub fn add_listener(&self, connection: DispatcherConnection) {
        lock(&self.listeners).push(connection);
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Refresh the nodes every `scan_interval` until the router is closed
    ///
    /// Failed refreshes are logged and retried on the next tick. Starting
    /// the poller again replaces the running one.
    pub fn spawn_home_poller(self: &Arc<Self>) {
        let router = Arc::downgrade(self);
        let interval = self.config.scan_interval();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(router) = router.upgrade() else {
                    break;
                };
                if let Err(e) = router.update_home_devices().await {
                    warn!("Failed to refresh Freebox Home nodes: {}", e);
                }
            }
        });

        if let Some(previous) = lock(&self.poller).replace(handle) {
            previous.abort();
        }
        debug!(host = %self.config.host, ?interval, "Started home node poller");
    }

    /// Disconnect every listener and stop the poller
    pub fn close(&self) {
        let listeners: Vec<DispatcherConnection> = lock(&self.listeners).drain(..).collect();
        for connection in listeners {
            connection.disconnect();
        }
        if let Some(poller) = lock(&self.poller).take() {
            poller.abort();
        }
        debug!(host = %self.config.host, "Closed Freebox router");
    }
}

impl Drop for FreeboxRouter {
    fn drop(&mut self) {
        if let Some(poller) = lock(&self.poller).take() {
            poller.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::EndpointReading;
    use crate::error::FreeboxError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticApi {
        nodes: Mutex<Vec<HomeNode>>,
        fail: bool,
    }

    #[async_trait]
    impl HomeApi for StaticApi {
        async fn get_home_nodes(&self) -> FreeboxResult<Vec<HomeNode>> {
            if self.fail {
                return Err(FreeboxError::Api("session expired".to_string()));
            }
            Ok(self.nodes.lock().unwrap().clone())
        }

        async fn set_home_endpoint_value(
            &self,
            _node_id: &NodeId,
            _command_id: CommandId,
            _payload: &Value,
        ) -> FreeboxResult<()> {
            Ok(())
        }

        async fn get_home_endpoint_value(
            &self,
            _node_id: &NodeId,
            _command_id: CommandId,
        ) -> FreeboxResult<EndpointReading> {
            Ok(EndpointReading::default())
        }
    }

    fn node(id: u64, category: &str) -> HomeNode {
        serde_json::from_value(json!({"id": id, "category": category, "label": "node"})).unwrap()
    }

    fn router(nodes: Vec<HomeNode>, fail: bool) -> FreeboxRouter {
        FreeboxRouter::new(
            FreeboxConfig::new("68:A3:78:00:00:01"),
            Arc::new(StaticApi {
                nodes: Mutex::new(nodes),
                fail,
            }),
            Arc::new(Dispatcher::new()),
        )
    }

    #[test]
    fn test_signal_names() {
        let router = router(vec![], false);
        assert_eq!(
            router.signal_home_device_new(),
            "freebox-mafreebox.freebox.fr-home-device-new"
        );
        assert_eq!(
            router.signal_home_device_update(),
            "freebox-mafreebox.freebox.fr-home-device-update"
        );
    }

    #[tokio::test]
    async fn test_update_skips_unsupported_categories() {
        let router = router(vec![node(1, "shutter"), node(2, "thermostat")], false);
        assert_eq!(router.update_home_devices().await.unwrap(), 1);
        assert!(router.home_device(&NodeId::from(1)).is_some());
        assert!(router.home_device(&NodeId::from(2)).is_none());
    }

    #[tokio::test]
    async fn test_new_signal_only_for_unseen_nodes() {
        let router = router(vec![node(1, "shutter")], false);
        let new_count = Arc::new(AtomicUsize::new(0));
        let update_count = Arc::new(AtomicUsize::new(0));

        let counter = new_count.clone();
        let _new = router
            .dispatcher()
            .connect(router.signal_home_device_new(), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let counter = update_count.clone();
        let _update = router
            .dispatcher()
            .connect(router.signal_home_device_update(), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        router.update_home_devices().await.unwrap();
        router.update_home_devices().await.unwrap();

        assert_eq!(new_count.load(Ordering::SeqCst), 1);
        assert_eq!(update_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_update_failure_propagates() {
        let router = router(vec![node(1, "shutter")], true);
        let err = router.update_home_devices().await.unwrap_err();
        assert!(matches!(err, FreeboxError::Api(_)));
        assert!(router.home_devices().is_empty());
    }

    #[test]
    fn test_close_disconnects_listeners() {
        let router = router(vec![], false);
        let connection = router
            .dispatcher()
            .connect(router.signal_home_device_new(), |_| {});
        router.add_listener(connection);
        assert_eq!(router.listener_count(), 1);

        router.close();
        assert_eq!(router.listener_count(), 0);
        assert_eq!(
            router
                .dispatcher()
                .listener_count(router.signal_home_device_new()),
            0
        );
    }
}
