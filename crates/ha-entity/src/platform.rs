//! Cover entity platform
//!
//! Owns the cover entities added by an integration, refreshes them and
//! routes cover service calls to them.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use ha_core::states::{STATE_UNAVAILABLE, STATE_UNKNOWN};
use ha_core::CoverService;
use serde::Serialize;
use serde_json::Value;
use ha_dispatcher::{Dispatcher, DispatcherConnection};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::entity::{AddCoverEntitiesCallback, CoverEntity};
use crate::error::{EntityError, EntityResult};

/// Entities handed over through the add-entities callback, not yet added
struct PendingBatch {
    entities: Vec<Box<dyn CoverEntity>>,
    update_before_add: bool,
}

/// A registered entity and the outcome of its last update
struct EntitySlot {
    entity: Box<dyn CoverEntity>,
    available: bool,
    last_updated: DateTime<Utc>,
}

impl EntitySlot {
    fn snapshot(&self, unique_id: &str) -> CoverSnapshot {
        let state = if self.available {
            self.entity
                .state()
                .map(|s| s.as_str())
                .unwrap_or(STATE_UNKNOWN)
        } else {
            STATE_UNAVAILABLE
        };

        CoverSnapshot {
            unique_id: unique_id.to_string(),
            state: state.to_string(),
            attributes: self.entity.state_attributes(),
            last_updated: self.last_updated,
        }
    }
}

/// State of a cover entity as the host would write it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverSnapshot {
    pub unique_id: String,
    /// "open", "closed", "opening", "closing", "unknown" or "unavailable"
    pub state: String,
    pub attributes: HashMap<String, Value>,
    pub last_updated: DateTime<Utc>,
}

/// The cover platform of one integration
///
/// Integrations never touch the platform directly: they receive the
/// callback from [`CoverPlatform::add_entities_callback`] and hand new
/// entities to it. The host then calls [`CoverPlatform::flush`] to add them.
///
/// A platform built with [`CoverPlatform::with_dispatcher`] also refreshes
/// an entity whenever its [`update_signal`](crate::Entity::update_signal)
/// is sent.
pub struct CoverPlatform {
    /// Integration domain the entities come from (e.g. "freebox")
    integration: String,
    /// Registered entities keyed by unique ID
    entities: Mutex<HashMap<String, EntitySlot>>,
    /// Unique IDs in registration order
    order: Mutex<Vec<String>>,
    pending_tx: mpsc::UnboundedSender<PendingBatch>,
    pending_rx: Mutex<mpsc::UnboundedReceiver<PendingBatch>>,
    dispatcher: Option<Arc<Dispatcher>>,
    /// Update signal connections of the registered entities
    listeners: Mutex<Vec<DispatcherConnection>>,
    this: Weak<CoverPlatform>,
}

impl CoverPlatform {
    /// Create an empty platform for an integration
    pub fn new(integration: impl Into<String>) -> Self {
        Self::build(integration.into(), None, Weak::new())
    }

    /// Create an empty platform that listens to the update signals of its
    /// entities on `dispatcher`
    pub fn with_dispatcher(
        integration: impl Into<String>,
        dispatcher: Arc<Dispatcher>,
    ) -> Arc<Self> {
        let integration = integration.into();
        Arc::new_cyclic(|this| Self::build(integration, Some(dispatcher), this.clone()))
    }

    fn build(
        integration: String,
        dispatcher: Option<Arc<Dispatcher>>,
        this: Weak<CoverPlatform>,
    ) -> Self {
        let (pending_tx, pending_rx) = mpsc::unbounded_channel();
        Self {
            integration,
            entities: Mutex::new(HashMap::new()),
            order: Mutex::new(Vec::new()),
            pending_tx,
            pending_rx: Mutex::new(pending_rx),
            dispatcher,
            listeners: Mutex::new(Vec::new()),
            this,
        }
    }

    pub fn integration(&self) -> &str {
        &self.integration
    }

    /// Callback handed to the integration's setup
    pub fn add_entities_callback(&self) -> AddCoverEntitiesCallback {
        let tx = self.pending_tx.clone();
        let integration = self.integration.clone();
        Arc::new(move |entities, update_before_add| {
            debug!(
                integration = %integration,
                count = entities.len(),
                update_before_add,
                "Queueing cover entities"
            );
            if tx
                .send(PendingBatch {
                    entities,
                    update_before_add,
                })
                .is_err()
            {
                warn!(integration = %integration, "Cover platform is gone, dropping entities");
            }
        })
    }

    /// Add every queued entity
    ///
    /// Batches queued with `update_before_add` are refreshed first, all
    /// entities of a batch at once. An entity whose first update fails is
    /// still added but reported unavailable. Returns the number of entities
    /// added.
    #[instrument(skip(self), fields(integration = %self.integration))]
    pub async fn flush(&self) -> usize {
        let mut batches = Vec::new();
        {
            let mut rx = self.pending_rx.lock().await;
            while let Ok(batch) = rx.try_recv() {
                batches.push(batch);
            }
        }

        let mut added = 0;
        for mut batch in batches {
            let mut available = vec![true; batch.entities.len()];

            if batch.update_before_add {
                let results =
                    join_all(batch.entities.iter_mut().map(|entity| entity.async_update())).await;
                for (i, result) in results.into_iter().enumerate() {
                    if let Err(e) = result {
                        warn!("Update before add failed: {}", e);
                        available[i] = false;
                    }
                }
            }

            for (entity, available) in batch.entities.into_iter().zip(available) {
                if self.register(entity, available).await {
                    added += 1;
                }
            }
        }

        if added > 0 {
            info!("Added {} cover entities", added);
        }
        added
    }

    async fn register(&self, entity: Box<dyn CoverEntity>, available: bool) -> bool {
        let Some(unique_id) = entity.unique_id().map(str::to_string) else {
            warn!(
                name = entity.name().unwrap_or_default(),
                "Cover entity has no unique ID, not adding it"
            );
            return false;
        };

        let update_signal = entity.update_signal().map(str::to_string);

        {
            let mut entities = self.entities.lock().await;
            if entities.contains_key(&unique_id) {
                warn!(unique_id = %unique_id, "Cover entity already exists, not adding it");
                return false;
            }

            debug!(unique_id = %unique_id, available, "Adding cover entity");
            entities.insert(
                unique_id.clone(),
                EntitySlot {
                    entity,
                    available,
                    last_updated: Utc::now(),
                },
            );
        }
        self.order.lock().await.push(unique_id.clone());

        if let Some(signal) = update_signal {
            self.connect_update_signal(unique_id, signal).await;
        }
        true
    }

    /// Refresh an entity in the background every time `signal` is sent
    async fn connect_update_signal(&self, unique_id: String, signal: String) {
        let Some(dispatcher) = &self.dispatcher else {
            return;
        };

        let platform = self.this.clone();
        debug!(unique_id = %unique_id, signal = %signal, "Listening for entity updates");
        let connection = dispatcher.connect(signal, move |_| {
            let Some(platform) = platform.upgrade() else {
                return;
            };
            let Ok(runtime) = Handle::try_current() else {
                warn!(unique_id = %unique_id, "No runtime to refresh cover entity on");
                return;
            };
            let unique_id = unique_id.clone();
            runtime.spawn(async move {
                if let Err(e) = platform.update_entity(&unique_id).await {
                    debug!(unique_id = %unique_id, "Skipping signalled refresh: {}", e);
                }
            });
        });
        self.listeners.lock().await.push(connection);
    }

    /// Disconnect the update signals of every entity
    pub async fn close(&self) {
        let listeners: Vec<DispatcherConnection> = self.listeners.lock().await.drain(..).collect();
        for connection in listeners {
            connection.disconnect();
        }
        debug!(integration = %self.integration, "Closed cover platform");
    }

    /// Refresh every entity that asks to be polled
    ///
    /// Failures mark the entity unavailable until its next successful update.
    pub async fn poll(&self) {
        let mut entities = self.entities.lock().await;
        for (unique_id, slot) in entities.iter_mut() {
            if !slot.entity.should_poll() {
                continue;
            }
            Self::refresh_slot(unique_id, slot).await;
        }
    }

    /// Refresh a single entity regardless of `should_poll`
    pub async fn update_entity(&self, unique_id: &str) -> EntityResult<()> {
        let mut entities = self.entities.lock().await;
        let slot = entities
            .get_mut(unique_id)
            .ok_or_else(|| EntityError::NotFound(unique_id.to_string()))?;
        Self::refresh_slot(unique_id, slot).await;
        Ok(())
    }

    async fn refresh_slot(unique_id: &str, slot: &mut EntitySlot) {
        match slot.entity.async_update().await {
            Ok(()) => {
                if !slot.available {
                    info!(unique_id = %unique_id, "Cover entity is back online");
                }
                slot.available = true;
            }
            Err(e) => {
                if slot.available {
                    warn!(unique_id = %unique_id, "Update failed: {}", e);
                }
                slot.available = false;
            }
        }
        slot.last_updated = Utc::now();
    }

    /// Call a cover service on one entity
    ///
    /// The entity must advertise the feature the service requires. Errors of
    /// the entity are returned unchanged.
    #[instrument(skip(self), fields(integration = %self.integration))]
    pub async fn call_service(&self, unique_id: &str, service: CoverService) -> EntityResult<()> {
        let mut entities = self.entities.lock().await;
        let slot = entities
            .get_mut(unique_id)
            .ok_or_else(|| EntityError::NotFound(unique_id.to_string()))?;

        if !slot
            .entity
            .supported_features()
            .contains(service.required_feature())
        {
            return Err(EntityError::NotSupported {
                entity: unique_id.to_string(),
                service,
            });
        }

        debug!(unique_id = %unique_id, service = %service, "Calling cover service");
        match service {
            CoverService::OpenCover => slot.entity.async_open_cover().await?,
            CoverService::CloseCover => slot.entity.async_close_cover().await?,
            CoverService::StopCover => slot.entity.async_stop_cover().await?,
        }
        slot.last_updated = Utc::now();
        Ok(())
    }

    /// Current state of one entity
    pub async fn snapshot(&self, unique_id: &str) -> Option<CoverSnapshot> {
        let entities = self.entities.lock().await;
        entities.get(unique_id).map(|slot| slot.snapshot(unique_id))
    }

    /// Current state of every entity, in registration order
    pub async fn snapshots(&self) -> Vec<CoverSnapshot> {
        let order = self.order.lock().await.clone();
        let entities = self.entities.lock().await;
        order
            .iter()
            .filter_map(|id| entities.get(id).map(|slot| slot.snapshot(id)))
            .collect()
    }

    /// Unique IDs of all entities, in registration order
    pub async fn unique_ids(&self) -> Vec<String> {
        self.order.lock().await.clone()
    }

    pub async fn entity_count(&self) -> usize {
        self.entities.lock().await.len()
    }
}
