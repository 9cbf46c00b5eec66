//! Freebox Home shutters as cover entities

use async_trait::async_trait;
use dashmap::DashSet;
use ha_core::{CoverDeviceClass, CoverEntityFeature, CoverState, DeviceInfo};
use ha_entity::{AddCoverEntitiesCallback, CoverEntity, Entity, EntityResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::entity::FreeboxHomeEntity;
use crate::error::FreeboxError;
use crate::home::{
    is_truthy, CommandId, EndpointKind, FreeboxHomeCategory, HomeNode, NodeId,
};
use crate::router::FreeboxRouter;

/// Set up the cover platform
///
/// Adds the shutters the router already knows, then adds new ones every
/// time the router signals a new node. The signal connection is owned by
/// the router and dropped when it closes.
pub fn setup_entry(router: &Arc<FreeboxRouter>, async_add_entities: AddCoverEntitiesCallback) {
    let tracked: Arc<DashSet<NodeId>> = Arc::new(DashSet::new());

    let weak_router = Arc::downgrade(router);
    let callback = async_add_entities.clone();
    let callback_tracked = tracked.clone();
    let connection = router
        .dispatcher()
        .connect(router.signal_home_device_new(), move |_| {
            if let Some(router) = weak_router.upgrade() {
                add_entities(&router, &callback, &callback_tracked);
            }
        });
    router.add_listener(connection);

    add_entities(router, &async_add_entities, &tracked);
}

/// Add the shutters of the router that are not tracked yet
///
/// New entities are handed over in one batch, refreshed before being added.
/// Returns the number of new entities.
pub fn add_entities(
    router: &Arc<FreeboxRouter>,
    async_add_entities: &AddCoverEntitiesCallback,
    tracked: &DashSet<NodeId>,
) -> usize {
    let mut nodes: Vec<HomeNode> = router
        .home_devices()
        .iter()
        .filter(|node| node.category == FreeboxHomeCategory::Shutter)
        .map(|node| node.value().clone())
        .collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let mut new_tracked: Vec<Box<dyn CoverEntity>> = Vec::new();
    for node in &nodes {
        if !tracked.insert(node.id.clone()) {
            continue;
        }
        debug!(node_id = %node.id, label = %node.label, "Adding Freebox shutter");
        new_tracked.push(Box::new(FreeboxCover::new(router.clone(), node)));
    }

    let count = new_tracked.len();
    if count > 0 {
        async_add_entities(new_tracked, true);
    }
    count
}

/// Convert a raw gateway state into a cover state
///
/// Truthy values mean closed, other non-null values mean open, and a
/// missing or null value is unknown.
pub fn convert_state(raw: Option<&Value>) -> Option<CoverState> {
    match raw {
        None | Some(Value::Null) => None,
        Some(value) if is_truthy(value) => Some(CoverState::Closed),
        Some(_) => Some(CoverState::Open),
    }
}

/// A Freebox Home shutter
pub struct FreeboxCover {
    base: FreeboxHomeEntity,
    command_up: Option<CommandId>,
    command_stop: Option<CommandId>,
    command_down: Option<CommandId>,
    command_state: Option<CommandId>,
    state: Option<CoverState>,
}

impl FreeboxCover {
    pub fn new(router: Arc<FreeboxRouter>, node: &HomeNode) -> Self {
        let base = FreeboxHomeEntity::new(router, node);
        let endpoints = &node.show_endpoints;

        let command_up = base.get_command_id(endpoints, EndpointKind::Slot, "up");
        let command_stop = base.get_command_id(endpoints, EndpointKind::Slot, "stop");
        let command_down = base.get_command_id(endpoints, EndpointKind::Slot, "down");
        let command_state = base.get_command_id(endpoints, EndpointKind::Signal, "state");
        let state = convert_state(
            base.get_node_value(endpoints, EndpointKind::Signal, "state")
                .as_ref(),
        );

        Self {
            base,
            command_up,
            command_stop,
            command_down,
            command_state,
            state,
        }
    }

    /// Id of the node behind this cover
    pub fn node_id(&self) -> &NodeId {
        self.base.id()
    }
}

#[async_trait]
impl Entity for FreeboxCover {
    fn unique_id(&self) -> Option<&str> {
        Some(self.base.unique_id())
    }

    fn name(&self) -> Option<&str> {
        Some(self.base.name())
    }

    fn device_info(&self) -> Option<DeviceInfo> {
        Some(self.base.device_info().clone())
    }

    /// The router's refresh signal, so the cover follows every node refresh
    fn update_signal(&self) -> Option<&str> {
        Some(self.base.update_signal())
    }

    /// Refresh the name and state of the shutter
    async fn async_update(&mut self) -> EntityResult<()> {
        debug!(node_id = %self.base.id(), "Updating Freebox shutter");
        let node = self
            .base
            .router()
            .home_device(self.base.id())
            .ok_or_else(|| FreeboxError::NodeNotFound(self.base.id().clone()))?;
        self.base.set_name(node.label.trim());

        let raw = self.base.get_home_endpoint_value(self.command_state).await?;
        self.state = convert_state(raw.as_ref());
        Ok(())
    }
}

#[async_trait]
impl CoverEntity for FreeboxCover {
    fn device_class(&self) -> Option<CoverDeviceClass> {
        Some(CoverDeviceClass::Shutter)
    }

    fn supported_features(&self) -> CoverEntityFeature {
        CoverEntityFeature::OPEN | CoverEntityFeature::CLOSE | CoverEntityFeature::STOP
    }

    fn is_closed(&self) -> Option<bool> {
        match self.state {
            Some(CoverState::Open) => Some(false),
            Some(CoverState::Closed) => Some(true),
            _ => None,
        }
    }

    async fn async_open_cover(&mut self) -> EntityResult<()> {
        debug!(node_id = %self.base.id(), "Sending open to Freebox shutter");
        self.base
            .set_home_endpoint_value(self.command_up, Value::Bool(true))
            .await?;
        self.state = Some(CoverState::Open);
        Ok(())
    }

    async fn async_close_cover(&mut self) -> EntityResult<()> {
        debug!(node_id = %self.base.id(), "Sending close to Freebox shutter");
        self.base
            .set_home_endpoint_value(self.command_down, Value::Bool(true))
            .await?;
        self.state = Some(CoverState::Closed);
        Ok(())
    }

    /// Stop the shutter; its position is unknown afterwards
    async fn async_stop_cover(&mut self) -> EntityResult<()> {
        debug!(node_id = %self.base.id(), "Sending stop to Freebox shutter");
        self.base
            .set_home_endpoint_value(self.command_stop, Value::Bool(true))
            .await?;
        self.state = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_state() {
        assert_eq!(convert_state(Some(&json!(true))), Some(CoverState::Closed));
        assert_eq!(convert_state(Some(&json!(false))), Some(CoverState::Open));
        assert_eq!(convert_state(None), None);
        assert_eq!(convert_state(Some(&Value::Null)), None);
    }

    #[test]
    fn test_convert_state_follows_truthiness() {
        assert_eq!(convert_state(Some(&json!(1))), Some(CoverState::Closed));
        assert_eq!(convert_state(Some(&json!(0))), Some(CoverState::Open));
        assert_eq!(convert_state(Some(&json!(""))), Some(CoverState::Open));
    }
}
