//! Base for entities backed by a Freebox Home node

use ha_core::{DeviceIdentifier, DeviceInfo};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

use crate::error::{FreeboxError, FreeboxResult};
use crate::home::{
    self, CommandId, Endpoint, EndpointKind, FreeboxHomeCategory, HomeNode, NodeId,
};
use crate::router::FreeboxRouter;
use crate::DOMAIN;

const MANUFACTURER: &str = "Freebox SAS";
const MANUFACTURER_SOMFY: &str = "Somfy";

/// State shared by every Freebox Home entity: identity, device info and
/// access to the node's endpoints through the router
pub struct FreeboxHomeEntity {
    router: Arc<FreeboxRouter>,
    id: NodeId,
    name: String,
    unique_id: String,
    device_info: DeviceInfo,
}

impl FreeboxHomeEntity {
    pub fn new(router: Arc<FreeboxRouter>, node: &HomeNode) -> Self {
        let name = node.label.trim().to_string();
        let unique_id = format!("{} home {}", router.mac(), node.id);
        let (manufacturer, model) = manufacturer_and_model(node);

        let device_info = DeviceInfo {
            identifiers: vec![DeviceIdentifier::new(DOMAIN, node.id.as_str())],
            name: Some(name.clone()),
            manufacturer: Some(manufacturer.to_string()),
            model: model.map(str::to_string),
            sw_version: node.firmware(),
            via_device: Some(DeviceIdentifier::new(DOMAIN, router.mac())),
        };

        Self {
            router,
            id: node.id.clone(),
            name,
            unique_id,
            device_info,
        }
    }

    pub fn router(&self) -> &Arc<FreeboxRouter> {
        &self.router
    }

    /// Id of the node this entity represents
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    /// Signal the router sends after every node refresh
    pub fn update_signal(&self) -> &str {
        self.router.signal_home_device_update()
    }

    /// Resolve the id of an endpoint, warning when the node lacks it
    pub fn get_command_id(
        &self,
        endpoints: &[Endpoint],
        kind: EndpointKind,
        name: &str,
    ) -> Option<CommandId> {
        let command_id = home::get_command_id(endpoints, kind, name);
        if command_id.is_none() {
            warn!(
                node_id = %self.id,
                "The Freebox Home device has no command value for: {}/{:?}",
                name,
                kind
            );
        }
        command_id
    }

    /// Read the value an endpoint carries in the node description
    pub fn get_node_value(
        &self,
        endpoints: &[Endpoint],
        kind: EndpointKind,
        name: &str,
    ) -> Option<Value> {
        if home::get_command_id(endpoints, kind, name).is_none() {
            warn!(
                node_id = %self.id,
                "The Freebox Home device has no node value for: {}/{:?}",
                name,
                kind
            );
            return None;
        }
        home::get_node_value(endpoints, kind, name)
    }

    /// Write an endpoint of the node
    ///
    /// Fails with `MissingCommand` when the endpoint could not be resolved.
    pub async fn set_home_endpoint_value(
        &self,
        command_id: Option<CommandId>,
        value: Value,
    ) -> FreeboxResult<()> {
        let Some(command_id) = command_id else {
            error!(node_id = %self.id, "Unable to SET a value through the API. Command is None");
            return Err(FreeboxError::MissingCommand {
                node_id: self.id.clone(),
            });
        };
        self.router
            .set_home_endpoint_value(&self.id, command_id, value)
            .await
    }

    /// Read an endpoint of the node
    ///
    /// An unresolved endpoint reads as `None`.
    pub async fn get_home_endpoint_value(
        &self,
        command_id: Option<CommandId>,
    ) -> FreeboxResult<Option<Value>> {
        let Some(command_id) = command_id else {
            error!(node_id = %self.id, "Unable to GET a value through the API. Command is None");
            return Ok(None);
        };
        self.router.get_home_endpoint_value(&self.id, command_id).await
    }
}

/// Manufacturer and model of a node
///
/// Somfy devices are only recognisable by the type they inherit from.
fn manufacturer_and_model(node: &HomeNode) -> (&'static str, Option<&'static str>) {
    if let Some(model) = node.category.model() {
        return (MANUFACTURER, Some(model));
    }
    match node.node_type.inherit.as_deref() {
        Some("node::rts") => (MANUFACTURER_SOMFY, FreeboxHomeCategory::Rts.model()),
        Some("node::ios") => (MANUFACTURER_SOMFY, FreeboxHomeCategory::Iohome.model()),
        _ => (MANUFACTURER, None),
    }
}
