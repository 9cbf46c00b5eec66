//! Mock Freebox Home API client

use async_trait::async_trait;
use ha_freebox::{
    CommandId, EndpointReading, FreeboxError, FreeboxResult, HomeApi, HomeNode, NodeId,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A write sent to the gateway
#[derive(Debug, Clone, PartialEq)]
pub struct SetCall {
    pub node_id: NodeId,
    pub command_id: CommandId,
    pub payload: Value,
}

/// In-memory gateway
///
/// Serves the configured nodes and endpoint values and records every
/// write. With `set_failing(true)` every request fails like a lost session.
#[derive(Default)]
pub struct MockHomeApi {
    nodes: Mutex<Vec<HomeNode>>,
    values: Mutex<HashMap<(NodeId, CommandId), Value>>,
    set_calls: Mutex<Vec<SetCall>>,
    failing: AtomicBool,
}

impl MockHomeApi {
    pub fn new(nodes: Vec<HomeNode>) -> Self {
        Self {
            nodes: Mutex::new(nodes),
            ..Default::default()
        }
    }

    /// Replace the nodes the gateway reports
    pub fn set_nodes(&self, nodes: Vec<HomeNode>) {
        *self.nodes.lock().unwrap() = nodes;
    }

    /// Set the value the gateway returns for one endpoint
    pub fn set_value(&self, node_id: impl Into<NodeId>, command_id: u64, value: Value) {
        self.values
            .lock()
            .unwrap()
            .insert((node_id.into(), CommandId(command_id)), value);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Writes received so far
    pub fn set_calls(&self) -> Vec<SetCall> {
        self.set_calls.lock().unwrap().clone()
    }

    fn check(&self) -> FreeboxResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FreeboxError::Api("auth_required".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl HomeApi for MockHomeApi {
    async fn get_home_nodes(&self) -> FreeboxResult<Vec<HomeNode>> {
        self.check()?;
        Ok(self.nodes.lock().unwrap().clone())
    }

    async fn set_home_endpoint_value(
        &self,
        node_id: &NodeId,
        command_id: CommandId,
        payload: &Value,
    ) -> FreeboxResult<()> {
        self.check()?;
        self.set_calls.lock().unwrap().push(SetCall {
            node_id: node_id.clone(),
            command_id,
            payload: payload.clone(),
        });
        Ok(())
    }

    async fn get_home_endpoint_value(
        &self,
        node_id: &NodeId,
        command_id: CommandId,
    ) -> FreeboxResult<EndpointReading> {
        self.check()?;
        let value = self
            .values
            .lock()
            .unwrap()
            .get(&(node_id.clone(), command_id))
            .cloned();
        Ok(EndpointReading { value })
    }
}
