//! Freebox Home API client interface
//!
//! Defines what the integration needs from the gateway client. Session
//! handling, authentication and transport live in the client
//! implementation, outside this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FreeboxResult;
use crate::home::{CommandId, HomeNode, NodeId};

/// Reply of the gateway when reading an endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointReading {
    /// Current value, `None` when the gateway does not know it
    #[serde(default)]
    pub value: Option<Value>,
}

/// Client for the `/home` part of the Freebox API
#[async_trait]
pub trait HomeApi: Send + Sync {
    /// List every node paired with the gateway
    async fn get_home_nodes(&self) -> FreeboxResult<Vec<HomeNode>>;

    /// Write an endpoint; `payload` is sent as is (`{"value": ...}`)
    async fn set_home_endpoint_value(
        &self,
        node_id: &NodeId,
        command_id: CommandId,
        payload: &Value,
    ) -> FreeboxResult<()>;

    /// Read an endpoint
    async fn get_home_endpoint_value(
        &self,
        node_id: &NodeId,
        command_id: CommandId,
    ) -> FreeboxResult<EndpointReading>;
}
