//! Freebox Home data model
//!
//! Nodes are the devices paired with the Freebox Home gateway (shutters,
//! motion sensors, cameras...). Each node exposes endpoints: `slot`
//! endpoints accept commands, `signal` endpoints report values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::error::FreeboxResult;

/// Identifier of a Freebox Home node
///
/// The gateway sends integers, but the id is treated as opaque. Strings are
/// accepted as well. Integer ids order numerically, before any other id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(NodeId(s)),
            Value::Number(n) => Ok(NodeId(n.to_string())),
            other => Err(D::Error::custom(format!(
                "node id must be a string or a number, got {}",
                other
            ))),
        }
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u64>(), other.0.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of one endpoint of a node, used to send commands or read values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(pub u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category of a Freebox Home node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeboxHomeCategory {
    Alarm,
    BasicShutter,
    Camera,
    /// Door/window sensor
    Dws,
    Iohome,
    /// Keyfob
    Kfb,
    Opener,
    /// Motion sensor
    Pir,
    Rts,
    Shutter,
    #[serde(other)]
    Other,
}

impl FreeboxHomeCategory {
    /// Model name the gateway sells under this category, if any
    pub fn model(&self) -> Option<&'static str> {
        match self {
            FreeboxHomeCategory::Pir => Some("F-HAPIR01A"),
            FreeboxHomeCategory::Camera => Some("F-HACAM01A"),
            FreeboxHomeCategory::Dws => Some("F-HADWS01A"),
            FreeboxHomeCategory::Kfb => Some("F-HAKFB01A"),
            FreeboxHomeCategory::Alarm => Some("F-MSEC07A"),
            FreeboxHomeCategory::Rts => Some("RTS"),
            FreeboxHomeCategory::Iohome => Some("IOHome"),
            _ => None,
        }
    }

    /// Whether the integration knows how to handle nodes of this category
    pub fn is_supported(&self) -> bool {
        !matches!(self, FreeboxHomeCategory::Other)
    }
}

/// Kind of endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// Accepts commands (e.g. "up", "down", "stop")
    Slot,
    /// Reports a value (e.g. "state", "battery")
    Signal,
    #[serde(other)]
    Other,
}

/// One endpoint of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: CommandId,
    pub ep_type: EndpointKind,
    pub name: String,
    /// Last value known by the gateway (signals only)
    #[serde(default)]
    pub value: Option<Value>,
}

/// Type description of a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeType {
    /// Parent type, e.g. "node::rts" for Somfy RTS devices
    #[serde(default)]
    pub inherit: Option<String>,
}

/// A node as reported by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeNode {
    pub id: NodeId,
    pub category: FreeboxHomeCategory,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub props: HashMap<String, Value>,
    #[serde(default)]
    pub show_endpoints: Vec<Endpoint>,
}

impl HomeNode {
    /// Firmware version reported in the node properties
    pub fn firmware(&self) -> Option<String> {
        match self.props.get("FwVersion")? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Parse the node list returned by the gateway
pub fn parse_home_nodes(value: Value) -> FreeboxResult<Vec<HomeNode>> {
    Ok(serde_json::from_value(value)?)
}

fn find_endpoint<'a>(
    endpoints: &'a [Endpoint],
    kind: EndpointKind,
    name: &str,
) -> Option<&'a Endpoint> {
    endpoints
        .iter()
        .find(|endpoint| endpoint.ep_type == kind && endpoint.name == name)
}

/// Id of the first endpoint matching both kind and name
pub fn get_command_id(
    endpoints: &[Endpoint],
    kind: EndpointKind,
    name: &str,
) -> Option<CommandId> {
    find_endpoint(endpoints, kind, name).map(|endpoint| endpoint.id)
}

/// Value of the first endpoint matching both kind and name
///
/// Returns `None` when the endpoint is missing or carries no value.
pub fn get_node_value(endpoints: &[Endpoint], kind: EndpointKind, name: &str) -> Option<Value> {
    find_endpoint(endpoints, kind, name).and_then(|endpoint| endpoint.value.clone())
}

/// Truthiness of a raw gateway value
///
/// `null`, `false`, `0`, empty strings, arrays and objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
