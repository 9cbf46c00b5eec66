//! Test fixtures

use ha_dispatcher::Dispatcher;
use ha_freebox::{FreeboxConfig, FreeboxRouter, HomeNode};
use serde_json::{json, Value};
use std::sync::Arc;

use super::MockHomeApi;

pub const MAC: &str = "68:A3:78:00:00:01";

/// Endpoint ids used by [`shutter_node`]
pub const CMD_UP: u64 = 0;
pub const CMD_STOP: u64 = 1;
pub const CMD_DOWN: u64 = 2;
pub const CMD_STATE: u64 = 3;

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A shutter node with up, stop, down and state endpoints
pub fn shutter_node(id: &str, label: &str, state: Value) -> HomeNode {
    node(json!({
        "id": id,
        "category": "shutter",
        "label": label,
        "type": {"inherit": "node::ios"},
        "props": {"FwVersion": "226.0"},
        "show_endpoints": [
            {"id": CMD_UP, "ep_type": "slot", "name": "up"},
            {"id": CMD_STOP, "ep_type": "slot", "name": "stop"},
            {"id": CMD_DOWN, "ep_type": "slot", "name": "down"},
            {"id": CMD_STATE, "ep_type": "signal", "name": "state", "value": state}
        ]
    }))
}

/// A motion sensor node
pub fn pir_node(id: &str, label: &str) -> HomeNode {
    node(json!({
        "id": id,
        "category": "pir",
        "label": label,
        "show_endpoints": [
            {"id": 0, "ep_type": "signal", "name": "trigger", "value": false}
        ]
    }))
}

pub fn node(value: Value) -> HomeNode {
    serde_json::from_value(value).unwrap()
}

/// A router for [`MAC`] backed by `api`
pub fn router_with(api: Arc<MockHomeApi>) -> Arc<FreeboxRouter> {
    Arc::new(FreeboxRouter::new(
        FreeboxConfig::new(MAC),
        api,
        Arc::new(Dispatcher::new()),
    ))
}
