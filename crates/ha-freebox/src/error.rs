//! Error types for the Freebox integration

use ha_entity::EntityError;
use std::path::PathBuf;
use thiserror::Error;

use crate::home::NodeId;

/// Result type for Freebox operations
pub type FreeboxResult<T> = Result<T, FreeboxError>;

/// Errors that can occur while talking to the Freebox or loading its config
#[derive(Debug, Error)]
pub enum FreeboxError {
    /// The gateway rejected or failed a request
    #[error("Freebox API error: {0}")]
    Api(String),

    /// The gateway answered with data that could not be decoded
    #[error("invalid Freebox response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// The node is not (or no longer) known to the router
    #[error("home node {0} is not known to the router")]
    NodeNotFound(NodeId),

    /// The node has no endpoint for the requested command
    #[error("home node {node_id} has no endpoint for this command")]
    MissingCommand { node_id: NodeId },

    /// Failed to read a config file
    #[error("failed to read file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },
}

impl From<FreeboxError> for EntityError {
    fn from(err: FreeboxError) -> Self {
        EntityError::integration(err)
    }
}
