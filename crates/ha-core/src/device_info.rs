//! Device information attached to entities

use serde::{Deserialize, Serialize};

/// A device identifier (domain, id) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentifier(pub String, pub String);

impl DeviceIdentifier {
    pub fn new(domain: impl Into<String>, id: impl Into<String>) -> Self {
        Self(domain.into(), id.into())
    }

    pub fn domain(&self) -> &str {
        &self.0
    }

    pub fn id(&self) -> &str {
        &self.1
    }
}

/// Describes the physical device an entity belongs to
///
/// The host uses this to create or update the matching device registry entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Identifiers of the device within its integrations
    #[serde(default)]
    pub identifiers: Vec<DeviceIdentifier>,

    /// Device name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Device manufacturer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    /// Device model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Firmware version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,

    /// Device this one is reached through (e.g. a gateway)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via_device: Option<DeviceIdentifier>,
}
