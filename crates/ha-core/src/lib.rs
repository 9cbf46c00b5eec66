//! Core types for Home Assistant covers
//!
//! This crate provides the host vocabulary shared by the entity layer and
//! integrations: cover states, device classes, supported feature flags,
//! cover services and device information.

mod cover;
mod device_info;

pub use cover::{CoverDeviceClass, CoverEntityFeature, CoverService, CoverState, UnknownService};
pub use device_info::{DeviceIdentifier, DeviceInfo};

/// Standard state values written by cover entities
pub mod states {
    pub const STATE_OPEN: &str = "open";
    pub const STATE_OPENING: &str = "opening";
    pub const STATE_CLOSED: &str = "closed";
    pub const STATE_CLOSING: &str = "closing";

    /// State used when the entity cannot tell which state it is in
    pub const STATE_UNKNOWN: &str = "unknown";

    /// State used when the last update of the entity failed
    pub const STATE_UNAVAILABLE: &str = "unavailable";
}

/// Attribute keys written alongside entity states
pub mod attributes {
    pub const ATTR_DEVICE_CLASS: &str = "device_class";
    pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";
    pub const ATTR_SUPPORTED_FEATURES: &str = "supported_features";
}
