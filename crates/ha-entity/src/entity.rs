//! Entity traits
//!
//! Integrations implement these traits; the platform calls them. Calls to a
//! single entity are never overlapped, which is why the mutating methods
//! take `&mut self`.

use async_trait::async_trait;
use ha_core::attributes::{ATTR_DEVICE_CLASS, ATTR_FRIENDLY_NAME, ATTR_SUPPORTED_FEATURES};
use ha_core::{CoverDeviceClass, CoverEntityFeature, CoverState, DeviceInfo};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::EntityResult;

/// Callback used by integrations to hand new cover entities to the platform
///
/// The flag asks the platform to run `async_update` on each entity before
/// writing its first state.
pub type AddCoverEntitiesCallback = Arc<dyn Fn(Vec<Box<dyn CoverEntity>>, bool) + Send + Sync>;

/// Base trait that all entities implement
#[async_trait]
pub trait Entity: Send + Sync {
    /// Stable identifier of the entity, unique within its platform
    fn unique_id(&self) -> Option<&str>;

    /// Display name
    fn name(&self) -> Option<&str>;

    /// Device the entity belongs to
    fn device_info(&self) -> Option<DeviceInfo> {
        None
    }

    /// Whether the platform should refresh this entity on every poll
    fn should_poll(&self) -> bool {
        true
    }

    /// Dispatcher signal after which the platform refreshes this entity
    fn update_signal(&self) -> Option<&str> {
        None
    }

    /// Refresh the cached state from the device
    async fn async_update(&mut self) -> EntityResult<()> {
        Ok(())
    }
}

/// Trait implemented by cover entities (shutters, blinds, garage doors...)
#[async_trait]
pub trait CoverEntity: Entity {
    fn device_class(&self) -> Option<CoverDeviceClass> {
        None
    }

    fn supported_features(&self) -> CoverEntityFeature;

    /// `Some(true)` when closed, `Some(false)` when open, `None` when unknown
    fn is_closed(&self) -> Option<bool>;

    fn is_opening(&self) -> bool {
        false
    }

    fn is_closing(&self) -> bool {
        false
    }

    async fn async_open_cover(&mut self) -> EntityResult<()>;

    async fn async_close_cover(&mut self) -> EntityResult<()>;

    async fn async_stop_cover(&mut self) -> EntityResult<()>;

    /// Current state derived from the travel flags and `is_closed`
    ///
    /// Travel wins over the closed flag; `None` means unknown.
    fn state(&self) -> Option<CoverState> {
        if self.is_opening() {
            return Some(CoverState::Opening);
        }
        if self.is_closing() {
            return Some(CoverState::Closing);
        }
        self.is_closed().map(|closed| {
            if closed {
                CoverState::Closed
            } else {
                CoverState::Open
            }
        })
    }

    /// Attributes written alongside the state
    fn state_attributes(&self) -> HashMap<String, Value> {
        let mut attributes = HashMap::new();
        attributes.insert(
            ATTR_SUPPORTED_FEATURES.to_string(),
            json!(self.supported_features().bits()),
        );
        if let Some(device_class) = self.device_class() {
            attributes.insert(ATTR_DEVICE_CLASS.to_string(), json!(device_class.as_str()));
        }
        if let Some(name) = self.name() {
            attributes.insert(ATTR_FRIENDLY_NAME.to_string(), json!(name));
        }
        attributes
    }
}
