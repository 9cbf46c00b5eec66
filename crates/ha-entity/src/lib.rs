//! Entity layer for Home Assistant integrations
//!
//! This crate provides the traits integrations implement for their entities
//! (`Entity`, `CoverEntity`), the callback type platforms hand to
//! integrations for registering new entities, and the `CoverPlatform` that
//! owns cover entities, refreshes them and routes cover service calls.

mod entity;
mod error;
mod platform;

pub use entity::{AddCoverEntitiesCallback, CoverEntity, Entity};
pub use error::{EntityError, EntityResult};
pub use platform::{CoverPlatform, CoverSnapshot};
