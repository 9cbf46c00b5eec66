//! Freebox integration for Home Assistant
//!
//! Exposes the shutters paired with a Freebox Home gateway as cover
//! entities. The [`FreeboxRouter`] keeps the registry of home nodes and
//! signals new ones through the dispatcher; the cover platform set up by
//! [`setup_entry`] turns every shutter node into a [`FreeboxCover`].
//!
//! The gateway client itself is not part of this crate: it is plugged in
//! through the [`HomeApi`] trait.

pub mod api;
pub mod config;
pub mod cover;
pub mod entity;
pub mod error;
pub mod home;
pub mod router;

/// Integration domain
pub const DOMAIN: &str = "freebox";

pub use api::{EndpointReading, HomeApi};
pub use config::FreeboxConfig;
pub use cover::{add_entities, convert_state, setup_entry, FreeboxCover};
pub use entity::FreeboxHomeEntity;
pub use error::{FreeboxError, FreeboxResult};
pub use home::{
    parse_home_nodes, CommandId, Endpoint, EndpointKind, FreeboxHomeCategory, HomeNode, NodeId,
    NodeType,
};
pub use router::FreeboxRouter;
