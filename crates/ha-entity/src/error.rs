//! Error types for entity operations

use ha_core::CoverService;
use thiserror::Error;

/// Result type for entity operations
pub type EntityResult<T> = Result<T, EntityError>;

/// Errors that can occur while updating or controlling an entity
#[derive(Debug, Error)]
pub enum EntityError {
    /// The entity does not advertise the feature the service needs
    #[error("entity {entity} does not support {service}")]
    NotSupported {
        entity: String,
        service: CoverService,
    },

    /// No entity with this unique ID is registered
    #[error("entity not found: {0}")]
    NotFound(String),

    /// Failure reported by the integration backing the entity
    #[error(transparent)]
    Integration(Box<dyn std::error::Error + Send + Sync>),
}

impl EntityError {
    /// Wrap an integration error, keeping it reachable through `source()`
    pub fn integration(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        EntityError::Integration(Box::new(err))
    }
}
