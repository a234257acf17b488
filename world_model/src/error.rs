//! Error types for world graph construction.

use thiserror::Error;

use crate::entities::EntityId;

/// Errors raised while building or editing the world graph directly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    /// An operation referenced an entity the graph does not hold.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// An entity with this ID was already added.
    #[error("Duplicate entity: {0}")]
    DuplicateEntity(EntityId),

    /// A relationship endpoint is missing from the graph.
    #[error("Relationship '{kind}' references missing endpoint {missing}")]
    MissingEndpoint {
        /// Relationship kind being added.
        kind: String,
        /// The endpoint that could not be found.
        missing: EntityId,
    },
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, WorldError>;
