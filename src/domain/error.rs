//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::{AffiliationType, EntityId};

/// Domain errors represent ownership-model violations.
/// These are independent of storage and presentation concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("entity already exists: {0}")]
    DuplicateEntity(EntityId),

    #[error("entity id is reserved for the root organisation: {0}")]
    ReservedId(EntityId),

    #[error("{entity} already holds {kind}")]
    DuplicateAffiliation {
        entity: EntityId,
        kind: AffiliationType,
    },

    #[error("{entity} references unknown parent entity {parent}")]
    DanglingParentReference { entity: EntityId, parent: EntityId },

    #[error("{entity} has an indirect shareholding without a parent entity")]
    MissingParent { entity: EntityId },

    #[error("cycle detected in ownership: {entity} would own itself through {parent}")]
    CyclicOwnership { entity: EntityId, parent: EntityId },

    #[error("invalid percentage '{input}': {reason}")]
    InvalidPercentage { input: String, reason: String },

    #[error("entity is not an individual: {0}")]
    NotIndividual(EntityId),

    #[error("{entity} holds no {kind} stake in {parent}")]
    NoSuchHolding {
        entity: EntityId,
        kind: AffiliationType,
        parent: EntityId,
    },
}

impl DomainError {
    /// True when the operation was refused because its effect is already present.
    pub fn is_already_satisfied(&self) -> bool {
        matches!(self, DomainError::DuplicateAffiliation { .. })
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
