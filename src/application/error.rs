//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, EntityKind};

/// Application errors wrap domain errors and add use-case context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("cannot {event} while {state}")]
    InvalidTransition { state: String, event: String },

    #[error("dialog creates {expected:?} entities, got {actual:?}")]
    KindMismatch {
        expected: EntityKind,
        actual: EntityKind,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    /// The underlying domain rule violation, if any.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ApplicationError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
