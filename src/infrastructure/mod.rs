//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements I/O boundary traits, reads seed files and wires up
//! services.

pub mod di;
pub mod error;
pub mod seed;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use seed::{SeedDocument, SeedFormat, SeedLoader};
