//! Application layer: session store, services and the add/link flow
//!
//! This layer orchestrates domain logic; it performs no I/O of its own.

pub mod error;
pub mod flow;
pub mod services;
pub mod store;

pub use error::{ApplicationError, ApplicationResult};
pub use flow::{FlowEvent, FlowOutcome, FlowState, OwnershipFlow};
pub use services::{OwnershipService, OwnershipStructure, SectionSpec, SectionView, SECTIONS};
pub use store::{Draft, EntityStore, Snapshot};
