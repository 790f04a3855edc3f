//! Application services
//!
//! Concrete service implementations that orchestrate domain logic over the
//! session store. Services are concrete structs, not traits.

mod ownership;

pub use ownership::{OwnershipService, OwnershipStructure, SectionSpec, SectionView, SECTIONS};
