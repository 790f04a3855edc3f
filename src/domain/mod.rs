//! Domain layer: entities, affiliation rules and the ownership tree
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod percentage;
pub mod rules;

pub use arena::{Holder, NodeData, OwnershipNode, OwnershipTree, TreeNode};
pub use builder::{
    aggregate_ownership, build_tree, OwnershipSummary, OwnershipTreeBuilder, DEFAULT_ROOT_NAME,
};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use percentage::Percentage;
