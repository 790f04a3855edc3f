//! Tree builder for deriving the shareholder structure from flat affiliations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use generational_arena::Index;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::domain::arena::{Holder, NodeData, OwnershipNode, OwnershipTree};
use crate::domain::entities::{AffiliationType, Entity, EntityId};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::percentage::Percentage;
use crate::domain::rules::{
    direct_shareholding, indirect_shareholdings, root_holding, total_direct_shareholding,
};

/// Display name used for the root when none is configured.
pub const DEFAULT_ROOT_NAME: &str = "Starbugz";

/// Aggregate direct ownership of the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipSummary {
    pub total: Decimal,
    /// Warning only: direct holdings add up to more than 100%
    pub over_allocated: bool,
}

type Holding = (Arc<Entity>, Option<Percentage>);

/// Constructs the ownership tree from a snapshot of entities.
pub struct OwnershipTreeBuilder {
    root_name: String,
    relationship_cache: HashMap<EntityId, Vec<Holding>>,
    path: HashSet<EntityId>,
}

impl Default for OwnershipTreeBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_NAME)
    }
}

impl OwnershipTreeBuilder {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            relationship_cache: HashMap::new(),
            path: HashSet::new(),
        }
    }

    /// Build the tree for `entities`, failing on an ownership cycle.
    ///
    /// An entity owning stakes in several parents is expanded once per path,
    /// together with everything below it. A chain of `n` diamonds therefore
    /// yields `2^n` nodes. Shared subtrees are not memoised.
    #[instrument(level = "debug", skip_all, fields(entities = entities.len()))]
    pub fn build(&mut self, entities: &[Arc<Entity>]) -> DomainResult<OwnershipTree> {
        // Reset state for a fresh build
        self.relationship_cache.clear();
        self.path.clear();

        self.scan(entities);

        let mut tree = OwnershipTree::new();
        let root_idx = tree.insert_node(
            NodeData {
                holder: Holder::Root {
                    name: self.root_name.clone(),
                },
                shareholding: None,
                effective_shareholding: Some(Decimal::ONE_HUNDRED),
                depth: 0,
            },
            None,
        );

        // Direct shareholders first, then entities parented at the root sentinel.
        let mut top_level: Vec<Holding> = entities
            .iter()
            .filter_map(|e| {
                e.has_affiliation(AffiliationType::Shareholder)
                    .then(|| (Arc::clone(e), direct_shareholding(e)))
            })
            .collect();
        for entity in entities {
            if top_level.iter().any(|(e, _)| e.id == entity.id) {
                continue;
            }
            if let Some(shareholding) = root_holding(entity) {
                top_level.push((Arc::clone(entity), shareholding));
            }
        }
        debug!("build: {} top-level holders", top_level.len());

        for (entity, shareholding) in top_level {
            self.attach(&mut tree, root_idx, entity, shareholding, 1, Some(Decimal::ONE_HUNDRED))?;
        }
        Ok(tree)
    }

    fn scan(&mut self, entities: &[Arc<Entity>]) {
        for entity in entities {
            for holding in indirect_shareholdings(entity) {
                if holding.parent_entity.is_root() {
                    continue;
                }
                self.relationship_cache
                    .entry(holding.parent_entity.clone())
                    .or_default()
                    .push((Arc::clone(entity), holding.shareholding));
            }
        }
    }

    fn attach(
        &mut self,
        tree: &mut OwnershipTree,
        parent_idx: Index,
        entity: Arc<Entity>,
        shareholding: Option<Percentage>,
        depth: usize,
        parent_effective: Option<Decimal>,
    ) -> DomainResult<()> {
        // Cycle detection along the current path only; diamonds are fine.
        if !self.path.insert(entity.id.clone()) {
            let parent = tree
                .get_node(parent_idx)
                .map(|n| n.data.holder.id())
                .unwrap_or_else(EntityId::root);
            return Err(DomainError::CyclicOwnership {
                entity: entity.id.clone(),
                parent,
            });
        }

        let effective = match (parent_effective, shareholding) {
            (Some(parent), Some(pct)) => Some(pct.of(parent)),
            _ => None,
        };
        let id = entity.id.clone();
        let node_idx = tree.insert_node(
            NodeData {
                holder: Holder::Entity(entity),
                shareholding,
                effective_shareholding: effective,
                depth,
            },
            Some(parent_idx),
        );

        let children = self.relationship_cache.get(&id).cloned().unwrap_or_default();
        for (child, child_shareholding) in children {
            self.attach(tree, node_idx, child, child_shareholding, depth + 1, effective)?;
        }

        self.path.remove(&id);
        Ok(())
    }
}

/// Pre-order, depth-annotated list of every holder below the root.
pub fn build_tree(entities: &[Arc<Entity>]) -> DomainResult<Vec<OwnershipNode>> {
    OwnershipTreeBuilder::default()
        .build(entities)
        .map(|tree| tree.flatten())
}

pub fn aggregate_ownership(entities: &[Arc<Entity>]) -> OwnershipSummary {
    let total = total_direct_shareholding(entities);
    OwnershipSummary {
        total,
        over_allocated: total > Decimal::ONE_HUNDRED,
    }
}
