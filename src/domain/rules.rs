//! Affiliation rules: pure predicates and extraction over affiliation lists.
//!
//! Nothing here mutates shared state or performs I/O. Write-time integrity
//! checks (`validate_*`) are also pure; callers decide when to apply them.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::entities::{Affiliation, AffiliationType, Entity, EntityDetails, EntityId};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::percentage::Percentage;

/// One `INDIRECT_SHAREHOLDER` entry of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectHolding<'a> {
    pub parent_entity: &'a EntityId,
    pub shareholding: Option<Percentage>,
}

pub fn has_affiliation(entity: &Entity, kind: AffiliationType) -> bool {
    entity.has_affiliation(kind)
}

pub fn is_individual(entity: &Entity) -> bool {
    entity.is_individual()
}

pub fn is_corporate(entity: &Entity) -> bool {
    entity.is_corporate()
}

/// Percentage of the root held through the entity's `SHAREHOLDER` affiliation.
pub fn direct_shareholding(entity: &Entity) -> Option<Percentage> {
    entity
        .affiliation
        .iter()
        .find(|a| a.kind == AffiliationType::Shareholder)
        .and_then(|a| a.shareholding)
}

pub fn indirect_shareholdings(entity: &Entity) -> Vec<IndirectHolding<'_>> {
    entity
        .affiliation
        .iter()
        .filter(|a| a.kind == AffiliationType::IndirectShareholder)
        .filter_map(|a| {
            a.parent_entity.as_ref().map(|parent| IndirectHolding {
                parent_entity: parent,
                shareholding: a.shareholding,
            })
        })
        .collect()
}

/// Where an entity sits directly under the root, and with which percentage.
///
/// `SHAREHOLDER` takes precedence over an `INDIRECT_SHAREHOLDER` parented at
/// the root sentinel; both place the entity at depth 1.
pub fn root_holding(entity: &Entity) -> Option<Option<Percentage>> {
    if entity.has_affiliation(AffiliationType::Shareholder) {
        return Some(direct_shareholding(entity));
    }
    indirect_shareholdings(entity)
        .into_iter()
        .find(|h| h.parent_entity.is_root())
        .map(|h| h.shareholding)
}

pub fn entities_with_affiliation(
    all: &[Arc<Entity>],
    kind: AffiliationType,
) -> Vec<&Arc<Entity>> {
    all.iter().filter(|e| e.has_affiliation(kind)).collect()
}

/// Individuals that do not yet hold `kind`: candidates for "add existing person".
pub fn available_individuals(all: &[Arc<Entity>], kind: AffiliationType) -> Vec<&Arc<Entity>> {
    all.iter()
        .filter(|e| e.is_individual() && !e.has_affiliation(kind))
        .collect()
}

/// Sum of direct shareholdings; a missing percentage counts as zero.
pub fn total_direct_shareholding(all: &[Arc<Entity>]) -> Decimal {
    entities_with_affiliation(all, AffiliationType::Shareholder)
        .into_iter()
        .map(|e| direct_shareholding(e).map(|p| p.value()).unwrap_or_default())
        .sum()
}

/// The affiliation that makes an entity an owner of `parent`: a direct
/// `SHAREHOLDER` for the root, an `INDIRECT_SHAREHOLDER` for anyone else.
pub fn owner_affiliation(parent: &EntityId, shareholding: Option<Percentage>) -> Affiliation {
    if parent.is_root() {
        Affiliation::shareholder(shareholding)
    } else {
        Affiliation::indirect(parent.clone(), shareholding)
    }
}

/// Return a copy of `entity` with `affiliation` appended.
///
/// Refuses with [`DomainError::DuplicateAffiliation`] when the entity already
/// holds that slot, so applying the same role twice leaves the entity as it was.
pub fn append_affiliation(entity: &Entity, affiliation: Affiliation) -> DomainResult<Entity> {
    if entity.affiliation.iter().any(|a| a.same_slot(&affiliation)) {
        return Err(DomainError::DuplicateAffiliation {
            entity: entity.id.clone(),
            kind: affiliation.kind,
        });
    }
    let mut updated = entity.clone();
    updated.affiliation.push(affiliation);
    Ok(updated)
}

/// Return a copy of `entity` without any affiliation matching `keep_out`,
/// or `None` when nothing matched.
pub fn without_affiliations(
    entity: &Entity,
    keep_out: impl Fn(&Affiliation) -> bool,
) -> Option<Entity> {
    let before = entity.affiliation.len();
    let mut updated = entity.clone();
    updated.affiliation.retain(|a| !keep_out(a));
    if updated.affiliation.len() == before {
        return None;
    }
    if !updated.has_affiliation(AffiliationType::User) {
        if let EntityDetails::Individual(individual) = &mut updated.details {
            individual.user_access = None;
        }
    }
    Some(updated)
}

fn index(all: &[Arc<Entity>]) -> HashMap<&EntityId, &Arc<Entity>> {
    all.iter().map(|e| (&e.id, e)).collect()
}

/// Check that `entity_id` may hold an indirect stake in `parent`.
///
/// The parent must be the root sentinel or an existing entity, and the new
/// link must not make `entity_id` its own ancestor.
pub fn validate_parent(
    all: &[Arc<Entity>],
    entity_id: &EntityId,
    parent: &EntityId,
) -> DomainResult<()> {
    if parent.is_root() {
        return Ok(());
    }
    if parent == entity_id {
        return Err(DomainError::CyclicOwnership {
            entity: entity_id.clone(),
            parent: parent.clone(),
        });
    }
    let by_id = index(all);
    if !by_id.contains_key(parent) {
        return Err(DomainError::DanglingParentReference {
            entity: entity_id.clone(),
            parent: parent.clone(),
        });
    }

    // Follow the stakes the parent holds, and theirs, towards the root.
    let mut seen: HashSet<&EntityId> = HashSet::new();
    let mut queue: VecDeque<&EntityId> = VecDeque::from([parent]);
    while let Some(current) = queue.pop_front() {
        if current == entity_id {
            return Err(DomainError::CyclicOwnership {
                entity: entity_id.clone(),
                parent: parent.clone(),
            });
        }
        if !seen.insert(current) {
            continue;
        }
        if let Some(node) = by_id.get(current) {
            for holding in indirect_shareholdings(node) {
                if !holding.parent_entity.is_root() {
                    queue.push_back(holding.parent_entity);
                }
            }
        }
    }
    Ok(())
}

/// Integrity of one entity against the rest of the collection.
pub fn validate_entity(all: &[Arc<Entity>], entity: &Entity) -> DomainResult<()> {
    if entity.id.is_root() {
        return Err(DomainError::ReservedId(entity.id.clone()));
    }
    for (i, affiliation) in entity.affiliation.iter().enumerate() {
        if entity.affiliation[..i].iter().any(|a| a.same_slot(affiliation)) {
            return Err(DomainError::DuplicateAffiliation {
                entity: entity.id.clone(),
                kind: affiliation.kind,
            });
        }
        if affiliation.kind == AffiliationType::IndirectShareholder {
            let parent = affiliation
                .parent_entity
                .as_ref()
                .ok_or_else(|| DomainError::MissingParent {
                    entity: entity.id.clone(),
                })?;
            validate_parent(all, &entity.id, parent)?;
        }
    }
    Ok(())
}

/// Integrity of a whole snapshot: unique ids and every entity valid.
pub fn validate_graph(all: &[Arc<Entity>]) -> DomainResult<()> {
    let mut ids = HashSet::new();
    for entity in all {
        if !ids.insert(&entity.id) {
            return Err(DomainError::DuplicateEntity(entity.id.clone()));
        }
    }
    all.iter().try_for_each(|e| validate_entity(all, e))
}
