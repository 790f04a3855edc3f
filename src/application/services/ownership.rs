//! Ownership service
//!
//! Use-cases of the associated-entities page: role sections, the ownership
//! structure, and the edits that add people to roles or link owners.

use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::store::EntityStore;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::rules::{
    append_affiliation, available_individuals, entities_with_affiliation, indirect_shareholdings,
    owner_affiliation, validate_parent,
};
use crate::domain::{
    aggregate_ownership, Affiliation, AffiliationType, DomainError, Entity, EntityDetails,
    EntityId, EntityKind, OwnershipNode, OwnershipSummary, OwnershipTree, OwnershipTreeBuilder,
    Percentage, UserAccess,
};

/// Static description of one role section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpec {
    pub title: &'static str,
    pub kind: AffiliationType,
    /// Entity kinds that may be created directly in this section
    pub creatable: &'static [EntityKind],
}

/// The page's role sections, in display order.
pub const SECTIONS: [SectionSpec; 4] = [
    SectionSpec {
        title: "Shareholders",
        kind: AffiliationType::Shareholder,
        creatable: &[EntityKind::Individual, EntityKind::Corporate],
    },
    SectionSpec {
        title: "Directors",
        kind: AffiliationType::Director,
        creatable: &[EntityKind::Individual],
    },
    SectionSpec {
        title: "Authorised Signatories",
        kind: AffiliationType::AuthorisedSignatory,
        creatable: &[EntityKind::Individual],
    },
    SectionSpec {
        title: "Users",
        kind: AffiliationType::User,
        creatable: &[EntityKind::Individual],
    },
];

/// One role section as rendered from a snapshot.
#[derive(Debug, Clone)]
pub struct SectionView {
    pub spec: SectionSpec,
    pub members: Vec<Arc<Entity>>,
    /// Individuals that could be added to this role
    pub available: Vec<Arc<Entity>>,
    /// Only present for the Shareholders section
    pub summary: Option<OwnershipSummary>,
}

/// Derived shareholder structure of the root organisation.
#[derive(Debug, Clone)]
pub struct OwnershipStructure {
    pub root_name: String,
    pub nodes: Vec<OwnershipNode>,
    pub summary: OwnershipSummary,
}

/// Service over a shared [`EntityStore`].
pub struct OwnershipService {
    store: Arc<EntityStore>,
    root_name: String,
}

impl OwnershipService {
    pub fn new(store: Arc<EntityStore>, root_name: impl Into<String>) -> Self {
        Self {
            store,
            root_name: root_name.into(),
        }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn sections(&self) -> Vec<SectionView> {
        let snapshot = self.store.snapshot();
        SECTIONS
            .iter()
            .map(|spec| SectionView {
                spec: *spec,
                members: entities_with_affiliation(&snapshot, spec.kind)
                    .into_iter()
                    .cloned()
                    .collect(),
                available: available_individuals(&snapshot, spec.kind)
                    .into_iter()
                    .cloned()
                    .collect(),
                summary: (spec.kind == AffiliationType::Shareholder)
                    .then(|| aggregate_ownership(&snapshot)),
            })
            .collect()
    }

    pub fn tree(&self) -> ApplicationResult<OwnershipTree> {
        let snapshot = self.store.snapshot();
        Ok(OwnershipTreeBuilder::new(self.root_name.clone()).build(&snapshot)?)
    }

    pub fn structure(&self) -> ApplicationResult<OwnershipStructure> {
        let snapshot = self.store.snapshot();
        let tree = OwnershipTreeBuilder::new(self.root_name.clone()).build(&snapshot)?;
        Ok(OwnershipStructure {
            root_name: self.root_name.clone(),
            nodes: tree.flatten(),
            summary: aggregate_ownership(&snapshot),
        })
    }

    pub fn summary(&self) -> OwnershipSummary {
        aggregate_ownership(&self.store.snapshot())
    }

    /// Existing entities that may be linked as owners of `parent`.
    ///
    /// Excludes the parent itself, current owners of the parent, and anything
    /// that would close an ownership cycle.
    pub fn link_candidates(&self, parent: &EntityId) -> Vec<Arc<Entity>> {
        let snapshot = self.store.snapshot();
        snapshot
            .iter()
            .filter(|e| self.check_link_in(&snapshot, parent, &e.id).is_ok())
            .cloned()
            .sorted_by_key(|e| e.display_name().to_lowercase())
            .collect()
    }

    /// Dry run of [`Self::link_existing`] without a percentage.
    pub fn check_link(&self, parent: &EntityId, owner: &EntityId) -> ApplicationResult<()> {
        let snapshot = self.store.snapshot();
        self.check_link_in(&snapshot, parent, owner)
    }

    fn check_link_in(
        &self,
        all: &[Arc<Entity>],
        parent: &EntityId,
        owner: &EntityId,
    ) -> ApplicationResult<()> {
        let entity = all
            .iter()
            .find(|e| &e.id == owner)
            .ok_or_else(|| DomainError::EntityNotFound(owner.clone()))?;
        if !parent.is_root() && !all.iter().any(|e| &e.id == parent) {
            return Err(DomainError::EntityNotFound(parent.clone()).into());
        }
        append_affiliation(entity, owner_affiliation(parent, None))?;
        if parent.is_root() {
            // An INDIRECT(root) seed entry already places the owner under the root.
            if indirect_shareholdings(entity)
                .iter()
                .any(|h| h.parent_entity.is_root())
            {
                return Err(DomainError::DuplicateAffiliation {
                    entity: owner.clone(),
                    kind: AffiliationType::Shareholder,
                }
                .into());
            }
            return Ok(());
        }
        Ok(validate_parent(all, owner, parent)?)
    }

    /// Add an existing entity to a non-shareholding role.
    #[instrument(level = "debug", skip(self))]
    pub fn add_to_role(&self, id: &EntityId, kind: AffiliationType) -> ApplicationResult<()> {
        match kind {
            AffiliationType::IndirectShareholder => Err(DomainError::MissingParent {
                entity: id.clone(),
            }
            .into()),
            AffiliationType::User => self.make_user(id, UserAccess::default()),
            _ => self.store.append_affiliation(id, Affiliation::role(kind)),
        }
    }

    /// Make an existing entity a direct shareholder. An empty amount leaves
    /// the percentage absent.
    #[instrument(level = "debug", skip(self))]
    pub fn make_shareholder(&self, id: &EntityId, amount: &str) -> ApplicationResult<()> {
        let shareholding = Percentage::parse_optional(amount)?;
        self.store
            .append_affiliation(id, Affiliation::shareholder(shareholding))
    }

    /// Grant workspace access: `USER` affiliation and access fields together.
    #[instrument(level = "debug", skip(self, access))]
    pub fn make_user(&self, id: &EntityId, access: UserAccess) -> ApplicationResult<()> {
        self.store.transact(|draft| {
            let entity = draft
                .get(id)
                .ok_or_else(|| DomainError::EntityNotFound(id.clone()))?;
            let mut updated = append_affiliation(entity, Affiliation::role(AffiliationType::User))?;
            match &mut updated.details {
                EntityDetails::Individual(individual) => individual.user_access = Some(access),
                EntityDetails::Corporate(_) => {
                    return Err(DomainError::NotIndividual(id.clone()).into())
                }
            }
            draft.update_entity(updated)
        })
    }

    /// Take an entity out of a role. `Ok(false)` when it did not hold it.
    pub fn remove_from_role(&self, id: &EntityId, kind: AffiliationType) -> ApplicationResult<bool> {
        self.store.remove_affiliation(id, kind)
    }

    /// Link an existing entity as an owner of `parent`.
    #[instrument(level = "debug", skip(self))]
    pub fn link_existing(
        &self,
        parent: &EntityId,
        owner: &EntityId,
        shareholding: Option<Percentage>,
    ) -> ApplicationResult<()> {
        self.store.transact(|draft| {
            self.check_link_in(draft.entities(), parent, owner)?;
            draft.append_affiliation(owner, owner_affiliation(parent, shareholding))
        })?;
        debug!("link_existing: {} now owns part of {}", owner, parent);
        Ok(())
    }

    /// Create a new entity as an owner of `parent`.
    #[instrument(level = "debug", skip(self, entity), fields(id = %entity.id))]
    pub fn add_owner(
        &self,
        parent: &EntityId,
        entity: Entity,
        shareholding: Option<Percentage>,
    ) -> ApplicationResult<EntityId> {
        let entity = append_affiliation(&entity, owner_affiliation(parent, shareholding))?;
        self.store.transact(|draft| draft.add_entity(entity))
    }

    /// Create an entity directly in a role section.
    pub fn add_to_section(
        &self,
        section: &SectionSpec,
        entity: Entity,
        shareholding: Option<Percentage>,
    ) -> ApplicationResult<EntityId> {
        let kind = EntityKind::of(&entity);
        if !section.creatable.contains(&kind) {
            return Err(ApplicationError::KindMismatch {
                expected: section.creatable[0],
                actual: kind,
            });
        }
        let affiliation = match section.kind {
            AffiliationType::Shareholder => Affiliation::shareholder(shareholding),
            other => Affiliation::role(other),
        };
        let entity = append_affiliation(&entity, affiliation)?;
        self.store.add_entity(entity)
    }
}
