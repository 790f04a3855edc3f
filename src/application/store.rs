//! Session-scoped entity store
//!
//! Holds the flat collection of associated entities. Writers work on a private
//! draft and publish it as a new snapshot in one step, so readers never see a
//! half-applied change.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, instrument};

use crate::application::ApplicationResult;
use crate::domain::rules::{
    append_affiliation, owner_affiliation, validate_entity, validate_graph, without_affiliations,
};
use crate::domain::{Affiliation, AffiliationType, DomainError, Entity, EntityId, Percentage};

/// Immutable view of the store at one point in time.
pub type Snapshot = Arc<Vec<Arc<Entity>>>;

/// The single source of truth for associated entities in a session.
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: RwLock<Snapshot>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from a complete set of entities, validated as a whole
    /// so that input order does not matter.
    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> ApplicationResult<Self> {
        let entities: Vec<Arc<Entity>> = entities.into_iter().map(Arc::new).collect();
        validate_graph(&entities)?;
        debug!("from_entities: {} entities", entities.len());
        Ok(Self {
            entities: RwLock::new(Arc::new(entities)),
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.entities.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn get(&self, id: &EntityId) -> Option<Arc<Entity>> {
        self.snapshot().iter().find(|e| &e.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// End of session: hand back everything held and leave the store empty.
    pub fn dispose(&self) -> Vec<Arc<Entity>> {
        let mut guard = self.entities.write().unwrap_or_else(PoisonError::into_inner);
        let taken = std::mem::take(&mut *guard);
        Arc::try_unwrap(taken).unwrap_or_else(|shared| shared.as_ref().clone())
    }

    /// Apply several mutations as one atomic update.
    ///
    /// `f` works on a draft copy. If it fails, or the resulting collection is
    /// not a valid ownership graph, the draft is dropped and the store is left
    /// untouched.
    pub fn transact<T>(
        &self,
        f: impl FnOnce(&mut Draft) -> ApplicationResult<T>,
    ) -> ApplicationResult<T> {
        let mut guard = self.entities.write().unwrap_or_else(PoisonError::into_inner);
        let mut draft = Draft {
            entities: guard.as_ref().clone(),
        };
        let value = f(&mut draft)?;
        validate_graph(&draft.entities)?;
        *guard = Arc::new(draft.entities);
        Ok(value)
    }

    pub fn add_entity(&self, entity: Entity) -> ApplicationResult<EntityId> {
        self.transact(|draft| draft.add_entity(entity))
    }

    pub fn update_entity(&self, updated: Entity) -> ApplicationResult<()> {
        self.transact(|draft| draft.update_entity(updated))
    }

    pub fn remove_affiliation(&self, id: &EntityId, kind: AffiliationType) -> ApplicationResult<bool> {
        self.transact(|draft| draft.remove_affiliation(id, kind))
    }

    pub fn remove_indirect_link(&self, id: &EntityId, parent: &EntityId) -> ApplicationResult<bool> {
        self.transact(|draft| draft.remove_indirect_link(id, parent))
    }

    pub fn append_affiliation(&self, id: &EntityId, affiliation: Affiliation) -> ApplicationResult<()> {
        self.transact(|draft| draft.append_affiliation(id, affiliation))
    }

    pub fn set_shareholding(
        &self,
        id: &EntityId,
        parent: &EntityId,
        shareholding: Option<Percentage>,
    ) -> ApplicationResult<()> {
        self.transact(|draft| draft.set_shareholding(id, parent, shareholding))
    }
}

/// Working copy of the store inside [`EntityStore::transact`].
#[derive(Debug)]
pub struct Draft {
    entities: Vec<Arc<Entity>>,
}

impl Draft {
    pub fn entities(&self) -> &[Arc<Entity>] {
        &self.entities
    }

    pub fn get(&self, id: &EntityId) -> Option<&Arc<Entity>> {
        self.entities.iter().find(|e| &e.id == id)
    }

    fn require(&self, id: &EntityId) -> ApplicationResult<&Arc<Entity>> {
        self.get(id)
            .ok_or_else(|| DomainError::EntityNotFound(id.clone()).into())
    }

    /// Swap in a new record for one id; every other entry keeps its `Arc`.
    fn replace(&mut self, updated: Entity) -> ApplicationResult<()> {
        let slot = self
            .entities
            .iter_mut()
            .find(|e| e.id == updated.id)
            .ok_or_else(|| DomainError::EntityNotFound(updated.id.clone()))?;
        *slot = Arc::new(updated);
        Ok(())
    }

    #[instrument(level = "debug", skip(self, entity), fields(id = %entity.id))]
    pub fn add_entity(&mut self, entity: Entity) -> ApplicationResult<EntityId> {
        if self.get(&entity.id).is_some() {
            return Err(DomainError::DuplicateEntity(entity.id).into());
        }
        validate_entity(&self.entities, &entity)?;
        let id = entity.id.clone();
        self.entities.push(Arc::new(entity));
        Ok(id)
    }

    #[instrument(level = "debug", skip(self, updated), fields(id = %updated.id))]
    pub fn update_entity(&mut self, updated: Entity) -> ApplicationResult<()> {
        self.require(&updated.id)?;
        validate_entity(&self.entities, &updated)?;
        self.replace(updated)
    }

    /// Drop every affiliation of `kind`. `Ok(false)` when there was none.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_affiliation(&mut self, id: &EntityId, kind: AffiliationType) -> ApplicationResult<bool> {
        let entity = self.require(id)?;
        match without_affiliations(entity, |a| a.kind == kind) {
            Some(updated) => self.replace(updated).map(|_| true),
            None => Ok(false),
        }
    }

    /// Drop the indirect stake `id` holds in `parent`. `Ok(false)` when there was none.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_indirect_link(&mut self, id: &EntityId, parent: &EntityId) -> ApplicationResult<bool> {
        let entity = self.require(id)?;
        let removed = without_affiliations(entity, |a| {
            a.kind == AffiliationType::IndirectShareholder && a.parent_entity.as_ref() == Some(parent)
        });
        match removed {
            Some(updated) => self.replace(updated).map(|_| true),
            None => Ok(false),
        }
    }

    #[instrument(level = "debug", skip(self, affiliation), fields(kind = %affiliation.kind))]
    pub fn append_affiliation(&mut self, id: &EntityId, affiliation: Affiliation) -> ApplicationResult<()> {
        let updated = append_affiliation(self.require(id)?, affiliation)?;
        validate_entity(&self.entities, &updated)?;
        self.replace(updated)
    }

    /// Change the percentage of an existing holding of `parent`'s equity.
    /// The root sentinel addresses the direct `SHAREHOLDER` affiliation.
    #[instrument(level = "debug", skip(self))]
    pub fn set_shareholding(
        &mut self,
        id: &EntityId,
        parent: &EntityId,
        shareholding: Option<Percentage>,
    ) -> ApplicationResult<()> {
        let mut updated = self.require(id)?.as_ref().clone();
        let target = owner_affiliation(parent, None);
        let slot = updated
            .affiliation
            .iter_mut()
            .find(|a| a.same_slot(&target))
            .ok_or_else(|| DomainError::NoSuchHolding {
                entity: id.clone(),
                kind: target.kind,
                parent: parent.clone(),
            })?;
        slot.shareholding = shareholding;
        self.replace(updated)
    }
}
