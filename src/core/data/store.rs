//! Compiler bookkeeping: where entities live while a routine is being packed.

use anyhow::{Result, bail};

use super::entity::{Entity, EntityId};

/// Read access to the entities a compiler instance produced.
///
/// The packer never owns entities; it borrows them from a source for the
/// duration of one packing call.
pub trait EntitySource {
    fn entity(&self, id: EntityId) -> Option<&Entity>;
}

/// In-memory arena of entities.
///
/// Ids can be reserved before their entity exists, so a compiler can hand out
/// the id of a routine that is still being compiled (recursive `$ref`).
#[derive(Debug, Default)]
pub struct RoutineStore {
    entities: Vec<Option<Entity>>,
}

impl RoutineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entity and return its fresh id.
    pub fn insert(&mut self, entity: impl Into<Entity>) -> EntityId {
        let id = self.next_id();
        self.entities.push(Some(entity.into()));
        id
    }

    /// Hand out an id whose entity is supplied later with [`define`](Self::define).
    pub fn reserve(&mut self) -> EntityId {
        let id = self.next_id();
        self.entities.push(None);
        id
    }

    /// Fill a reserved id.
    pub fn define(&mut self, id: EntityId, entity: impl Into<Entity>) -> Result<()> {
        match self.entities.get_mut(id.0 as usize) {
            Some(slot @ None) => {
                *slot = Some(entity.into());
                Ok(())
            }
            Some(Some(_)) => bail!("entity {} is already defined", id),
            None => bail!("entity {} was never reserved", id),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn next_id(&self) -> EntityId {
        EntityId(self.entities.len() as u32)
    }
}

impl EntitySource for RoutineStore {
    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0 as usize).and_then(Option::as_ref)
    }
}
