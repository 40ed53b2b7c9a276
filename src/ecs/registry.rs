//! Entity registry.
//!
//! The registry is the arena that owns every [`Entity`]. It keeps three kinds
//! of structural bookkeeping next to the resolved entity map:
//!
//! - `staged`: entities created since the last resolution pass. They are
//!   visible to lookups, tag queries and counts, but no system has matched
//!   them yet.
//! - `pending_remove`: ids whose destruction was requested. They stay fully
//!   visible until the next resolution pass erases them.
//! - `deferred`: component attach/detach commands issued while systems were
//!   iterating (or from a script). The world applies them between systems.
//!
//! The registry is shared behind a `parking_lot::RwLock` by
//! [`World`](super::world::World); writers hold the exclusive lock only for
//! the duration of one structural change.

use std::collections::BTreeMap;

use crate::ecs::component::{Component, ComponentKind};
use crate::ecs::entity::{Entity, EntityId};

/// Structural change recorded for later application by the world.
#[derive(Clone, Debug, PartialEq)]
pub enum ComponentCommand {
    Add { entity: EntityId, component: Component },
    Remove { entity: EntityId, kind: ComponentKind },
}

#[derive(Debug)]
pub struct Registry {
    entities: BTreeMap<EntityId, Entity>,
    staged: BTreeMap<EntityId, Entity>,
    pending_remove: Vec<EntityId>,
    deferred: Vec<ComponentCommand>,
    next_id: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            staged: BTreeMap::new(),
            pending_remove: Vec::new(),
            deferred: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a fresh id and stage an empty, active entity under it.
    pub fn create_entity(&mut self) -> EntityId {
        let id = EntityId::from_raw(self.next_id);
        self.next_id += 1;
        self.staged.insert(id, Entity::new(id));
        id
    }

    /// Queue an entity for removal at the next resolution pass.
    ///
    /// Returns `false` when the id is unknown or already queued.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        if !self.contains(id) || self.pending_remove.contains(&id) {
            return false;
        }
        self.pending_remove.push(id);
        true
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id) || self.staged.contains_key(&id)
    }

    pub fn is_pending_removal(&self, id: EntityId) -> bool {
        self.pending_remove.contains(&id)
    }

    /// `true` while the entity waits for the next resolution pass to be matched.
    pub fn is_staged(&self, id: EntityId) -> bool {
        self.staged.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id).or_else(|| self.staged.get(&id))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        match self.entities.get_mut(&id) {
            Some(entity) => Some(entity),
            None => self.staged.get_mut(&id),
        }
    }

    /// Active entities carrying `tag`, ascending by id.
    pub fn find_by_tag(&self, tag: &str) -> Vec<EntityId> {
        let mut found: Vec<EntityId> = self
            .iter()
            .filter(|e| e.is_active() && e.has_tag(tag))
            .map(Entity::id)
            .collect();
        found.sort_unstable();
        found
    }

    /// Every entity in the registry, active or not, staged or resolved.
    pub fn total_entities(&self) -> usize {
        self.entities.len() + self.staged.len()
    }

    pub fn active_count(&self) -> usize {
        self.iter().filter(|e| e.is_active()).count()
    }

    /// Resolved entities first, then staged ones; each group ascending by id.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().chain(self.staged.values())
    }

    /// Resolved entities only, ascending by id.
    pub fn resolved(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn defer(&mut self, command: ComponentCommand) {
        self.deferred.push(command);
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.staged.is_empty() || !self.pending_remove.is_empty() || !self.deferred.is_empty()
    }

    pub(crate) fn take_deferred(&mut self) -> Vec<ComponentCommand> {
        std::mem::take(&mut self.deferred)
    }

    /// Move every staged entity into the resolved map and return their ids.
    pub(crate) fn promote_staged(&mut self) -> Vec<EntityId> {
        let staged = std::mem::take(&mut self.staged);
        let ids: Vec<EntityId> = staged.keys().copied().collect();
        self.entities.extend(staged);
        ids
    }

    /// Drain the removal queue, keeping only ids that are still present.
    pub(crate) fn take_pending_remove(&mut self) -> Vec<EntityId> {
        let queued = std::mem::take(&mut self.pending_remove);
        queued.into_iter().filter(|id| self.contains(*id)).collect()
    }

    pub(crate) fn erase(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id).or_else(|| self.staged.remove(&id))
    }

    /// Ids of every inactive entity, ascending.
    pub(crate) fn inactive_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .iter()
            .filter(|e| !e.is_active())
            .map(Entity::id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_increase() {
        let mut reg = Registry::new();
        let a = reg.create_entity();
        let b = reg.create_entity();
        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert!(reg.is_staged(a));
    }

    #[test]
    fn staged_entities_are_visible_to_lookups() {
        let mut reg = Registry::new();
        let id = reg.create_entity();
        reg.get_mut(id).unwrap().add_tag("enemy");
        assert_eq!(reg.find_by_tag("enemy"), vec![id]);
        assert_eq!(reg.total_entities(), 1);
        assert_eq!(reg.active_count(), 1);
    }

    #[test]
    fn destroy_is_idempotent_and_ignores_unknown_ids() {
        let mut reg = Registry::new();
        let id = reg.create_entity();
        assert!(reg.destroy_entity(id));
        assert!(!reg.destroy_entity(id));
        assert!(!reg.destroy_entity(EntityId::from_raw(99)));
        assert_eq!(reg.take_pending_remove(), vec![id]);
    }

    #[test]
    fn ids_are_not_reused_after_erase() {
        let mut reg = Registry::new();
        let a = reg.create_entity();
        reg.promote_staged();
        reg.erase(a);
        let b = reg.create_entity();
        assert!(b > a);
    }

    #[test]
    fn find_by_tag_skips_inactive() {
        let mut reg = Registry::new();
        let a = reg.create_entity();
        let b = reg.create_entity();
        reg.promote_staged();
        for id in [a, b] {
            reg.get_mut(id).unwrap().add_tag("bullet");
        }
        reg.get_mut(a).unwrap().deactivate();
        assert_eq!(reg.find_by_tag("bullet"), vec![b]);
        assert_eq!(reg.inactive_ids(), vec![a]);
    }
}
