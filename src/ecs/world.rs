//! The world: entity registry, registered systems and the frame protocol.
//!
//! # Frame protocol
//!
//! [`World::update`] (and [`World::frame`], which also hands the systems a
//! frame surface and an input query) runs in two phases:
//!
//! 1. **Resolution.** Deferred component commands are applied, staged
//!    entities join the registry and every system whose requirements they
//!    meet is notified, then queued removals are erased after every system
//!    has been told to forget them. Both queues are empty afterwards.
//! 2. **Systems.** Each system's `update` runs in ascending priority order
//!    (registration order among equals). The first failing system aborts the
//!    rest of the frame.
//!
//! Entities created or destroyed during phase 2, and component commands
//! queued through [`SystemContext`], only take effect at the next resolution
//! pass. Match sets never change while the systems run.
//!
//! The registry lives behind an `Arc<parking_lot::RwLock<_>>` so that
//! [`WorldReader`] and [`WorldHandle`] clones can inspect or queue changes
//! from outside the frame loop.

use std::sync::Arc;

use log::{Level, log, warn};
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ecs::component::{Component, ComponentData, ComponentKind};
use crate::ecs::entity::{ComponentMut, Entity, EntityId};
use crate::ecs::error::{EcsError, EcsResult};
use crate::ecs::registry::{ComponentCommand, Registry};
use crate::ecs::system::{FrameIo, System, SystemContext};

pub struct World {
    registry: Arc<RwLock<Registry>>,
    systems: Vec<Box<dyn System>>,
    debug: bool,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::new())),
            systems: Vec::new(),
            debug: false,
        }
    }

    /// Builder-style toggle for verbose match logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Read-only handle usable from other threads.
    pub fn reader(&self) -> WorldReader {
        WorldReader {
            registry: Arc::clone(&self.registry),
        }
    }

    /// Handle for callers outside the frame loop (scripts, tools). Structural
    /// changes made through it are queued for the next resolution pass.
    pub fn handle(&self) -> WorldHandle {
        WorldHandle {
            reader: self.reader(),
        }
    }

    // ---- entities ----

    /// Stage a new active entity. It is visible to lookups right away and
    /// matched by systems at the next resolution pass.
    pub fn create_entity(&mut self) -> EntityId {
        let id = self.registry.write().create_entity();
        log!(self.level(), "created entity {}", id);
        id
    }

    /// Queue an entity for removal. Returns `false` for unknown or already
    /// queued ids.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        let queued = self.registry.write().destroy_entity(id);
        if queued {
            log!(self.level(), "queued entity {} for removal", id);
        }
        queued
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.registry.read().contains(id)
    }

    pub fn get_entity(&self, id: EntityId) -> Option<MappedRwLockReadGuard<'_, Entity>> {
        RwLockReadGuard::try_map(self.registry.read(), |r| r.get(id)).ok()
    }

    /// Mutable access to tags, the active flag and component fields. Adding or
    /// removing components goes through [`add_component`](Self::add_component)
    /// and [`remove_component`](Self::remove_component).
    pub fn entity_mut(&mut self, id: EntityId) -> Option<MappedRwLockWriteGuard<'_, Entity>> {
        RwLockWriteGuard::try_map(self.registry.write(), |r| r.get_mut(id)).ok()
    }

    pub fn add_tag(&mut self, id: EntityId, tag: impl Into<String>) -> EcsResult<()> {
        self.with_entity(id, |e| e.add_tag(tag))
    }

    pub fn remove_tag(&mut self, id: EntityId, tag: &str) -> EcsResult<bool> {
        self.with_entity(id, |e| e.remove_tag(tag))
    }

    pub fn has_tag(&self, id: EntityId, tag: &str) -> bool {
        self.registry.read().get(id).is_some_and(|e| e.has_tag(tag))
    }

    pub fn activate(&mut self, id: EntityId) -> EcsResult<()> {
        self.with_entity(id, Entity::activate)
    }

    pub fn deactivate(&mut self, id: EntityId) -> EcsResult<()> {
        self.with_entity(id, Entity::deactivate)
    }

    pub fn is_active(&self, id: EntityId) -> bool {
        self.registry.read().get(id).is_some_and(Entity::is_active)
    }

    /// Active entities carrying `tag`, ascending by id.
    pub fn find_entities_by_tag(&self, tag: &str) -> Vec<EntityId> {
        self.registry.read().find_by_tag(tag)
    }

    /// Every entity in the registry, active or not.
    pub fn total_entities(&self) -> usize {
        self.registry.read().total_entities()
    }

    pub fn active_entity_count(&self) -> usize {
        self.registry.read().active_count()
    }

    fn with_entity<R>(&mut self, id: EntityId, f: impl FnOnce(&mut Entity) -> R) -> EcsResult<R> {
        let mut registry = self.registry.write();
        let entity = registry.get_mut(id).ok_or(EcsError::UnknownEntity(id))?;
        Ok(f(entity))
    }

    // ---- components ----

    /// Attach a component, replacing any previous one of the same kind.
    ///
    /// Systems that the entity newly satisfies are notified before this
    /// returns. A staged entity is matched at the next resolution pass instead.
    pub fn add_component(&mut self, id: EntityId, component: impl Into<Component>) -> EcsResult<()> {
        let component = component.into();
        let kind = component.kind();
        let level = self.level();
        let mut registry = self.registry.write();
        let staged = registry.is_staged(id);
        let entity = registry.get_mut(id).ok_or(EcsError::UnknownEntity(id))?;
        entity.insert_component(component);
        log!(level, "added {} to entity {}", kind, id);
        if staged {
            return Ok(());
        }

        let entity = &*entity;
        for system in self.systems.iter_mut() {
            if system.has_required_components(entity) && system.on_entity_added(id) {
                log!(level, "entity {} now matches system `{}`", id, system.name());
            }
        }
        Ok(())
    }

    /// Detach a component. Returns `Ok(false)` if the entity did not hold one
    /// of that kind. Systems that no longer match are notified.
    pub fn remove_component(&mut self, id: EntityId, kind: ComponentKind) -> EcsResult<bool> {
        let level = self.level();
        let mut registry = self.registry.write();
        let entity = registry.get_mut(id).ok_or(EcsError::UnknownEntity(id))?;
        if entity.take_component(kind).is_none() {
            return Ok(false);
        }
        log!(level, "removed {} from entity {}", kind, id);

        let entity = &*entity;
        for system in self.systems.iter_mut() {
            if system.matched().contains(id)
                && !system.has_required_components(entity)
                && system.on_entity_removed(id)
            {
                log!(level, "entity {} no longer matches system `{}`", id, system.name());
            }
        }
        Ok(true)
    }

    pub fn has_component(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.registry.read().get(id).is_some_and(|e| e.has_component(kind))
    }

    /// Copy of the attached component of `kind`.
    pub fn get_component(&self, id: EntityId, kind: ComponentKind) -> Option<Component> {
        self.registry.read().get(id)?.get_component(kind).cloned()
    }

    /// Typed copy of an attached component.
    pub fn component<T: ComponentData + Clone>(&self, id: EntityId) -> Option<T> {
        self.registry.read().get(id)?.get::<T>().cloned()
    }

    /// Run `f` on a typed component in place.
    pub fn with_component_mut<T: ComponentData, R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let mut registry = self.registry.write();
        registry.get_mut(id)?.get_mut::<T>().map(f)
    }

    // ---- systems ----

    /// Register a system. It is inserted after every system of lower or equal
    /// priority and immediately matched against the resolved active entities.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        let mut system: Box<dyn System> = Box::new(system);
        let level = self.level();
        {
            let registry = self.registry.read();
            for entity in registry.resolved().filter(|e| e.is_active()) {
                if system.has_required_components(entity) && system.on_entity_added(entity.id()) {
                    log!(level, "entity {} now matches system `{}`", entity.id(), system.name());
                }
            }
        }
        let priority = system.priority();
        let pos = self.systems.partition_point(|s| s.priority() <= priority);
        log!(
            level,
            "registered system `{}` (priority {}, {} matched)",
            system.name(),
            priority,
            system.matched().len()
        );
        self.systems.insert(pos, system);
    }

    /// Registered systems in execution order.
    pub fn systems(&self) -> impl Iterator<Item = &dyn System> {
        self.systems.iter().map(|s| s.as_ref())
    }

    pub fn system(&self, name: &str) -> Option<&dyn System> {
        self.systems().find(|s| s.name() == name)
    }

    // ---- frame ----

    /// Advance one frame without a surface or input query.
    pub fn update(&mut self, dt: f32) -> EcsResult<()> {
        self.frame(dt, FrameIo::default())
    }

    /// Advance one frame, handing `io` to every system.
    pub fn frame(&mut self, dt: f32, mut io: FrameIo<'_>) -> EcsResult<()> {
        self.resolve();

        let mut registry = self.registry.write();
        for system in self.systems.iter_mut() {
            let name = system.name();
            let mut ctx = SystemContext::new(&mut registry, name, &mut io);
            system
                .update(dt, &mut ctx)
                .map_err(|source| EcsError::SystemUpdateFailed {
                    system: name.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Apply queued removals and additions now, outside of a frame.
    pub fn resolve(&mut self) {
        self.apply_deferred();

        let level = self.level();
        let mut registry = self.registry.write();

        for id in registry.promote_staged() {
            let Some(entity) = registry.get(id) else {
                continue;
            };
            for system in self.systems.iter_mut() {
                if system.has_required_components(entity) && system.on_entity_added(id) {
                    log!(level, "entity {} now matches system `{}`", id, system.name());
                }
            }
        }

        for id in registry.take_pending_remove() {
            for system in self.systems.iter_mut() {
                if system.on_entity_removed(id) {
                    log!(level, "entity {} left system `{}`", id, system.name());
                }
            }
            registry.erase(id);
            log!(level, "destroyed entity {}", id);
        }
    }

    /// Apply component commands queued by systems or handles. Commands that
    /// target entities which no longer exist are dropped.
    pub fn apply_deferred(&mut self) -> usize {
        let commands = self.registry.write().take_deferred();
        let mut applied = 0;
        for command in commands {
            let result = match command {
                ComponentCommand::Add { entity, component } => self.add_component(entity, component),
                ComponentCommand::Remove { entity, kind } => self.remove_component(entity, kind).map(|_| ()),
            };
            match result {
                Ok(()) => applied += 1,
                Err(err) => warn!("dropping deferred component command: {}", err),
            }
        }
        applied
    }

    /// Erase every inactive entity immediately, notifying the systems that
    /// matched it. Returns the number of entities erased.
    pub fn cleanup_inactive_entities(&mut self) -> usize {
        let level = self.level();
        let mut registry = self.registry.write();
        let ids = registry.inactive_ids();
        for id in &ids {
            for system in self.systems.iter_mut() {
                system.on_entity_removed(*id);
            }
            registry.erase(*id);
        }
        if !ids.is_empty() {
            log!(level, "cleaned up {} inactive entities", ids.len());
        }
        ids.len()
    }

    fn level(&self) -> Level {
        if self.debug { Level::Debug } else { Level::Trace }
    }
}

/// Shared read access to a world's registry.
#[derive(Clone)]
pub struct WorldReader {
    registry: Arc<RwLock<Registry>>,
}

impl WorldReader {
    pub fn contains(&self, id: EntityId) -> bool {
        self.registry.read().contains(id)
    }

    pub fn is_active(&self, id: EntityId) -> bool {
        self.registry.read().get(id).is_some_and(Entity::is_active)
    }

    pub fn has_tag(&self, id: EntityId, tag: &str) -> bool {
        self.registry.read().get(id).is_some_and(|e| e.has_tag(tag))
    }

    /// Tags of an entity, sorted.
    pub fn tags(&self, id: EntityId) -> Option<Vec<String>> {
        let registry = self.registry.read();
        let mut tags: Vec<String> = registry.get(id)?.tags().map(str::to_string).collect();
        tags.sort();
        Some(tags)
    }

    pub fn has_component(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.registry.read().get(id).is_some_and(|e| e.has_component(kind))
    }

    pub fn get_component(&self, id: EntityId, kind: ComponentKind) -> Option<Component> {
        self.registry.read().get(id)?.get_component(kind).cloned()
    }

    pub fn find_entities_by_tag(&self, tag: &str) -> Vec<EntityId> {
        self.registry.read().find_by_tag(tag)
    }

    pub fn total_entities(&self) -> usize {
        self.registry.read().total_entities()
    }

    pub fn active_entity_count(&self) -> usize {
        self.registry.read().active_count()
    }
}

/// Write handle for callers outside the frame loop.
///
/// Entity creation and destruction use the normal deferred queues. Component
/// attach and detach are queued as commands and applied by the owning world's
/// next [`World::apply_deferred`] or resolution pass. Tags, the active flag
/// and existing component fields are edited in place.
#[derive(Clone)]
pub struct WorldHandle {
    reader: WorldReader,
}

impl WorldHandle {
    pub fn read(&self) -> &WorldReader {
        &self.reader
    }

    pub fn create_entity(&self) -> EntityId {
        self.reader.registry.write().create_entity()
    }

    pub fn destroy_entity(&self, id: EntityId) -> bool {
        self.reader.registry.write().destroy_entity(id)
    }

    /// Run `f` on the entity. `None` if the id is unknown.
    pub fn with_entity<R>(&self, id: EntityId, f: impl FnOnce(&mut Entity) -> R) -> Option<R> {
        self.reader.registry.write().get_mut(id).map(f)
    }

    /// Run `f` on an attached component of `kind`.
    pub fn with_component<R>(
        &self,
        id: EntityId,
        kind: ComponentKind,
        f: impl FnOnce(ComponentMut<'_>) -> R,
    ) -> Option<R> {
        let mut registry = self.reader.registry.write();
        registry.get_mut(id)?.get_component_mut(kind).map(f)
    }

    /// Queue a component attach. Returns `false` for unknown ids.
    pub fn queue_add_component(&self, id: EntityId, component: impl Into<Component>) -> bool {
        let mut registry = self.reader.registry.write();
        if !registry.contains(id) {
            return false;
        }
        registry.defer(ComponentCommand::Add {
            entity: id,
            component: component.into(),
        });
        true
    }

    /// Queue a component detach. Returns `false` for unknown ids.
    pub fn queue_remove_component(&self, id: EntityId, kind: ComponentKind) -> bool {
        let mut registry = self.reader.registry.write();
        if !registry.contains(id) {
            return false;
        }
        registry.defer(ComponentCommand::Remove { entity: id, kind });
        true
    }
}
