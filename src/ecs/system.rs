//! System trait, match cache and per-update context.
//!
//! A system declares the component kinds it requires and keeps the ids of the
//! entities that currently satisfy them, ordered ascending. The world keeps
//! that cache in sync by calling [`System::on_entity_added`] and
//! [`System::on_entity_removed`]; a system never scans the registry itself.
//!
//! During [`System::update`] the system receives a [`SystemContext`] that
//! gives it access to the registry, the optional frame surface and the
//! optional input query. Structural changes requested through the context are
//! deferred: entity creation and destruction wait for the next resolution
//! pass, component attach/detach is applied once the system returns.

use std::fmt;

use crate::ecs::component::{Component, ComponentData, ComponentKind, ComponentSet};
use crate::ecs::entity::{Entity, EntityId};
use crate::ecs::error::{EcsError, SystemResult};
use crate::ecs::registry::{ComponentCommand, Registry};
use crate::resources::input::InputQuery;
use crate::resources::surface::FrameSurface;

/// Ordering key for systems. Lower values run first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemPriority(pub i32);

impl SystemPriority {
    pub const PHYSICS: SystemPriority = SystemPriority(0);
    pub const UPDATE: SystemPriority = SystemPriority(1);
    pub const RENDER: SystemPriority = SystemPriority(2);

    /// The priority right after this one.
    pub const fn next(self) -> Self {
        SystemPriority(self.0 + 1)
    }
}

impl fmt::Display for SystemPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entity ids matched by a system, kept sorted and free of duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchedEntities(Vec<EntityId>);

impl MatchedEntities {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert keeping ascending order. Returns `false` if already present.
    pub fn insert(&mut self, id: EntityId) -> bool {
        match self.0.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, id);
                true
            }
        }
    }

    /// Returns `false` if the id was not present.
    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.0.binary_search(&id) {
            Ok(pos) => {
                self.0.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[EntityId] {
        &self.0
    }

    /// Owned copy for iterating while the context is borrowed mutably.
    pub fn to_vec(&self) -> Vec<EntityId> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Shared state every system carries: identity, ordering, requirements and
/// the match cache.
#[derive(Clone, Debug)]
pub struct SystemBase {
    name: &'static str,
    priority: SystemPriority,
    required: ComponentSet,
    matched: MatchedEntities,
}

impl SystemBase {
    pub fn new(name: &'static str, priority: SystemPriority, required: ComponentSet) -> Self {
        Self {
            name,
            priority,
            required,
            matched: MatchedEntities::new(),
        }
    }

    pub fn matched(&self) -> &MatchedEntities {
        &self.matched
    }

    pub fn matched_mut(&mut self) -> &mut MatchedEntities {
        &mut self.matched
    }
}

/// A unit of per-frame logic operating on the entities that hold all of its
/// required component kinds.
///
/// Implementors only provide [`base`](System::base),
/// [`base_mut`](System::base_mut) and [`update`](System::update); the match
/// bookkeeping has default implementations that rarely need overriding.
pub trait System {
    fn base(&self) -> &SystemBase;

    fn base_mut(&mut self) -> &mut SystemBase;

    /// Run one frame of logic over the matched entities.
    fn update(&mut self, dt: f32, ctx: &mut SystemContext<'_, '_>) -> SystemResult;

    fn name(&self) -> &'static str {
        self.base().name
    }

    fn priority(&self) -> SystemPriority {
        self.base().priority
    }

    fn required_components(&self) -> ComponentSet {
        self.base().required
    }

    fn matched(&self) -> &MatchedEntities {
        &self.base().matched
    }

    fn has_required_components(&self, entity: &Entity) -> bool {
        entity.signature().contains_all(self.required_components())
    }

    /// Record a newly matching entity. Returns `false` if it was already matched.
    fn on_entity_added(&mut self, id: EntityId) -> bool {
        self.base_mut().matched.insert(id)
    }

    /// Forget an entity. Returns `false` if it was never matched.
    fn on_entity_removed(&mut self, id: EntityId) -> bool {
        self.base_mut().matched.remove(id)
    }
}

/// Host-provided collaborators for one frame.
#[derive(Default)]
pub struct FrameIo<'a> {
    pub surface: Option<&'a mut dyn FrameSurface>,
    pub input: Option<&'a dyn InputQuery>,
}

impl<'a> FrameIo<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_surface(mut self, surface: &'a mut dyn FrameSurface) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_input(mut self, input: &'a dyn InputQuery) -> Self {
        self.input = Some(input);
        self
    }
}

/// Access handed to a system for the duration of its update.
pub struct SystemContext<'a, 'io> {
    registry: &'a mut Registry,
    system: &'static str,
    io: &'a mut FrameIo<'io>,
}

impl<'a, 'io> SystemContext<'a, 'io> {
    pub(crate) fn new(
        registry: &'a mut Registry,
        system: &'static str,
        io: &'a mut FrameIo<'io>,
    ) -> Self {
        Self {
            registry,
            system,
            io,
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.registry.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.registry.get_mut(id)
    }

    /// Required component of a matched entity.
    ///
    /// # Panics
    /// If the entity is gone or lacks the component. For a matched entity and
    /// a required kind this means the match cache is out of sync.
    pub fn component<T: ComponentData>(&self, id: EntityId) -> &T {
        match self.registry.get(id).and_then(|e| e.get::<T>()) {
            Some(component) => component,
            None => invariant_violated(self.system, id, T::KIND),
        }
    }

    /// Mutable variant of [`component`](Self::component), with the same panics.
    pub fn component_mut<T: ComponentData>(&mut self, id: EntityId) -> &mut T {
        let system = self.system;
        match self.registry.get_mut(id).and_then(|e| e.get_mut::<T>()) {
            Some(component) => component,
            None => invariant_violated(system, id, T::KIND),
        }
    }

    /// Stage a new entity. Systems see it from the next frame on.
    pub fn create_entity(&mut self) -> EntityId {
        self.registry.create_entity()
    }

    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        self.registry.destroy_entity(id)
    }

    /// Queue a component attach, applied at the next resolution pass.
    pub fn add_component(&mut self, entity: EntityId, component: impl Into<Component>) {
        self.registry.defer(ComponentCommand::Add {
            entity,
            component: component.into(),
        });
    }

    /// Queue a component detach, applied at the next resolution pass.
    pub fn remove_component(&mut self, entity: EntityId, kind: ComponentKind) {
        self.registry.defer(ComponentCommand::Remove { entity, kind });
    }

    pub fn find_entities_by_tag(&self, tag: &str) -> Vec<EntityId> {
        self.registry.find_by_tag(tag)
    }

    pub fn has_surface(&self) -> bool {
        self.io.surface.is_some()
    }

    pub fn surface(&mut self) -> Option<&mut (dyn FrameSurface + 'io)> {
        self.io.surface.as_deref_mut()
    }

    pub fn input(&self) -> Option<&'io dyn InputQuery> {
        self.io.input
    }

    /// Borrow the registry and the surface at the same time.
    pub fn split(&mut self) -> (&Registry, Option<&mut (dyn FrameSurface + 'io)>) {
        (&*self.registry, self.io.surface.as_deref_mut())
    }
}

#[cold]
fn invariant_violated(system: &str, entity: EntityId, kind: ComponentKind) -> ! {
    panic!(
        "{}",
        EcsError::ComponentMatchInvariantViolated {
            system: system.to_string(),
            entity,
            kind,
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::transform::Transform;

    struct Tracker {
        base: SystemBase,
    }

    impl System for Tracker {
        fn base(&self) -> &SystemBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut SystemBase {
            &mut self.base
        }

        fn update(&mut self, _dt: f32, ctx: &mut SystemContext<'_, '_>) -> SystemResult {
            for id in self.matched().to_vec() {
                ctx.component_mut::<Transform>(id).x += 1.0;
            }
            Ok(())
        }
    }

    fn tracker() -> Tracker {
        Tracker {
            base: SystemBase::new(
                "tracker",
                SystemPriority::UPDATE,
                ComponentSet::of(&[ComponentKind::Transform]),
            ),
        }
    }

    #[test]
    fn matched_entities_stay_sorted_without_duplicates() {
        let mut m = MatchedEntities::new();
        for raw in [5, 2, 9, 2] {
            m.insert(EntityId::from_raw(raw));
        }
        let raw: Vec<u64> = m.iter().map(EntityId::raw).collect();
        assert_eq!(raw, vec![2, 5, 9]);
        assert!(m.remove(EntityId::from_raw(5)));
        assert!(!m.remove(EntityId::from_raw(5)));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn priority_constants_are_ordered() {
        assert!(SystemPriority::PHYSICS < SystemPriority::UPDATE);
        assert!(SystemPriority::UPDATE < SystemPriority::RENDER);
        assert_eq!(SystemPriority::RENDER.next(), SystemPriority(3));
    }

    #[test]
    fn default_hooks_maintain_the_match_cache() {
        let mut system = tracker();
        assert!(system.on_entity_added(EntityId::from_raw(3)));
        assert!(!system.on_entity_added(EntityId::from_raw(3)));
        assert!(system.on_entity_removed(EntityId::from_raw(3)));
        assert!(!system.on_entity_removed(EntityId::from_raw(3)));
        assert!(system.matched().is_empty());
    }

    #[test]
    fn context_defers_component_commands() {
        let mut registry = Registry::new();
        let id = registry.create_entity();
        let mut io = FrameIo::new();
        let mut ctx = SystemContext::new(&mut registry, "tracker", &mut io);
        ctx.add_component(id, Transform::new(1.0, 2.0));
        ctx.remove_component(id, ComponentKind::Sprite);
        assert!(!ctx.has_surface());
        assert!(ctx.input().is_none());
        assert_eq!(registry.take_deferred().len(), 2);
        assert!(!registry.get(id).unwrap().has_component(ComponentKind::Transform));
    }

    #[test]
    #[should_panic(expected = "without its required transform component")]
    fn update_panics_on_out_of_sync_match() {
        let mut registry = Registry::new();
        let id = registry.create_entity();
        let mut system = tracker();
        system.on_entity_added(id);
        let mut io = FrameIo::new();
        let mut ctx = SystemContext::new(&mut registry, "tracker", &mut io);
        let _ = system.update(0.016, &mut ctx);
    }
}
