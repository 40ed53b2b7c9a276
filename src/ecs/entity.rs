//! Entity identity and per-entity component storage.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::ecs::component::{Component, ComponentData, ComponentKind, ComponentSet};

/// Opaque entity handle. Handles increase monotonically and are never reused
/// within a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub const fn from_raw(raw: u64) -> Self {
        EntityId(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A component attached to an entity, together with the id of its owner.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentSlot {
    pub owner: EntityId,
    pub value: Component,
}

/// An identity aggregating at most one component per kind, plus an active
/// flag and a set of string tags.
///
/// Entities live inside the world's registry. Adding or removing components
/// goes through [`World`](crate::ecs::world::World) so that systems can be
/// re-matched; tags, the active flag and component fields can be edited
/// directly.
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    active: bool,
    tags: FxHashSet<String>,
    components: FxHashMap<ComponentKind, ComponentSlot>,
    signature: ComponentSet,
}

impl Entity {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            active: true,
            tags: FxHashSet::default(),
            components: FxHashMap::default(),
            signature: ComponentSet::EMPTY,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Hide the entity from tag queries. It stays in system match caches
    /// until it is destroyed, cleaned up, or loses a required component.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    /// Returns `true` if the tag was present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// The kinds this entity currently holds.
    pub fn signature(&self) -> ComponentSet {
        self.signature
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.signature.contains(kind)
    }

    pub fn get_component(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.get(&kind).map(|slot| &slot.value)
    }

    /// Mutable access to a component's fields. The kind cannot change through
    /// this reference.
    pub fn get_component_mut(&mut self, kind: ComponentKind) -> Option<ComponentMut<'_>> {
        self.components.get_mut(&kind).map(|slot| ComponentMut(&mut slot.value))
    }

    /// Owner recorded on the attached component of `kind`.
    pub fn component_owner(&self, kind: ComponentKind) -> Option<EntityId> {
        self.components.get(&kind).map(|slot| slot.owner)
    }

    pub fn get<T: ComponentData>(&self) -> Option<&T> {
        self.get_component(T::KIND).and_then(T::from_component)
    }

    pub fn get_mut<T: ComponentData>(&mut self) -> Option<&mut T> {
        self.components
            .get_mut(&T::KIND)
            .and_then(|slot| T::from_component_mut(&mut slot.value))
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values().map(|slot| &slot.value)
    }

    /// Attach a component, replacing and returning any previous one of the
    /// same kind.
    pub(crate) fn insert_component(&mut self, component: Component) -> Option<Component> {
        let kind = component.kind();
        self.signature.insert(kind);
        self.components
            .insert(
                kind,
                ComponentSlot {
                    owner: self.id,
                    value: component,
                },
            )
            .map(|slot| slot.value)
    }

    pub(crate) fn take_component(&mut self, kind: ComponentKind) -> Option<Component> {
        let slot = self.components.remove(&kind)?;
        self.signature.remove(kind);
        Some(slot.value)
    }
}

/// Field-level mutable access to an attached component.
///
/// Wraps the `&mut Component` so callers can edit fields but never swap the
/// value for a component of a different kind.
#[derive(Debug)]
pub struct ComponentMut<'a>(&'a mut Component);

impl ComponentMut<'_> {
    pub fn kind(&self) -> ComponentKind {
        self.0.kind()
    }

    pub fn get(&self) -> &Component {
        &*self.0
    }

    pub fn downcast_mut<T: ComponentData>(&mut self) -> Option<&mut T> {
        T::from_component_mut(self.0)
    }

    /// Replace the value with another one of the same kind. Returns `false`
    /// and leaves the component untouched if the kinds differ.
    pub fn replace(&mut self, value: Component) -> bool {
        if value.kind() != self.0.kind() {
            return false;
        }
        *self.0 = value;
        true
    }
}
