//! Entity-component-system core.
//!
//! Submodules overview:
//! - [`component`] – component kinds, kind sets and the [`Component`] union
//! - [`entity`] – entity ids and per-entity component storage
//! - [`registry`] – the entity arena with its deferred structural queues
//! - [`system`] – the [`System`] trait, match cache and update context
//! - [`world`] – the [`World`] and its frame protocol
//! - [`error`] – error types shared by the above

pub mod component;
pub mod entity;
pub mod error;
pub mod registry;
pub mod system;
pub mod world;

pub use component::{Component, ComponentData, ComponentKind, ComponentSet};
pub use entity::{Entity, EntityId};
pub use error::{EcsError, EcsResult, SystemError, SystemResult};
pub use system::{FrameIo, MatchedEntities, System, SystemBase, SystemContext, SystemPriority};
pub use world::{World, WorldHandle, WorldReader};
