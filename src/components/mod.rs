//! Component data records.
//!
//! Each submodule defines one of the fixed component kinds that can be attached
//! to an entity. The closed set of kinds and the tagged union wrapping them live
//! in [`crate::ecs::component`].
//!
//! Submodules overview:
//! - [`transform`] – world-space position, scale and rotation (kind 1)
//! - [`sprite`] – image key, size, layer and color for rendering (kind 2)
//! - [`text`] – screen-space text with a visibility flag (kind 3)
//! - [`screenconfig`] – requested screen resolution and presets (kind 4)
//! - [`physics`] – velocity, gravity and speed for integration (kind 5)
//! - [`collider`] – box or circle collision shape with layer filtering (kind 6)

pub mod collider;
pub mod physics;
pub mod screenconfig;
pub mod sprite;
pub mod text;
pub mod transform;
