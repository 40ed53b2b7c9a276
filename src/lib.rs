//! Kestrel engine library.
//!
//! A small 2D runtime built around a deferred-update ECS world and a generic
//! state machine. Exposed as a library for the binary, the integration tests
//! and embedding hosts.

pub mod behaviors;
pub mod components;
pub mod ecs;
pub mod events;
pub mod game;
pub mod resources;
pub mod scripting;
pub mod state;
pub mod systems;
