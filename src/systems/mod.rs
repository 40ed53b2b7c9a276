//! Built-in systems.
//!
//! Each system implements [`System`](crate::ecs::system::System) and is
//! registered on a [`World`](crate::ecs::world::World), which runs them in
//! priority order every frame.
//!
//! | System | Priority | Requires |
//! |---|---|---|
//! | [`physics::PhysicsSystem`] | `PHYSICS` (0) | Transform, Physics |
//! | [`collision::CollisionSystem`] | `PHYSICS` (0) | Transform, Collider |
//! | [`player::PlayerSystem`] | `UPDATE` (1) | Transform |
//! | [`screenconfig::ScreenConfigSystem`] | `UPDATE` (1) | ScreenConfig |
//! | [`render::RenderSystem`] | `RENDER` (2) | Transform, Sprite |
//! | [`text::TextSystem`] | `RENDER + 1` (3) | Text |
pub mod collision;
pub mod physics;
pub mod player;
pub mod render;
pub mod screenconfig;
pub mod text;
