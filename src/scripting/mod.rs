//! Scripting boundary.
//!
//! - [`bridge`] – plain-value operations over a [`World`](crate::ecs::world::World)
//! - `lua_runtime` – the Lua `engine` table (with the `lua` feature)
pub mod bridge;
#[cfg(feature = "lua")]
pub mod lua_runtime;
