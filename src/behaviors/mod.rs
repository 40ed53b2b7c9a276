//! Game-object behaviors built on the generic [`StateMachine`](crate::state::StateMachine).
//!
//! - [`player`] – idle/run/jump platformer controller
pub mod player;
