//! Named-state machine used by game-object behaviors.
//!
//! - [`state`] – the [`State`] trait plus [`Transition`] and [`TransitionEvent`]
//! - [`machine`] – [`StateMachine`], the registry of states and allowed transitions
//! - [`error`] – [`StateError`]

pub mod error;
pub mod machine;
pub mod state;

pub use error::{StateError, StateResult};
pub use machine::StateMachine;
pub use state::{State, Transition, TransitionEvent};
