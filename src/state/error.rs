//! State machine errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("state not found: {0}")]
    UnknownState(String),

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("state machine has no current state; call set_initial_state first")]
    NotInitialized,

    #[error("initial state already set")]
    AlreadyInitialized,

    /// Raised by a state's own update logic.
    #[error("{0}")]
    Failed(String),
}

pub type StateResult<T> = Result<T, StateError>;
