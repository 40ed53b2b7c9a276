//! The [`State`] trait and the values exchanged during transitions.

use crate::state::error::StateResult;

/// Request to move the machine to another state, carrying the data handed to
/// the target's `on_enter`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<D = ()> {
    pub to: String,
    pub data: D,
}

impl<D> Transition<D> {
    pub fn with_data(to: impl Into<String>, data: D) -> Self {
        Self { to: to.into(), data }
    }
}

impl Transition<()> {
    pub fn to(to: impl Into<String>) -> Self {
        Self::with_data(to, ())
    }
}

/// Delivered to the transition observer after the target state was entered.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionEvent<D = ()> {
    pub from: String,
    pub to: String,
    pub data: D,
}

/// One named state of a [`StateMachine`](super::machine::StateMachine).
///
/// `C` is the context the machine drives (for example a player record) and
/// `D` the payload passed along with a transition.
///
/// Hooks default to doing nothing. `on_update` returns `Some(transition)` to
/// move the machine; the change happens before
/// [`StateMachine::update`](super::machine::StateMachine::update) returns.
pub trait State<C, D = ()> {
    fn name(&self) -> &str;

    fn on_enter(&mut self, _ctx: &mut C, _data: &D) {}

    /// `time_in_state` is the number of seconds since the current state was
    /// entered, including this frame's `dt`.
    fn on_update(&mut self, _ctx: &mut C, _dt: f32, _time_in_state: f32) -> StateResult<Option<Transition<D>>> {
        Ok(None)
    }

    fn on_exit(&mut self, _ctx: &mut C) {}
}
