//! Generic finite state machine.
//!
//! States are registered by name, transitions must be declared up front with
//! [`StateMachine::add_transition`], and [`StateMachine::change_state`]
//! refuses any pair that was not declared.
//!
//! # Transition order
//!
//! 1. `on_exit` on the current state
//! 2. `previous = current`, `current = target`, time in state reset to zero
//! 3. `on_enter(data)` on the target
//! 4. the transition observer, if any, receives `{from, to, data}`
//!
//! # Example
//!
//! ```ignore
//! let mut machine = StateMachine::new();
//! machine.add_state(Idle);
//! machine.add_state(Run);
//! machine.add_transition("idle", "run")?;
//! machine.set_initial_state("idle", &mut player, ())?;
//! machine.update(&mut player, dt)?;
//! ```

use std::fmt;

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::state::error::{StateError, StateResult};
use crate::state::state::{State, Transition, TransitionEvent};

type Observer<D> = Box<dyn FnMut(&TransitionEvent<D>)>;

pub struct StateMachine<C, D = ()> {
    states: FxHashMap<String, Box<dyn State<C, D>>>,
    current: Option<String>,
    previous: Option<String>,
    global: Option<Box<dyn State<C, D>>>,
    transitions: FxHashMap<String, FxHashSet<String>>,
    observer: Option<Observer<D>>,
    time_in_state: f32,
}

impl<C, D> Default for StateMachine<C, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, D> StateMachine<C, D> {
    pub fn new() -> Self {
        Self {
            states: FxHashMap::default(),
            current: None,
            previous: None,
            global: None,
            transitions: FxHashMap::default(),
            observer: None,
            time_in_state: 0.0,
        }
    }

    /// Register a state under its own name, replacing any state of that name.
    pub fn add_state<S: State<C, D> + 'static>(&mut self, state: S) {
        let name = state.name().to_string();
        if self.states.insert(name.clone(), Box::new(state)).is_some() {
            debug!("state `{}` replaced", name);
        }
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// Allow `from -> to`. Both states must already be registered.
    pub fn add_transition(&mut self, from: &str, to: &str) -> StateResult<()> {
        for name in [from, to] {
            if !self.states.contains_key(name) {
                return Err(StateError::UnknownState(name.to_string()));
            }
        }
        self.transitions
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        Ok(())
    }

    pub fn can_transition(&self, from: &str, to: &str) -> bool {
        self.transitions.get(from).is_some_and(|targets| targets.contains(to))
    }

    /// Enter the first state. Must be called exactly once, before
    /// [`update`](Self::update) or [`change_state`](Self::change_state).
    pub fn set_initial_state(&mut self, name: &str, ctx: &mut C, data: D) -> StateResult<()> {
        if self.current.is_some() {
            return Err(StateError::AlreadyInitialized);
        }
        let state = self
            .states
            .get_mut(name)
            .ok_or_else(|| StateError::UnknownState(name.to_string()))?;
        self.current = Some(name.to_string());
        self.time_in_state = 0.0;
        state.on_enter(ctx, &data);
        Ok(())
    }

    /// State whose `on_update` runs every frame before the current state's.
    pub fn set_global_state<S: State<C, D> + 'static>(&mut self, state: S) {
        self.global = Some(Box::new(state));
    }

    pub fn set_transition_observer(&mut self, observer: impl FnMut(&TransitionEvent<D>) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Move to `name`. On error nothing changes and no hook runs.
    pub fn change_state(&mut self, name: &str, ctx: &mut C, data: D) -> StateResult<()> {
        let from = self.current.clone().ok_or(StateError::NotInitialized)?;
        if !self.states.contains_key(name) {
            return Err(StateError::UnknownState(name.to_string()));
        }
        if !self.can_transition(&from, name) {
            return Err(StateError::InvalidTransition {
                from,
                to: name.to_string(),
            });
        }

        if let Some(state) = self.states.get_mut(&from) {
            state.on_exit(ctx);
        }
        self.previous = Some(from.clone());
        self.current = Some(name.to_string());
        self.time_in_state = 0.0;

        let event = TransitionEvent {
            from,
            to: name.to_string(),
            data,
        };
        if let Some(state) = self.states.get_mut(name) {
            state.on_enter(ctx, &event.data);
        }
        debug!("state transition: {} -> {}", event.from, event.to);
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
        Ok(())
    }

    /// Advance by `dt`: the global state's `on_update`, then the current
    /// state's. A transition returned by the global state is applied before
    /// the current state is looked up, so the state updated second is the
    /// new one.
    pub fn update(&mut self, ctx: &mut C, dt: f32) -> StateResult<()> {
        if self.current.is_none() {
            return Err(StateError::NotInitialized);
        }
        self.time_in_state += dt;

        if let Some(global) = self.global.as_mut() {
            let requested = global.on_update(ctx, dt, self.time_in_state)?;
            if let Some(Transition { to, data }) = requested {
                self.change_state(&to, ctx, data)?;
            }
        }

        let current = self.current.clone().ok_or(StateError::NotInitialized)?;
        let state = self
            .states
            .get_mut(&current)
            .ok_or_else(|| StateError::UnknownState(current.clone()))?;
        if let Some(Transition { to, data }) = state.on_update(ctx, dt, self.time_in_state)? {
            self.change_state(&to, ctx, data)?;
        }
        Ok(())
    }

    pub fn current_state(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn previous_state(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Seconds spent in the current state.
    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }
}

impl<C, D> fmt::Debug for StateMachine<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut states: Vec<&String> = self.states.keys().collect();
        states.sort();
        f.debug_struct("StateMachine")
            .field("states", &states)
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("has_global", &self.global.is_some())
            .field("time_in_state", &self.time_in_state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log(Vec<String>);

    struct Named(&'static str);

    impl State<Log, i32> for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn on_enter(&mut self, ctx: &mut Log, data: &i32) {
            ctx.0.push(format!("enter {} {}", self.0, data));
        }

        fn on_exit(&mut self, ctx: &mut Log) {
            ctx.0.push(format!("exit {}", self.0));
        }
    }

    fn machine() -> StateMachine<Log, i32> {
        let mut m = StateMachine::new();
        m.add_state(Named("a"));
        m.add_state(Named("b"));
        m.add_transition("a", "b").unwrap();
        m
    }

    #[test]
    fn add_transition_requires_registered_states() {
        let mut m = machine();
        assert_eq!(
            m.add_transition("a", "zzz"),
            Err(StateError::UnknownState("zzz".into()))
        );
        assert!(m.can_transition("a", "b"));
        assert!(!m.can_transition("b", "a"));
    }

    #[test]
    fn change_before_initial_state_fails() {
        let mut m = machine();
        let mut log = Log::default();
        assert_eq!(m.change_state("b", &mut log, 0), Err(StateError::NotInitialized));
        assert_eq!(m.update(&mut log, 0.1), Err(StateError::NotInitialized));
    }

    #[test]
    fn initial_state_can_only_be_set_once() {
        let mut m = machine();
        let mut log = Log::default();
        m.set_initial_state("a", &mut log, 7).unwrap();
        assert_eq!(m.set_initial_state("b", &mut log, 0), Err(StateError::AlreadyInitialized));
        assert_eq!(log.0, vec!["enter a 7"]);
    }

    #[test]
    fn hooks_and_observer_run_in_order() {
        let mut m = machine();
        let mut log = Log::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        m.set_transition_observer(move |e: &TransitionEvent<i32>| sink.borrow_mut().push(e.clone()));
        m.set_initial_state("a", &mut log, 0).unwrap();
        m.update(&mut log, 0.5).unwrap();
        assert_eq!(m.time_in_state(), 0.5);

        m.change_state("b", &mut log, 3).unwrap();
        assert_eq!(log.0, vec!["enter a 0", "exit a", "enter b 3"]);
        assert_eq!(m.current_state(), Some("b"));
        assert_eq!(m.previous_state(), Some("a"));
        assert_eq!(m.time_in_state(), 0.0);
        assert_eq!(
            seen.borrow().as_slice(),
            &[TransitionEvent {
                from: "a".into(),
                to: "b".into(),
                data: 3
            }]
        );
    }

    #[test]
    fn unknown_state_is_reported_before_transition_guard() {
        let mut m = machine();
        let mut log = Log::default();
        m.set_initial_state("a", &mut log, 0).unwrap();
        assert_eq!(
            m.change_state("nope", &mut log, 0),
            Err(StateError::UnknownState("nope".into()))
        );
        m.change_state("b", &mut log, 0).unwrap();
        assert_eq!(
            m.change_state("a", &mut log, 0),
            Err(StateError::InvalidTransition {
                from: "b".into(),
                to: "a".into()
            })
        );
        assert_eq!(m.current_state(), Some("b"));
    }
}
