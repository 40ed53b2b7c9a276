//! Platformer player driven by an idle/run/jump state machine.
//!
//! Allowed transitions:
//!
//! ```text
//! idle -> run, idle -> jump
//! run  -> idle, run -> jump
//! jump -> idle
//! ```
//!
//! Screen coordinates grow downwards, so a jump starts with a negative
//! vertical velocity and gravity pulls it back to `ground_y`.

use log::debug;

use crate::resources::input::{ACTION_LEFT, ACTION_OK, ACTION_RIGHT, ACTION_UP, InputQuery};
use crate::state::{State, StateMachine, StateResult, Transition, TransitionEvent};

pub const IDLE: &str = "idle";
pub const RUN: &str = "run";
pub const JUMP: &str = "jump";

const DEFAULT_RUN_SPEED: f32 = 180.0;
const DEFAULT_JUMP_FORCE: f32 = 420.0;
const DEFAULT_GRAVITY: f32 = 980.0;

/// Kinematic and animation state the player states operate on.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub velocity_y: f32,
    /// -1.0, 0.0 or 1.0 from the horizontal actions.
    pub direction: f32,
    pub jump_pressed: bool,
    pub grounded: bool,
    pub animation: String,
    pub run_speed: f32,
    pub jump_force: f32,
    pub gravity: f32,
    pub ground_y: f32,
}

impl Player {
    pub fn new(x: f32, ground_y: f32) -> Self {
        Self {
            x,
            y: ground_y,
            velocity_y: 0.0,
            direction: 0.0,
            jump_pressed: false,
            grounded: true,
            animation: String::new(),
            run_speed: DEFAULT_RUN_SPEED,
            jump_force: DEFAULT_JUMP_FORCE,
            gravity: DEFAULT_GRAVITY,
            ground_y,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.direction != 0.0
    }

    pub fn set_animation(&mut self, name: &str) {
        self.animation.clear();
        self.animation.push_str(name);
    }

    pub fn apply_jump_force(&mut self) {
        self.velocity_y = -self.jump_force;
        self.grounded = false;
    }

    /// Sample the input query for this frame.
    pub fn read_input(&mut self, input: &dyn InputQuery) {
        let left = input.is_action_active(ACTION_LEFT);
        let right = input.is_action_active(ACTION_RIGHT);
        self.direction = match (left, right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        self.jump_pressed = input.is_action_just_pressed(ACTION_UP) || input.is_action_just_pressed(ACTION_OK);
    }

    /// Move horizontally and, while airborne, fall under gravity until the
    /// ground is reached.
    pub fn integrate(&mut self, dt: f32) {
        self.x += self.direction * self.run_speed * dt;
        if self.grounded {
            return;
        }
        self.velocity_y += self.gravity * dt;
        self.y += self.velocity_y * dt;
        if self.y >= self.ground_y {
            self.y = self.ground_y;
            self.velocity_y = 0.0;
            self.grounded = true;
        }
    }
}

pub struct Idle;

impl State<Player> for Idle {
    fn name(&self) -> &str {
        IDLE
    }

    fn on_enter(&mut self, player: &mut Player, _data: &()) {
        player.set_animation(IDLE);
    }

    fn on_update(&mut self, player: &mut Player, _dt: f32, _time_in_state: f32) -> StateResult<Option<Transition>> {
        if player.is_moving() {
            return Ok(Some(Transition::to(RUN)));
        }
        if player.jump_pressed {
            return Ok(Some(Transition::to(JUMP)));
        }
        Ok(None)
    }
}

pub struct Run;

impl State<Player> for Run {
    fn name(&self) -> &str {
        RUN
    }

    fn on_enter(&mut self, player: &mut Player, _data: &()) {
        player.set_animation(RUN);
    }

    fn on_update(&mut self, player: &mut Player, _dt: f32, _time_in_state: f32) -> StateResult<Option<Transition>> {
        if !player.is_moving() {
            return Ok(Some(Transition::to(IDLE)));
        }
        if player.jump_pressed {
            return Ok(Some(Transition::to(JUMP)));
        }
        Ok(None)
    }
}

pub struct Jump;

impl State<Player> for Jump {
    fn name(&self) -> &str {
        JUMP
    }

    fn on_enter(&mut self, player: &mut Player, _data: &()) {
        player.set_animation(JUMP);
        player.apply_jump_force();
    }

    fn on_update(&mut self, player: &mut Player, _dt: f32, _time_in_state: f32) -> StateResult<Option<Transition>> {
        if player.grounded {
            return Ok(Some(Transition::to(IDLE)));
        }
        Ok(None)
    }
}

/// Build the player machine with its states and transitions registered.
/// The initial state still has to be set.
pub fn player_state_machine() -> StateResult<StateMachine<Player>> {
    let mut machine = StateMachine::new();
    machine.add_state(Idle);
    machine.add_state(Run);
    machine.add_state(Jump);
    for (from, to) in [(IDLE, RUN), (IDLE, JUMP), (RUN, IDLE), (RUN, JUMP), (JUMP, IDLE)] {
        machine.add_transition(from, to)?;
    }
    machine.set_transition_observer(|event: &TransitionEvent| {
        debug!("player: {} -> {}", event.from, event.to);
    });
    Ok(machine)
}

/// A [`Player`] together with the machine driving it.
pub struct PlayerController {
    machine: StateMachine<Player>,
    player: Player,
}

impl PlayerController {
    /// Create a grounded player in the `idle` state.
    pub fn new(x: f32, ground_y: f32) -> StateResult<Self> {
        let mut machine = player_state_machine()?;
        let mut player = Player::new(x, ground_y);
        machine.set_initial_state(IDLE, &mut player, ())?;
        Ok(Self { machine, player })
    }

    /// Read input, let the current state react, then integrate motion.
    pub fn update(&mut self, input: &dyn InputQuery, dt: f32) -> StateResult<()> {
        self.player.read_input(input);
        self.machine.update(&mut self.player, dt)?;
        self.player.integrate(dt);
        Ok(())
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn state(&self) -> &str {
        self.machine.current_state().unwrap_or(IDLE)
    }

    pub fn machine(&self) -> &StateMachine<Player> {
        &self.machine
    }

    /// Force a transition, subject to the registered transition table.
    pub fn change_state(&mut self, name: &str) -> StateResult<()> {
        self.machine.change_state(name, &mut self.player, ())
    }
}
