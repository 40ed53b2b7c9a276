//! Kinematic body component.
//!
//! [`Physics`] stores the velocity and constant vertical acceleration of an
//! entity. The [`PhysicsSystem`](crate::systems::physics::PhysicsSystem)
//! consumes it together with a [`Transform`](super::transform::Transform)
//! using semi-implicit Euler: velocity first, then position.

use serde::{Deserialize, Serialize};

const DEFAULT_SPEED: f32 = 3.0;

/// Kinematic body storing velocity and gravity.
///
/// # Fields
/// - `velocity_x`, `velocity_y` - current velocity in world units per second
/// - `gravity` - vertical acceleration in world units per second squared
/// - `speed` - movement speed hint for controllers (not used by integration)
///
/// # Example
/// ```ignore
/// let body = Physics::new().with_gravity(9.8).with_velocity(0.0, -120.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Physics {
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub gravity: f32,
    pub speed: f32,
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

impl Physics {
    /// Create a body at rest without gravity.
    pub fn new() -> Self {
        Self {
            velocity_x: 0.0,
            velocity_y: 0.0,
            gravity: 0.0,
            speed: DEFAULT_SPEED,
        }
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.velocity_x = vx;
        self.velocity_y = vy;
        self
    }

    pub fn set_velocity(&mut self, vx: f32, vy: f32) {
        self.velocity_x = vx;
        self.velocity_y = vy;
    }

    /// Get the current velocity as `(x, y)`.
    pub fn velocity(&self) -> (f32, f32) {
        (self.velocity_x, self.velocity_y)
    }

    /// Advance the velocity by `dt` seconds of gravity and return the
    /// displacement to apply to the position.
    pub fn integrate(&mut self, dt: f32) -> (f32, f32) {
        self.velocity_y += self.gravity * dt;
        (self.velocity_x * dt, self.velocity_y * dt)
    }
}
