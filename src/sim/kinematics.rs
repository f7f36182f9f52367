//! Vertical kinematics for the bird
//!
//! Fixed unit timestep: one call advances exactly one rendered frame. There is
//! no variable-timestep handling, so changing the frame cap changes the feel.

use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::config::GameConfig;

/// Advance one frame with semi-implicit Euler.
///
/// Velocity is updated first, then position uses the new velocity:
/// `v' = v + g`, `p' = p + v'`.
#[inline]
pub fn advance(position: f32, velocity: f32, gravity: f32) -> (f32, f32) {
    let velocity = velocity + gravity;
    (position + velocity, velocity)
}

/// Apply a flap impulse.
///
/// Overrides the current velocity rather than adding to it, so repeated flaps
/// within one frame are idempotent.
#[inline]
pub fn flap(_velocity: f32, flap_power: f32) -> f32 {
    flap_power
}

/// The player-controlled entity. Only `y` and `velocity` change during play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bird {
    /// Fixed left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Vertical velocity (positive = down)
    pub velocity: f32,
    pub width: f32,
    pub height: f32,
}

impl Bird {
    /// Bird at rest, vertically centred in the world
    pub fn new(config: &GameConfig) -> Self {
        Self {
            x: config.bird_x,
            y: config.bird_start_y(),
            velocity: 0.0,
            width: config.bird_width,
            height: config.bird_height,
        }
    }

    pub fn flap(&mut self, flap_power: f32) {
        self.velocity = flap(self.velocity, flap_power);
    }

    /// One frame of gravity
    pub fn step(&mut self, gravity: f32) {
        (self.y, self.velocity) = advance(self.y, self.velocity, gravity);
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }
}
