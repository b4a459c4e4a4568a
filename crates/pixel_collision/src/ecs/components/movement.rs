//! Movement component for entities that can move in 2D space
//!
//! Velocities are expressed in pixels per tick; the external scheduler
//! advances the simulation in whole ticks.

use crate::foundation::math::Vec2;

/// Component for entities that can move
#[derive(Debug, Clone, PartialEq)]
pub struct MovementComponent {
    /// Linear velocity in pixels per tick
    pub velocity: Vec2,

    /// Velocity change applied each tick (e.g. gravity)
    pub acceleration: Vec2,

    /// Whether movement is enabled
    pub enabled: bool,
}

impl MovementComponent {
    /// Create a new movement component at rest
    pub fn new() -> Self {
        Self {
            velocity: Vec2::zeros(),
            acceleration: Vec2::zeros(),
            enabled: true,
        }
    }

    /// Create a movement component with initial velocity
    pub fn with_velocity(velocity: Vec2) -> Self {
        Self {
            velocity,
            ..Self::new()
        }
    }

    /// Builder pattern: constant acceleration
    pub fn with_acceleration(mut self, acceleration: Vec2) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Advance one tick and return the position delta
    pub fn integrate(&mut self) -> Vec2 {
        if !self.enabled {
            return Vec2::zeros();
        }
        self.velocity += self.acceleration;
        self.velocity
    }
}

impl Default for MovementComponent {
    fn default() -> Self {
        Self::new()
    }
}
