//! Transform component for the ECS system
//!
//! Pure data component holding an entity's world position. Positions are
//! y-down pixel coordinates.

use crate::foundation::math::Vec2;

/// ECS Transform component
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformComponent {
    /// World space position of the entity origin
    pub position: Vec2,
}

impl TransformComponent {
    /// Create from position only
    pub fn from_position(position: Vec2) -> Self {
        Self { position }
    }

    /// Move by `delta`
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}
