//! Collision layer system for filtering collision detection
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.8:
//! "Most games need to filter collisions... This is typically done via
//! collision layers or groups."
//!
//! A shape belongs to a set of layers. Two shapes are collision candidates
//! when their layer sets share at least one layer.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of collision layers a shape participates in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CollisionLayers: u32 {
        /// Player character layer
        const PLAYER = 1 << 0;
        /// Enemy character layer
        const ENEMY = 1 << 1;
        /// Projectiles (bullets, missiles, etc.)
        const PROJECTILE = 1 << 2;
        /// Static level geometry
        const ENVIRONMENT = 1 << 3;
        /// Trigger volumes (no physical response)
        const TRIGGER = 1 << 4;
        /// Pickups and collectibles
        const PICKUP = 1 << 5;
        /// Climbable surfaces
        const LADDER = 1 << 6;
        /// Every layer, including user-defined bits 7-31
        const ALL = u32::MAX;
    }
}

impl CollisionLayers {
    /// Single user-defined layer by bit index
    ///
    /// Returns an empty set for indices past bit 31.
    pub const fn layer(index: u32) -> Self {
        if index < 32 {
            Self::from_bits_retain(1 << index)
        } else {
            Self::empty()
        }
    }

    /// Check if two shapes should be tested against each other
    pub const fn should_collide(self, other: Self) -> bool {
        self.intersects(other)
    }
}
