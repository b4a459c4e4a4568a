//! Contact records produced by the narrow phase

use crate::ecs::Entity;
use crate::foundation::math::Rect;
use crate::physics::pixel_mask::MaskRegion;
use serde::{Deserialize, Serialize};

/// How a shape behaves when something runs into it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    /// Blocks movement
    #[default]
    Solid,
    /// Climbable; reported but never pushes back
    Ladder,
    /// Reported to handlers only
    Trigger,
}

impl ContactType {
    /// Does this contact push the moving entity out?
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Solid)
    }
}

/// One confirmed overlap between a moving entity and another shape
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    /// The entity that moved
    pub entity: Entity,
    /// The shape it ran into
    pub other: Entity,
    /// Overlap rectangle relative to the moving entity's bounds origin
    pub bounds: Rect,
    /// Common solid pixels, present when both shapes carry masks
    pub region: Option<MaskRegion>,
    /// Copied from the other shape
    pub contact_type: ContactType,
}

impl Contact {
    /// Contact resolved on bounding boxes alone
    pub const fn is_box_only(&self) -> bool {
        self.region.is_none()
    }
}

/// Collision pair representing two entities that are touching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// Lower entity id
    pub entity_a: Entity,
    /// Higher entity id
    pub entity_b: Entity,
}

impl CollisionPair {
    /// Create a new collision pair (always stores smaller entity ID first for consistency)
    pub fn new(entity_a: Entity, entity_b: Entity) -> Self {
        if entity_a.id() <= entity_b.id() {
            Self { entity_a, entity_b }
        } else {
            Self { entity_a: entity_b, entity_b: entity_a }
        }
    }

    /// Does this pair involve `entity`?
    pub fn involves(&self, entity: Entity) -> bool {
        self.entity_a == entity || self.entity_b == entity
    }
}
