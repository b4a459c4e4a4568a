//! Collision shape component
//!
//! Based on Game Engine Architecture 3rd Edition:
//! - Section 13.3: Collision Detection System
//! - Section 16.2: Component-based architecture
//!
//! The shape is stored in entity-local space (offset from the entity
//! position) and placed in the world only when a test needs it.

use crate::foundation::math::{Rect, Vec2};
use crate::physics::collision_layers::CollisionLayers;
use crate::physics::contact::{Contact, ContactType};
use crate::physics::pixel_mask::PixelMask;
use std::sync::Arc;

/// Component that gives an entity a collidable shape
#[derive(Debug, Clone)]
pub struct CollisionShape {
    /// Offset of the bounding rectangle from the entity position
    pub offset: Vec2,

    /// Bounding rectangle width
    pub width: f32,

    /// Bounding rectangle height
    pub height: f32,

    /// Optional per-pixel shape, aligned with the bounding rectangle origin
    pub mask: Option<Arc<PixelMask>>,

    /// Layers this shape participates in; empty disables collision
    pub layers: CollisionLayers,

    /// Behaviour reported to whoever runs into this shape
    pub contact_type: ContactType,

    /// Contacts found in the latest resolution pass, in discovery order
    pub contacts: Vec<Contact>,
}

impl CollisionShape {
    /// Create a solid box shape on every layer
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            offset: Vec2::zeros(),
            width,
            height,
            mask: None,
            layers: CollisionLayers::ALL,
            contact_type: ContactType::Solid,
            contacts: Vec::new(),
        }
    }

    /// Create a shape sized to a pixel mask
    pub fn from_mask(mask: Arc<PixelMask>) -> Self {
        let mut shape = Self::new(mask.width() as f32, mask.height() as f32);
        shape.mask = Some(mask);
        shape
    }

    /// Builder pattern: set the local offset
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Builder pattern: set collision layers
    pub fn with_layers(mut self, layers: CollisionLayers) -> Self {
        self.layers = layers;
        self
    }

    /// Builder pattern: set the contact type
    pub fn with_contact_type(mut self, contact_type: ContactType) -> Self {
        self.contact_type = contact_type;
        self
    }

    /// Builder pattern: attach a pixel mask
    pub fn with_mask(mut self, mask: Arc<PixelMask>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Bounding rectangle for an entity at `position`
    pub fn world_bounds(&self, position: Vec2) -> Rect {
        Rect::new(
            position.x + self.offset.x,
            position.y + self.offset.y,
            self.width,
            self.height,
        )
    }

    /// Does this shape take part in collision at all?
    pub fn is_collidable(&self) -> bool {
        !self.layers.is_empty()
    }

    /// Is the shape touching a contact of the given type?
    pub fn touching(&self, contact_type: ContactType) -> bool {
        self.contacts.iter().any(|c| c.contact_type == contact_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_bounds_applies_offset() {
        let shape = CollisionShape::new(10.0, 20.0).with_offset(Vec2::new(-5.0, -20.0));
        assert_eq!(
            shape.world_bounds(Vec2::new(100.0, 50.0)),
            Rect::new(95.0, 30.0, 10.0, 20.0)
        );
    }

    #[test]
    fn test_mask_shape_takes_mask_size() {
        let shape = CollisionShape::from_mask(Arc::new(PixelMask::new(6, 4)));
        assert_eq!((shape.width, shape.height), (6.0, 4.0));
        assert!(shape.mask.is_some());
    }

    #[test]
    fn test_empty_layers_not_collidable() {
        let shape = CollisionShape::new(1.0, 1.0).with_layers(CollisionLayers::empty());
        assert!(!shape.is_collidable());
    }
}
