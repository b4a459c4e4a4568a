//! Broad phase + narrow phase contact generation
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13:
//! "The collision detection system is typically split into two phases:
//! broad-phase and narrow-phase."
//!
//! Broad phase asks the entity's (view, layer) index for everything near
//! its bounds. Narrow phase keeps candidates whose layers match and whose
//! bounding boxes overlap, then, when both shapes carry pixel masks, only
//! those sharing a solid pixel.

use crate::ecs::components::CollisionShape;
use crate::ecs::{CollisionWorld, Entity};
use crate::foundation::math::Rect;
use crate::physics::collision_registry::CollisionRegistry;
use crate::physics::contact::Contact;

/// Turns moved entities into contact lists
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactPipeline;

impl ContactPipeline {
    /// Create a pipeline
    pub const fn new() -> Self {
        Self
    }

    /// Contacts of `entity` at its current position, in broad-phase order
    ///
    /// Entities without a shape or without collision layers have none.
    pub fn find_contacts(
        &self,
        entity: Entity,
        world: &dyn CollisionWorld,
        registry: &CollisionRegistry,
    ) -> Vec<Contact> {
        let (Some(shape), Some(bounds)) = (world.shape(entity), world.bounds(entity)) else {
            return Vec::new();
        };
        if !shape.is_collidable() {
            return Vec::new();
        }

        registry
            .candidates(entity, &bounds)
            .into_iter()
            .filter(|&other| other != entity)
            .filter_map(|other| {
                let other_shape = world.shape(other)?;
                if !shape.layers.should_collide(other_shape.layers) {
                    return None;
                }
                let other_bounds = world.bounds(other)?;
                Self::narrow_phase(entity, bounds, shape, other, other_bounds, other_shape)
            })
            .collect()
    }

    /// Exact test between two placed shapes
    pub fn narrow_phase(
        entity: Entity,
        bounds: Rect,
        shape: &CollisionShape,
        other: Entity,
        other_bounds: Rect,
        other_shape: &CollisionShape,
    ) -> Option<Contact> {
        let overlap = bounds.intersection(&other_bounds)?;

        let region = match (&shape.mask, &other_shape.mask) {
            (Some(mask), Some(other_mask)) => {
                // Masks are anchored at their bounding rectangle origins.
                let offset_x = (other_bounds.x - bounds.x).round() as i32;
                let offset_y = (other_bounds.y - bounds.y).round() as i32;
                if !mask.intersects_mask(offset_x, offset_y, other_mask) {
                    return None;
                }
                mask.intersection_region(offset_x, offset_y, other_mask)
            }
            _ => None,
        };

        Some(Contact {
            entity,
            other,
            bounds: overlap.translated(-bounds.origin()),
            region,
            contact_type: other_shape.contact_type,
        })
    }

    /// Replace the entity's published contact list
    pub fn publish(world: &mut dyn CollisionWorld, entity: Entity, contacts: &[Contact]) {
        if let Some(shape) = world.shape_mut(entity) {
            shape.contacts.clear();
            shape.contacts.extend_from_slice(contacts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{LayerId, ViewId, World};
    use crate::foundation::math::Vec2;
    use crate::physics::collision_layers::CollisionLayers;
    use crate::physics::contact::ContactType;
    use crate::physics::pixel_mask::PixelMask;
    use crate::spatial::SpatialIndexConfig;
    use std::sync::Arc;

    struct Scene {
        world: World,
        registry: CollisionRegistry,
    }

    impl Scene {
        fn new() -> Self {
            let mut registry = CollisionRegistry::new();
            registry
                .configure(&SpatialIndexConfig::new(
                    ViewId(0),
                    LayerId(0),
                    Rect::new(0.0, 0.0, 256.0, 256.0),
                    4,
                    4,
                ))
                .unwrap();
            Self { world: World::new(), registry }
        }

        fn spawn(&mut self, x: f32, y: f32, shape: CollisionShape) -> Entity {
            let entity = self.world.create_entity(ViewId(0), LayerId(0), Vec2::new(x, y));
            self.world.set_shape(entity, shape);
            self.registry.on_entity_activated(entity, &self.world);
            entity
        }

        fn contacts(&self, entity: Entity) -> Vec<Contact> {
            ContactPipeline::new().find_contacts(entity, &self.world, &self.registry)
        }
    }

    #[test]
    fn test_box_contact_is_local_to_mover() {
        let mut scene = Scene::new();
        let a = scene.spawn(22.0, 10.0, CollisionShape::new(10.0, 10.0));
        let b = scene.spawn(30.0, 10.0, CollisionShape::new(10.0, 10.0).with_contact_type(ContactType::Ladder));

        let contacts = scene.contacts(a);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].other, b);
        assert_eq!(contacts[0].bounds, Rect::new(8.0, 0.0, 2.0, 10.0));
        assert_eq!(contacts[0].contact_type, ContactType::Ladder);
        assert!(contacts[0].is_box_only());
    }

    #[test]
    fn test_layer_filtering() {
        let mut scene = Scene::new();
        let a = scene.spawn(
            10.0,
            10.0,
            CollisionShape::new(10.0, 10.0).with_layers(CollisionLayers::PLAYER),
        );
        scene.spawn(
            15.0,
            10.0,
            CollisionShape::new(10.0, 10.0).with_layers(CollisionLayers::PICKUP),
        );
        let wall = scene.spawn(
            12.0,
            12.0,
            CollisionShape::new(10.0, 10.0).with_layers(CollisionLayers::PLAYER | CollisionLayers::ENVIRONMENT),
        );

        let contacts = scene.contacts(a);
        assert_eq!(contacts.iter().map(|c| c.other).collect::<Vec<_>>(), vec![wall]);
    }

    #[test]
    fn test_no_layers_means_no_contacts() {
        let mut scene = Scene::new();
        let ghost = scene.spawn(
            10.0,
            10.0,
            CollisionShape::new(10.0, 10.0).with_layers(CollisionLayers::empty()),
        );
        scene.spawn(12.0, 10.0, CollisionShape::new(10.0, 10.0));
        assert!(scene.contacts(ghost).is_empty());
    }

    #[test]
    fn test_masks_refine_box_overlap() {
        let mut scene = Scene::new();
        // Solid only in the right column / left column respectively.
        let right_edge = Arc::new(PixelMask::from_fn(10, 10, |x, _| x == 9));
        let left_edge = Arc::new(PixelMask::from_fn(10, 10, |x, _| x == 0));

        let a = scene.spawn(0.0, 0.0, CollisionShape::from_mask(Arc::clone(&right_edge)));
        // Boxes overlap by 5 columns, but the solid columns don't meet.
        let b = scene.spawn(5.0, 0.0, CollisionShape::from_mask(Arc::clone(&left_edge)));
        assert!(scene.contacts(a).is_empty());

        // Overlap of one column where both solid columns line up.
        scene.world.set_position(b, Vec2::new(9.0, 0.0));
        scene.registry.refresh(b, &scene.world);
        let contacts = scene.contacts(a);
        assert_eq!(contacts.len(), 1);
        let region = contacts[0].region.as_ref().unwrap();
        assert_eq!(region.bits.count_set(), 10);
    }

    #[test]
    fn test_mask_against_plain_box_uses_box() {
        let mut scene = Scene::new();
        let sparse = Arc::new(PixelMask::new(10, 10));
        let a = scene.spawn(0.0, 0.0, CollisionShape::from_mask(sparse));
        scene.spawn(5.0, 5.0, CollisionShape::new(10.0, 10.0));

        let contacts = scene.contacts(a);
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].region.is_none());
    }

    #[test]
    fn test_publish_replaces_contacts() {
        let mut scene = Scene::new();
        let a = scene.spawn(10.0, 10.0, CollisionShape::new(10.0, 10.0));
        scene.spawn(15.0, 10.0, CollisionShape::new(10.0, 10.0));

        let contacts = scene.contacts(a);
        ContactPipeline::publish(&mut scene.world, a, &contacts);
        ContactPipeline::publish(&mut scene.world, a, &contacts);
        assert_eq!(scene.world.shape(a).unwrap().contacts.len(), 1);
        assert!(scene.world.shape(a).unwrap().touching(ContactType::Solid));

        ContactPipeline::publish(&mut scene.world, a, &[]);
        assert!(scene.world.shape(a).unwrap().contacts.is_empty());
    }
}
