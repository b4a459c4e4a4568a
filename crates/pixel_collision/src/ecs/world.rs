//! In-memory entity store implementing [`CollisionWorld`]

use super::components::{CollisionShape, MovementComponent, TransformComponent};
use super::{CollisionWorld, Entity, LayerId, ViewId};
use crate::events::MoveBatch;
use crate::foundation::math::Vec2;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct EntityRecord {
    transform: TransformComponent,
    movement: Option<MovementComponent>,
    shape: Option<CollisionShape>,
    view: ViewId,
    layer: LayerId,
}

/// World containing entities with transform, movement and collision data
#[derive(Debug, Default)]
pub struct World {
    next_entity_id: u32,
    entities: BTreeMap<Entity, EntityRecord>,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity placed in `view`/`layer`
    pub fn create_entity(&mut self, view: ViewId, layer: LayerId, position: Vec2) -> Entity {
        let entity = Entity::new(self.next_entity_id);
        self.next_entity_id += 1;
        self.entities.insert(
            entity,
            EntityRecord {
                transform: TransformComponent::from_position(position),
                movement: None,
                shape: None,
                view,
                layer,
            },
        );
        entity
    }

    /// Remove an entity and its components
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        self.entities.remove(&entity).is_some()
    }

    /// Attach or replace the collision shape
    pub fn set_shape(&mut self, entity: Entity, shape: CollisionShape) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.shape = Some(shape);
        }
    }

    /// Move an entity to another view and layer
    ///
    /// The collision engine picks the change up on the next activation or
    /// motion event.
    pub fn set_placement(&mut self, entity: Entity, view: ViewId, layer: LayerId) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.view = view;
            record.layer = layer;
        }
    }

    /// Attach or replace the movement component
    pub fn set_movement(&mut self, entity: Entity, movement: MovementComponent) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.movement = Some(movement);
        }
    }

    /// Movement component, if any
    pub fn movement(&self, entity: Entity) -> Option<&MovementComponent> {
        self.entities.get(&entity)?.movement.as_ref()
    }

    /// Get an iterator over all entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys().copied()
    }

    /// Advance every moving entity by one tick
    ///
    /// Returns the entities whose position changed, in id order.
    pub fn step_motion(&mut self) -> MoveBatch {
        let mut batch = MoveBatch::new();
        for (&entity, record) in &mut self.entities {
            let Some(movement) = record.movement.as_mut() else {
                continue;
            };
            let delta = movement.integrate();
            if delta != Vec2::zeros() {
                record.transform.translate(delta);
                batch.push(entity);
            }
        }
        batch
    }
}

impl CollisionWorld for World {
    fn position(&self, entity: Entity) -> Option<Vec2> {
        self.entities.get(&entity).map(|r| r.transform.position)
    }

    fn set_position(&mut self, entity: Entity, position: Vec2) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.transform.position = position;
        }
    }

    fn velocity(&self, entity: Entity) -> Option<Vec2> {
        self.movement(entity).map(|m| m.velocity)
    }

    fn set_velocity(&mut self, entity: Entity, velocity: Vec2) {
        if let Some(movement) = self.entities.get_mut(&entity).and_then(|r| r.movement.as_mut()) {
            movement.velocity = velocity;
        }
    }

    fn placement(&self, entity: Entity) -> Option<(ViewId, LayerId)> {
        self.entities.get(&entity).map(|r| (r.view, r.layer))
    }

    fn shape(&self, entity: Entity) -> Option<&CollisionShape> {
        self.entities.get(&entity)?.shape.as_ref()
    }

    fn shape_mut(&mut self, entity: Entity) -> Option<&mut CollisionShape> {
        self.entities.get_mut(&entity)?.shape.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Rect;

    #[test]
    fn test_step_motion_reports_moved_entities() {
        let mut world = World::new();
        let moving = world.create_entity(ViewId(0), LayerId(0), Vec2::new(10.0, 10.0));
        let resting = world.create_entity(ViewId(0), LayerId(0), Vec2::zeros());
        world.set_movement(moving, MovementComponent::with_velocity(Vec2::new(3.0, 0.0)));
        world.set_movement(resting, MovementComponent::new());

        let batch = world.step_motion();
        assert_eq!(batch.iter().collect::<Vec<_>>(), vec![moving]);
        assert_eq!(world.position(moving), Some(Vec2::new(13.0, 10.0)));
        assert_eq!(world.position(resting), Some(Vec2::zeros()));
    }

    #[test]
    fn test_bounds_from_shape() {
        let mut world = World::new();
        let entity = world.create_entity(ViewId(1), LayerId(2), Vec2::new(10.0, 10.0));
        assert_eq!(world.bounds(entity), None);

        world.set_shape(entity, CollisionShape::new(10.0, 10.0));
        assert_eq!(world.bounds(entity), Some(Rect::new(10.0, 10.0, 10.0, 10.0)));
        assert_eq!(world.placement(entity), Some((ViewId(1), LayerId(2))));
    }

    #[test]
    fn test_static_entity_ignores_velocity() {
        let mut world = World::new();
        let entity = world.create_entity(ViewId(0), LayerId(0), Vec2::zeros());
        world.set_velocity(entity, Vec2::new(1.0, 1.0));
        assert_eq!(world.velocity(entity), None);
    }
}
