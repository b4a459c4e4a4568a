//! Entity-Component-System collaborator interface
//!
//! Entity storage is owned by the host game. The collision engine reaches it
//! only through [`CollisionWorld`]; [`World`] is a small in-memory store
//! implementing it for tests, demos and tools.

pub mod world;
pub mod entity;
pub mod components;

pub use world::World;
pub use entity::{Entity, ViewId, LayerId};

use crate::foundation::math::{Rect, Vec2};
use components::CollisionShape;

/// Transform/movement/shape access the collision engine needs from the host
pub trait CollisionWorld {
    /// Current world position
    fn position(&self, entity: Entity) -> Option<Vec2>;

    /// Move the entity
    fn set_position(&mut self, entity: Entity, position: Vec2);

    /// Current velocity in pixels per tick; `None` for static entities
    fn velocity(&self, entity: Entity) -> Option<Vec2>;

    /// Overwrite the velocity; ignored for static entities
    fn set_velocity(&mut self, entity: Entity, velocity: Vec2);

    /// View and scene layer the entity is placed in
    fn placement(&self, entity: Entity) -> Option<(ViewId, LayerId)>;

    /// Collision shape, if the entity has one
    fn shape(&self, entity: Entity) -> Option<&CollisionShape>;

    /// Mutable collision shape, used to publish contacts
    fn shape_mut(&mut self, entity: Entity) -> Option<&mut CollisionShape>;

    /// World-space bounding rectangle of the entity's shape
    fn bounds(&self, entity: Entity) -> Option<Rect> {
        let position = self.position(entity)?;
        Some(self.shape(entity)?.world_bounds(position))
    }
}
