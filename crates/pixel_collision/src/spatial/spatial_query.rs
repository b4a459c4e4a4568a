//! Abstract spatial query interface for broad-phase collision detection
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.2:
//! "Spatial partitioning schemes... allow us to quickly cull out pairs of
//! objects that cannot possibly be colliding."
//!
//! This abstraction allows swapping different spatial partitioning schemes
//! (quad-tree, grid, BVH, etc.) without changing the collision registry.

use crate::ecs::Entity;
use crate::foundation::math::Rect;

/// Abstract interface for spatial partitioning used in broad-phase collision detection
pub trait SpatialQuery: Send + Sync {
    /// Insert an entity with its world bounds, replacing any previous entry
    fn insert(&mut self, entity: Entity, bounds: Rect);

    /// Remove an entity; returns false if it wasn't indexed
    fn remove(&mut self, entity: Entity) -> bool;

    /// Update an entity's bounds in the spatial structure
    fn update(&mut self, entity: Entity, bounds: Rect) {
        self.remove(entity);
        self.insert(entity, bounds);
    }

    /// Entities whose bounds overlap `rect`, in a deterministic order
    fn query_rect(&self, rect: &Rect) -> Vec<Entity>;

    /// Bounds an entity was last indexed with
    fn entity_bounds(&self, entity: Entity) -> Option<Rect>;

    /// Region of the world the structure partitions
    fn world_area(&self) -> Rect;

    /// Clear all entities from the spatial structure
    fn clear(&mut self);

    /// Get the number of entities in the structure
    fn entity_count(&self) -> usize;
}
