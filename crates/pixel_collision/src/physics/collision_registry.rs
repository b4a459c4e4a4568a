//! Per-(view, layer) broad-phase index table
//!
//! Each configured (view, layer) pair owns its own spatial structure.
//! Activation events add entities to the structure of their placement,
//! deactivation removes them and deleting a view drops every structure
//! registered under it.

use crate::ecs::{CollisionWorld, Entity, LayerId, ViewId};
use crate::engine::CollisionError;
use crate::foundation::math::Rect;
use crate::spatial::{QuadTree, SpatialIndexConfig, SpatialQuery};
use std::collections::{BTreeMap, HashMap};

/// Key of one spatial index
pub type IndexKey = (ViewId, LayerId);

/// What deleting a view removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletedView {
    /// Number of indices dropped
    pub indices: usize,
    /// Entities that were members of those indices, in id order
    pub members: Vec<Entity>,
}

/// Keyed store of broad-phase structures
#[derive(Default)]
pub struct CollisionRegistry {
    indices: BTreeMap<IndexKey, Box<dyn SpatialQuery>>,
    /// Which index each active entity lives in
    memberships: HashMap<Entity, IndexKey>,
}

impl CollisionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a quad-tree from persisted configuration and register it
    ///
    /// Replaces any index already configured for the same key; entities of
    /// the old index must be activated again.
    pub fn configure(&mut self, config: &SpatialIndexConfig) -> Result<IndexKey, CollisionError> {
        let (key, tree_config) = config.validate()?;
        log::debug!(
            "CollisionRegistry: configured index for view {:?} layer {:?} over {:?}",
            key.0,
            key.1,
            tree_config.world_area
        );
        self.insert_index(key, Box::new(QuadTree::new(tree_config)));
        Ok(key)
    }

    /// Register a custom spatial structure for `key`
    pub fn insert_index(&mut self, key: IndexKey, index: Box<dyn SpatialQuery>) {
        if self.indices.insert(key, index).is_some() {
            log::warn!("CollisionRegistry: replaced existing index for {key:?}");
            self.memberships.retain(|_, member_key| *member_key != key);
        }
    }

    /// Spatial structure for a (view, layer) pair
    pub fn index(&self, view: ViewId, layer: LayerId) -> Option<&dyn SpatialQuery> {
        self.indices.get(&(view, layer)).map(|index| &**index)
    }

    /// Number of configured indices
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Index the entity is currently a member of
    pub fn membership(&self, entity: Entity) -> Option<IndexKey> {
        self.memberships.get(&entity).copied()
    }

    /// Add an activated entity to the index of its placement
    ///
    /// Returns false when the entity has no shape or its (view, layer) has no
    /// index; such entities never take part in broad-phase queries.
    pub fn on_entity_activated(&mut self, entity: Entity, world: &dyn CollisionWorld) -> bool {
        let (Some(key), Some(bounds)) = (world.placement(entity), world.bounds(entity)) else {
            log::trace!("CollisionRegistry: {entity:?} has no placement or shape, skipped");
            return false;
        };
        self.place(entity, key, bounds)
    }

    /// Remove a deactivated entity from its index
    pub fn on_entity_deactivated(&mut self, entity: Entity) -> bool {
        let Some(key) = self.memberships.remove(&entity) else {
            return false;
        };
        if let Some(index) = self.indices.get_mut(&key) {
            index.remove(entity);
        }
        true
    }

    /// Re-index a moved entity with its current bounds and placement
    ///
    /// Entities that were never activated are left alone.
    pub fn refresh(&mut self, entity: Entity, world: &dyn CollisionWorld) -> bool {
        let Some(old_key) = self.membership(entity) else {
            return false;
        };
        let (Some(key), Some(bounds)) = (world.placement(entity), world.bounds(entity)) else {
            return self.on_entity_deactivated(entity);
        };
        if key != old_key {
            log::trace!("CollisionRegistry: {entity:?} moved from {old_key:?} to {key:?}");
        }
        self.place(entity, key, bounds)
    }

    fn place(&mut self, entity: Entity, key: IndexKey, bounds: Rect) -> bool {
        if self.membership(entity).is_some_and(|old_key| old_key != key) {
            self.on_entity_deactivated(entity);
        }
        let Some(index) = self.indices.get_mut(&key) else {
            log::trace!("CollisionRegistry: no index for {key:?}, {entity:?} skipped");
            return false;
        };
        index.update(entity, bounds);
        self.memberships.insert(entity, key);
        true
    }

    /// Candidates overlapping `rect` in the index holding `entity`
    pub fn candidates(&self, entity: Entity, rect: &Rect) -> Vec<Entity> {
        self.membership(entity)
            .and_then(|key| self.indices.get(&key))
            .map(|index| index.query_rect(rect))
            .unwrap_or_default()
    }

    /// Drop every index of a deleted view
    ///
    /// Unknown or empty views are fine and remove nothing.
    pub fn on_view_deleted(&mut self, view: ViewId) -> DeletedView {
        let before = self.indices.len();
        self.indices.retain(|(index_view, _), _| *index_view != view);

        let mut members = Vec::new();
        self.memberships.retain(|&entity, (member_view, _)| {
            let keep = *member_view != view;
            if !keep {
                members.push(entity);
            }
            keep
        });
        members.sort_unstable();

        let deleted = DeletedView {
            indices: before - self.indices.len(),
            members,
        };
        log::debug!(
            "CollisionRegistry: view {view:?} deleted, dropped {} index(es) and {} member(s)",
            deleted.indices,
            deleted.members.len()
        );
        deleted
    }
}
