//! Quad-tree spatial partitioning structure
//!
//! Divides a fixed world rectangle into hierarchical quadrants for fast
//! rectangle queries. A node splits into four children once it holds more
//! than `max_entries_per_node` entries and is shallower than `max_depth`.
//!
//! Entries live in the smallest node whose region fully contains their
//! bounds; an entry straddling a quadrant boundary stays in the parent.
//! Bounds outside the world area stay at the root. Nodes never merge back,
//! removal only shrinks entry lists.

use crate::ecs::{Entity, LayerId, ViewId};
use crate::engine::CollisionError;
use crate::foundation::math::Rect;
use crate::spatial::spatial_query::SpatialQuery;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;

new_key_type! {
    /// Handle of a node inside a [`QuadTree`]
    pub struct NodeKey;
}

/// Persisted description of one (view, layer) index
///
/// Every field is mandatory; they are optional here only so a missing one
/// can be reported by name instead of as a parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialIndexConfig {
    /// View the index belongs to
    pub view_id: Option<ViewId>,
    /// Scene layer the index belongs to
    pub layer_id: Option<LayerId>,
    /// Region partitioned by the tree
    pub world_area: Option<Rect>,
    /// Entries a node may hold before splitting
    pub max_entries_per_node: Option<usize>,
    /// Deepest level a node may split to
    pub max_depth: Option<u32>,
}

impl SpatialIndexConfig {
    /// Fully specified configuration
    pub const fn new(
        view_id: ViewId,
        layer_id: LayerId,
        world_area: Rect,
        max_entries_per_node: usize,
        max_depth: u32,
    ) -> Self {
        Self {
            view_id: Some(view_id),
            layer_id: Some(layer_id),
            world_area: Some(world_area),
            max_entries_per_node: Some(max_entries_per_node),
            max_depth: Some(max_depth),
        }
    }

    /// Check every mandatory field and split into key and tree settings
    pub fn validate(&self) -> Result<((ViewId, LayerId), QuadTreeConfig), CollisionError> {
        let view = self.view_id.ok_or(CollisionError::MissingConfig("view_id"))?;
        let layer = self.layer_id.ok_or(CollisionError::MissingConfig("layer_id"))?;
        let world_area = self.world_area.ok_or(CollisionError::MissingConfig("world_area"))?;
        let max_entries_per_node = self
            .max_entries_per_node
            .ok_or(CollisionError::MissingConfig("max_entries_per_node"))?;
        let max_depth = self.max_depth.ok_or(CollisionError::MissingConfig("max_depth"))?;

        if world_area.is_empty() {
            return Err(CollisionError::InvalidConfig(format!(
                "world_area {world_area:?} has no area"
            )));
        }
        if max_entries_per_node == 0 {
            return Err(CollisionError::InvalidConfig(
                "max_entries_per_node must be at least 1".to_string(),
            ));
        }

        Ok((
            (view, layer),
            QuadTreeConfig {
                world_area,
                max_entries_per_node,
                max_depth,
            },
        ))
    }
}

/// Configuration for quad-tree behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadTreeConfig {
    /// Region covered by the root node
    pub world_area: Rect,

    /// Maximum entries per node before subdivision
    pub max_entries_per_node: usize,

    /// Maximum subdivision depth (root is depth 0)
    pub max_depth: u32,
}

/// Entity stored in the quad-tree with its bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadTreeEntry {
    /// Indexed entity
    pub entity: Entity,
    /// Bounds at insertion time
    pub bounds: Rect,
}

/// Single node in the quad-tree hierarchy
#[derive(Debug, Clone)]
pub struct QuadTreeNode {
    /// World-space region of this node
    pub bounds: Rect,

    /// Entries owned by this node, in insertion order
    pub entries: Vec<QuadTreeEntry>,

    /// Child quadrants (NW, NE, SW, SE), None if this is a leaf
    pub children: Option<[NodeKey; 4]>,

    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl QuadTreeNode {
    fn new(bounds: Rect, depth: u32) -> Self {
        Self {
            bounds,
            entries: Vec::new(),
            children: None,
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub const fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Quad-tree spatial partitioning structure
#[derive(Debug, Clone)]
pub struct QuadTree {
    nodes: SlotMap<NodeKey, QuadTreeNode>,
    root: NodeKey,
    config: QuadTreeConfig,
    /// Reverse lookup: which node currently owns each entity
    locations: HashMap<Entity, NodeKey>,
}

impl QuadTree {
    /// Create an empty tree
    pub fn new(config: QuadTreeConfig) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(QuadTreeNode::new(config.world_area, 0));
        Self {
            nodes,
            root,
            config,
            locations: HashMap::new(),
        }
    }

    /// Tree settings
    pub const fn config(&self) -> &QuadTreeConfig {
        &self.config
    }

    /// Root node
    pub fn root(&self) -> &QuadTreeNode {
        &self.nodes[self.root]
    }

    /// Node by key
    pub fn node(&self, key: NodeKey) -> Option<&QuadTreeNode> {
        self.nodes.get(key)
    }

    /// Total number of nodes, leaves included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the node currently holding `entity`
    pub fn depth_of(&self, entity: Entity) -> Option<u32> {
        let key = self.locations.get(&entity)?;
        Some(self.nodes[*key].depth)
    }

    /// Number of indexed entities
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// True when nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Is `entity` indexed?
    pub fn contains(&self, entity: Entity) -> bool {
        self.locations.contains_key(&entity)
    }

    fn containing_child(&self, key: NodeKey, bounds: &Rect) -> Option<NodeKey> {
        let children = self.nodes[key].children?;
        children
            .into_iter()
            .find(|&child| self.nodes[child].bounds.contains_rect(bounds))
    }

    fn should_split(&self, key: NodeKey) -> bool {
        let node = &self.nodes[key];
        node.is_leaf()
            && node.entries.len() > self.config.max_entries_per_node
            && node.depth < self.config.max_depth
    }

    /// Insert an entity, replacing a previous entry for it
    pub fn insert(&mut self, entity: Entity, bounds: Rect) {
        self.remove(entity);

        let mut key = self.root;
        if self.nodes[key].bounds.contains_rect(&bounds) {
            while let Some(child) = self.containing_child(key, &bounds) {
                key = child;
            }
        }

        self.nodes[key].entries.push(QuadTreeEntry { entity, bounds });
        self.locations.insert(entity, key);

        if self.should_split(key) {
            self.subdivide(key);
        }
    }

    /// Split `key` into four quadrants and push entries down, repeating for
    /// any child that ends up over capacity
    fn subdivide(&mut self, key: NodeKey) {
        let mut pending = vec![key];

        while let Some(key) = pending.pop() {
            let (quadrants, depth) = {
                let node = &self.nodes[key];
                (node.bounds.quadrants(), node.depth + 1)
            };
            let children = quadrants.map(|bounds| self.nodes.insert(QuadTreeNode::new(bounds, depth)));
            self.nodes[key].children = Some(children);

            let entries = std::mem::take(&mut self.nodes[key].entries);
            let mut kept = Vec::new();
            for entry in entries {
                match self.containing_child(key, &entry.bounds) {
                    Some(child) => {
                        self.nodes[child].entries.push(entry);
                        self.locations.insert(entry.entity, child);
                    }
                    None => kept.push(entry),
                }
            }
            log::trace!(
                "QuadTree: split node at depth {} ({} entries stay, region {:?})",
                depth - 1,
                kept.len(),
                self.nodes[key].bounds
            );
            self.nodes[key].entries = kept;

            // Reverse so the NW child is handled first.
            for child in children.into_iter().rev() {
                if self.should_split(child) {
                    pending.push(child);
                }
            }
        }
    }

    /// Remove an entity; returns false if it wasn't indexed
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(key) = self.locations.remove(&entity) else {
            return false;
        };
        let entries = &mut self.nodes[key].entries;
        if let Some(index) = entries.iter().position(|e| e.entity == entity) {
            entries.remove(index);
        }
        true
    }

    /// Entities whose bounds overlap `rect`
    ///
    /// Nodes are visited in pre-order (NW, NE, SW, SE) and entries in
    /// insertion order, so the result is reproducible.
    pub fn query(&self, rect: &Rect) -> Vec<Entity> {
        let mut results = Vec::new();
        let mut stack = vec![self.root];

        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            results.extend(
                node.entries
                    .iter()
                    .filter(|entry| entry.bounds.overlaps(rect))
                    .map(|entry| entry.entity),
            );

            if let Some(children) = node.children {
                for child in children.into_iter().rev() {
                    if self.nodes[child].bounds.touches(rect) {
                        stack.push(child);
                    }
                }
            }
        }

        results
    }

    /// Bounds an entity was inserted with
    pub fn bounds_of(&self, entity: Entity) -> Option<Rect> {
        let key = self.locations.get(&entity)?;
        self.nodes[*key]
            .entries
            .iter()
            .find(|e| e.entity == entity)
            .map(|e| e.bounds)
    }

    /// Clear the tree back to a single empty root
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.insert(QuadTreeNode::new(self.config.world_area, 0));
        self.locations.clear();
    }
}

impl SpatialQuery for QuadTree {
    fn insert(&mut self, entity: Entity, bounds: Rect) {
        QuadTree::insert(self, entity, bounds);
    }

    fn remove(&mut self, entity: Entity) -> bool {
        QuadTree::remove(self, entity)
    }

    fn update(&mut self, entity: Entity, bounds: Rect) {
        // insert already replaces the old entry
        QuadTree::insert(self, entity, bounds);
    }

    fn query_rect(&self, rect: &Rect) -> Vec<Entity> {
        self.query(rect)
    }

    fn entity_bounds(&self, entity: Entity) -> Option<Rect> {
        self.bounds_of(entity)
    }

    fn world_area(&self) -> Rect {
        self.config.world_area
    }

    fn clear(&mut self) {
        QuadTree::clear(self);
    }

    fn entity_count(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(max_entries_per_node: usize, max_depth: u32) -> QuadTree {
        QuadTree::new(QuadTreeConfig {
            world_area: Rect::new(0.0, 0.0, 256.0, 256.0),
            max_entries_per_node,
            max_depth,
        })
    }

    fn ids(entities: &[Entity]) -> Vec<u32> {
        let mut ids: Vec<u32> = entities.iter().map(|e| e.id()).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_quadtree_basic_insertion() {
        let mut tree = tree(4, 4);
        tree.insert(Entity::new(1), Rect::new(10.0, 10.0, 5.0, 5.0));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.query(&Rect::new(0.0, 0.0, 20.0, 20.0)), vec![Entity::new(1)]);
    }

    #[test]
    fn test_quadtree_subdivision() {
        let mut tree = tree(2, 3);
        for i in 0..3 {
            tree.insert(Entity::new(i), Rect::new(10.0 + i as f32 * 5.0, 10.0, 2.0, 2.0));
        }

        assert!(!tree.root().is_leaf());
        assert_eq!(tree.len(), 3);
        // All three sit in the NW corner, so they descend until max depth.
        assert_eq!(tree.depth_of(Entity::new(0)), Some(3));
    }

    #[test]
    fn test_quadtree_respects_max_depth() {
        let mut tree = tree(1, 0);
        for i in 0..10 {
            tree.insert(Entity::new(i), Rect::new(1.0, 1.0, 1.0, 1.0));
        }
        assert!(tree.root().is_leaf());
        assert_eq!(tree.root().entries.len(), 10);
    }

    #[test]
    fn test_straddling_entry_stays_in_parent() {
        let mut tree = tree(1, 4);
        tree.insert(Entity::new(1), Rect::new(10.0, 10.0, 4.0, 4.0));
        // Crosses the vertical midline at x = 128.
        tree.insert(Entity::new(2), Rect::new(120.0, 10.0, 16.0, 4.0));

        assert_eq!(tree.depth_of(Entity::new(2)), Some(0));
        assert!(tree.depth_of(Entity::new(1)).unwrap() > 0);
    }

    #[test]
    fn test_out_of_world_entry_is_found() {
        let mut tree = tree(1, 4);
        tree.insert(Entity::new(1), Rect::new(10.0, 10.0, 4.0, 4.0));
        tree.insert(Entity::new(2), Rect::new(300.0, 300.0, 4.0, 4.0));
        tree.insert(Entity::new(3), Rect::new(20.0, 20.0, 4.0, 4.0));

        assert_eq!(tree.depth_of(Entity::new(2)), Some(0));
        assert_eq!(tree.query(&Rect::new(290.0, 290.0, 20.0, 20.0)), vec![Entity::new(2)]);
    }

    #[test]
    fn test_remove_uses_reverse_lookup() {
        let mut tree = tree(1, 4);
        for i in 0..8 {
            tree.insert(Entity::new(i), Rect::new(i as f32 * 30.0, 5.0, 4.0, 4.0));
        }
        let nodes_before = tree.node_count();

        assert!(tree.remove(Entity::new(3)));
        assert!(!tree.remove(Entity::new(3)));
        assert_eq!(tree.len(), 7);
        assert!(!tree.query(&Rect::new(0.0, 0.0, 256.0, 256.0)).contains(&Entity::new(3)));
        // No merge back on removal.
        assert_eq!(tree.node_count(), nodes_before);
    }

    #[test]
    fn test_reinsert_replaces_entry() {
        let mut tree = tree(4, 4);
        tree.insert(Entity::new(1), Rect::new(10.0, 10.0, 4.0, 4.0));
        tree.insert(Entity::new(1), Rect::new(200.0, 200.0, 4.0, 4.0));

        assert_eq!(tree.len(), 1);
        assert!(tree.query(&Rect::new(0.0, 0.0, 50.0, 50.0)).is_empty());
        assert_eq!(tree.bounds_of(Entity::new(1)), Some(Rect::new(200.0, 200.0, 4.0, 4.0)));
    }

    #[test]
    fn test_query_skips_touching_edges() {
        let mut tree = tree(4, 4);
        tree.insert(Entity::new(1), Rect::new(30.0, 10.0, 10.0, 10.0));
        assert!(tree.query(&Rect::new(20.0, 10.0, 10.0, 10.0)).is_empty());
        assert_eq!(tree.query(&Rect::new(22.0, 10.0, 10.0, 10.0)), vec![Entity::new(1)]);
    }

    #[test]
    fn test_query_order_is_deterministic() {
        let build = || {
            let mut tree = tree(2, 5);
            for i in 0..40 {
                let x = (i * 37 % 240) as f32;
                let y = (i * 91 % 240) as f32;
                tree.insert(Entity::new(i), Rect::new(x, y, 12.0, 12.0));
            }
            tree
        };
        let area = Rect::new(40.0, 40.0, 150.0, 150.0);
        assert_eq!(build().query(&area), build().query(&area));
        assert_eq!(ids(&build().query(&area)), ids(&build().query(&area)));
    }

    #[test]
    fn test_clear_resets_root() {
        let mut tree = tree(1, 4);
        for i in 0..6 {
            tree.insert(Entity::new(i), Rect::new(i as f32 * 40.0, 0.0, 4.0, 4.0));
        }
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn test_config_requires_every_field() {
        let full = SpatialIndexConfig::new(
            ViewId(1),
            LayerId(2),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            8,
            4,
        );
        assert!(full.validate().is_ok());

        let missing_area = SpatialIndexConfig { world_area: None, ..full.clone() };
        assert!(matches!(
            missing_area.validate(),
            Err(CollisionError::MissingConfig("world_area"))
        ));

        let missing_view = SpatialIndexConfig { view_id: None, ..full.clone() };
        assert!(matches!(
            missing_view.validate(),
            Err(CollisionError::MissingConfig("view_id"))
        ));

        let missing_depth = SpatialIndexConfig { max_depth: None, ..full };
        assert!(matches!(
            missing_depth.validate(),
            Err(CollisionError::MissingConfig("max_depth"))
        ));
    }

    #[test]
    fn test_config_rejects_degenerate_values() {
        let empty_area =
            SpatialIndexConfig::new(ViewId(0), LayerId(0), Rect::new(0.0, 0.0, 0.0, 10.0), 4, 4);
        assert!(matches!(empty_area.validate(), Err(CollisionError::InvalidConfig(_))));

        let zero_entries =
            SpatialIndexConfig::new(ViewId(0), LayerId(0), Rect::new(0.0, 0.0, 10.0, 10.0), 0, 4);
        assert!(matches!(zero_entries.validate(), Err(CollisionError::InvalidConfig(_))));
    }
}
