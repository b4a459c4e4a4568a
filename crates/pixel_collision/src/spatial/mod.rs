//! Spatial partitioning data structures
//!
//! Provides efficient spatial indexing for broad-phase collision
//! candidate lookup in 2D space.

pub mod quadtree;
pub mod spatial_query;

pub use quadtree::{QuadTree, QuadTreeConfig, QuadTreeEntry, QuadTreeNode, SpatialIndexConfig};
pub use spatial_query::SpatialQuery;
