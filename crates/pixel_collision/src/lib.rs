//! # Pixel Collision
//!
//! Pixel-accurate 2D collision detection and resolution.
//!
//! ## Features
//!
//! - **Pixel Masks**: Bit-packed per-pixel solidity with point, rectangle and mask overlap tests
//! - **Quad-tree Broad Phase**: One spatial index per (view, layer)
//! - **Event Driven**: Activation, motion and view lifecycle entry points
//! - **Pluggable Resolution**: Axis-separated and platformer ground-scan strategies
//! - **Deterministic**: Identical inputs yield identical contacts and corrections
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixel_collision::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::load_from_file("collision.ron")?;
//!     let mut engine = CollisionEngine::new(&config, None)?;
//!     let mut world = World::new();
//!
//!     let player = world.create_entity(ViewId(0), LayerId(0), Vec2::new(10.0, 10.0));
//!     world.set_shape(player, CollisionShape::new(10.0, 10.0));
//!     world.set_movement(player, MovementComponent::with_velocity(Vec2::new(3.0, 0.0)));
//!     engine.on_entity_activated(player, &world);
//!
//!     let moved = world.step_motion();
//!     engine.on_entity_moved(&moved, &mut world);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod physics;
pub mod spatial;

mod engine;

pub use engine::{CollisionEngine, CollisionError, EngineConfig};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, Format},
        ecs::{
            components::{CollisionShape, MovementComponent, TransformComponent},
            CollisionWorld, Entity, LayerId, ViewId, World,
        },
        events::{CollisionEvent, CollisionHandler, EventQueue, MoveBatch},
        foundation::math::{PixelRect, Rect, Vec2},
        physics::{
            AxisMask, CollisionLayers, CollisionPair, Contact, ContactType, GroundState, MaskError, PixelMask,
            Resolution, ResolverConfig, TileGrid, TileHit, TileMap,
        },
        spatial::{QuadTree, SpatialIndexConfig, SpatialQuery},
        CollisionEngine, CollisionError, EngineConfig,
    };
}
