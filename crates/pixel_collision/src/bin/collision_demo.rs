//! Collision Demo
//!
//! Replays two small scenes tick by tick with logging:
//! - A box sliding into a static wall, resolved by axis separation
//! - A player falling onto a tile floor, snapped by the ground scan
//!
//! Run with `RUST_LOG=debug` to see the engine's own log lines. An optional
//! `.toml`/`.ron` engine config path replaces the wall scene's defaults.

use pixel_collision::foundation::logging;
use pixel_collision::physics::GroundScanConfig;
use pixel_collision::prelude::*;
use std::sync::Arc;

// Scene settings
const WORLD_SIZE: f32 = 256.0;
const BOX_SIZE: f32 = 10.0;
const WALL_TICKS: usize = 6;
const FALL_TICKS: usize = 8;
const TILE_SIZE: f32 = 8.0;
const GRAVITY: f32 = 1.0;

fn index_config() -> SpatialIndexConfig {
    SpatialIndexConfig::new(
        ViewId(0),
        LayerId(0),
        Rect::new(0.0, 0.0, WORLD_SIZE, WORLD_SIZE),
        4,
        6,
    )
}

fn wall_scene(config: &EngineConfig) -> Result<(), CollisionError> {
    log::info!("=== Wall scene ===");
    let mut engine = CollisionEngine::new(config, None)?;
    let mut world = World::new();

    let mover = world.create_entity(ViewId(0), LayerId(0), Vec2::new(10.0, 10.0));
    world.set_shape(mover, CollisionShape::new(BOX_SIZE, BOX_SIZE));
    world.set_movement(mover, MovementComponent::with_velocity(Vec2::new(3.0, 0.0)));

    let wall = world.create_entity(ViewId(0), LayerId(0), Vec2::new(30.0, 10.0));
    world.set_shape(
        wall,
        CollisionShape::new(BOX_SIZE, BOX_SIZE).with_layers(CollisionLayers::ENVIRONMENT | CollisionLayers::PLAYER),
    );

    let mut queue = EventQueue::new();
    queue.send(CollisionEvent::EntityActivated(mover));
    queue.send(CollisionEvent::EntityActivated(wall));
    engine.process_events(&mut queue, &mut world);

    for tick in 1..=WALL_TICKS {
        let moved = world.step_motion();
        if moved.is_empty() {
            log::info!("tick {tick}: at rest");
            continue;
        }
        engine.on_entity_moved(&moved, &mut world);

        let contacts = world.shape(mover).map(|shape| shape.contacts.len()).unwrap_or_default();
        log::info!(
            "tick {tick}: position {:?}, velocity {:?}, {contacts} contact(s)",
            world.position(mover).unwrap_or_else(Vec2::zeros),
            world.velocity(mover).unwrap_or_else(Vec2::zeros)
        );
        for pair in engine.collisions_entered() {
            log::info!("tick {tick}: {:?} and {:?} started touching", pair.entity_a, pair.entity_b);
        }
    }
    Ok(())
}

fn platform_scene() -> Result<(), CollisionError> {
    log::info!("=== Platform scene ===");
    let level = Entity::new(u32::MAX);
    let mut tiles = TileMap::new(Vec2::zeros(), Vec2::new(TILE_SIZE, TILE_SIZE), 32, 32);
    for column in 0..32 {
        tiles.set_tile(column, 10, level, ContactType::Solid);
    }

    let config = EngineConfig {
        resolver: ResolverConfig::GroundScan(GroundScanConfig::default()),
        indices: vec![index_config()],
    };
    let mut engine = CollisionEngine::new(&config, Some(Arc::new(tiles)))?;
    let mut world = World::new();

    let player = world.create_entity(ViewId(0), LayerId(0), Vec2::new(40.0, 60.0));
    world.set_shape(player, CollisionShape::new(TILE_SIZE, TILE_SIZE).with_layers(CollisionLayers::PLAYER));
    world.set_movement(player, MovementComponent::new().with_acceleration(Vec2::new(0.0, GRAVITY)));
    engine.on_entity_activated(player, &world);

    for tick in 1..=FALL_TICKS {
        let moved = world.step_motion();
        engine.on_entity_moved(&moved, &mut world);
        let state = engine.ground_state(player).unwrap_or_default();
        log::info!(
            "tick {tick}: position {:?}, on_ground {}",
            world.position(player).unwrap_or_else(Vec2::zeros),
            state.on_ground
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading engine config from {path}");
            EngineConfig::load_from_file(&path)?
        }
        None => EngineConfig {
            resolver: ResolverConfig::default(),
            indices: vec![index_config()],
        },
    };

    wall_scene(&config)?;
    platform_scene()?;
    Ok(())
}
