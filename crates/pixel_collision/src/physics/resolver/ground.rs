//! Platformer resolution: axis separation plus a ground ray scan
//!
//! After contact-based resolution, a narrow column under the entity's
//! bottom center is intersected with the level's tile grid. When a ground
//! surface lies within the scan depth the entity snaps onto it, unless it is
//! moving upward. Entities that were on the ground last pass also snap down
//! onto a surface below them, which keeps them glued to steps and slopes.
//!
//! Solid tiles are ground. Ladder tiles are ground only from above; an
//! entity overlapping one is flagged as on a ladder instead.

use super::{AxisMask, AxisSeparatedResolver, CollisionResolver, GroundScanConfig, ResolveContext, Resolution};
use crate::ecs::Entity;
use crate::foundation::math::{Rect, Vec2};
use crate::physics::contact::{Contact, ContactType};
use std::collections::HashMap;
use std::sync::Arc;

/// One tile returned by a [`TileGrid`] query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileHit {
    /// Entity owning the tile layer
    pub entity: Entity,
    /// World x of the tile's left edge
    pub x: f32,
    /// World y of the tile's top edge
    pub y: f32,
    /// How the tile behaves
    pub kind: ContactType,
}

impl TileHit {
    /// World rectangle of the tile
    pub fn rect(&self, tile_size: Vec2) -> Rect {
        Rect::new(self.x, self.y, tile_size.x, tile_size.y)
    }
}

/// Level geometry the ground scan samples
pub trait TileGrid: Send + Sync {
    /// Size of one tile in pixels
    fn tile_size(&self) -> Vec2;

    /// Tiles overlapping `rect`, row by row from the top
    fn tiles_in(&self, rect: &Rect) -> Vec<TileHit>;
}

/// Dense grid of tiles anchored at a world origin
#[derive(Debug, Clone)]
pub struct TileMap {
    origin: Vec2,
    tile_size: Vec2,
    columns: u32,
    rows: u32,
    cells: Vec<Option<(Entity, ContactType)>>,
}

impl TileMap {
    /// Empty map of `columns` x `rows` tiles
    pub fn new(origin: Vec2, tile_size: Vec2, columns: u32, rows: u32) -> Self {
        Self {
            origin,
            tile_size,
            columns,
            rows,
            cells: vec![None; columns as usize * rows as usize],
        }
    }

    fn cell_index(&self, column: u32, row: u32) -> Option<usize> {
        (column < self.columns && row < self.rows)
            .then(|| row as usize * self.columns as usize + column as usize)
    }

    /// Place a tile; returns false outside the map
    pub fn set_tile(&mut self, column: u32, row: u32, entity: Entity, kind: ContactType) -> bool {
        let Some(index) = self.cell_index(column, row) else {
            return false;
        };
        self.cells[index] = Some((entity, kind));
        true
    }

    /// Remove a tile
    pub fn clear_tile(&mut self, column: u32, row: u32) {
        if let Some(index) = self.cell_index(column, row) {
            self.cells[index] = None;
        }
    }

    /// Tile at a grid cell
    pub fn tile(&self, column: u32, row: u32) -> Option<(Entity, ContactType)> {
        self.cells[self.cell_index(column, row)?]
    }

    /// World rectangle covered by the map
    pub fn area(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            self.tile_size.x * self.columns as f32,
            self.tile_size.y * self.rows as f32,
        )
    }

    fn cell_span(start: f32, end: f32, size: f32, count: u32) -> std::ops::Range<u32> {
        let first = (start / size).floor().clamp(0.0, count as f32) as u32;
        let last = (end / size).ceil().clamp(0.0, count as f32) as u32;
        first..last
    }
}

impl TileGrid for TileMap {
    fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    fn tiles_in(&self, rect: &Rect) -> Vec<TileHit> {
        if self.tile_size.x <= 0.0 || self.tile_size.y <= 0.0 || !rect.overlaps(&self.area()) {
            return Vec::new();
        }
        let local = rect.translated(-self.origin);
        let columns = Self::cell_span(local.x, local.right(), self.tile_size.x, self.columns);
        let rows = Self::cell_span(local.y, local.bottom(), self.tile_size.y, self.rows);

        let mut hits = Vec::new();
        for row in rows {
            for column in columns.clone() {
                let Some((entity, kind)) = self.tile(column, row) else {
                    continue;
                };
                let hit = TileHit {
                    entity,
                    x: self.origin.x + column as f32 * self.tile_size.x,
                    y: self.origin.y + row as f32 * self.tile_size.y,
                    kind,
                };
                if hit.rect(self.tile_size).overlaps(rect) {
                    hits.push(hit);
                }
            }
        }
        hits
    }
}

/// Per-entity flags read by movement logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroundState {
    /// Standing on something; gravity can be suppressed
    pub on_ground: bool,
    /// Overlapping a ladder
    pub on_ladder: bool,
}

/// Axis-separated resolution plus tile-grid ground snapping
pub struct GroundScanResolver {
    axis: AxisSeparatedResolver,
    config: GroundScanConfig,
    tiles: Arc<dyn TileGrid>,
    states: HashMap<Entity, GroundState>,
}

impl GroundScanResolver {
    /// Create a resolver scanning `tiles`
    pub fn new(config: GroundScanConfig, tiles: Arc<dyn TileGrid>) -> Self {
        Self {
            axis: AxisSeparatedResolver::new(config.axis.clone()),
            config,
            tiles,
            states: HashMap::new(),
        }
    }

    /// Current tuning
    pub const fn config(&self) -> &GroundScanConfig {
        &self.config
    }

    /// Is the entity standing on something?
    pub fn is_on_ground(&self, entity: Entity) -> bool {
        self.states.get(&entity).is_some_and(|state| state.on_ground)
    }

    /// Is the entity overlapping a ladder?
    pub fn is_on_ladder(&self, entity: Entity) -> bool {
        self.states.get(&entity).is_some_and(|state| state.on_ladder)
    }

    /// Top of the highest ground surface near `bounds`' bottom edge
    ///
    /// The column reaches `scan_depth` below the bottom edge and
    /// `scan_depth + travel` above it, `travel` being how far the entity fell
    /// this tick, so fast falls cannot skip a floor.
    pub fn scan_ground(&self, bounds: &Rect, travel: f32) -> Option<f32> {
        let depth = self.config.scan_depth;
        let travel = travel.max(0.0);
        let bottom = bounds.bottom();
        let top = bottom - depth - travel;
        let column = Rect::new(
            bounds.center().x - self.config.scan_width * 0.5,
            top,
            self.config.scan_width,
            depth * 2.0 + travel,
        );

        self.tiles
            .tiles_in(&column)
            .into_iter()
            .filter(|tile| match tile.kind {
                ContactType::Solid => true,
                ContactType::Ladder => tile.y >= bottom - travel,
                ContactType::Trigger => false,
            })
            .map(|tile| tile.y)
            .filter(|&surface| surface >= top && surface <= bottom + depth)
            .fold(None, |best: Option<f32>, surface| Some(best.map_or(surface, |best| best.min(surface))))
    }
}

impl CollisionResolver for GroundScanResolver {
    fn resolve(
        &mut self,
        entity: Entity,
        contacts: &[Contact],
        velocity: Vec2,
        ctx: &mut ResolveContext<'_>,
    ) -> Resolution {
        let mut resolution = self.axis.resolve(entity, contacts, velocity, ctx);
        let Some(bounds) = ctx.world.bounds(entity) else {
            return resolution;
        };
        let corrected = bounds.translated(resolution.correction);
        let was_on_ground = self.is_on_ground(entity);

        let mut state = GroundState {
            on_ground: resolution.correction.y < 0.0,
            on_ladder: contacts.iter().any(|c| c.contact_type == ContactType::Ladder)
                || self
                    .tiles
                    .tiles_in(&corrected)
                    .iter()
                    .any(|tile| tile.kind == ContactType::Ladder),
        };

        let rising = !resolution.zero_velocity.contains(AxisMask::Y) && velocity.y < 0.0;
        if !rising {
            if let Some(surface) = self.scan_ground(&corrected, velocity.y) {
                let gap = surface - corrected.bottom();
                if gap <= 0.0 || was_on_ground {
                    resolution.correction.y += gap;
                    resolution.zero_velocity |= AxisMask::Y;
                    state.on_ground = true;
                }
            }
        }

        if state.on_ground != was_on_ground {
            log::debug!("GroundScanResolver: {entity:?} on_ground = {}", state.on_ground);
        }
        self.states.insert(entity, state);
        resolution
    }

    fn ground_state(&self, entity: Entity) -> Option<GroundState> {
        self.states.get(&entity).copied()
    }

    fn forget(&mut self, entity: Entity) {
        self.states.remove(&entity);
    }

    fn name(&self) -> &'static str {
        "ground-scan"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::CollisionShape;
    use crate::ecs::{CollisionWorld, LayerId, ViewId, World};
    use crate::physics::collision_registry::CollisionRegistry;
    use crate::physics::contact_pipeline::ContactPipeline;
    use crate::spatial::SpatialIndexConfig;

    const TILES: Entity = Entity::new(1000);

    /// 8x8 tiles, floor along row 5 (y = 40)
    fn level() -> TileMap {
        let mut map = TileMap::new(Vec2::zeros(), Vec2::new(8.0, 8.0), 16, 8);
        for column in 0..16 {
            map.set_tile(column, 5, TILES, ContactType::Solid);
        }
        map.set_tile(10, 4, TILES, ContactType::Ladder);
        map.set_tile(10, 3, TILES, ContactType::Ladder);
        map
    }

    struct Scene {
        world: World,
        registry: CollisionRegistry,
        pipeline: ContactPipeline,
        resolver: GroundScanResolver,
        player: Entity,
    }

    impl Scene {
        fn new(x: f32, y: f32) -> Self {
            let mut registry = CollisionRegistry::new();
            registry
                .configure(&SpatialIndexConfig::new(
                    ViewId(0),
                    LayerId(0),
                    Rect::new(0.0, 0.0, 128.0, 64.0),
                    4,
                    4,
                ))
                .unwrap();
            let mut world = World::new();
            let player = world.create_entity(ViewId(0), LayerId(0), Vec2::new(x, y));
            world.set_shape(player, CollisionShape::new(8.0, 8.0));
            registry.on_entity_activated(player, &world);
            Self {
                world,
                registry,
                pipeline: ContactPipeline::new(),
                resolver: GroundScanResolver::new(GroundScanConfig::default(), Arc::new(level())),
                player,
            }
        }

        /// Resolve and apply, returning the resolution
        fn step(&mut self, velocity: Vec2) -> Resolution {
            let position = self.world.position(self.player).unwrap() + velocity;
            self.world.set_position(self.player, position);
            let contacts = self.pipeline.find_contacts(self.player, &self.world, &self.registry);
            let mut ctx = ResolveContext {
                world: &mut self.world,
                registry: &self.registry,
                pipeline: &self.pipeline,
            };
            let resolution = self.resolver.resolve(self.player, &contacts, velocity, &mut ctx);
            self.world.set_position(self.player, position + resolution.correction);
            resolution
        }
    }

    #[test]
    fn test_tile_map_query() {
        let mut map = level();
        let hits = map.tiles_in(&Rect::new(4.0, 36.0, 8.0, 8.0));
        assert_eq!(hits.len(), 2);
        assert_eq!((hits[0].x, hits[0].y), (0.0, 40.0));
        assert_eq!((hits[1].x, hits[1].y), (8.0, 40.0));

        // Touching edges are not overlaps.
        assert!(map.tiles_in(&Rect::new(0.0, 32.0, 8.0, 8.0)).is_empty());
        assert!(map.tiles_in(&Rect::new(-50.0, -50.0, 10.0, 10.0)).is_empty());
        assert!(!map.set_tile(16, 0, TILES, ContactType::Solid));
    }

    #[test]
    fn test_falling_entity_snaps_onto_floor() {
        let mut scene = Scene::new(20.0, 30.0);
        let resolution = scene.step(Vec2::new(0.0, 3.0));
        assert_eq!(resolution.correction, Vec2::new(0.0, -1.0));
        assert!(resolution.zero_velocity.contains(AxisMask::Y));
        assert_eq!(scene.world.position(scene.player), Some(Vec2::new(20.0, 32.0)));
        assert!(scene.resolver.is_on_ground(scene.player));
    }

    #[test]
    fn test_airborne_entity_keeps_falling() {
        let mut scene = Scene::new(20.0, 10.0);
        let resolution = scene.step(Vec2::new(0.0, 2.0));
        assert!(resolution.is_noop());
        assert!(!scene.resolver.is_on_ground(scene.player));
    }

    #[test]
    fn test_rising_entity_is_not_snapped() {
        let mut scene = Scene::new(20.0, 33.0);
        let resolution = scene.step(Vec2::new(0.0, -2.0));
        assert!(resolution.is_noop());
        assert!(!scene.resolver.is_on_ground(scene.player));
    }

    #[test]
    fn test_grounded_entity_sticks_to_floor() {
        let mut scene = Scene::new(20.0, 30.0);
        scene.step(Vec2::new(0.0, 3.0));
        assert!(scene.resolver.is_on_ground(scene.player));

        // Walking with no vertical velocity stays on the floor.
        let resolution = scene.step(Vec2::new(3.0, 0.0));
        assert_eq!(resolution.correction, Vec2::zeros());
        assert_eq!(scene.world.position(scene.player), Some(Vec2::new(23.0, 32.0)));
        assert!(scene.resolver.is_on_ground(scene.player));
    }

    #[test]
    fn test_ladder_overlap_is_tracked() {
        let mut scene = Scene::new(78.0, 20.0);
        scene.step(Vec2::new(2.0, 0.0));
        assert!(scene.resolver.is_on_ladder(scene.player));
        assert_eq!(
            scene.resolver.ground_state(scene.player),
            Some(GroundState { on_ground: false, on_ladder: true })
        );

        scene.resolver.forget(scene.player);
        assert_eq!(scene.resolver.ground_state(scene.player), None);
    }
}
