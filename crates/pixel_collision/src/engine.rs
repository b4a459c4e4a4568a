//! Collision engine: event entry points wiring registry, pipeline and resolver

use crate::{
    config::{Config, ConfigError},
    ecs::{CollisionWorld, Entity, ViewId},
    events::{CollisionEvent, CollisionHandler, ContactDispatcher, EventQueue, MoveBatch},
    foundation::math::Vec2,
    physics::{
        collision_registry::{CollisionRegistry, DeletedView, IndexKey},
        contact::{CollisionPair, Contact},
        contact_pipeline::ContactPipeline,
        pixel_mask::MaskError,
        resolver::{
            build_resolver, CollisionResolver, GroundState, ResolveContext, Resolution, ResolverConfig,
            TileGrid,
        },
    },
    spatial::SpatialIndexConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Collision engine
///
/// Owns the per-(view, layer) indices, the contact pipeline and the
/// configured resolver. The host calls the `on_*` entry points from its
/// event dispatcher; entity data is reached through [`CollisionWorld`].
pub struct CollisionEngine {
    registry: CollisionRegistry,
    pipeline: ContactPipeline,
    resolver: Box<dyn CollisionResolver>,
    dispatcher: ContactDispatcher,
    /// Pairs touching after the latest motion batch or view deletion
    current_pairs: BTreeSet<CollisionPair>,
    /// Pairs touching before it
    previous_pairs: BTreeSet<CollisionPair>,
}

impl CollisionEngine {
    /// Create an engine from configuration
    ///
    /// Every configured index is built up front; the first invalid one
    /// aborts. `tiles` is required by the ground-scan resolver only.
    pub fn new(config: &EngineConfig, tiles: Option<Arc<dyn TileGrid>>) -> Result<Self, CollisionError> {
        log::info!("Initializing collision engine...");

        let resolver = build_resolver(&config.resolver, tiles)?;
        let mut engine = Self::with_resolver(resolver);
        for index in &config.indices {
            engine.configure_index(index)?;
        }

        log::info!(
            "Collision engine ready: {} index(es), {} resolver",
            engine.registry.index_count(),
            engine.resolver.name()
        );
        Ok(engine)
    }

    /// Create an engine without indices around a custom resolver
    pub fn with_resolver(resolver: Box<dyn CollisionResolver>) -> Self {
        Self {
            registry: CollisionRegistry::new(),
            pipeline: ContactPipeline::new(),
            resolver,
            dispatcher: ContactDispatcher::new(),
            current_pairs: BTreeSet::new(),
            previous_pairs: BTreeSet::new(),
        }
    }

    /// Add or replace the index of one (view, layer)
    pub fn configure_index(&mut self, config: &SpatialIndexConfig) -> Result<IndexKey, CollisionError> {
        self.registry.configure(config)
    }

    /// Register a contact listener
    pub fn register_handler(&mut self, handler: Box<dyn CollisionHandler>) {
        self.dispatcher.register_handler(handler);
    }

    /// Broad-phase indices
    pub fn registry(&self) -> &CollisionRegistry {
        &self.registry
    }

    /// Active resolver
    pub fn resolver(&self) -> &dyn CollisionResolver {
        self.resolver.as_ref()
    }

    /// Ground/ladder flags kept by the resolver, if it tracks them
    pub fn ground_state(&self, entity: Entity) -> Option<GroundState> {
        self.resolver.ground_state(entity)
    }

    /// Entity became active; index it under its placement
    pub fn on_entity_activated(&mut self, entity: Entity, world: &dyn CollisionWorld) -> bool {
        self.registry.on_entity_activated(entity, world)
    }

    /// Entity was deactivated; drop it from its index and pair tracking
    pub fn on_entity_deactivated(&mut self, entity: Entity) -> bool {
        self.resolver.forget(entity);
        self.current_pairs.retain(|pair| !pair.involves(entity));
        self.registry.on_entity_deactivated(entity)
    }

    /// View deleted; drop all of its indices and forget their members
    ///
    /// Pairs involving a dropped member end here and are reported by
    /// [`collisions_exited`](Self::collisions_exited).
    pub fn on_view_deleted(&mut self, view: ViewId) -> DeletedView {
        let deleted = self.registry.on_view_deleted(view);
        for &entity in &deleted.members {
            self.resolver.forget(entity);
        }
        self.previous_pairs = std::mem::take(&mut self.current_pairs);
        self.current_pairs = self
            .previous_pairs
            .iter()
            .filter(|pair| !deleted.members.iter().any(|&member| pair.involves(member)))
            .copied()
            .collect();
        deleted
    }

    /// Detect and resolve collisions for the entities moved this tick
    ///
    /// Every moved entity is re-indexed first so the broad phase sees the
    /// whole batch at its new positions. Entities are then processed in
    /// batch order: contacts are collected, published on the shape and
    /// forwarded to listeners, and the resolver's correction is applied.
    pub fn on_entity_moved(&mut self, batch: &MoveBatch, world: &mut dyn CollisionWorld) -> Vec<(Entity, Resolution)> {
        for entity in batch.iter() {
            self.registry.refresh(entity, &*world);
        }

        self.previous_pairs = std::mem::take(&mut self.current_pairs);
        self.current_pairs = self
            .previous_pairs
            .iter()
            .filter(|pair| !batch.iter().any(|moved| pair.involves(moved)))
            .copied()
            .collect();

        let mut resolutions = Vec::with_capacity(batch.len());
        for entity in batch.iter() {
            let contacts = self.pipeline.find_contacts(entity, &*world, &self.registry);
            ContactPipeline::publish(world, entity, &contacts);
            self.dispatch_contacts(&contacts);

            let resolution = self.resolve(entity, &contacts, world);
            resolutions.push((entity, resolution));
        }
        resolutions
    }

    fn dispatch_contacts(&mut self, contacts: &[Contact]) {
        for contact in contacts {
            log::trace!("CollisionEngine: contact {:?} -> {:?}", contact.entity, contact.other);
            self.dispatcher.dispatch(contact);
            self.current_pairs.insert(CollisionPair::new(contact.entity, contact.other));
        }
    }

    fn resolve(&mut self, entity: Entity, contacts: &[Contact], world: &mut dyn CollisionWorld) -> Resolution {
        let velocity = world.velocity(entity).unwrap_or_else(Vec2::zeros);
        let mut ctx = ResolveContext {
            world: &mut *world,
            registry: &self.registry,
            pipeline: &self.pipeline,
        };
        let resolution = self.resolver.resolve(entity, contacts, velocity, &mut ctx);
        if resolution.is_noop() {
            return resolution;
        }

        if let Some(position) = world.position(entity) {
            world.set_position(entity, position + resolution.correction);
        }
        if !resolution.zero_velocity.is_empty() {
            world.set_velocity(entity, resolution.zero_velocity.stop(velocity));
        }
        self.registry.refresh(entity, &*world);

        log::debug!(
            "CollisionEngine: {entity:?} resolved by {:?}, stopped {:?}",
            resolution.correction,
            resolution.zero_velocity
        );
        resolution
    }

    /// Route one host event to its entry point
    pub fn handle_event(&mut self, event: &CollisionEvent, world: &mut dyn CollisionWorld) {
        match event {
            CollisionEvent::EntityActivated(entity) => {
                self.on_entity_activated(*entity, &*world);
            }
            CollisionEvent::EntityDeactivated(entity) => {
                self.on_entity_deactivated(*entity);
            }
            CollisionEvent::Moved(batch) => {
                self.on_entity_moved(batch, world);
            }
            CollisionEvent::ViewDeleted(view) => {
                self.on_view_deleted(*view);
            }
        }
    }

    /// Deliver every queued event in order
    pub fn process_events(&mut self, queue: &mut EventQueue, world: &mut dyn CollisionWorld) -> usize {
        let events = queue.drain();
        for event in &events {
            self.handle_event(event, world);
        }
        events.len()
    }

    /// Pairs touching after the latest motion batch or view deletion
    pub fn current_collisions(&self) -> &BTreeSet<CollisionPair> {
        &self.current_pairs
    }

    /// Pairs that started touching in the latest motion batch
    ///
    /// Always empty right after a view deletion.
    pub fn collisions_entered(&self) -> Vec<CollisionPair> {
        self.current_pairs.difference(&self.previous_pairs).copied().collect()
    }

    /// Pairs that stopped touching in the latest motion batch or view
    /// deletion
    pub fn collisions_exited(&self) -> Vec<CollisionPair> {
        self.previous_pairs.difference(&self.current_pairs).copied().collect()
    }
}

/// Collision engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Response strategy
    pub resolver: ResolverConfig,

    /// One entry per (view, layer) index
    pub indices: Vec<SpatialIndexConfig>,
}

impl Config for EngineConfig {}

/// Collision engine errors
#[derive(Error, Debug)]
pub enum CollisionError {
    /// A mandatory configuration attribute is absent
    #[error("Missing configuration attribute: {0}")]
    MissingConfig(&'static str),

    /// A configuration attribute has an unusable value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required external collaborator was not supplied
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Pixel mask error
    #[error("Pixel mask error: {0}")]
    Mask(#[from] MaskError),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Format;
    use crate::ecs::components::{CollisionShape, MovementComponent};
    use crate::ecs::{LayerId, World};
    use crate::foundation::math::Rect;
    use crate::physics::contact::ContactType;
    use crate::physics::resolver::{GroundScanConfig, TileMap};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine() -> CollisionEngine {
        let config = EngineConfig {
            resolver: ResolverConfig::default(),
            indices: vec![SpatialIndexConfig::new(
                ViewId(0),
                LayerId(0),
                Rect::new(0.0, 0.0, 256.0, 256.0),
                4,
                4,
            )],
        };
        CollisionEngine::new(&config, None).unwrap()
    }

    fn spawn(world: &mut World, engine: &mut CollisionEngine, x: f32, velocity: Option<Vec2>) -> Entity {
        let entity = world.create_entity(ViewId(0), LayerId(0), Vec2::new(x, 10.0));
        world.set_shape(entity, CollisionShape::new(10.0, 10.0));
        if let Some(velocity) = velocity {
            world.set_movement(entity, MovementComponent::with_velocity(velocity));
        }
        engine.on_entity_activated(entity, world);
        entity
    }

    struct Recorder {
        seen: Rc<RefCell<Vec<Entity>>>,
    }

    impl CollisionHandler for Recorder {
        fn on_contact(&mut self, contact: &Contact) -> bool {
            self.seen.borrow_mut().push(contact.other);
            false
        }
    }

    #[test]
    fn test_moving_into_wall_is_resolved_and_reported() {
        let mut engine = engine();
        let mut world = World::new();
        let a = spawn(&mut world, &mut engine, 10.0, Some(Vec2::new(3.0, 0.0)));
        let b = spawn(&mut world, &mut engine, 30.0, None);
        let seen = Rc::new(RefCell::new(Vec::new()));
        engine.register_handler(Box::new(Recorder { seen: Rc::clone(&seen) }));

        for _ in 0..4 {
            let batch = world.step_motion();
            engine.on_entity_moved(&batch, &mut world);
        }

        assert_eq!(*seen.borrow(), vec![b]);
        assert_eq!(world.position(a), Some(Vec2::new(20.0, 10.0)));
        assert_eq!(world.velocity(a), Some(Vec2::zeros()));
        assert_eq!(engine.collisions_entered(), vec![CollisionPair::new(a, b)]);
        let contacts = &world.shape(a).unwrap().contacts;
        assert_eq!(contacts[0].bounds, Rect::new(8.0, 0.0, 2.0, 10.0));
    }

    #[test]
    fn test_pairs_exit_when_separated() {
        let mut engine = engine();
        let mut world = World::new();
        let a = spawn(&mut world, &mut engine, 15.0, None);
        let b = spawn(&mut world, &mut engine, 30.0, None);
        world.set_shape(b, CollisionShape::new(10.0, 10.0).with_contact_type(ContactType::Trigger));

        world.set_position(a, Vec2::new(25.0, 10.0));
        engine.on_entity_moved(&MoveBatch::from_iter([a]), &mut world);
        assert_eq!(engine.current_collisions().len(), 1);
        // Triggers report without pushing back.
        assert_eq!(world.position(a), Some(Vec2::new(25.0, 10.0)));

        world.set_position(a, Vec2::new(60.0, 10.0));
        engine.on_entity_moved(&MoveBatch::from_iter([a]), &mut world);
        assert!(engine.current_collisions().is_empty());
        assert_eq!(engine.collisions_exited(), vec![CollisionPair::new(a, b)]);
        assert!(world.shape(a).unwrap().contacts.is_empty());
    }

    #[test]
    fn test_view_deletion_ends_pairs_of_its_members() {
        let mut engine = engine();
        engine
            .configure_index(&SpatialIndexConfig::new(
                ViewId(1),
                LayerId(0),
                Rect::new(0.0, 0.0, 256.0, 256.0),
                4,
                4,
            ))
            .unwrap();
        let mut world = World::new();
        let a = world.create_entity(ViewId(1), LayerId(0), Vec2::new(15.0, 10.0));
        let b = world.create_entity(ViewId(1), LayerId(0), Vec2::new(20.0, 10.0));
        for entity in [a, b] {
            world.set_shape(entity, CollisionShape::new(10.0, 10.0).with_contact_type(ContactType::Trigger));
            engine.on_entity_activated(entity, &world);
        }
        let other = spawn(&mut world, &mut engine, 100.0, None);

        engine.on_entity_moved(&MoveBatch::from_iter([a]), &mut world);
        assert_eq!(engine.current_collisions().len(), 1);

        let deleted = engine.on_view_deleted(ViewId(1));
        assert_eq!(deleted.members, vec![a, b]);
        assert!(engine.current_collisions().is_empty());
        assert_eq!(engine.collisions_exited(), vec![CollisionPair::new(a, b)]);
        assert!(engine.collisions_entered().is_empty());

        engine.on_entity_moved(&MoveBatch::from_iter([other]), &mut world);
        assert!(engine.current_collisions().is_empty());
        assert!(engine.collisions_exited().is_empty());
    }

    #[test]
    fn test_view_deletion_forgets_ground_state() {
        let mut tiles = TileMap::new(Vec2::zeros(), Vec2::new(16.0, 16.0), 8, 8);
        for column in 0..8 {
            tiles.set_tile(column, 4, Entity::new(900), ContactType::Solid);
        }
        let tiles: Arc<dyn TileGrid> = Arc::new(tiles);
        let config = EngineConfig {
            resolver: ResolverConfig::GroundScan(GroundScanConfig::default()),
            indices: vec![SpatialIndexConfig::new(
                ViewId(3),
                LayerId(0),
                Rect::new(0.0, 0.0, 128.0, 128.0),
                4,
                4,
            )],
        };
        let mut engine = CollisionEngine::new(&config, Some(tiles)).unwrap();
        let mut world = World::new();
        // Feet two pixels into the floor at y = 64.
        let player = world.create_entity(ViewId(3), LayerId(0), Vec2::new(20.0, 58.0));
        world.set_shape(player, CollisionShape::new(8.0, 8.0));
        world.set_movement(player, MovementComponent::with_velocity(Vec2::new(0.0, 2.0)));
        engine.on_entity_activated(player, &world);

        engine.on_entity_moved(&MoveBatch::from_iter([player]), &mut world);
        assert!(engine.ground_state(player).is_some_and(|state| state.on_ground));

        engine.on_view_deleted(ViewId(3));
        assert_eq!(engine.ground_state(player), None);
    }

    #[test]
    fn test_queued_events_are_processed_in_order() {
        let mut engine = engine();
        let mut world = World::new();
        let a = world.create_entity(ViewId(0), LayerId(0), Vec2::new(10.0, 10.0));
        world.set_shape(a, CollisionShape::new(10.0, 10.0));

        let mut queue = EventQueue::new();
        queue.send(CollisionEvent::EntityActivated(a));
        queue.send(CollisionEvent::Moved(MoveBatch::from_iter([a])));
        queue.send(CollisionEvent::EntityDeactivated(a));
        queue.send(CollisionEvent::ViewDeleted(ViewId(0)));

        assert_eq!(engine.process_events(&mut queue, &mut world), 4);
        assert_eq!(engine.registry().membership(a), None);
        assert_eq!(engine.registry().index_count(), 0);
    }

    #[test]
    fn test_ground_scan_without_tiles_fails_fast() {
        let config = EngineConfig {
            resolver: ResolverConfig::GroundScan(GroundScanConfig::default()),
            indices: Vec::new(),
        };
        assert!(matches!(
            CollisionEngine::new(&config, None),
            Err(CollisionError::MissingCollaborator(_))
        ));
    }

    #[test]
    fn test_invalid_index_aborts_construction() {
        let config = EngineConfig {
            resolver: ResolverConfig::default(),
            indices: vec![SpatialIndexConfig {
                max_depth: None,
                ..SpatialIndexConfig::new(ViewId(0), LayerId(0), Rect::new(0.0, 0.0, 8.0, 8.0), 4, 4)
            }],
        };
        assert!(matches!(
            CollisionEngine::new(&config, None),
            Err(CollisionError::MissingConfig("max_depth"))
        ));
    }

    #[test]
    fn test_engine_config_from_toml() {
        let text = r#"
            [resolver.AxisSeparated]
            primary_axis = "y"
            ground_fraction = 0.5

            [[indices]]
            view_id = 1
            layer_id = 2
            world_area = { x = 0.0, y = 0.0, width = 640.0, height = 480.0 }
            max_entries_per_node = 8
            max_depth = 6
        "#;
        let config = EngineConfig::from_str_with_format(text, Format::Toml).unwrap();
        assert_eq!(config.indices.len(), 1);
        assert_eq!(config.indices[0].layer_id, Some(LayerId(2)));

        let engine = CollisionEngine::new(&config, None).unwrap();
        assert!(engine.registry().index(ViewId(1), LayerId(2)).is_some());
    }
}
