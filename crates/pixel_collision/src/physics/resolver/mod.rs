//! Collision response strategies
//!
//! A resolver turns the contacts of one moved entity into a position
//! correction and a set of velocity axes to zero. The engine applies the
//! result; resolvers only probe positions through [`ResolveContext`] and
//! always leave the world as they found it.
//!
//! Two strategies exist:
//! - [`AxisSeparatedResolver`]: resolves x and y independently, pushing the
//!   entity back out of solid contacts against its direction of travel
//! - [`GroundScanResolver`]: axis separation plus a ray scan into a tile
//!   grid beneath the entity, for platformer ground and ladder tracking

mod axis;
mod ground;

pub use axis::AxisSeparatedResolver;
pub use ground::{GroundScanResolver, GroundState, TileGrid, TileHit, TileMap};

use crate::ecs::{CollisionWorld, Entity};
use crate::engine::CollisionError;
use crate::foundation::math::Vec2;
use crate::physics::collision_registry::CollisionRegistry;
use crate::physics::contact::Contact;
use crate::physics::contact_pipeline::ContactPipeline;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

bitflags! {
    /// Velocity axes a resolution stops
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AxisMask: u8 {
        /// Horizontal axis
        const X = 1 << 0;
        /// Vertical axis
        const Y = 1 << 1;
    }
}

impl AxisMask {
    /// `velocity` with the named components zeroed
    pub fn stop(self, mut velocity: Vec2) -> Vec2 {
        if self.contains(AxisMask::X) {
            velocity.x = 0.0;
        }
        if self.contains(AxisMask::Y) {
            velocity.y = 0.0;
        }
        velocity
    }
}

/// Outcome of resolving one entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Position delta to apply
    pub correction: Vec2,
    /// Velocity components to zero
    pub zero_velocity: AxisMask,
}

impl Resolution {
    /// Leave the entity where it is
    pub fn none() -> Self {
        Self {
            correction: Vec2::zeros(),
            zero_velocity: AxisMask::empty(),
        }
    }

    /// True when applying the resolution changes nothing
    pub fn is_noop(&self) -> bool {
        self.correction == Vec2::zeros() && self.zero_velocity.is_empty()
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::none()
    }
}

/// Collaborators a resolver may use while probing
pub struct ResolveContext<'a> {
    /// Host entity storage
    pub world: &'a mut dyn CollisionWorld,
    /// Broad-phase indices
    pub registry: &'a CollisionRegistry,
    /// Narrow phase used to recompute contacts
    pub pipeline: &'a ContactPipeline,
}

impl ResolveContext<'_> {
    /// Contacts the entity would have at `position`
    ///
    /// The entity is moved there temporarily and put back before returning.
    pub fn contacts_at(&mut self, entity: Entity, position: Vec2) -> Vec<Contact> {
        let Some(original) = self.world.position(entity) else {
            return Vec::new();
        };
        self.world.set_position(entity, position);
        let contacts = self.pipeline.find_contacts(entity, &*self.world, self.registry);
        self.world.set_position(entity, original);
        contacts
    }
}

/// Strategy computing the correction for one moved entity
pub trait CollisionResolver: Send {
    /// Resolve `entity` against the contacts found at its current position
    ///
    /// `velocity` is the per-tick displacement that brought it there.
    fn resolve(
        &mut self,
        entity: Entity,
        contacts: &[Contact],
        velocity: Vec2,
        ctx: &mut ResolveContext<'_>,
    ) -> Resolution;

    /// Ground/ladder tracking for resolvers that keep it
    fn ground_state(&self, _entity: Entity) -> Option<GroundState> {
        None
    }

    /// Forget per-entity state of a deactivated entity
    fn forget(&mut self, _entity: Entity) {}

    /// Strategy name for logs
    fn name(&self) -> &'static str;
}

/// Axis resolved last, with its full displacement restored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryAxis {
    /// Resolve y first, then x
    #[default]
    X,
    /// Resolve x first, then y
    Y,
}

/// Tuning of axis-separated resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisResolverConfig {
    /// Axis resolved last
    pub primary_axis: PrimaryAxis,
    /// Contacts starting below this fraction of the entity height are
    /// ground contacts and never block horizontally
    pub ground_fraction: f32,
    /// Contacts no wider than this are corner grazes and never block
    /// vertically
    pub corner_threshold: f32,
}

impl Default for AxisResolverConfig {
    fn default() -> Self {
        Self {
            primary_axis: PrimaryAxis::X,
            ground_fraction: 0.75,
            corner_threshold: 1.0,
        }
    }
}

/// Tuning of the ground ray scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundScanConfig {
    /// Wall and ceiling handling
    pub axis: AxisResolverConfig,
    /// Width of the column scanned under the entity's bottom center
    pub scan_width: f32,
    /// How far above and below the entity's bottom edge ground is searched
    pub scan_depth: f32,
}

impl Default for GroundScanConfig {
    fn default() -> Self {
        Self {
            axis: AxisResolverConfig::default(),
            scan_width: 2.0,
            scan_depth: 4.0,
        }
    }
}

/// Which resolver the engine is built with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolverConfig {
    /// General purpose axis separation
    AxisSeparated(AxisResolverConfig),
    /// Platformer resolution against a tile grid
    GroundScan(GroundScanConfig),
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::AxisSeparated(AxisResolverConfig::default())
    }
}

/// Build the configured resolver
///
/// The ground-scan strategy needs a tile grid; without one this fails with
/// [`CollisionError::MissingCollaborator`].
pub fn build_resolver(
    config: &ResolverConfig,
    tiles: Option<Arc<dyn TileGrid>>,
) -> Result<Box<dyn CollisionResolver>, CollisionError> {
    match config {
        ResolverConfig::AxisSeparated(axis) => Ok(Box::new(AxisSeparatedResolver::new(axis.clone()))),
        ResolverConfig::GroundScan(scan) => {
            let tiles = tiles.ok_or(CollisionError::MissingCollaborator("tile grid"))?;
            Ok(Box::new(GroundScanResolver::new(scan.clone(), tiles)))
        }
    }
}
