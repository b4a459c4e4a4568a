//! Collision detection and response
//!
//! Pixel masks and layers describe shapes, the registry and pipeline find
//! contacts, and resolvers turn contacts into position corrections.

pub mod collision_layers;
pub mod collision_registry;
pub mod contact;
pub mod contact_pipeline;
pub mod pixel_mask;
pub mod resolver;

pub use collision_layers::CollisionLayers;
pub use collision_registry::{CollisionRegistry, DeletedView, IndexKey};
pub use contact::{CollisionPair, Contact, ContactType};
pub use contact_pipeline::ContactPipeline;
pub use pixel_mask::{MaskError, MaskRegion, PixelMask};
pub use resolver::{
    build_resolver, AxisMask, AxisResolverConfig, AxisSeparatedResolver, CollisionResolver, GroundScanConfig,
    GroundScanResolver, GroundState, PrimaryAxis, ResolveContext, Resolution, ResolverConfig, TileGrid, TileHit,
    TileMap,
};
