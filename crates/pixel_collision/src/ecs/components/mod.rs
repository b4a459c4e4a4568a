//! ECS Components module
//!
//! Data attached to entities by the reference [`World`](crate::ecs::World).

pub mod transform;
pub mod movement;
pub mod collision;

pub use transform::TransformComponent;
pub use movement::MovementComponent;
pub use collision::CollisionShape;
