//! Physics module for collision detection
//!
//! Combines the BVH broad phase with the SAT narrow phase behind the
//! [`Collisions`] facade.

pub mod collision;
pub mod collision_system;

pub use collision::{Aabb, Body, BodyOptions, CollisionResult, Shape, ShapeKind};
pub use collision_system::Collisions;
