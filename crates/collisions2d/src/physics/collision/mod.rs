//! Collision geometry and narrow-phase detection
//!
//! # Architecture
//!
//! - **Model Space Storage**: shapes keep local vertices, angle and scale
//! - **Lazy Transformation**: bodies rebuild world vertices, normals and
//!   bounding boxes only when something changed and a test needs them
//! - **Caller-Owned Results**: narrow-phase tests write into a reusable
//!   [`CollisionResult`]
//!
//! # Module Organization
//!
//! - [`aabb`] - Axis-aligned bounding boxes
//! - [`shape`] - Model-space shape variants
//! - [`body`] - Positioned bodies with a world-space cache
//! - [`primitives`] - Projection intervals and collision results
//! - [`sat`] - Separating Axis Theorem tests

pub mod aabb;
pub mod body;
pub mod primitives;
pub mod sat;
pub mod shape;

// Re-export commonly used types
pub use aabb::Aabb;
pub use body::{Body, BodyOptions};
pub use primitives::{CollisionResult, Projection};
pub use shape::{Outline, Shape, ShapeKind, WorldShape};
