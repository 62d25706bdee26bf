//! # collisions2d
//!
//! 2D collision detection for circles, convex polygons, points and line
//! segments.
//!
//! ## Features
//!
//! - **BVH Broad Phase**: dynamic bounding volume hierarchy with padded boxes
//! - **SAT Narrow Phase**: exact overlap depth, direction and containment
//! - **Lazy Geometry**: world-space vertices and normals rebuilt only on change
//! - **Id Registry**: several bodies (line chains) can share one id
//! - **Debug Paths**: draw bodies and BVH boxes onto any path surface
//!
//! ## Quick Start
//!
//! ```rust
//! use collisions2d::prelude::*;
//!
//! fn main() -> Result<(), CollisionError> {
//!     let mut system = Collisions::new();
//!     let a = system.create_circle("a", Vec2::new(0.0, 0.0), 1.0)?;
//!     let b = system.create_circle("b", Vec2::new(1.0, 0.0), 1.0)?;
//!
//!     system.update();
//!     let mut result = CollisionResult::new();
//!     for other in system.potentials(a)? {
//!         if system.collides(a, other, Some(&mut result), true)? {
//!             assert_eq!(other, b);
//!             assert!((result.overlap - 1.0).abs() < 1e-9);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod debug;
pub mod error;
pub mod foundation;
pub mod physics;
pub mod spatial;

pub use error::{CollisionError, ErrorKind, Result};
pub use physics::collision_system::Collisions;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, CollisionsConfig},
        debug::{PathCommand, PathSink},
        error::{CollisionError, ErrorKind},
        foundation::{
            collections::BodyHandle,
            math::Vec2,
        },
        physics::{
            collision::{sat, Aabb, Body, BodyOptions, CollisionResult, Shape, ShapeKind},
            Collisions,
        },
        spatial::{Bvh, BvhConfig, InsertionCost},
    };
}
