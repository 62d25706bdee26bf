//! Spatial partitioning data structures
//!
//! Provides the broad-phase index used to find candidate collision pairs
//! and to answer region queries in 2D space.

mod bvh;

pub use bvh::{Bvh, BvhConfig, BvhNode, InsertionCost, NodeKind};
