//! Specialized collection types
//!
//! Bodies and BVH nodes live in slot maps so that the id map, the BVH leaves
//! and callers can all hold the same stable, copyable handle without any
//! shared ownership.

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Stable handle to a body stored in a collision system
    pub struct BodyHandle;

    /// Stable handle to a node of the bounding volume hierarchy
    pub struct NodeHandle;
}

/// Arena of bodies keyed by [`BodyHandle`]
pub type BodyArena<T> = SlotMap<BodyHandle, T>;

/// Arena of BVH nodes keyed by [`NodeHandle`]
pub type NodeArena<T> = SlotMap<NodeHandle, T>;
