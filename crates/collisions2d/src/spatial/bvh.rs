//! Dynamic bounding volume hierarchy
//!
//! A binary tree of axis-aligned boxes used as the broad phase. Leaves hold
//! one body handle and that body's padded bounding box; branches hold the
//! union of their two children. Bodies are inserted by descending towards
//! the child whose cost grows least, and a moved body is only reinserted
//! once its new box escapes the padded box it was stored with.
//!
//! Nodes live in a slot map arena so that parent links and child links are
//! plain copyable handles.

use serde::{Deserialize, Serialize};

use crate::error::{CollisionError, Result};
use crate::foundation::collections::{BodyArena, BodyHandle, NodeArena, NodeHandle, SecondaryMap};
use crate::physics::collision::{Aabb, Body};

/// Cost function minimised when choosing where to insert a leaf
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertionCost {
    /// Box area (tighter trees for roughly square boxes)
    #[default]
    Area,
    /// Box perimeter (copes better with long thin boxes)
    Perimeter,
}

impl InsertionCost {
    /// Cost of a single box
    pub fn of(self, aabb: &Aabb) -> f64 {
        match self {
            Self::Area => aabb.area(),
            Self::Perimeter => aabb.perimeter(),
        }
    }

    /// How much the cost of `aabb` grows when it is extended to cover `other`
    pub fn growth(self, aabb: &Aabb, other: &Aabb) -> f64 {
        self.of(&aabb.union(other)) - self.of(aabb)
    }
}

/// Configuration for BVH behavior
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BvhConfig {
    /// Cost used to pick a child during insertion
    pub insertion_cost: InsertionCost,
}

/// Leaf or branch payload of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Wraps exactly one body
    Leaf(BodyHandle),
    /// Two children; its box is their union
    Branch {
        /// Child the descent prefers on ties
        left: NodeHandle,
        /// Other child
        right: NodeHandle,
    },
}

/// Single node in the hierarchy
#[derive(Debug, Clone)]
pub struct BvhNode {
    /// Padded body box for leaves, union of children for branches
    pub bounds: Aabb,
    /// Parent branch, `None` for the root
    pub parent: Option<NodeHandle>,
    /// Leaf or branch payload
    pub kind: NodeKind,
}

impl BvhNode {
    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Body wrapped by a leaf
    pub fn body(&self) -> Option<BodyHandle> {
        match self.kind {
            NodeKind::Leaf(body) => Some(body),
            NodeKind::Branch { .. } => None,
        }
    }
}

/// Bounding volume hierarchy over body handles
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    config: BvhConfig,
    nodes: NodeArena<BvhNode>,
    root: Option<NodeHandle>,
    leaves: SecondaryMap<BodyHandle, NodeHandle>,
}

impl Bvh {
    /// Create an empty hierarchy
    pub fn new(config: BvhConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Create an empty hierarchy with room for `capacity` bodies
    pub fn with_capacity(config: BvhConfig, capacity: usize) -> Self {
        Self {
            config,
            // A full binary tree with n leaves has 2n - 1 nodes
            nodes: NodeArena::with_capacity_and_key(capacity.saturating_mul(2)),
            root: None,
            leaves: SecondaryMap::with_capacity(capacity),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &BvhConfig {
        &self.config
    }

    /// Insert a body with its padded bounding box
    ///
    /// A body that is already tracked is moved to the new box.
    pub fn insert(&mut self, body: BodyHandle, bounds: Aabb) {
        if let Some(leaf) = self.leaves.remove(body) {
            self.detach_leaf(leaf);
        }
        self.insert_leaf(body, bounds);
    }

    /// Remove a body, returning the box it was stored with
    pub fn remove(&mut self, body: BodyHandle) -> Result<Aabb> {
        let leaf = self
            .leaves
            .remove(body)
            .ok_or(CollisionError::UnknownBody(body))?;
        Ok(self.detach_leaf(leaf))
    }

    /// Reinsert a body if its tight `bounds` escaped its stored box
    ///
    /// The new stored box is `bounds` grown by `padding`. Returns whether the
    /// leaf was reinserted.
    pub fn update_leaf(&mut self, body: BodyHandle, bounds: Aabb, padding: f64) -> Result<bool> {
        let leaf = *self
            .leaves
            .get(body)
            .ok_or(CollisionError::UnknownBody(body))?;

        if self.nodes[leaf].bounds.contains(&bounds) {
            return Ok(false);
        }

        self.detach_leaf(leaf);
        self.insert_leaf(body, bounds.padded(padding));
        log::trace!("Reinserted {body:?} into BVH");
        Ok(true)
    }

    /// Refresh every tracked body and reinsert those whose tight box escaped
    /// their stored padded box
    ///
    /// Bodies whose padding changed are always reinserted with the new
    /// padding. Returns the number of reinsertions. Bodies in `bodies` that
    /// are not tracked here are left alone.
    pub fn update(&mut self, bodies: &mut BodyArena<Body>) -> usize {
        let mut reinserted = 0;
        for (handle, body) in bodies.iter_mut() {
            if !self.leaves.contains_key(handle) {
                continue;
            }
            let bounds = body.bounds();
            if body.take_padding_change() {
                self.insert(handle, body.cached_padded_bounds());
                reinserted += 1;
            } else if let Ok(true) = self.update_leaf(handle, bounds, body.padding()) {
                reinserted += 1;
            }
        }

        log::debug!(
            "BVH update: {} of {} bodies reinserted, depth {}",
            reinserted,
            self.len(),
            self.depth()
        );
        reinserted
    }

    /// Bodies whose stored boxes intersect the stored box of `body`
    ///
    /// This is a superset of the bodies actually colliding with it.
    pub fn potentials(&self, body: BodyHandle) -> Result<Vec<BodyHandle>> {
        let leaf = *self
            .leaves
            .get(body)
            .ok_or(CollisionError::UnknownBody(body))?;
        Ok(self.collect(&self.nodes[leaf].bounds, Some(body)))
    }

    /// Bodies whose stored boxes intersect `region`
    pub fn query(&self, region: &Aabb) -> Vec<BodyHandle> {
        self.collect(region, None)
    }

    /// Whether `body` is tracked
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.leaves.contains_key(body)
    }

    /// Box `body` is currently stored with
    pub fn bounds_of(&self, body: BodyHandle) -> Option<Aabb> {
        self.leaves.get(body).map(|leaf| self.nodes[*leaf].bounds)
    }

    /// Number of tracked bodies
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether no body is tracked
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Number of levels; 0 when empty
    pub fn depth(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };

        let mut deepest = 0;
        let mut stack = vec![(root, 1)];
        while let Some((handle, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let NodeKind::Branch { left, right } = self.nodes[handle].kind {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        deepest
    }

    /// Root node handle
    pub fn root(&self) -> Option<NodeHandle> {
        self.root
    }

    /// Box covering every tracked body
    pub fn root_bounds(&self) -> Option<Aabb> {
        self.root.map(|root| self.nodes[root].bounds)
    }

    /// Look up a node
    pub fn node(&self, handle: NodeHandle) -> Option<&BvhNode> {
        self.nodes.get(handle)
    }

    /// Every node, branches and leaves, in arena order
    pub fn nodes(&self) -> impl Iterator<Item = &BvhNode> + '_ {
        self.nodes.values()
    }

    /// Remove every body
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.leaves.clear();
        self.root = None;
    }

    // --- Internals ---

    fn insert_leaf(&mut self, body: BodyHandle, bounds: Aabb) {
        let leaf = self.nodes.insert(BvhNode {
            bounds,
            parent: None,
            kind: NodeKind::Leaf(body),
        });
        self.leaves.insert(body, leaf);

        let Some(mut current) = self.root else {
            self.root = Some(leaf);
            return;
        };

        let cost = self.config.insertion_cost;
        loop {
            match self.nodes[current].kind {
                NodeKind::Branch { left, right } => {
                    let grown = self.nodes[current].bounds.union(&bounds);
                    self.nodes[current].bounds = grown;

                    let left_growth = cost.growth(&self.nodes[left].bounds, &bounds);
                    let right_growth = cost.growth(&self.nodes[right].bounds, &bounds);
                    current = if right_growth < left_growth { right } else { left };
                }
                NodeKind::Leaf(_) => {
                    let parent = self.nodes[current].parent;
                    let merged = self.nodes[current].bounds.union(&bounds);
                    let branch = self.nodes.insert(BvhNode {
                        bounds: merged,
                        parent,
                        kind: NodeKind::Branch {
                            left: current,
                            right: leaf,
                        },
                    });
                    self.nodes[current].parent = Some(branch);
                    self.nodes[leaf].parent = Some(branch);

                    match parent {
                        Some(parent) => self.replace_child(parent, current, branch),
                        None => self.root = Some(branch),
                    }
                    return;
                }
            }
        }
    }

    /// Unlink a leaf node, collapse its parent and refit ancestors
    ///
    /// The caller owns the `leaves` map entry.
    fn detach_leaf(&mut self, leaf: NodeHandle) -> Aabb {
        let Some(node) = self.nodes.remove(leaf) else {
            return Aabb::default();
        };

        let Some(parent) = node.parent else {
            self.root = None;
            return node.bounds;
        };

        if let Some(parent_node) = self.nodes.remove(parent) {
            let sibling = match parent_node.kind {
                NodeKind::Branch { left, right } if left == leaf => right,
                NodeKind::Branch { left, .. } => left,
                NodeKind::Leaf(_) => return node.bounds,
            };

            let grandparent = parent_node.parent;
            self.nodes[sibling].parent = grandparent;
            match grandparent {
                Some(grandparent) => {
                    self.replace_child(grandparent, parent, sibling);
                    self.refit_from(grandparent);
                }
                None => self.root = Some(sibling),
            }
        }

        node.bounds
    }

    fn replace_child(&mut self, parent: NodeHandle, old: NodeHandle, new: NodeHandle) {
        if let NodeKind::Branch { left, right } = &mut self.nodes[parent].kind {
            if *left == old {
                *left = new;
            } else if *right == old {
                *right = new;
            }
        }
    }

    /// Re-tighten branch boxes from `start` up to the root
    fn refit_from(&mut self, start: NodeHandle) {
        let mut current = Some(start);
        while let Some(handle) = current {
            if let NodeKind::Branch { left, right } = self.nodes[handle].kind {
                let tight = self.nodes[left].bounds.union(&self.nodes[right].bounds);
                self.nodes[handle].bounds = tight;
            }
            current = self.nodes[handle].parent;
        }
    }

    fn collect(&self, region: &Aabb, skip: Option<BodyHandle>) -> Vec<BodyHandle> {
        let mut found = Vec::new();
        let Some(root) = self.root else {
            return found;
        };

        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let node = &self.nodes[handle];
            if !node.bounds.intersects(region) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf(body) => {
                    if Some(body) != skip {
                        found.push(body);
                    }
                }
                NodeKind::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        found
    }

    /// Panic if links, leaf map or branch boxes are inconsistent
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let Some(root) = self.root else {
            assert!(self.nodes.is_empty(), "empty tree with live nodes");
            assert!(self.leaves.is_empty(), "empty tree with tracked leaves");
            return;
        };
        assert!(self.nodes[root].parent.is_none(), "root has a parent");

        let mut leaf_count = 0;
        let mut node_count = 0;
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            node_count += 1;
            let node = &self.nodes[handle];
            match node.kind {
                NodeKind::Leaf(body) => {
                    leaf_count += 1;
                    assert_eq!(self.leaves.get(body), Some(&handle), "leaf map mismatch");
                }
                NodeKind::Branch { left, right } => {
                    assert_eq!(self.nodes[left].parent, Some(handle), "broken parent link");
                    assert_eq!(self.nodes[right].parent, Some(handle), "broken parent link");
                    let union = self.nodes[left].bounds.union(&self.nodes[right].bounds);
                    assert_eq!(node.bounds, union, "branch box is not the union of its children");
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        assert_eq!(leaf_count, self.leaves.len(), "unreachable leaves");
        assert_eq!(node_count, self.nodes.len(), "unreachable nodes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::foundation::math::Vec2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn square(x: f64, y: f64, size: f64) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::new(x + size, y + size))
    }

    fn track(bodies: &mut BodyArena<Body>, bvh: &mut Bvh, mut body: Body) -> BodyHandle {
        body.take_padding_change();
        let bounds = body.padded_bounds();
        let handle = bodies.insert(body);
        bvh.insert(handle, bounds);
        handle
    }

    /// Mint handles without needing real bodies
    fn handles(count: usize) -> Vec<BodyHandle> {
        let mut arena: BodyArena<()> = BodyArena::with_key();
        (0..count).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn test_empty_tree() {
        let bvh = Bvh::default();
        let stray = handles(1)[0];
        assert!(bvh.is_empty());
        assert_eq!(bvh.depth(), 0);
        assert!(bvh.root_bounds().is_none());
        assert!(bvh.query(&square(0.0, 0.0, 100.0)).is_empty());
        assert_eq!(bvh.potentials(stray).unwrap_err().kind(), ErrorKind::NotFound);
        bvh.assert_consistent();
    }

    #[test]
    fn test_single_leaf_is_root() {
        let mut bvh = Bvh::default();
        let body = handles(1)[0];
        bvh.insert(body, square(0.0, 0.0, 1.0));

        assert_eq!(bvh.len(), 1);
        assert_eq!(bvh.depth(), 1);
        assert!(bvh.node(bvh.root().unwrap()).unwrap().is_leaf());
        assert!(bvh.potentials(body).unwrap().is_empty());
        bvh.assert_consistent();
    }

    #[test]
    fn test_new_leaf_goes_right_of_old_leaf() {
        let mut bvh = Bvh::default();
        let ids = handles(2);
        bvh.insert(ids[0], square(0.0, 0.0, 1.0));
        bvh.insert(ids[1], square(5.0, 0.0, 1.0));

        let root = bvh.node(bvh.root().unwrap()).unwrap();
        let NodeKind::Branch { left, right } = root.kind else {
            panic!("root should be a branch");
        };
        assert_eq!(bvh.node(left).unwrap().body(), Some(ids[0]));
        assert_eq!(bvh.node(right).unwrap().body(), Some(ids[1]));
        assert_eq!(root.bounds, square(0.0, 0.0, 1.0).union(&square(5.0, 0.0, 1.0)));
    }

    #[test]
    fn test_potentials_match_brute_force() {
        for cost in [InsertionCost::Area, InsertionCost::Perimeter] {
            let mut bvh = Bvh::new(BvhConfig { insertion_cost: cost });
            let mut rng = StdRng::seed_from_u64(7);
            let ids = handles(200);
            let boxes: Vec<Aabb> = ids
                .iter()
                .map(|_| {
                    let x = rng.gen_range(0.0..100.0);
                    let y = rng.gen_range(0.0..100.0);
                    let w = rng.gen_range(0.5..6.0);
                    let h = rng.gen_range(0.5..6.0);
                    Aabb::new(Vec2::new(x, y), Vec2::new(x + w, y + h))
                })
                .collect();

            for (id, aabb) in ids.iter().zip(&boxes) {
                bvh.insert(*id, *aabb);
            }
            bvh.assert_consistent();

            for (i, id) in ids.iter().enumerate() {
                let mut found = bvh.potentials(*id).unwrap();
                found.sort();
                let mut expected: Vec<BodyHandle> = ids
                    .iter()
                    .zip(&boxes)
                    .filter(|(other, aabb)| *other != id && aabb.intersects(&boxes[i]))
                    .map(|(other, _)| *other)
                    .collect();
                expected.sort();
                assert_eq!(found, expected);
            }
        }
    }

    #[test]
    fn test_remove_collapses_parent() {
        let mut bvh = Bvh::default();
        let ids = handles(3);
        bvh.insert(ids[0], square(0.0, 0.0, 1.0));
        bvh.insert(ids[1], square(10.0, 0.0, 1.0));
        bvh.insert(ids[2], square(20.0, 0.0, 1.0));

        let removed = bvh.remove(ids[1]).unwrap();
        assert_eq!(removed, square(10.0, 0.0, 1.0));
        assert_eq!(bvh.len(), 2);
        assert!(!bvh.contains(ids[1]));
        bvh.assert_consistent();
        assert_eq!(
            bvh.root_bounds(),
            Some(square(0.0, 0.0, 1.0).union(&square(20.0, 0.0, 1.0)))
        );

        bvh.remove(ids[0]).unwrap();
        bvh.remove(ids[2]).unwrap();
        assert!(bvh.is_empty());
        bvh.assert_consistent();
    }

    #[test]
    fn test_remove_unknown_leaves_tree_untouched() {
        let mut bvh = Bvh::default();
        let ids = handles(2);
        bvh.insert(ids[0], square(0.0, 0.0, 1.0));

        let err = bvh.remove(ids[1]).unwrap_err();
        assert_eq!(err, CollisionError::UnknownBody(ids[1]));
        assert!(err.is_not_found());
        assert_eq!(bvh.len(), 1);

        bvh.remove(ids[0]).unwrap();
        assert!(bvh.remove(ids[0]).unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_leaf_only_when_box_escapes() {
        let mut bvh = Bvh::default();
        let ids = handles(2);
        bvh.insert(ids[0], square(0.0, 0.0, 4.0));
        bvh.insert(ids[1], square(10.0, 0.0, 1.0));

        assert!(!bvh.update_leaf(ids[0], square(1.0, 1.0, 2.0), 0.0).unwrap());
        assert_eq!(bvh.bounds_of(ids[0]), Some(square(0.0, 0.0, 4.0)));

        assert!(bvh.update_leaf(ids[0], square(3.0, 3.0, 2.0), 0.5).unwrap());
        assert_eq!(bvh.bounds_of(ids[0]), Some(square(3.0, 3.0, 2.0).padded(0.5)));
        bvh.assert_consistent();

        let stray = handles(3)[2];
        assert!(bvh.update_leaf(stray, square(0.0, 0.0, 1.0), 0.0).is_err());
    }

    #[test]
    fn test_duplicate_insert_moves_body() {
        let mut bvh = Bvh::default();
        let ids = handles(2);
        bvh.insert(ids[0], square(0.0, 0.0, 1.0));
        bvh.insert(ids[1], square(2.0, 0.0, 1.0));
        bvh.insert(ids[0], square(50.0, 50.0, 1.0));

        assert_eq!(bvh.len(), 2);
        assert_eq!(bvh.bounds_of(ids[0]), Some(square(50.0, 50.0, 1.0)));
        bvh.assert_consistent();
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut bodies: BodyArena<Body> = BodyArena::with_key();
        let mut bvh = Bvh::default();
        for i in 0..20 {
            let body = Body::circle(Vec2::new(f64::from(i) * 3.0, 0.0), 1.0)
                .unwrap()
                .with_padding(0.5);
            track(&mut bodies, &mut bvh, body);
        }

        for body in bodies.values_mut() {
            body.translate(Vec2::new(0.0, 2.0));
        }
        assert_eq!(bvh.update(&mut bodies), 20);
        bvh.assert_consistent();

        let snapshot: Vec<Option<Aabb>> = bodies.keys().map(|h| bvh.bounds_of(h)).collect();
        assert_eq!(bvh.update(&mut bodies), 0);
        let again: Vec<Option<Aabb>> = bodies.keys().map(|h| bvh.bounds_of(h)).collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_small_moves_stay_inside_padding() {
        let mut bodies: BodyArena<Body> = BodyArena::with_key();
        let mut bvh = Bvh::default();
        let body = Body::circle(Vec2::zeros(), 1.0).unwrap().with_padding(1.0);
        let handle = track(&mut bodies, &mut bvh, body);

        bodies[handle].translate(Vec2::new(0.5, 0.0));
        assert_eq!(bvh.update(&mut bodies), 0);
        bodies[handle].translate(Vec2::new(1.0, 0.0));
        assert_eq!(bvh.update(&mut bodies), 1);
    }

    #[test]
    fn test_padding_change_restores_body() {
        let mut bodies: BodyArena<Body> = BodyArena::with_key();
        let mut bvh = Bvh::default();
        let a = track(&mut bodies, &mut bvh, Body::circle(Vec2::zeros(), 1.0).unwrap());
        let b = track(&mut bodies, &mut bvh, Body::circle(Vec2::new(3.5, 0.0), 1.0).unwrap());
        assert!(bvh.potentials(a).unwrap().is_empty());

        bodies[a].set_padding(2.0);
        assert_eq!(bvh.update(&mut bodies), 1);
        assert_eq!(bvh.bounds_of(a), Some(square(-3.0, -3.0, 6.0)));
        assert_eq!(bvh.potentials(a).unwrap(), vec![b]);
        bvh.assert_consistent();

        // Shrinking is picked up too
        bodies[a].set_padding(0.0);
        assert_eq!(bvh.update(&mut bodies), 1);
        assert_eq!(bvh.bounds_of(a), Some(square(-1.0, -1.0, 2.0)));
        assert_eq!(bvh.update(&mut bodies), 0);
    }

    #[test]
    fn test_query_region_and_clear() {
        let mut bvh = Bvh::with_capacity(BvhConfig::default(), 8);
        let ids = handles(3);
        bvh.insert(ids[0], square(0.0, 0.0, 1.0));
        bvh.insert(ids[1], square(5.0, 5.0, 1.0));
        bvh.insert(ids[2], square(9.0, 9.0, 1.0));

        let mut hits = bvh.query(&square(4.0, 4.0, 6.0));
        hits.sort();
        let mut expected = vec![ids[1], ids[2]];
        expected.sort();
        assert_eq!(hits, expected);
        assert_eq!(bvh.nodes().count(), 5);

        bvh.clear();
        assert!(bvh.is_empty());
        assert_eq!(bvh.nodes().count(), 0);
        bvh.assert_consistent();
    }

    #[test]
    fn test_insertion_cost_growth() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(1.0, 0.0, 1.0);
        assert_eq!(InsertionCost::Area.growth(&a, &b), 1.0);
        assert_eq!(InsertionCost::Perimeter.growth(&a, &b), 2.0);
        assert_eq!(InsertionCost::Area.growth(&a, &a), 0.0);
    }
}
