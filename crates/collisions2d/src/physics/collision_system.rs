//! Core collision detection system
//!
//! Collision detection is split into two phases: a broad phase that finds
//! candidate pairs through the BVH, and a narrow phase that runs the exact
//! SAT test on each candidate.
//!
//! [`Collisions`] owns every body in an arena and tracks them by a string id.
//! One id may own several bodies (line chains register one body per
//! segment). Handles returned by the `create_*` methods stay valid until the
//! id is removed or replaced.

use std::collections::{HashMap, HashSet};

use crate::config::{ConfigError, CollisionsConfig};
use crate::debug::draw::{draw_aabb, draw_body, PathSink};
use crate::error::{CollisionError, Result};
use crate::foundation::collections::{BodyArena, BodyHandle};
use crate::foundation::math::Vec2;
use crate::physics::collision::{sat, Body, BodyOptions, CollisionResult};
use crate::spatial::Bvh;

/// Broad and narrow phase collision system over id-tagged bodies
#[derive(Debug, Clone)]
pub struct Collisions {
    config: CollisionsConfig,
    bodies: BodyArena<Body>,
    bvh: Bvh,
    ids: HashMap<String, Vec<BodyHandle>>,
}

impl Default for Collisions {
    fn default() -> Self {
        Self::new()
    }
}

impl Collisions {
    /// Create an empty system with the default configuration
    pub fn new() -> Self {
        Self::build(CollisionsConfig::default())
    }

    /// Create an empty system after validating `config`
    pub fn with_config(config: CollisionsConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CollisionsConfig) -> Self {
        let capacity = config.initial_capacity;
        Self {
            bodies: BodyArena::with_capacity_and_key(capacity),
            bvh: Bvh::with_capacity(config.bvh_config(), capacity),
            ids: HashMap::with_capacity(capacity),
            config,
        }
    }

    // --- Creation ---

    /// Create and track a circle
    pub fn create_circle(
        &mut self,
        id: impl Into<String>,
        position: Vec2,
        radius: f64,
    ) -> Result<BodyHandle> {
        self.create_circle_with(id, position, radius, BodyOptions::default())
    }

    /// Create and track a scaled or padded circle
    pub fn create_circle_with(
        &mut self,
        id: impl Into<String>,
        position: Vec2,
        radius: f64,
        options: BodyOptions,
    ) -> Result<BodyHandle> {
        let body = self.configure(Body::circle(position, radius)?, &options);
        Ok(self.register_one(id.into(), body))
    }

    /// Create and track a polygon with vertices relative to `position`
    pub fn create_polygon(
        &mut self,
        id: impl Into<String>,
        position: Vec2,
        points: Vec<Vec2>,
    ) -> Result<BodyHandle> {
        self.create_polygon_with(id, position, points, BodyOptions::default())
    }

    /// Create and track a rotated, scaled or padded polygon
    pub fn create_polygon_with(
        &mut self,
        id: impl Into<String>,
        position: Vec2,
        points: Vec<Vec2>,
        options: BodyOptions,
    ) -> Result<BodyHandle> {
        let body = self.configure(Body::polygon(position, points)?, &options);
        Ok(self.register_one(id.into(), body))
    }

    /// Create and track a polygon from world-space vertices
    ///
    /// The first vertex becomes the body position.
    pub fn create_absolute_polygon(
        &mut self,
        id: impl Into<String>,
        points: Vec<Vec2>,
    ) -> Result<BodyHandle> {
        self.create_absolute_polygon_with(id, points, BodyOptions::default())
    }

    /// Like [`Collisions::create_absolute_polygon`], transformed around the
    /// first vertex
    pub fn create_absolute_polygon_with(
        &mut self,
        id: impl Into<String>,
        points: Vec<Vec2>,
        options: BodyOptions,
    ) -> Result<BodyHandle> {
        let (origin, relative) = make_relative(&points)?;
        self.create_polygon_with(id, origin, relative, options)
    }

    /// Create and track a point
    pub fn create_point(&mut self, id: impl Into<String>, position: Vec2) -> BodyHandle {
        self.create_point_with(id, position, None)
    }

    /// Create and track a point with its own padding
    pub fn create_point_with(
        &mut self,
        id: impl Into<String>,
        position: Vec2,
        padding: Option<f64>,
    ) -> BodyHandle {
        let body = Body::point(position).with_padding(padding.unwrap_or(self.config.default_padding));
        self.register_one(id.into(), body)
    }

    /// Create and track a chain of line segments relative to `position`
    ///
    /// Segment `i` joins `points[i]` to `points[i - 1]`, and every segment is
    /// registered under `id`. A single point yields one point body.
    pub fn create_lines(
        &mut self,
        id: impl Into<String>,
        position: Vec2,
        points: &[Vec2],
    ) -> Result<Vec<BodyHandle>> {
        self.create_lines_with(id, position, points, BodyOptions::default())
    }

    /// Create and track a line chain, applying `options` to every segment
    ///
    /// Each segment rotates and scales around `position`, so the chain keeps
    /// its shape.
    pub fn create_lines_with(
        &mut self,
        id: impl Into<String>,
        position: Vec2,
        points: &[Vec2],
        options: BodyOptions,
    ) -> Result<Vec<BodyHandle>> {
        let bodies = match points {
            [] => {
                return Err(CollisionError::InvalidShape(
                    "a line chain requires at least one point".to_string(),
                ));
            }
            [single] => vec![Body::point(position + single)],
            _ => points
                .windows(2)
                .map(|pair| Body::line(position, pair[1], pair[0]))
                .collect::<Result<Vec<_>>>()?,
        };

        let bodies = bodies.into_iter().map(|body| self.configure(body, &options)).collect();
        Ok(self.register(id.into(), bodies))
    }

    /// Create and track a chain of line segments from world-space points
    pub fn create_absolute_lines(
        &mut self,
        id: impl Into<String>,
        points: &[Vec2],
    ) -> Result<Vec<BodyHandle>> {
        self.create_absolute_lines_with(id, points, BodyOptions::default())
    }

    /// Like [`Collisions::create_absolute_lines`], transformed around the
    /// first point
    pub fn create_absolute_lines_with(
        &mut self,
        id: impl Into<String>,
        points: &[Vec2],
        options: BodyOptions,
    ) -> Result<Vec<BodyHandle>> {
        let (origin, relative) = make_relative(points)?;
        self.create_lines_with(id, origin, &relative, options)
    }

    /// Track a prebuilt body under `id`, keeping its own padding
    pub fn insert(&mut self, id: impl Into<String>, body: Body) -> BodyHandle {
        self.register_one(id.into(), body)
    }

    fn configure(&self, body: Body, options: &BodyOptions) -> Body {
        options.apply(body, self.config.default_padding)
    }

    fn register_one(&mut self, id: String, body: Body) -> BodyHandle {
        let handles = self.register(id, vec![body]);
        handles[0]
    }

    fn register(&mut self, id: String, bodies: Vec<Body>) -> Vec<BodyHandle> {
        if self.ids.contains_key(&id) {
            log::debug!("Replacing bodies registered under '{id}'");
            if let Err(err) = self.remove(&id) {
                log::warn!("Failed to replace bodies registered under '{id}': {err}");
            }
        }

        let handles: Vec<BodyHandle> = bodies
            .into_iter()
            .map(|mut body| {
                body.set_id(id.clone());
                body.take_padding_change();
                let bounds = body.padded_bounds();
                let handle = self.bodies.insert(body);
                self.bvh.insert(handle, bounds);
                handle
            })
            .collect();

        log::debug!("Registered {} body(ies) under '{id}'", handles.len());
        self.ids.insert(id, handles.clone());
        handles
    }

    // --- Removal and maintenance ---

    /// Stop tracking every body registered under `id` and hand them back
    pub fn remove(&mut self, id: &str) -> Result<Vec<Body>> {
        let handles = self
            .ids
            .remove(id)
            .ok_or_else(|| CollisionError::UnknownId(id.to_string()))?;

        let mut removed = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Err(err) = self.bvh.remove(handle) {
                log::warn!("Body registered under '{id}' was missing from the BVH: {err}");
            }
            if let Some(body) = self.bodies.remove(handle) {
                removed.push(body);
            }
        }

        log::debug!("Removed {} body(ies) registered under '{id}'", removed.len());
        Ok(removed)
    }

    /// Refresh every body and reinsert those that left their padded box
    ///
    /// Call after moving bodies and before querying potentials. Returns the
    /// number of BVH reinsertions.
    pub fn update(&mut self) -> usize {
        self.bvh.update(&mut self.bodies)
    }

    /// Remove every body
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.bvh.clear();
        self.ids.clear();
    }

    // --- Queries ---

    /// Broad-phase candidates for one body
    pub fn potentials(&self, handle: BodyHandle) -> Result<Vec<BodyHandle>> {
        self.bvh.potentials(handle)
    }

    /// Broad-phase candidates for every body under `id`
    ///
    /// The id's own bodies are excluded; each candidate appears once, in the
    /// order it was first found.
    pub fn potentials_of(&self, id: &str) -> Result<Vec<BodyHandle>> {
        let own = self.parts(id)?;
        let own_set: HashSet<BodyHandle> = own.iter().copied().collect();

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for part in own {
            for candidate in self.bvh.potentials(*part)? {
                if !own_set.contains(&candidate) && seen.insert(candidate) {
                    found.push(candidate);
                }
            }
        }
        Ok(found)
    }

    /// Narrow-phase test between two tracked bodies
    ///
    /// `result`, when given, is overwritten and tagged with both handles.
    /// A body may be tested against itself.
    pub fn collides(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        result: Option<&mut CollisionResult>,
        use_aabb: bool,
    ) -> Result<bool> {
        self.body_mut(a)
            .ok_or(CollisionError::UnknownBody(a))?
            .refresh_coords();
        self.body_mut(b)
            .ok_or(CollisionError::UnknownBody(b))?
            .refresh_coords();

        // Normals are only needed once the bounding boxes overlap
        let boxes_overlap = self.bodies[a]
            .cached_bounds()
            .intersects(&self.bodies[b].cached_bounds());
        if !use_aabb || boxes_overlap {
            self.bodies[a].refresh_normals();
            self.bodies[b].refresh_normals();
        }

        let mut result = result;
        let hit = sat::test(&self.bodies[a], &self.bodies[b], result.as_deref_mut(), use_aabb);
        if let Some(result) = result {
            result.a = Some(a);
            result.b = Some(b);
        }
        Ok(hit)
    }

    /// Test every body under `a_id` against every body under `b_id`
    ///
    /// Pairs are tried in registration order and the search stops at the
    /// first colliding pair, whose data is left in `result`.
    pub fn collides_ids(
        &mut self,
        a_id: &str,
        b_id: &str,
        result: Option<&mut CollisionResult>,
        use_aabb: bool,
    ) -> Result<bool> {
        let a_parts = self.parts(a_id)?.to_vec();
        let b_parts = self.parts(b_id)?.to_vec();

        let mut result = result;
        for a in &a_parts {
            for b in &b_parts {
                if self.collides(*a, *b, result.as_deref_mut(), use_aabb)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Ids of the bodies actually colliding with any body under `id`
    ///
    /// Sorted and free of duplicates; `id` itself is never listed.
    pub fn collided_ids(&mut self, id: &str) -> Result<Vec<String>> {
        let candidates = self.potentials_of(id)?;
        let parts = self.parts(id)?.to_vec();

        let mut hits = Vec::new();
        for candidate in candidates {
            for part in &parts {
                if self.collides(*part, candidate, None, true)? {
                    if let Some(other) = self.bodies[candidate].id() {
                        hits.push(other.to_string());
                    }
                    break;
                }
            }
        }

        hits.sort();
        hits.dedup();
        Ok(hits)
    }

    // --- Accessors ---

    /// Look up a body
    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    /// Look up a body for mutation; call [`update`](Self::update) afterwards
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    /// Handles registered under `id`, in registration order
    pub fn handles(&self, id: &str) -> Option<&[BodyHandle]> {
        self.ids.get(id).map(Vec::as_slice)
    }

    /// Every registered id, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.ids.keys().map(String::as_str)
    }

    /// Whether `id` is registered
    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Every tracked body with its handle
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> + '_ {
        self.bodies.iter()
    }

    /// Number of tracked bodies (not ids)
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Broad-phase hierarchy
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Active configuration
    pub fn config(&self) -> &CollisionsConfig {
        &self.config
    }

    // --- Debug drawing ---

    /// Append the outline of every body to `sink`
    pub fn draw(&mut self, sink: &mut impl PathSink) {
        for body in self.bodies.values_mut() {
            draw_body(body, sink);
        }
    }

    /// Append every BVH node box to `sink`
    pub fn draw_bvh(&self, sink: &mut impl PathSink) {
        for node in self.bvh.nodes() {
            draw_aabb(&node.bounds, sink);
        }
    }

    fn parts(&self, id: &str) -> Result<&[BodyHandle]> {
        self.handles(id)
            .ok_or_else(|| CollisionError::UnknownId(id.to_string()))
    }
}

/// Split world-space points into an origin (the first point) and offsets from it
fn make_relative(points: &[Vec2]) -> Result<(Vec2, Vec<Vec2>)> {
    let origin = *points
        .first()
        .ok_or_else(|| CollisionError::InvalidShape("no points given".to_string()))?;
    Ok((origin, points.iter().map(|p| p - origin).collect()))
}
