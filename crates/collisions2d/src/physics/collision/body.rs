//! Collision bodies
//!
//! A [`Body`] couples a model-space [`Shape`] with a world position and a
//! lazily rebuilt world-space cache. Mutators never fail on geometry and only
//! mark the cache dirty; the cache is rebuilt the next time a bounding box,
//! vertex list or normal list is needed.

use super::aabb::Aabb;
use super::shape::{Shape, ShapeKind, WorldShape};
use crate::error::{CollisionError, Result};
use crate::foundation::math::{utils, Transform2, Vec2};

/// World-space data derived from the shape and transform
#[derive(Debug, Clone)]
struct WorldCache {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
    bounds: Aabb,
    coords_dirty: bool,
    normals_dirty: bool,
    padding_changed: bool,
}

impl Default for WorldCache {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            bounds: Aabb::default(),
            coords_dirty: true,
            normals_dirty: true,
            padding_changed: false,
        }
    }
}

/// Transform and padding applied to bodies built by the `create_*` methods
///
/// Circles ignore `angle` and take the larger of the two scale factors.
/// A `padding` of `None` falls back to the system's default padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyOptions {
    /// Rotation in radians
    pub angle: f64,
    /// Scale along X
    pub scale_x: f64,
    /// Scale along Y
    pub scale_y: f64,
    /// Bounding volume padding
    pub padding: Option<f64>,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            padding: None,
        }
    }
}

impl BodyOptions {
    /// Options with a uniform scale
    pub fn scaled(scale: f64) -> Self {
        Self {
            scale_x: scale,
            scale_y: scale,
            ..Self::default()
        }
    }

    /// Set the rotation (builder style)
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Set per-axis scale (builder style)
    pub fn with_scale_xy(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    /// Set an explicit padding (builder style)
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = Some(padding);
        self
    }

    /// Apply to `body`, using `default_padding` when no padding was given
    pub fn apply(&self, body: Body, default_padding: f64) -> Body {
        body.with_angle(self.angle)
            .with_scale_xy(self.scale_x, self.scale_y)
            .with_padding(self.padding.unwrap_or(default_padding))
    }
}

/// A movable body tracked by the collision system
#[derive(Debug, Clone)]
pub struct Body {
    id: Option<String>,
    position: Vec2,
    padding: f64,
    shape: Shape,
    cache: WorldCache,
}

impl Body {
    /// Create a body from an already validated shape
    pub fn new(position: Vec2, shape: Shape) -> Self {
        Self {
            id: None,
            position,
            padding: 0.0,
            shape,
            cache: WorldCache::default(),
        }
    }

    /// Create a circle centered at `position`
    pub fn circle(position: Vec2, radius: f64) -> Result<Self> {
        Ok(Self::new(position, Shape::circle(radius)?))
    }

    /// Create a polygon whose vertices are relative to `position`
    pub fn polygon(position: Vec2, points: Vec<Vec2>) -> Result<Self> {
        Ok(Self::new(position, Shape::polygon(points)?))
    }

    /// Create a point at `position`
    pub fn point(position: Vec2) -> Self {
        Self::new(position, Shape::point())
    }

    /// Create a line segment whose endpoints are relative to `position`
    pub fn line(position: Vec2, start: Vec2, end: Vec2) -> Result<Self> {
        Ok(Self::new(position, Shape::line(start, end)?))
    }

    /// Set the external id (builder style)
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the bounding volume padding (builder style)
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.set_padding(padding);
        self
    }

    /// Set the rotation in radians (builder style)
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.set_angle(angle);
        self
    }

    /// Set a uniform scale (builder style)
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.set_scale(scale);
        self
    }

    /// Set per-axis scale (builder style)
    pub fn with_scale_xy(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.set_scale_xy(scale_x, scale_y);
        self
    }

    // --- Accessors ---

    /// External id, if any
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    /// World-space origin
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// X coordinate of the origin
    pub fn x(&self) -> f64 {
        self.position.x
    }

    /// Y coordinate of the origin
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Bounding volume padding
    pub fn padding(&self) -> f64 {
        self.padding
    }

    /// Model-space shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Shape variant
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Rotation in radians (always 0 for circles)
    pub fn angle(&self) -> f64 {
        self.shape.outline().map_or(0.0, |outline| outline.angle)
    }

    /// Scale along X (the uniform scale for circles)
    pub fn scale_x(&self) -> f64 {
        match &self.shape {
            Shape::Circle { scale, .. } => *scale,
            Shape::Polygon(o) | Shape::Point(o) | Shape::Line(o) => o.scale_x,
        }
    }

    /// Scale along Y (the uniform scale for circles)
    pub fn scale_y(&self) -> f64 {
        match &self.shape {
            Shape::Circle { scale, .. } => *scale,
            Shape::Polygon(o) | Shape::Point(o) | Shape::Line(o) => o.scale_y,
        }
    }

    /// Unscaled radius for circles
    pub fn radius(&self) -> Option<f64> {
        match self.shape {
            Shape::Circle { radius, .. } => Some(radius),
            _ => None,
        }
    }

    /// Whether the world-space cache is stale
    pub fn is_dirty(&self) -> bool {
        self.cache.coords_dirty
    }

    // --- Mutators ---

    /// Move the origin
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.invalidate();
    }

    /// Move the origin along X
    pub fn set_x(&mut self, x: f64) {
        self.position.x = x;
        self.invalidate();
    }

    /// Move the origin along Y
    pub fn set_y(&mut self, y: f64) {
        self.position.y = y;
        self.invalidate();
    }

    /// Move the origin by an offset
    pub fn translate(&mut self, offset: Vec2) {
        self.position += offset;
        self.invalidate();
    }

    /// Set the padding; negative or non-finite values become 0
    ///
    /// A tracked body is stored again with the new padding on the next
    /// update.
    pub fn set_padding(&mut self, padding: f64) {
        let padding = if padding.is_finite() { padding.max(0.0) } else { 0.0 };
        if padding != self.padding {
            self.padding = padding;
            self.cache.padding_changed = true;
        }
    }

    /// Set the rotation in radians; circles are unaffected
    pub fn set_angle(&mut self, angle: f64) {
        if let Some(outline) = self.shape.outline_mut() {
            outline.angle = angle;
            self.invalidate();
        }
    }

    /// Set a uniform scale; negative factors are mirrored to positive and
    /// non-finite ones are ignored
    pub fn set_scale(&mut self, scale: f64) {
        let Some(scale) = sanitize_scale(scale) else {
            return;
        };
        match &mut self.shape {
            Shape::Circle { scale: s, .. } => *s = scale,
            Shape::Polygon(o) | Shape::Point(o) | Shape::Line(o) => {
                o.scale_x = scale;
                o.scale_y = scale;
            }
        }
        self.invalidate();
    }

    /// Set per-axis scale
    ///
    /// Circles only support a uniform scale and take the larger factor.
    /// Factors are sanitized like [`Body::set_scale`].
    pub fn set_scale_xy(&mut self, scale_x: f64, scale_y: f64) {
        let (Some(scale_x), Some(scale_y)) = (sanitize_scale(scale_x), sanitize_scale(scale_y)) else {
            return;
        };
        match &mut self.shape {
            Shape::Circle { scale, .. } => *scale = scale_x.max(scale_y),
            Shape::Polygon(o) | Shape::Point(o) | Shape::Line(o) => {
                o.scale_x = scale_x;
                o.scale_y = scale_y;
            }
        }
        self.invalidate();
    }

    /// Set the circle radius; ignored for other shapes and for invalid radii
    pub fn set_radius(&mut self, radius: f64) {
        let kind = self.shape.kind();
        match &mut self.shape {
            Shape::Circle { radius: r, .. } if radius.is_finite() && radius >= 0.0 => {
                *r = radius;
                self.invalidate();
            }
            Shape::Circle { .. } => log::warn!("Ignoring invalid circle radius {radius}"),
            _ => log::warn!("Ignoring set_radius on a {kind:?} body"),
        }
    }

    /// Replace the local vertex list
    ///
    /// Points keep their single vertex, lines require exactly two vertices
    /// and circles have no vertices at all.
    pub fn set_points(&mut self, points: Vec<Vec2>) -> Result<()> {
        match &mut self.shape {
            Shape::Circle { .. } => {
                return Err(CollisionError::InvalidShape("circles have no vertices".to_string()));
            }
            Shape::Point(_) => {
                return Err(CollisionError::InvalidShape("a point's vertex cannot be replaced".to_string()));
            }
            Shape::Line(_) if points.len() != 2 => {
                return Err(CollisionError::InvalidShape(format!(
                    "a line requires exactly 2 vertices, got {}",
                    points.len()
                )));
            }
            Shape::Line(outline) | Shape::Polygon(outline) => outline.replace_points(points)?,
        }
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        self.cache.coords_dirty = true;
        self.cache.normals_dirty = true;
    }

    // --- World-space cache ---

    /// Rebuild world vertices and the tight bounding box if stale
    pub fn refresh_coords(&mut self) {
        if !self.cache.coords_dirty {
            return;
        }

        let position = self.position;
        let cache = &mut self.cache;
        match &self.shape {
            Shape::Circle { radius, scale } => {
                let r = radius * scale;
                cache.vertices.clear();
                cache.bounds = Aabb::from_center_half_extents(position, Vec2::new(r, r));
            }
            Shape::Polygon(outline) | Shape::Point(outline) | Shape::Line(outline) => {
                let transform = Transform2::new(
                    position,
                    outline.angle,
                    Vec2::new(outline.scale_x, outline.scale_y),
                );
                cache.vertices.clear();
                cache.vertices.extend(outline.points().iter().map(|p| transform.transform_point(p)));
                cache.bounds = Aabb::from_points(&cache.vertices)
                    .unwrap_or_else(|| Aabb::new(position, position));
            }
        }

        cache.coords_dirty = false;
        cache.normals_dirty = true;
    }

    /// Rebuild edge normals (and coordinates first, if needed)
    pub fn refresh_normals(&mut self) {
        self.refresh_coords();
        if !self.cache.normals_dirty {
            return;
        }

        let WorldCache { vertices, normals, .. } = &mut self.cache;
        normals.clear();
        let count = vertices.len();
        for i in 0..count {
            let edge = vertices[(i + 1) % count] - vertices[i];
            normals.push(utils::normalize_or_zero(&utils::right_perpendicular(&edge)));
        }

        self.cache.normals_dirty = false;
    }

    /// Rebuild the whole cache if stale
    pub fn refresh(&mut self) {
        self.refresh_normals();
    }

    /// Tight world-space bounding box
    pub fn bounds(&mut self) -> Aabb {
        self.refresh_coords();
        self.cache.bounds
    }

    /// Bounding box grown by the padding, as stored in the BVH
    pub fn padded_bounds(&mut self) -> Aabb {
        self.bounds().padded(self.padding)
    }

    /// World-space vertices (empty for circles)
    pub fn world_vertices(&mut self) -> &[Vec2] {
        self.refresh_coords();
        &self.cache.vertices
    }

    /// World-space unit edge normals (empty for circles)
    pub fn world_normals(&mut self) -> &[Vec2] {
        self.refresh_normals();
        &self.cache.normals
    }

    pub(crate) fn cached_bounds(&self) -> Aabb {
        debug_assert!(!self.cache.coords_dirty, "bounds read from a dirty body");
        self.cache.bounds
    }

    pub(crate) fn cached_padded_bounds(&self) -> Aabb {
        self.cached_bounds().padded(self.padding)
    }

    /// Whether the padding changed since the body was last stored in a BVH;
    /// clears the flag
    pub(crate) fn take_padding_change(&mut self) -> bool {
        std::mem::take(&mut self.cache.padding_changed)
    }

    /// World-space view for narrow-phase tests; requires a refreshed body
    pub(crate) fn world_shape(&self) -> WorldShape<'_> {
        match self.shape {
            Shape::Circle { radius, scale } => WorldShape::Circle {
                center: self.position,
                radius: radius * scale,
            },
            _ => {
                debug_assert!(
                    !self.cache.coords_dirty && !self.cache.normals_dirty,
                    "world shape read from a dirty body"
                );
                WorldShape::Outline {
                    vertices: &self.cache.vertices,
                    normals: &self.cache.normals,
                }
            }
        }
    }
}

fn sanitize_scale(scale: f64) -> Option<f64> {
    if scale.is_finite() {
        Some(scale.abs())
    } else {
        log::warn!("Ignoring non-finite scale {scale}");
        None
    }
}
