//! Collision shape definitions
//!
//! Shapes are stored in MODEL SPACE and transformed to world space on demand
//! (see [`Body`](super::body::Body)). Points and lines are modelled as
//! degenerate outlines so that all vertex-based shapes share one transform
//! and one separating-axis path.

use crate::error::{CollisionError, Result};
use crate::foundation::math::Vec2;

/// Model-space vertex list plus the rotation and scale applied to it
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    points: Vec<Vec2>,
    /// Rotation in radians
    pub angle: f64,
    /// Scale along the local X axis
    pub scale_x: f64,
    /// Scale along the local Y axis
    pub scale_y: f64,
}

impl Outline {
    /// Create an outline with identity rotation and scale
    pub fn new(points: Vec<Vec2>) -> Result<Self> {
        validate_points(&points)?;
        Ok(Self {
            points,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        })
    }

    /// Local vertex list
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub(crate) fn replace_points(&mut self, points: Vec<Vec2>) -> Result<()> {
        validate_points(&points)?;
        self.points = points;
        Ok(())
    }
}

fn validate_points(points: &[Vec2]) -> Result<()> {
    if points.is_empty() {
        return Err(CollisionError::InvalidShape(
            "outline requires at least one vertex".to_string(),
        ));
    }
    if let Some(bad) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(CollisionError::InvalidShape(format!(
            "non-finite vertex ({}, {})",
            bad.x, bad.y
        )));
    }
    Ok(())
}

/// Discriminant-only view of a [`Shape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Circle
    Circle,
    /// Polygon with any number of vertices
    Polygon,
    /// Single-vertex outline
    Point,
    /// Two-vertex outline
    Line,
}

/// Collision shape types (stored in MODEL SPACE)
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A circle around the body position
    Circle {
        /// Unscaled radius
        radius: f64,
        /// Uniform scale; the effective radius is `radius * scale`
        scale: f64,
    },
    /// A convex polygon given by local vertices
    Polygon(Outline),
    /// A point at the body position
    Point(Outline),
    /// A line segment given by two local vertices
    Line(Outline),
}

impl Shape {
    /// Creates a circle shape with the given radius
    pub fn circle(radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(CollisionError::InvalidShape(format!(
                "circle radius must be finite and non-negative, got {radius}"
            )));
        }
        Ok(Self::Circle { radius, scale: 1.0 })
    }

    /// Creates a polygon shape from local vertices
    pub fn polygon(points: Vec<Vec2>) -> Result<Self> {
        Ok(Self::Polygon(Outline::new(points)?))
    }

    /// Creates a point shape at the local origin
    pub fn point() -> Self {
        Self::Point(Outline {
            points: vec![Vec2::zeros()],
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        })
    }

    /// Creates a line shape between two local vertices
    pub fn line(start: Vec2, end: Vec2) -> Result<Self> {
        Ok(Self::Line(Outline::new(vec![start, end])?))
    }

    /// Which variant this is
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Polygon(_) => ShapeKind::Polygon,
            Self::Point(_) => ShapeKind::Point,
            Self::Line(_) => ShapeKind::Line,
        }
    }

    /// Vertex data for outline shapes, `None` for circles
    pub fn outline(&self) -> Option<&Outline> {
        match self {
            Self::Circle { .. } => None,
            Self::Polygon(outline) | Self::Point(outline) | Self::Line(outline) => Some(outline),
        }
    }

    pub(crate) fn outline_mut(&mut self) -> Option<&mut Outline> {
        match self {
            Self::Circle { .. } => None,
            Self::Polygon(outline) | Self::Point(outline) | Self::Line(outline) => Some(outline),
        }
    }

    /// Effective circle radius (`radius * scale`), `None` for outlines
    pub fn effective_radius(&self) -> Option<f64> {
        match self {
            Self::Circle { radius, scale } => Some(radius * scale),
            _ => None,
        }
    }
}

/// World-space view of a refreshed body, borrowed for a single test
#[derive(Debug, Clone, Copy)]
pub enum WorldShape<'a> {
    /// World center and effective radius
    Circle {
        /// Center in world space
        center: Vec2,
        /// Effective radius
        radius: f64,
    },
    /// World vertices and unit edge normals (zero for degenerate edges)
    Outline {
        /// Transformed vertices
        vertices: &'a [Vec2],
        /// One normal per edge `i -> i + 1`
        normals: &'a [Vec2],
    },
}
