//! Math utilities and types
//!
//! Provides the 2D vector type used by the geometry and collision code,
//! plus the few transforms bodies need to move from model to world space.

pub use nalgebra::{Rotation2, Vector2};

/// 2D vector type (double precision; overlap depths are compared at 1e-9)
pub type Vec2 = Vector2<f64>;

/// Model-to-world transform for outline shapes
///
/// Local vertices are scaled component-wise, rotated about the body origin,
/// then translated by the body position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2 {
    /// World-space origin
    pub position: Vec2,

    /// Rotation in radians (counter-clockwise)
    pub angle: f64,

    /// Scale factors along the local X and Y axes
    pub scale: Vec2,
}

impl Default for Transform2 {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            angle: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Transform2 {
    /// Create a transform from all of its parts
    pub fn new(position: Vec2, angle: f64, scale: Vec2) -> Self {
        Self { position, angle, scale }
    }

    /// Apply this transform to a model-space point
    pub fn transform_point(&self, local: &Vec2) -> Vec2 {
        let scaled = local.component_mul(&self.scale);
        // Skip the trig for the common unrotated case
        let rotated = if self.angle == 0.0 {
            scaled
        } else {
            Rotation2::new(self.angle) * scaled
        };
        rotated + self.position
    }
}

/// Math utility functions
pub mod utils {
    use super::Vec2;

    /// Right-hand perpendicular `(y, -x)`; outward for counter-clockwise winding
    pub fn right_perpendicular(v: &Vec2) -> Vec2 {
        Vec2::new(v.y, -v.x)
    }

    /// Normalize a vector, returning zero for zero-length input
    pub fn normalize_or_zero(v: &Vec2) -> Vec2 {
        let length = v.norm();
        if length == 0.0 {
            Vec2::zeros()
        } else {
            v / length
        }
    }
}
