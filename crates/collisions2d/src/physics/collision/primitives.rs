//! Narrow-phase primitives
//!
//! Projection intervals used by the separating-axis tests and the
//! caller-owned [`CollisionResult`] record they fill in.

use crate::foundation::collections::BodyHandle;
use crate::foundation::math::Vec2;

/// Interval covered by a shape projected onto an axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Smallest projected value
    pub min: f64,
    /// Largest projected value
    pub max: f64,
}

/// Outcome of comparing two overlapping projections on one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisOverlap {
    /// Signed overlap; negative means b lies towards the negative side of a
    pub overlap: f64,
    /// Whether a may still be contained in b
    pub a_in_b: bool,
    /// Whether b may still be contained in a
    pub b_in_a: bool,
}

impl Projection {
    /// Project a vertex list onto `axis`
    ///
    /// An empty list projects to the empty interval `[+inf, -inf]`, which
    /// separates from everything.
    pub fn of_points(points: &[Vec2], axis: &Vec2) -> Self {
        points.iter().fold(
            Self { min: f64::INFINITY, max: f64::NEG_INFINITY },
            |acc, p| {
                let d = p.dot(axis);
                Self { min: acc.min.min(d), max: acc.max.max(d) }
            },
        )
    }

    /// Project a circle onto a unit `axis`
    pub fn of_circle(center: &Vec2, radius: f64, axis: &Vec2) -> Self {
        let c = center.dot(axis);
        Self { min: c - radius, max: c + radius }
    }

    /// True when the intervals overlap by zero or less
    pub fn is_separated_from(&self, other: &Projection) -> bool {
        self.max <= other.min || other.max <= self.min
    }

    /// Signed overlap of `self` (body a) against `other` (body b)
    ///
    /// Returns `None` when the intervals are separated.
    pub fn overlap_with(&self, other: &Projection) -> Option<AxisOverlap> {
        if self.is_separated_from(other) {
            return None;
        }

        let mut a_in_b = true;
        let mut b_in_a = true;
        let overlap;

        if self.min < other.min {
            a_in_b = false;
            if self.max < other.max {
                overlap = self.max - other.min;
                b_in_a = false;
            } else {
                overlap = nested_overlap(self, other);
            }
        } else {
            b_in_a = false;
            if self.max > other.max {
                overlap = self.min - other.max;
                a_in_b = false;
            } else {
                overlap = nested_overlap(self, other);
            }
        }

        Some(AxisOverlap { overlap, a_in_b, b_in_a })
    }
}

// One interval nests in the other: push out through the shorter side
fn nested_overlap(a: &Projection, b: &Projection) -> f64 {
    let forward = a.max - b.min;
    let backward = b.max - a.min;
    if forward < backward {
        forward
    } else {
        -backward
    }
}

/// Result of a narrow-phase test, reused across calls
///
/// Moving body `a` by [`separation`](Self::separation) resolves the overlap.
/// Every test overwrites every field; on a miss all numbers are zero and all
/// flags are false.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionResult {
    /// Whether the bodies collide
    pub collision: bool,
    /// First body, filled in by the collision system
    pub a: Option<BodyHandle>,
    /// Second body, filled in by the collision system
    pub b: Option<BodyHandle>,
    /// Whether a lies entirely inside b
    pub a_in_b: bool,
    /// Whether b lies entirely inside a
    pub b_in_a: bool,
    /// Penetration depth along the overlap direction
    pub overlap: f64,
    /// X component of the unit direction from a toward b
    pub overlap_x: f64,
    /// Y component of the unit direction from a toward b
    pub overlap_y: f64,
}

impl CollisionResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every field
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Unit direction of the minimum translation, from a toward b
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.overlap_x, self.overlap_y)
    }

    /// Overlap scaled along the direction
    pub fn overlap_vector(&self) -> Vec2 {
        self.direction() * self.overlap
    }

    /// Offset that moves `a` out of `b`
    pub fn separation(&self) -> Vec2 {
        -self.overlap_vector()
    }
}
