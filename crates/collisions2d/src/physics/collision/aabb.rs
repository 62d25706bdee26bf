//! Axis-aligned bounding boxes
//!
//! Used both as the narrow-phase fast reject and as the volume stored in
//! every BVH node.

use crate::foundation::math::Vec2;

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec2,
    /// Maximum corner of the bounding box
    pub max: Vec2,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec2::zeros(),
            max: Vec2::zeros(),
        }
    }
}

impl Aabb {
    /// Create a new AABB from min and max points
    ///
    /// Corners are reordered so that `min <= max` on both axes.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: Vec2::new(min.x.min(max.x), min.y.min(max.y)),
            max: Vec2::new(min.x.max(max.x), min.y.max(max.y)),
        }
    }

    /// Create an AABB centered at a point with given half extents
    pub fn from_center_half_extents(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Create the smallest AABB containing every point, or `None` for an empty slice
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for point in rest {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }
        Some(Self { min, max })
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Width along X
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height along Y
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Area of the box
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Perimeter of the box
    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width() + self.height())
    }

    /// Grow the box by `padding` on all four sides
    pub fn padded(&self, padding: f64) -> Self {
        let pad = Vec2::new(padding, padding);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Check if this AABB intersects another AABB (touching counts)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    /// Check if `other` lies entirely inside this box (shared edges count)
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x && self.min.y <= other.min.y &&
        self.max.x >= other.max.x && self.max.y >= other.max.y
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: &Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(min_x: f64, min_y: f64, size: f64) -> Aabb {
        Aabb::new(Vec2::new(min_x, min_y), Vec2::new(min_x + size, min_y + size))
    }

    #[test]
    fn test_new_reorders_corners() {
        let aabb = Aabb::new(Vec2::new(2.0, -1.0), Vec2::new(-3.0, 4.0));
        assert_eq!(aabb.min, Vec2::new(-3.0, -1.0));
        assert_eq!(aabb.max, Vec2::new(2.0, 4.0));
    }

    #[test]
    fn test_from_points() {
        assert!(Aabb::from_points(&[]).is_none());

        let aabb = Aabb::from_points(&[
            Vec2::new(1.0, 5.0),
            Vec2::new(-2.0, 3.0),
            Vec2::new(4.0, -1.0),
        ]).unwrap();
        assert_eq!(aabb.min, Vec2::new(-2.0, -1.0));
        assert_eq!(aabb.max, Vec2::new(4.0, 5.0));
    }

    #[test]
    fn test_intersects_is_inclusive() {
        let a = square(0.0, 0.0, 1.0);
        let touching = square(1.0, 0.0, 1.0);
        let apart = square(1.5, 0.0, 1.0);
        assert!(a.intersects(&touching));
        assert!(touching.intersects(&a));
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn test_union_and_contains() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(3.0, 2.0, 1.0);
        let union = a.union(&b);
        assert!(union.contains(&a));
        assert!(union.contains(&b));
        assert!(!a.contains(&union));
        assert_relative_eq!(union.area(), 12.0);
        assert_relative_eq!(union.perimeter(), 14.0);
    }

    #[test]
    fn test_padded() {
        let padded = square(0.0, 0.0, 2.0).padded(0.5);
        assert_eq!(padded.min, Vec2::new(-0.5, -0.5));
        assert_eq!(padded.max, Vec2::new(2.5, 2.5));
        assert_relative_eq!(padded.center(), Vec2::new(1.0, 1.0));
        assert_relative_eq!(padded.extents(), Vec2::new(1.5, 1.5));
    }
}
