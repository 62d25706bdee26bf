//! Separating Axis Theorem narrow phase
//!
//! Exact overlap tests between pairs of bodies. Every candidate axis is a
//! unit vector; the axis with the smallest overlap becomes the minimum
//! translation direction, oriented from body a toward body b.
//!
//! Intervals that only touch count as separated, so shapes sharing an edge
//! or a vertex do not collide. Zero-length axes are skipped, and if no axis
//! survives the fixed fallback axis `(0, 1)` is tested instead.

use super::body::Body;
use super::primitives::{CollisionResult, Projection};
use super::shape::WorldShape;
use crate::foundation::math::Vec2;

/// Axis used when two circles share a center or every other axis is degenerate
pub const FALLBACK_AXIS: Vec2 = Vec2::new(0.0, 1.0);

/// Test two bodies for collision, refreshing their world-space caches
///
/// When `use_aabb` is set, the tight bounding boxes are compared first and
/// the full test only runs if they intersect. `result`, when given, is
/// overwritten; the body handles in it are left `None`.
pub fn collides(
    a: &mut Body,
    b: &mut Body,
    result: Option<&mut CollisionResult>,
    use_aabb: bool,
) -> bool {
    a.refresh_coords();
    b.refresh_coords();

    if use_aabb && !a.cached_bounds().intersects(&b.cached_bounds()) {
        if let Some(result) = result {
            result.reset();
        }
        log::trace!("Bounding boxes disjoint, skipping SAT");
        return false;
    }

    a.refresh_normals();
    b.refresh_normals();
    test(a, b, result, false)
}

/// Narrow-phase test on bodies whose caches are already fresh
///
/// Takes shared references so a body may be tested against itself.
pub(crate) fn test(
    a: &Body,
    b: &Body,
    result: Option<&mut CollisionResult>,
    use_aabb: bool,
) -> bool {
    let mut scratch = CollisionResult::default();
    let out = result.unwrap_or(&mut scratch);
    out.reset();

    if use_aabb && !a.cached_bounds().intersects(&b.cached_bounds()) {
        log::trace!("Bounding boxes disjoint, skipping SAT");
        return false;
    }

    let contact = match (a.world_shape(), b.world_shape()) {
        (
            WorldShape::Circle { center: ca, radius: ra },
            WorldShape::Circle { center: cb, radius: rb },
        ) => circle_circle(ca, ra, cb, rb),
        (
            WorldShape::Outline { vertices: va, .. },
            WorldShape::Outline { vertices: vb, .. },
        ) if va.len() == 1 && vb.len() == 1 => point_point(va[0], vb[0]),
        (
            WorldShape::Outline { vertices: va, normals: na },
            WorldShape::Outline { vertices: vb, normals: nb },
        ) => outline_outline(va, na, vb, nb),
        (
            WorldShape::Outline { vertices, normals },
            WorldShape::Circle { center, radius },
        ) => outline_circle(vertices, normals, center, radius, false),
        (
            WorldShape::Circle { center, radius },
            WorldShape::Outline { vertices, normals },
        ) => outline_circle(vertices, normals, center, radius, true),
    };

    match contact {
        Some(contact) => {
            out.collision = true;
            out.overlap = contact.overlap;
            out.overlap_x = contact.direction.x;
            out.overlap_y = contact.direction.y;
            out.a_in_b = contact.a_in_b;
            out.b_in_a = contact.b_in_a;
            true
        }
        None => false,
    }
}

/// Minimum translation found by a pairwise test
#[derive(Debug, Clone, Copy)]
struct Contact {
    overlap: f64,
    direction: Vec2,
    a_in_b: bool,
    b_in_a: bool,
}

/// Running minimum over the candidate axes of one pair
struct AxisSearch {
    best: Option<(f64, Vec2)>,
    a_in_b: bool,
    b_in_a: bool,
}

impl AxisSearch {
    fn new() -> Self {
        Self { best: None, a_in_b: true, b_in_a: true }
    }

    /// Fold one axis in; `false` means the axis separates the shapes
    fn test(&mut self, axis: Vec2, a: &Projection, b: &Projection) -> bool {
        let Some(axis_overlap) = a.overlap_with(b) else {
            return false;
        };

        self.a_in_b &= axis_overlap.a_in_b;
        self.b_in_a &= axis_overlap.b_in_a;

        let improves = self
            .best
            .map_or(true, |(best, _)| axis_overlap.overlap.abs() < best.abs());
        if improves {
            self.best = Some((axis_overlap.overlap, axis));
        }
        true
    }

    fn has_axis(&self) -> bool {
        self.best.is_some()
    }

    fn finish(self) -> Option<Contact> {
        let (overlap, axis) = self.best?;
        let direction = if overlap < 0.0 { -axis } else { axis };
        Some(Contact {
            overlap: overlap.abs(),
            direction,
            a_in_b: self.a_in_b,
            b_in_a: self.b_in_a,
        })
    }
}

fn circle_circle(ca: Vec2, ra: f64, cb: Vec2, rb: f64) -> Option<Contact> {
    let delta = cb - ca;
    let distance = delta.norm();
    let radii = ra + rb;
    if distance >= radii {
        return None;
    }

    let direction = if distance == 0.0 { FALLBACK_AXIS } else { delta / distance };
    Some(Contact {
        overlap: radii - distance,
        direction,
        a_in_b: ra <= rb && distance <= rb - ra,
        b_in_a: rb <= ra && distance <= ra - rb,
    })
}

fn point_point(a: Vec2, b: Vec2) -> Option<Contact> {
    (a == b).then_some(Contact {
        overlap: 0.0,
        direction: Vec2::zeros(),
        a_in_b: true,
        b_in_a: true,
    })
}

fn outline_outline(
    va: &[Vec2],
    na: &[Vec2],
    vb: &[Vec2],
    nb: &[Vec2],
) -> Option<Contact> {
    let mut search = AxisSearch::new();

    for axis in na.iter().chain(nb).filter(|n| **n != Vec2::zeros()) {
        let pa = Projection::of_points(va, axis);
        let pb = Projection::of_points(vb, axis);
        if !search.test(*axis, &pa, &pb) {
            return None;
        }
    }

    if !search.has_axis() {
        let pa = Projection::of_points(va, &FALLBACK_AXIS);
        let pb = Projection::of_points(vb, &FALLBACK_AXIS);
        if !search.test(FALLBACK_AXIS, &pa, &pb) {
            return None;
        }
    }

    search.finish()
}

/// Outline against circle; `circle_first` keeps the caller's a/b order
fn outline_circle(
    vertices: &[Vec2],
    normals: &[Vec2],
    center: Vec2,
    radius: f64,
    circle_first: bool,
) -> Option<Contact> {
    let mut search = AxisSearch::new();
    let test_axis = |search: &mut AxisSearch, axis: Vec2| {
        let outline = Projection::of_points(vertices, &axis);
        let circle = Projection::of_circle(&center, radius, &axis);
        if circle_first {
            search.test(axis, &circle, &outline)
        } else {
            search.test(axis, &outline, &circle)
        }
    };

    for axis in normals.iter().filter(|n| **n != Vec2::zeros()) {
        if !test_axis(&mut search, *axis) {
            return None;
        }
    }

    let nearest = vertices.iter().copied().min_by(|p, q| {
        (center - p).norm_squared().total_cmp(&(center - q).norm_squared())
    });
    if let Some(nearest) = nearest {
        let to_center = center - nearest;
        let length = to_center.norm();
        if length > 0.0 && !test_axis(&mut search, to_center / length) {
            return None;
        }
    }

    if !search.has_axis() && !test_axis(&mut search, FALLBACK_AXIS) {
        return None;
    }

    search.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    const EPSILON: f64 = 1e-9;

    fn unit_square(x: f64, y: f64) -> Body {
        Body::polygon(
            Vec2::new(x, y),
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
        )
        .unwrap()
    }

    fn circle(x: f64, y: f64, radius: f64) -> Body {
        Body::circle(Vec2::new(x, y), radius).unwrap()
    }

    #[test]
    fn test_circles_overlap_depth() {
        let mut a = circle(0.0, 0.0, 1.0);
        let mut b = circle(1.5, 0.0, 1.0);
        let mut result = CollisionResult::new();

        assert!(collides(&mut a, &mut b, Some(&mut result), true));
        assert_relative_eq!(result.overlap, 0.5, epsilon = EPSILON);
        assert_relative_eq!(result.direction(), Vec2::new(1.0, 0.0), epsilon = EPSILON);
        assert!(!result.a_in_b);
        assert!(!result.b_in_a);
    }

    #[test]
    fn test_touching_circles_do_not_collide() {
        let mut a = circle(0.0, 0.0, 1.0);
        let mut b = circle(2.0, 0.0, 1.0);
        assert!(!collides(&mut a, &mut b, None, false));
    }

    #[test]
    fn test_circle_containment() {
        let mut small = circle(0.0, 0.0, 1.0);
        let mut large = circle(0.0, 0.0, 5.0);
        let mut result = CollisionResult::new();

        assert!(collides(&mut small, &mut large, Some(&mut result), true));
        assert!(result.a_in_b);
        assert!(!result.b_in_a);
        assert_relative_eq!(result.overlap, 6.0, epsilon = EPSILON);
        // Coincident centers fall back to +Y
        assert_relative_eq!(result.direction(), FALLBACK_AXIS, epsilon = EPSILON);
    }

    #[test]
    fn test_separated_squares() {
        let mut a = unit_square(0.0, 0.0);
        let mut b = unit_square(1.5, 0.0);
        let mut result = CollisionResult::new();
        result.collision = true;
        result.overlap = 3.0;

        assert!(!collides(&mut a, &mut b, Some(&mut result), false));
        assert_eq!(result, CollisionResult::new());
    }

    #[test]
    fn test_overlapping_squares() {
        let mut a = unit_square(0.0, 0.0);
        let mut b = unit_square(0.5, 0.0);
        let mut result = CollisionResult::new();

        assert!(collides(&mut a, &mut b, Some(&mut result), true));
        assert_relative_eq!(result.overlap, 0.5, epsilon = EPSILON);
        assert_relative_eq!(result.direction(), Vec2::new(1.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(result.separation(), Vec2::new(-0.5, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_direction_flips_with_order() {
        let mut a = unit_square(0.5, 0.0);
        let mut b = unit_square(0.0, 0.0);
        let mut result = CollisionResult::new();

        assert!(collides(&mut a, &mut b, Some(&mut result), true));
        assert_relative_eq!(result.overlap, 0.5, epsilon = EPSILON);
        assert_relative_eq!(result.direction(), Vec2::new(-1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_squares_sharing_an_edge_do_not_collide() {
        let mut a = unit_square(0.0, 0.0);
        let mut b = unit_square(1.0, 0.0);
        assert!(!collides(&mut a, &mut b, None, true));
    }

    #[test]
    fn test_polygon_containment() {
        let mut big = Body::polygon(
            Vec2::zeros(),
            vec![
                Vec2::new(-5.0, -5.0),
                Vec2::new(5.0, -5.0),
                Vec2::new(5.0, 5.0),
                Vec2::new(-5.0, 5.0),
            ],
        )
        .unwrap();
        let mut small = unit_square(0.0, 0.0);
        let mut result = CollisionResult::new();

        assert!(collides(&mut small, &mut big, Some(&mut result), true));
        assert!(result.a_in_b);
        assert!(!result.b_in_a);
    }

    #[test]
    fn test_rotated_square_reaches_further() {
        // A diamond's corner reaches sqrt(0.5) from its center
        let mut diamond = Body::polygon(
            Vec2::zeros(),
            vec![
                Vec2::new(-0.5, -0.5),
                Vec2::new(0.5, -0.5),
                Vec2::new(0.5, 0.5),
                Vec2::new(-0.5, 0.5),
            ],
        )
        .unwrap()
        .with_angle(FRAC_PI_4);
        let mut probe = circle(0.9, 0.0, 0.1);
        assert!(!collides(&mut diamond, &mut probe, None, true));

        probe.set_x(0.75);
        let mut result = CollisionResult::new();
        assert!(collides(&mut diamond, &mut probe, Some(&mut result), true));
        assert!(result.overlap > 0.0);
    }

    #[test]
    fn test_square_against_circle_on_side() {
        let mut square = unit_square(0.0, 0.0);
        let mut ball = circle(1.5, 0.5, 0.6);
        let mut result = CollisionResult::new();

        assert!(collides(&mut square, &mut ball, Some(&mut result), true));
        assert_relative_eq!(result.overlap, 0.1, epsilon = EPSILON);
        assert_relative_eq!(result.direction(), Vec2::new(1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_circle_near_corner_is_separated_by_vertex_axis() {
        let mut square = unit_square(0.0, 0.0);
        let mut ball = circle(1.5, 1.5, 0.6);
        // Bounding boxes and both face axes overlap, only the corner axis separates
        assert!(square.bounds().intersects(&ball.bounds()));
        assert!(!collides(&mut square, &mut ball, None, true));
    }

    #[test]
    fn test_circle_first_keeps_direction_toward_b() {
        let mut ball = circle(-0.4, 0.5, 0.5);
        let mut square = unit_square(0.0, 0.0);
        let mut result = CollisionResult::new();

        assert!(collides(&mut ball, &mut square, Some(&mut result), true));
        assert_relative_eq!(result.overlap, 0.1, epsilon = EPSILON);
        assert_relative_eq!(result.direction(), Vec2::new(1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_circle_inside_polygon() {
        let mut square = Body::polygon(
            Vec2::zeros(),
            vec![
                Vec2::new(-5.0, -5.0),
                Vec2::new(5.0, -5.0),
                Vec2::new(5.0, 5.0),
                Vec2::new(-5.0, 5.0),
            ],
        )
        .unwrap();
        let mut ball = circle(0.0, 0.0, 1.0);
        let mut result = CollisionResult::new();

        assert!(collides(&mut square, &mut ball, Some(&mut result), true));
        assert!(result.b_in_a);
        assert!(!result.a_in_b);
    }

    #[test]
    fn test_point_in_polygon_and_on_edge() {
        let mut square = unit_square(0.0, 0.0);
        let mut inside = Body::point(Vec2::new(0.5, 0.25));
        let mut on_edge = Body::point(Vec2::new(1.0, 0.5));
        let mut result = CollisionResult::new();

        assert!(collides(&mut inside, &mut square, Some(&mut result), true));
        assert!(result.a_in_b);
        assert_relative_eq!(result.overlap, 0.25, epsilon = EPSILON);
        assert!(!collides(&mut on_edge, &mut square, None, true));
    }

    #[test]
    fn test_point_point() {
        let mut a = Body::point(Vec2::new(2.0, 3.0));
        let mut b = Body::point(Vec2::new(2.0, 3.0));
        let mut result = CollisionResult::new();

        assert!(collides(&mut a, &mut b, Some(&mut result), true));
        assert!(result.a_in_b && result.b_in_a);
        assert_eq!(result.overlap, 0.0);

        b.set_y(3.5);
        assert!(!collides(&mut a, &mut b, Some(&mut result), true));
        assert!(!result.collision);
    }

    #[test]
    fn test_point_at_circle_center_uses_fallback() {
        let mut ball = circle(1.0, 1.0, 2.0);
        let mut point = Body::point(Vec2::new(1.0, 1.0));
        let mut result = CollisionResult::new();

        assert!(collides(&mut point, &mut ball, Some(&mut result), true));
        assert!(result.a_in_b);
        assert_relative_eq!(result.overlap, 2.0, epsilon = EPSILON);
        assert_relative_eq!(result.direction().norm(), 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_crossing_lines_collide() {
        let mut a = Body::line(Vec2::zeros(), Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)).unwrap();
        let mut b = Body::line(Vec2::zeros(), Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0)).unwrap();
        let mut result = CollisionResult::new();

        assert!(collides(&mut a, &mut b, Some(&mut result), true));
        assert_relative_eq!(result.overlap, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_collinear_lines_do_not_collide() {
        let mut a = Body::line(Vec2::zeros(), Vec2::zeros(), Vec2::new(2.0, 0.0)).unwrap();
        let mut b = Body::line(Vec2::zeros(), Vec2::new(1.0, 0.0), Vec2::new(3.0, 0.0)).unwrap();
        assert!(!collides(&mut a, &mut b, None, false));
    }

    #[test]
    fn test_aabb_reject_agrees_with_full_test() {
        let mut a = unit_square(0.0, 0.0);
        let mut b = circle(10.0, 10.0, 1.0);
        assert!(!collides(&mut a, &mut b, None, true));
        assert!(!collides(&mut a, &mut b, None, false));
    }

    #[test]
    fn test_self_test_through_shared_refs() {
        let mut body = unit_square(0.0, 0.0);
        body.refresh();
        let mut result = CollisionResult::new();

        assert!(test(&body, &body, Some(&mut result), true));
        assert!(result.a_in_b);
        assert_relative_eq!(result.overlap, 1.0, epsilon = EPSILON);
    }
}
