//! Debug path drawing
//!
//! Bodies and BVH boxes are described as 2D paths on an abstract
//! [`PathSink`], so any canvas-like surface can render them. A
//! `Vec<PathCommand>` records the path instead, which is what tests use.

use std::f64::consts::TAU;

use crate::foundation::math::Vec2;
use crate::physics::collision::{Aabb, Body, WorldShape};

/// Radius of the marker drawn for point bodies
pub const POINT_MARKER_RADIUS: f64 = 1.0;

/// A surface that accepts 2D path segments
pub trait PathSink {
    /// Start a new sub-path at `point`
    fn move_to(&mut self, point: Vec2);

    /// Straight segment from the current point to `point`
    fn line_to(&mut self, point: Vec2);

    /// Circular arc around `center` between two angles in radians
    fn arc(&mut self, center: Vec2, radius: f64, start_angle: f64, end_angle: f64);
}

/// One recorded path segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start of a sub-path
    MoveTo(Vec2),
    /// Straight segment
    LineTo(Vec2),
    /// Circular arc
    Arc {
        /// Arc center
        center: Vec2,
        /// Arc radius
        radius: f64,
        /// Start angle in radians
        start_angle: f64,
        /// End angle in radians
        end_angle: f64,
    },
}

impl PathSink for Vec<PathCommand> {
    fn move_to(&mut self, point: Vec2) {
        self.push(PathCommand::MoveTo(point));
    }

    fn line_to(&mut self, point: Vec2) {
        self.push(PathCommand::LineTo(point));
    }

    fn arc(&mut self, center: Vec2, radius: f64, start_angle: f64, end_angle: f64) {
        self.push(PathCommand::Arc { center, radius, start_angle, end_angle });
    }
}

/// Append the outline of `body` to `sink`
pub fn draw_body(body: &mut Body, sink: &mut impl PathSink) {
    body.refresh();
    match body.world_shape() {
        WorldShape::Circle { center, radius } => {
            sink.move_to(Vec2::new(center.x + radius, center.y));
            sink.arc(center, radius, 0.0, TAU);
        }
        WorldShape::Outline { vertices, .. } => match vertices {
            [] => {}
            [point] => {
                sink.move_to(Vec2::new(point.x + POINT_MARKER_RADIUS, point.y));
                sink.arc(*point, POINT_MARKER_RADIUS, 0.0, TAU);
            }
            [first, rest @ ..] => {
                sink.move_to(*first);
                for vertex in rest {
                    sink.line_to(*vertex);
                }
                if vertices.len() > 2 {
                    sink.line_to(*first);
                }
            }
        },
    }
}

/// Append the four edges of `aabb` to `sink`
pub fn draw_aabb(aabb: &Aabb, sink: &mut impl PathSink) {
    sink.move_to(aabb.min);
    sink.line_to(Vec2::new(aabb.max.x, aabb.min.y));
    sink.line_to(aabb.max);
    sink.line_to(Vec2::new(aabb.min.x, aabb.max.y));
    sink.line_to(aabb.min);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_path() {
        let mut body = Body::circle(Vec2::new(1.0, 2.0), 3.0).unwrap();
        let mut path = Vec::new();
        draw_body(&mut body, &mut path);
        assert_eq!(
            path,
            vec![
                PathCommand::MoveTo(Vec2::new(4.0, 2.0)),
                PathCommand::Arc { center: Vec2::new(1.0, 2.0), radius: 3.0, start_angle: 0.0, end_angle: TAU },
            ]
        );
    }

    #[test]
    fn test_polygon_path_is_closed() {
        let mut body = Body::polygon(
            Vec2::zeros(),
            vec![Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(0.0, 2.0)],
        )
        .unwrap();
        let mut path = Vec::new();
        draw_body(&mut body, &mut path);
        assert_eq!(path.len(), 4);
        assert_eq!(path[0], PathCommand::MoveTo(Vec2::new(0.0, 0.0)));
        assert_eq!(path[3], PathCommand::LineTo(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn test_line_path_is_open() {
        let mut body = Body::line(Vec2::new(1.0, 1.0), Vec2::zeros(), Vec2::new(4.0, 0.0)).unwrap();
        let mut path = Vec::new();
        draw_body(&mut body, &mut path);
        assert_eq!(
            path,
            vec![
                PathCommand::MoveTo(Vec2::new(1.0, 1.0)),
                PathCommand::LineTo(Vec2::new(5.0, 1.0)),
            ]
        );
    }

    #[test]
    fn test_point_marker() {
        let mut body = Body::point(Vec2::new(5.0, 5.0));
        let mut path = Vec::new();
        draw_body(&mut body, &mut path);
        assert!(matches!(path[1], PathCommand::Arc { radius, .. } if radius == POINT_MARKER_RADIUS));
    }

    #[test]
    fn test_aabb_path() {
        let mut path = Vec::new();
        draw_aabb(&Aabb::new(Vec2::zeros(), Vec2::new(1.0, 1.0)), &mut path);
        assert_eq!(path.len(), 5);
        assert_eq!(path[4], PathCommand::LineTo(Vec2::zeros()));
    }
}
