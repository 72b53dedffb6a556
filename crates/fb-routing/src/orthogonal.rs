//! Orthogonal (manhattan) connector routing.
//!
//! Given two side-aware endpoints and the midpoint between them, produce
//! an axis-aligned polyline. Each endpoint is first pushed outward from
//! its node by a standoff `offset` in the direction its side implies, so
//! the first and last legs always leave/enter perpendicular to the node
//! face.
//!
//! There are 16 side pairs. Each solver picks 1–2 intermediate waypoints
//! keyed on the relative position of the two offset points:
//!
//! - same side (e.g. right→right): hug the outermost extent of both
//!   offsets, two waypoints;
//! - opposite sides: route through the shared midpoint axis when the
//!   endpoints face each other, otherwise S-curve around via the other
//!   midpoint axis;
//! - perpendicular sides: a single corner waypoint when it approaches
//!   both faces from the outside, else fall back to the shared midpoint
//!   (which never reverses the entry/exit legs).
//!
//! The four solvers are structural mirrors of each other under 90°
//! rotation of sides; `Side::Left` doubles as the fallback arm of the
//! dispatch.

use crate::path::Path;
use fb_core::geometry::{Point, Side};

/// A located, side-aware connector endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointRef {
    pub point: Point,
    pub side: Side,
}

impl EndpointRef {
    pub fn new(point: Point, side: Side) -> Self {
        Self { point, side }
    }

    /// The endpoint pushed outward from its node face.
    fn offset_point(&self, offset: f64) -> Point {
        let dir = self.side.outward();
        Point::new(self.point.x + dir.x * offset, self.point.y + dir.y * offset)
    }
}

/// Compute the manhattan polyline between `source` and `target`.
///
/// `mid` is the midpoint between the raw endpoints (callers usually pass
/// `source.point.midpoint(&target.point)`, but label-aware callers may
/// shift it). `offset` is the endpoint standoff distance.
pub fn orthogonal_path(source: EndpointRef, target: EndpointRef, mid: Point, offset: f64) -> Path {
    let s = source.offset_point(offset);
    let t = target.offset_point(offset);

    let waypoints = match source.side {
        Side::Right => route_from_right(s, t, target.side, mid),
        Side::Bottom => route_from_bottom(s, t, target.side, mid),
        Side::Top => route_from_top(s, t, target.side, mid),
        Side::Left => route_from_left(s, t, target.side, mid),
    };

    let mut points = Vec::with_capacity(waypoints.len() + 4);
    points.push(source.point);
    points.push(s);
    points.extend(waypoints);
    points.push(t);
    points.push(target.point);
    points.dedup_by(|a, b| a == b);

    Path::new(points)
}

/// Source exits rightward from `s`.
fn route_from_right(s: Point, t: Point, target_side: Side, mid: Point) -> Vec<Point> {
    match target_side {
        // Same side: hug the rightmost extent.
        Side::Right => {
            let x = s.x.max(t.x);
            vec![Point::new(x, s.y), Point::new(x, t.y)]
        }
        // Facing pair: vertical channel at the midpoint, else S around.
        Side::Left => {
            if s.x <= t.x {
                vec![Point::new(mid.x, s.y), Point::new(mid.x, t.y)]
            } else {
                vec![Point::new(s.x, mid.y), Point::new(t.x, mid.y)]
            }
        }
        // Perpendicular: corner when it extends both exit legs.
        Side::Top => {
            if t.x >= s.x && s.y <= t.y {
                vec![Point::new(t.x, s.y)]
            } else {
                vec![Point::new(mid.x, s.y), Point::new(mid.x, t.y)]
            }
        }
        Side::Bottom => {
            if t.x >= s.x && s.y >= t.y {
                vec![Point::new(t.x, s.y)]
            } else {
                vec![Point::new(mid.x, s.y), Point::new(mid.x, t.y)]
            }
        }
    }
}

/// Source exits leftward from `s`. Mirror of [`route_from_right`].
fn route_from_left(s: Point, t: Point, target_side: Side, mid: Point) -> Vec<Point> {
    match target_side {
        Side::Left => {
            let x = s.x.min(t.x);
            vec![Point::new(x, s.y), Point::new(x, t.y)]
        }
        Side::Right => {
            if s.x >= t.x {
                vec![Point::new(mid.x, s.y), Point::new(mid.x, t.y)]
            } else {
                vec![Point::new(s.x, mid.y), Point::new(t.x, mid.y)]
            }
        }
        Side::Top => {
            if t.x <= s.x && s.y <= t.y {
                vec![Point::new(t.x, s.y)]
            } else {
                vec![Point::new(mid.x, s.y), Point::new(mid.x, t.y)]
            }
        }
        Side::Bottom => {
            if t.x <= s.x && s.y >= t.y {
                vec![Point::new(t.x, s.y)]
            } else {
                vec![Point::new(mid.x, s.y), Point::new(mid.x, t.y)]
            }
        }
    }
}

/// Source exits downward from `s`. Axis-swapped mirror of [`route_from_right`].
fn route_from_bottom(s: Point, t: Point, target_side: Side, mid: Point) -> Vec<Point> {
    match target_side {
        Side::Bottom => {
            let y = s.y.max(t.y);
            vec![Point::new(s.x, y), Point::new(t.x, y)]
        }
        Side::Top => {
            if s.y <= t.y {
                vec![Point::new(s.x, mid.y), Point::new(t.x, mid.y)]
            } else {
                vec![Point::new(mid.x, s.y), Point::new(mid.x, t.y)]
            }
        }
        Side::Right => {
            if t.y >= s.y && s.x >= t.x {
                vec![Point::new(s.x, t.y)]
            } else {
                vec![Point::new(s.x, mid.y), Point::new(t.x, mid.y)]
            }
        }
        Side::Left => {
            if t.y >= s.y && s.x <= t.x {
                vec![Point::new(s.x, t.y)]
            } else {
                vec![Point::new(s.x, mid.y), Point::new(t.x, mid.y)]
            }
        }
    }
}

/// Source exits upward from `s`. Mirror of [`route_from_bottom`].
fn route_from_top(s: Point, t: Point, target_side: Side, mid: Point) -> Vec<Point> {
    match target_side {
        Side::Top => {
            let y = s.y.min(t.y);
            vec![Point::new(s.x, y), Point::new(t.x, y)]
        }
        Side::Bottom => {
            if s.y >= t.y {
                vec![Point::new(s.x, mid.y), Point::new(t.x, mid.y)]
            } else {
                vec![Point::new(mid.x, s.y), Point::new(mid.x, t.y)]
            }
        }
        Side::Right => {
            if t.y <= s.y && s.x >= t.x {
                vec![Point::new(s.x, t.y)]
            } else {
                vec![Point::new(s.x, mid.y), Point::new(t.x, mid.y)]
            }
        }
        Side::Left => {
            if t.y <= s.y && s.x <= t.x {
                vec![Point::new(s.x, t.y)]
            } else {
                vec![Point::new(s.x, mid.y), Point::new(t.x, mid.y)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const OFFSET: f64 = 10.0;

    fn route(sx: f64, sy: f64, ss: Side, tx: f64, ty: f64, ts: Side) -> Vec<Point> {
        let source = EndpointRef::new(Point::new(sx, sy), ss);
        let target = EndpointRef::new(Point::new(tx, ty), ts);
        let mid = source.point.midpoint(&target.point);
        orthogonal_path(source, target, mid, OFFSET).into_points()
    }

    fn assert_manhattan(points: &[Point]) {
        for w in points.windows(2) {
            assert!(
                w[0].x == w[1].x || w[0].y == w[1].y,
                "segment {:?} -> {:?} is not axis-aligned",
                w[0],
                w[1]
            );
        }
    }

    #[test]
    fn every_side_pair_is_axis_aligned() {
        let sides = [Side::Top, Side::Right, Side::Bottom, Side::Left];
        for &ss in &sides {
            for &ts in &sides {
                // Two placements per pair to hit both branches.
                for (tx, ty) in [(200.0, 150.0), (-120.0, -80.0)] {
                    let pts = route(0.0, 0.0, ss, tx, ty, ts);
                    assert!(pts.len() >= 3, "{ss:?}->{ts:?} too short: {pts:?}");
                    assert_manhattan(&pts);
                    assert_eq!(pts[0], Point::new(0.0, 0.0));
                    assert_eq!(*pts.last().unwrap(), Point::new(tx, ty));
                }
            }
        }
    }

    #[test]
    fn bottom_to_bottom_hugs_the_lower_extent() {
        // Source below target: both waypoints sit at max(source_y, target_y) + offset.
        let pts = route(0.0, 100.0, Side::Bottom, 50.0, 0.0, Side::Bottom);
        assert_eq!(
            pts,
            vec![
                Point::new(0.0, 100.0),
                Point::new(0.0, 110.0),
                Point::new(50.0, 110.0),
                Point::new(50.0, 10.0),
                Point::new(50.0, 0.0),
            ]
        );
    }

    #[test]
    fn right_to_right_hugs_the_rightmost_extent() {
        let pts = route(100.0, 0.0, Side::Right, 0.0, 50.0, Side::Right);
        assert_eq!(
            pts,
            vec![
                Point::new(100.0, 0.0),
                Point::new(110.0, 0.0),
                Point::new(110.0, 50.0),
                Point::new(10.0, 50.0),
                Point::new(0.0, 50.0),
            ]
        );
    }

    #[test]
    fn facing_pair_routes_through_shared_midpoint() {
        // right → left with the target well to the right: vertical channel at mid.x.
        let pts = route(0.0, 0.0, Side::Right, 100.0, 60.0, Side::Left);
        assert_eq!(
            pts,
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(50.0, 0.0),
                Point::new(50.0, 60.0),
                Point::new(90.0, 60.0),
                Point::new(100.0, 60.0),
            ]
        );
    }

    #[test]
    fn overlapping_facing_pair_s_curves_around() {
        // right → left with the target on the LEFT: detour through mid.y.
        let pts = route(100.0, 0.0, Side::Right, 0.0, 60.0, Side::Left);
        assert_eq!(
            pts,
            vec![
                Point::new(100.0, 0.0),
                Point::new(110.0, 0.0),
                Point::new(110.0, 30.0),
                Point::new(-10.0, 30.0),
                Point::new(-10.0, 60.0),
                Point::new(0.0, 60.0),
            ]
        );
    }

    #[test]
    fn perpendicular_pair_uses_single_corner_when_clear() {
        // right → top, target below and to the right: one corner waypoint.
        let pts = route(0.0, 0.0, Side::Right, 100.0, 80.0, Side::Top);
        assert_eq!(
            pts,
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 70.0),
                Point::new(100.0, 80.0),
            ]
        );
    }

    #[test]
    fn perpendicular_pair_falls_back_to_midpoint() {
        // right → top with the target up-left: the corner would enter the
        // node body, so the route detours through the shared midpoint.
        let pts = route(100.0, 80.0, Side::Right, 0.0, 0.0, Side::Top);
        assert_eq!(
            pts,
            vec![
                Point::new(100.0, 80.0),
                Point::new(110.0, 80.0),
                Point::new(50.0, 80.0),
                Point::new(50.0, -10.0),
                Point::new(0.0, -10.0),
                Point::new(0.0, 0.0),
            ]
        );
    }

    #[test]
    fn left_solver_mirrors_right_solver() {
        // Mirror the facing-pair fixture across x and the waypoints mirror too.
        let right = route(0.0, 0.0, Side::Right, 100.0, 60.0, Side::Left);
        let left = route(0.0, 0.0, Side::Left, -100.0, 60.0, Side::Right);
        let mirrored: Vec<Point> = right.iter().map(|p| Point::new(-p.x, p.y)).collect();
        assert_eq!(left, mirrored);
    }

    #[test]
    fn top_solver_mirrors_bottom_solver() {
        let bottom = route(0.0, 0.0, Side::Bottom, 50.0, 100.0, Side::Top);
        let top = route(0.0, 0.0, Side::Top, 50.0, -100.0, Side::Bottom);
        let mirrored: Vec<Point> = bottom.iter().map(|p| Point::new(p.x, -p.y)).collect();
        assert_eq!(top, mirrored);
    }

    #[test]
    fn point_at_distance_walks_the_polyline() {
        let source = EndpointRef::new(Point::new(0.0, 100.0), Side::Bottom);
        let target = EndpointRef::new(Point::new(50.0, 0.0), Side::Bottom);
        let mid = source.point.midpoint(&target.point);
        let path = orthogonal_path(source, target, mid, OFFSET);
        // Legs: 10 down, 50 across, 100 up, 10 up.
        assert_eq!(path.total_length(), 170.0);
        assert_eq!(path.point_at_distance(0.0), Point::new(0.0, 100.0));
        assert_eq!(path.point_at_distance(35.0), Point::new(25.0, 110.0));
        assert_eq!(path.point_at_distance(-0.0), Point::new(50.0, 0.0));
    }
}
