//! Curved (bezier) connector routing.
//!
//! A control-point list defines the curve: 2 points make a line, 3 a
//! quadratic, 4 a cubic. Distances along the curve resolve through a
//! fixed-resolution arc-length table: the curve is evaluated at uniform
//! parameter steps, chord lengths accumulate monotonically, and a signed
//! pixel distance inverts to a parameter by binary search + linear
//! interpolation between the bracketing samples.

use crate::path::normalize_distance;
use fb_core::geometry::Point;
use kurbo::{CubicBez, Line, ParamCurve, QuadBez};

/// Samples in the arc-length lookup table (table holds `SAMPLES + 1` entries).
const SAMPLES: usize = 100;

fn to_kurbo(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x, p.y)
}

fn from_kurbo(p: kurbo::Point) -> Point {
    Point::new(p.x, p.y)
}

#[derive(Debug, Clone)]
enum Curve {
    /// 0 or 1 control points; evaluation is constant.
    Degenerate(Point),
    Line(Line),
    Quad(QuadBez),
    Cubic(CubicBez),
}

impl Curve {
    fn eval(&self, t: f64) -> Point {
        match self {
            Curve::Degenerate(p) => *p,
            Curve::Line(c) => from_kurbo(c.eval(t)),
            Curve::Quad(c) => from_kurbo(c.eval(t)),
            Curve::Cubic(c) => from_kurbo(c.eval(t)),
        }
    }
}

/// A routed curve with its arc-length parameterization.
#[derive(Debug, Clone)]
pub struct CurvePath {
    curve: Curve,
    /// Cumulative chord lengths at uniform parameter steps; strictly
    /// non-decreasing, `lengths[0] == 0`, `lengths[SAMPLES] == total`.
    lengths: Vec<f64>,
    total: f64,
}

/// Build a curve from an ordered control-point list.
///
/// 0 points evaluate to the origin, 1 to that point. Lists longer than 4
/// are truncated to a cubic over the first four points.
pub fn curved_path(control: &[Point]) -> CurvePath {
    let curve = match control.len() {
        0 => Curve::Degenerate(Point::ZERO),
        1 => Curve::Degenerate(control[0]),
        2 => Curve::Line(Line::new(to_kurbo(control[0]), to_kurbo(control[1]))),
        3 => Curve::Quad(QuadBez::new(
            to_kurbo(control[0]),
            to_kurbo(control[1]),
            to_kurbo(control[2]),
        )),
        n => {
            if n > 4 {
                log::debug!("curved_path: {n} control points, using the first 4 as a cubic");
            }
            Curve::Cubic(CubicBez::new(
                to_kurbo(control[0]),
                to_kurbo(control[1]),
                to_kurbo(control[2]),
                to_kurbo(control[3]),
            ))
        }
    };
    CurvePath::new(curve)
}

impl CurvePath {
    fn new(curve: Curve) -> Self {
        let mut lengths = Vec::with_capacity(SAMPLES + 1);
        lengths.push(0.0);
        let mut total = 0.0;
        let mut prev = curve.eval(0.0);
        for i in 1..=SAMPLES {
            let t = i as f64 / SAMPLES as f64;
            let next = curve.eval(t);
            total += prev.distance_to(&next);
            lengths.push(total);
            prev = next;
        }
        Self { curve, lengths, total }
    }

    pub fn total_length(&self) -> f64 {
        self.total
    }

    pub fn start(&self) -> Point {
        self.curve.eval(0.0)
    }

    pub fn end(&self) -> Point {
        self.curve.eval(1.0)
    }

    /// The point at a signed distance along the curve.
    ///
    /// The distance resolves per [`normalize_distance`] (negative and
    /// `-0.0` measure from the end, result clamped to the curve length),
    /// then inverts through the arc-length table.
    pub fn point_at_distance(&self, distance: f64) -> Point {
        if self.total == 0.0 {
            return self.curve.eval(0.0);
        }
        let target = normalize_distance(distance, self.total);

        // First sample index with cumulative length >= target.
        let hi = self.lengths.partition_point(|&len| len < target);
        if hi == 0 {
            return self.curve.eval(0.0);
        }
        let lo = hi - 1;

        let span = self.lengths[hi] - self.lengths[lo];
        let frac = if span > 0.0 { (target - self.lengths[lo]) / span } else { 0.0 };
        let t = (lo as f64 + frac) / SAMPLES as f64;
        self.curve.eval(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        a.distance_to(&b) < 1e-6
    }

    #[test]
    fn line_distances_are_exact() {
        let path = curved_path(&[Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        assert!((path.total_length() - 100.0).abs() < 1e-9);
        assert!(close(path.point_at_distance(0.0), Point::new(0.0, 0.0)));
        assert!(close(path.point_at_distance(25.0), Point::new(25.0, 0.0)));
        assert!(close(path.point_at_distance(100.0), Point::new(100.0, 0.0)));
    }

    #[test]
    fn endpoints_hit_start_and_end() {
        let path = curved_path(&[
            Point::new(0.0, 0.0),
            Point::new(50.0, 100.0),
            Point::new(150.0, -100.0),
            Point::new(200.0, 0.0),
        ]);
        assert!(close(path.point_at_distance(0.0), path.start()));
        assert!(close(path.point_at_distance(path.total_length()), path.end()));
        // Past-the-end clamps.
        assert!(close(path.point_at_distance(path.total_length() + 500.0), path.end()));
    }

    #[test]
    fn negative_distance_mirrors_positive() {
        let path = curved_path(&[
            Point::new(0.0, 0.0),
            Point::new(40.0, 80.0),
            Point::new(120.0, 80.0),
        ]);
        let total = path.total_length();
        for d in [10.0, 35.0, total / 2.0] {
            let forward = path.point_at_distance(total - d);
            let backward = path.point_at_distance(-d);
            assert!(close(forward, backward), "mismatch at d={d}");
        }
        assert!(close(path.point_at_distance(-0.0), path.end()));
    }

    #[test]
    fn quadratic_midpoint_is_on_curve() {
        // Symmetric quad: the arc-length midpoint is the curve's apex.
        let path = curved_path(&[
            Point::new(0.0, 0.0),
            Point::new(50.0, 100.0),
            Point::new(100.0, 0.0),
        ]);
        let mid = path.point_at_distance(path.total_length() / 2.0);
        assert!((mid.x - 50.0).abs() < 0.5);
        assert!((mid.y - 50.0).abs() < 0.5);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(close(curved_path(&[]).point_at_distance(10.0), Point::ZERO));
        let single = curved_path(&[Point::new(7.0, 8.0)]);
        assert!(close(single.point_at_distance(0.0), Point::new(7.0, 8.0)));
        assert!(close(single.point_at_distance(-3.0), Point::new(7.0, 8.0)));
    }
}
