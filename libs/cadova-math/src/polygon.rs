//! # Simple Polygon
//!
//! A single closed 2D loop without self-intersections.

use crate::bbox::BoundingBox2;
use config::constants::EPSILON;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A simple closed polygon in the plane.
///
/// Points are stored in order; the closing edge from the last point back to
/// the first is implicit. Counter-clockwise winding encloses positive area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplePolygon {
    points: Vec<DVec2>,
}

impl SimplePolygon {
    /// A polygon from an ordered point loop.
    pub fn new(points: Vec<DVec2>) -> Self {
        Self { points }
    }

    /// The vertex loop.
    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed area by the shoelace formula; positive for counter-clockwise.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    /// Absolute enclosed area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// True when the winding is counter-clockwise.
    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Total edge length including the closing edge.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        (0..n)
            .map(|i| (self.points[(i + 1) % n] - self.points[i]).length())
            .sum()
    }

    /// The loop in reverse order.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// True when every turn has the same orientation (no reflex vertex).
    pub fn is_convex(&self) -> bool {
        let n = self.points.len();
        if n < 4 {
            return n == 3;
        }
        let mut sign = 0.0_f64;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let c = self.points[(i + 2) % n];
            let cross = (b - a).perp_dot(c - b);
            if cross.abs() < EPSILON {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Even-odd point containment via ray casting.
    pub fn contains(&self, point: DVec2) -> bool {
        let n = self.points.len();
        let mut inside = false;
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > point.y) != (b.y > point.y) {
                let x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Bounding box of the vertex loop.
    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::around(self.points.iter().copied())
    }

    /// Drops vertices that are collinear with their neighbors within
    /// `epsilon`, and consecutive duplicates. Passing `0.0` removes exact
    /// duplicates only, which makes the operation idempotent.
    pub fn simplified(&self, epsilon: f64) -> Self {
        let n = self.points.len();
        if n < 4 {
            return self.clone();
        }
        let mut kept = Vec::with_capacity(n);
        for i in 0..n {
            let prev = self.points[(i + n - 1) % n];
            let here = self.points[i];
            let next = self.points[(i + 1) % n];
            if (here - prev).length() <= epsilon {
                continue;
            }
            let cross = (here - prev).perp_dot(next - here).abs();
            let span = (next - prev).length();
            if span > EPSILON && cross / span <= epsilon {
                continue;
            }
            kept.push(here);
        }
        if kept.len() < 3 {
            return self.clone();
        }
        Self { points: kept }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> SimplePolygon {
        SimplePolygon::new(vec![
            DVec2::ZERO,
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ])
    }

    #[test]
    fn test_signed_area_and_winding() {
        let sq = unit_square();
        assert!((sq.signed_area() - 1.0).abs() < 1e-12);
        assert!(sq.is_counter_clockwise());
        assert!(!sq.reversed().is_counter_clockwise());
    }

    #[test]
    fn test_containment() {
        let sq = unit_square();
        assert!(sq.contains(DVec2::splat(0.5)));
        assert!(!sq.contains(DVec2::new(1.5, 0.5)));
    }

    #[test]
    fn test_convexity() {
        assert!(unit_square().is_convex());
        let arrow = SimplePolygon::new(vec![
            DVec2::ZERO,
            DVec2::new(2.0, 0.0),
            DVec2::new(1.0, 0.5),
            DVec2::new(2.0, 1.0),
            DVec2::new(0.0, 1.0),
        ]);
        assert!(!arrow.is_convex());
    }

    #[test]
    fn test_simplify_removes_collinear_run() {
        let p = SimplePolygon::new(vec![
            DVec2::ZERO,
            DVec2::new(0.5, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ]);
        let s = p.simplified(1e-9);
        assert_eq!(s.len(), 4);
        assert!((s.area() - 1.0).abs() < 1e-12);
        // Idempotent at zero epsilon.
        let z = p.simplified(0.0);
        assert_eq!(z, z.simplified(0.0));
    }
}
