//! A single Bezier curve segment of degree 1 to 3.

use crate::error::InvalidGeometry;
use crate::segmentation::Segmentation;
use config::constants::{
    BISECTION_MAX_ITERATIONS, CURVE_PARAMETER_TOLERANCE, NEWTON_MAX_ITERATIONS,
};
use glam::{DVec2, DVec3};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Control-point algebra required by the curve evaluator.
pub trait ControlPoint:
    Copy
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + std::fmt::Debug
    + 'static
{
    /// The additive identity.
    fn zero() -> Self;
    /// Euclidean distance to another point.
    fn distance(self, other: Self) -> f64;
    /// Linear interpolation toward `other`.
    fn lerp(self, other: Self, t: f64) -> Self {
        self * (1.0 - t) + other * t
    }
}

impl ControlPoint for DVec2 {
    fn zero() -> Self {
        DVec2::ZERO
    }
    fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }
}

impl ControlPoint for DVec3 {
    fn zero() -> Self {
        DVec3::ZERO
    }
    fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }
}

/// A Bezier curve segment.
///
/// Holds 2 to 4 control points (degree 1 to 3). Derivative curves may hold
/// a single point, in which case evaluation is constant.
///
/// # Example
///
/// ```rust
/// use cadova_math::BezierCurve;
/// use glam::DVec2;
///
/// let curve = BezierCurve::new(vec![
///     DVec2::ZERO,
///     DVec2::new(1.0, 1.0),
///     DVec2::new(2.0, 0.0),
/// ]).unwrap();
/// assert!((curve.point(0.5) - DVec2::new(1.0, 0.5)).length() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "V: DeserializeOwned"))]
pub struct BezierCurve<V: ControlPoint> {
    points: Vec<V>,
}

impl<V: ControlPoint> BezierCurve<V> {
    /// A curve from 2 to 4 control points.
    pub fn new(points: Vec<V>) -> Result<Self, InvalidGeometry> {
        if points.len() < 2 || points.len() > 4 {
            return Err(InvalidGeometry::new(format!(
                "bezier curve needs 2 to 4 control points, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// A straight segment.
    pub fn line(from: V, to: V) -> Self {
        Self {
            points: vec![from, to],
        }
    }

    fn constant(point: V) -> Self {
        Self {
            points: vec![point],
        }
    }

    /// The control points.
    pub fn control_points(&self) -> &[V] {
        &self.points
    }

    /// Polynomial degree (number of control points minus one).
    pub fn degree(&self) -> usize {
        self.points.len() - 1
    }

    /// The first control point.
    pub fn start(&self) -> V {
        self.points[0]
    }

    /// The last control point.
    pub fn end(&self) -> V {
        *self.points.last().unwrap_or(&self.points[0])
    }

    /// Evaluates the curve at `t` in `0..=1` by de Casteljau reduction.
    pub fn point(&self, t: f64) -> V {
        let mut work = self.points.clone();
        let mut n = work.len();
        while n > 1 {
            for i in 0..n - 1 {
                work[i] = work[i].lerp(work[i + 1], t);
            }
            n -= 1;
        }
        work[0]
    }

    /// The derivative curve (one degree lower).
    pub fn derivative(&self) -> Self {
        if self.points.len() < 2 {
            return Self::constant(V::zero());
        }
        let degree = self.degree() as f64;
        let points = self
            .points
            .windows(2)
            .map(|w| (w[1] - w[0]) * degree)
            .collect();
        Self { points }
    }

    /// Splits the curve at `t` into two curves covering `0..t` and `t..1`.
    pub fn split(&self, t: f64) -> (Self, Self) {
        let mut work = self.points.clone();
        let mut left = vec![work[0]];
        let mut right = vec![*work.last().unwrap_or(&work[0])];
        let mut n = work.len();
        while n > 1 {
            for i in 0..n - 1 {
                work[i] = work[i].lerp(work[i + 1], t);
            }
            n -= 1;
            left.push(work[0]);
            right.push(work[n - 1]);
        }
        right.reverse();
        (Self { points: left }, Self { points: right })
    }

    /// The restriction of the curve to `t0..t1`, reparameterized to `0..=1`.
    pub fn subcurve(&self, t0: f64, t1: f64) -> Self {
        if t1 <= t0 {
            return Self::constant(self.point(t0));
        }
        let (_, tail) = self.split(t0);
        let local = (t1 - t0) / (1.0 - t0).max(f64::EPSILON);
        let (head, _) = tail.split(local.min(1.0));
        head
    }

    /// Length of the control polygon, an upper bound for the arc length.
    pub fn control_polygon_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }

    /// Sampled points including both endpoints.
    pub fn points(&self, segmentation: &Segmentation) -> Vec<V> {
        let n = segmentation
            .length_segment_count(self.control_polygon_length())
            .max(1);
        (0..=n)
            .map(|i| self.point(i as f64 / n as f64))
            .collect()
    }

    /// Polyline arc-length approximation under the given segmentation.
    pub fn length(&self, segmentation: &Segmentation) -> f64 {
        self.points(segmentation)
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }

    /// Solves `f(point(t)) == target` for a `f`-monotone curve.
    ///
    /// Newton iteration on the scalar objective, falling back to
    /// bisection when Newton leaves the unit interval or stalls.
    pub fn solve_parameter<F>(&self, f: F, target: f64) -> Option<f64>
    where
        F: Fn(V) -> f64,
    {
        let at_start = f(self.start());
        let at_end = f(self.end());
        let (lo_value, hi_value) = (at_start.min(at_end), at_start.max(at_end));
        if target < lo_value - CURVE_PARAMETER_TOLERANCE
            || target > hi_value + CURVE_PARAMETER_TOLERANCE
        {
            return None;
        }
        let rising = at_end >= at_start;
        let objective = |t: f64| f(self.point(t)) - target;

        let mut t = 0.5;
        for _ in 0..NEWTON_MAX_ITERATIONS {
            let value = objective(t);
            if value.abs() < CURVE_PARAMETER_TOLERANCE {
                return Some(t);
            }
            let h = 1e-7;
            let lo = (t - h).max(0.0);
            let hi = (t + h).min(1.0);
            let slope = (objective(hi) - objective(lo)) / (hi - lo);
            if slope.abs() < f64::EPSILON {
                break;
            }
            let next = t - value / slope;
            if !(0.0..=1.0).contains(&next) {
                break;
            }
            t = next;
        }

        // Bisection fallback.
        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..BISECTION_MAX_ITERATIONS {
            let mid = (lo + hi) / 2.0;
            let value = objective(mid);
            if value.abs() < CURVE_PARAMETER_TOLERANCE {
                return Some(mid);
            }
            if (value > 0.0) == rising {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Some((lo + hi) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_endpoints() {
        let c = BezierCurve::new(vec![DVec2::ZERO, DVec2::new(1.0, 2.0), DVec2::new(3.0, 0.0)])
            .unwrap();
        assert_eq!(c.point(0.0), DVec2::ZERO);
        assert_eq!(c.point(1.0), DVec2::new(3.0, 0.0));
    }

    #[test]
    fn test_rejects_bad_arity() {
        assert!(BezierCurve::new(vec![DVec2::ZERO]).is_err());
        assert!(BezierCurve::new(vec![DVec2::ZERO; 5]).is_err());
    }

    #[test]
    fn test_derivative_of_line_is_constant() {
        let c = BezierCurve::line(DVec2::ZERO, DVec2::new(2.0, 0.0));
        let d = c.derivative();
        assert_eq!(d.point(0.3), DVec2::new(2.0, 0.0));
    }

    #[test]
    fn test_split_preserves_shape() {
        let c = BezierCurve::new(vec![
            DVec3::ZERO,
            DVec3::new(1.0, 2.0, 0.0),
            DVec3::new(2.0, 2.0, 1.0),
            DVec3::new(3.0, 0.0, 0.0),
        ])
        .unwrap();
        let (left, right) = c.split(0.25);
        let p = c.point(0.25 * 0.5);
        assert_relative_eq!(left.point(0.5).x, p.x, epsilon = 1e-12);
        let q = c.point(0.25 + 0.75 * 0.5);
        assert_relative_eq!(right.point(0.5).x, q.x, epsilon = 1e-12);
    }

    #[test]
    fn test_subcurve_endpoints() {
        let c = BezierCurve::new(vec![
            DVec2::ZERO,
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 0.0),
        ])
        .unwrap();
        let s = c.subcurve(0.2, 0.7);
        assert!((s.start() - c.point(0.2)).length() < 1e-12);
        assert!((s.end() - c.point(0.7)).length() < 1e-12);
    }

    #[test]
    fn test_length_of_straight_line() {
        let c = BezierCurve::line(DVec3::ZERO, DVec3::new(3.0, 4.0, 0.0));
        let len = c.length(&Segmentation::fixed(8));
        assert_relative_eq!(len, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_solve_parameter_monotone_x() {
        let c = BezierCurve::new(vec![
            DVec2::ZERO,
            DVec2::new(1.0, 3.0),
            DVec2::new(2.0, -1.0),
            DVec2::new(3.0, 0.5),
        ])
        .unwrap();
        let t = c.solve_parameter(|p| p.x, 1.5).unwrap();
        assert_relative_eq!(c.point(t).x, 1.5, epsilon = 1e-5);
        assert!(c.solve_parameter(|p| p.x, 9.0).is_none());
    }
}
