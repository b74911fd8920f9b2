//! Bezier paths: curve sequences sharing endpoints, addressed by a
//! fractional position.

use super::curve::{BezierCurve, ControlPoint};
use crate::error::InvalidGeometry;
use crate::segmentation::Segmentation;
use config::constants::EPSILON;
use serde::{Deserialize, Serialize};

/// A location on a path.
///
/// The integer part selects the curve, the fractional part is the local
/// parameter within that curve. `PathPosition(2.5)` is the midpoint of the
/// third curve.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PathPosition(pub f64);

impl PathPosition {
    /// The path start.
    pub const START: Self = Self(0.0);

    /// Index of the addressed curve, clamped to `curve_count - 1`.
    pub fn curve_index(self, curve_count: usize) -> usize {
        if curve_count == 0 {
            return 0;
        }
        (self.0.floor() as usize).min(curve_count - 1)
    }

    /// Local parameter within the addressed curve.
    pub fn local_parameter(self, curve_count: usize) -> f64 {
        let index = self.curve_index(curve_count);
        (self.0 - index as f64).clamp(0.0, 1.0)
    }
}

/// A path of Bezier curves sharing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "V: serde::de::DeserializeOwned"))]
pub struct BezierPath<V: ControlPoint> {
    curves: Vec<BezierCurve<V>>,
}

impl<V: ControlPoint> BezierPath<V> {
    /// A path from consecutive curves.
    ///
    /// Each curve must start where the previous one ends.
    pub fn new(curves: Vec<BezierCurve<V>>) -> Result<Self, InvalidGeometry> {
        if curves.is_empty() {
            return Err(InvalidGeometry::new("bezier path needs at least one curve"));
        }
        for pair in curves.windows(2) {
            if pair[0].end().distance(pair[1].start()) > EPSILON {
                return Err(InvalidGeometry::new(
                    "bezier path curves must share endpoints",
                ));
            }
        }
        Ok(Self { curves })
    }

    /// A single-curve path.
    pub fn from_curve(curve: BezierCurve<V>) -> Self {
        Self {
            curves: vec![curve],
        }
    }

    /// The constituent curves.
    pub fn curves(&self) -> &[BezierCurve<V>] {
        &self.curves
    }

    /// Number of curves.
    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    /// The position addressing the path end.
    pub fn end_position(&self) -> PathPosition {
        PathPosition(self.curves.len() as f64)
    }

    /// The path start point.
    pub fn start_point(&self) -> V {
        self.curves[0].start()
    }

    /// The path end point.
    pub fn end_point(&self) -> V {
        self.curves[self.curves.len() - 1].end()
    }

    /// True when the path ends where it starts.
    pub fn is_closed(&self) -> bool {
        self.start_point().distance(self.end_point()) < EPSILON
    }

    /// Evaluates the path at `position`.
    pub fn point(&self, position: PathPosition) -> V {
        let index = position.curve_index(self.curves.len());
        self.curves[index].point(position.local_parameter(self.curves.len()))
    }

    /// The derivative of the addressed curve at `position`.
    ///
    /// Curve-wise: the scale of the derivative reflects the local curve
    /// parameterization, not global arc length.
    pub fn derivative(&self, position: PathPosition) -> V {
        let index = position.curve_index(self.curves.len());
        self.curves[index]
            .derivative()
            .point(position.local_parameter(self.curves.len()))
    }

    /// The restriction of the path to `from..to`.
    pub fn subpath(&self, from: PathPosition, to: PathPosition) -> Result<Self, InvalidGeometry> {
        if to.0 <= from.0 {
            return Err(InvalidGeometry::new("subpath range is empty"));
        }
        let n = self.curves.len();
        let first = from.curve_index(n);
        let last = to.curve_index(n);
        let mut out = Vec::new();
        for index in first..=last {
            let t0 = if index == first {
                from.local_parameter(n)
            } else {
                0.0
            };
            let t1 = if index == last {
                to.local_parameter(n)
            } else {
                1.0
            };
            if t1 - t0 > EPSILON {
                out.push(self.curves[index].subcurve(t0, t1));
            }
        }
        Self::new(out)
    }

    /// Total polyline length under the segmentation.
    pub fn length(&self, segmentation: &Segmentation) -> f64 {
        self.curves
            .iter()
            .map(|c| c.length(segmentation))
            .sum()
    }

    /// Sampled points along the whole path, deduplicating shared
    /// endpoints.
    pub fn points(&self, segmentation: &Segmentation) -> Vec<V> {
        self.sample(segmentation)
            .into_iter()
            .map(|(_, p)| p)
            .collect()
    }

    /// Sampled `(position, point)` pairs along the whole path.
    pub fn sample(&self, segmentation: &Segmentation) -> Vec<(PathPosition, V)> {
        let mut out = Vec::new();
        for (index, curve) in self.curves.iter().enumerate() {
            let n = segmentation
                .length_segment_count(curve.control_polygon_length())
                .max(1);
            let start = if index == 0 { 0 } else { 1 };
            for i in start..=n {
                let t = i as f64 / n as f64;
                out.push((PathPosition(index as f64 + t), curve.point(t)));
            }
        }
        if out.is_empty() {
            out.push((PathPosition::START, self.start_point()));
        }
        out
    }

    /// Finds the position where `f(point)` reaches `target`, assuming `f`
    /// is monotone along the path.
    pub fn position_where<F>(&self, f: F, target: f64) -> Option<PathPosition>
    where
        F: Fn(V) -> f64,
    {
        for (index, curve) in self.curves.iter().enumerate() {
            let a = f(curve.start());
            let b = f(curve.end());
            if target < a.min(b) - EPSILON || target > a.max(b) + EPSILON {
                continue;
            }
            if let Some(t) = curve.solve_parameter(&f, target) {
                return Some(PathPosition(index as f64 + t));
            }
        }
        None
    }
}
