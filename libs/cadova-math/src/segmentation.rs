//! # Segmentation
//!
//! The policy deciding how curved geometry is discretized into straight
//! segments. Pure functions of radius, arc angle, or length; leaf
//! constructors sample these when lowering into the scene node so equal
//! inputs produce equal node fingerprints.

use crate::angle::Angle;
use config::constants::{
    MAX_SEGMENTS, MIN_ADAPTIVE_SEGMENTS, MIN_ARC_SEGMENTS, MIN_FIXED_SEGMENTS,
    DEFAULT_MIN_ANGLE_DEGREES, DEFAULT_MIN_SIZE,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Curve discretization policy.
///
/// # Example
///
/// ```rust
/// use cadova_math::Segmentation;
///
/// let fixed = Segmentation::fixed(16);
/// assert_eq!(fixed.segment_count(100.0), 16);
///
/// let adaptive = Segmentation::default();
/// assert!(adaptive.segment_count(10.0) >= adaptive.segment_count(1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Segmentation {
    /// A fixed number of segments per full circle, at least 3.
    Fixed {
        /// Segments per full turn.
        count: u32,
    },
    /// Resolution-driven segmentation bounded by a maximum angle per
    /// segment and a minimum segment length.
    Adaptive {
        /// Largest allowed angle per segment.
        min_angle: Angle,
        /// Shortest allowed segment length.
        min_size: f64,
    },
}

impl Segmentation {
    /// Fixed segmentation with at least 3 segments.
    pub fn fixed(count: u32) -> Self {
        Self::Fixed {
            count: count.max(MIN_FIXED_SEGMENTS),
        }
    }

    /// Adaptive segmentation from an angular and a length bound.
    pub fn adaptive(min_angle: Angle, min_size: f64) -> Self {
        Self::Adaptive {
            min_angle,
            min_size,
        }
    }

    /// Segment count for a full circle of the given radius.
    ///
    /// Adaptive mode takes the smaller of the angle-driven and
    /// circumference-driven counts, floored, never below 5.
    pub fn segment_count(&self, radius: f64) -> u32 {
        let count = match *self {
            Self::Fixed { count } => count.max(MIN_FIXED_SEGMENTS),
            Self::Adaptive {
                min_angle,
                min_size,
            } => {
                let by_angle = 360.0 / min_angle.to_degrees().max(f64::EPSILON);
                let by_length = TAU * radius / min_size.max(f64::EPSILON);
                let n = by_angle.min(by_length).max(MIN_ADAPTIVE_SEGMENTS as f64);
                n.floor() as u32
            }
        };
        count.min(MAX_SEGMENTS)
    }

    /// Segment count for an arc of `angle` at the given radius, at least 2.
    pub fn arc_segment_count(&self, radius: f64, angle: Angle) -> u32 {
        let full = self.segment_count(radius) as f64;
        let fraction = (angle.to_degrees().abs() / 360.0).min(1.0);
        ((full * fraction).ceil() as u32)
            .max(MIN_ARC_SEGMENTS)
            .min(MAX_SEGMENTS)
    }

    /// Segment count for a straight run of the given length.
    pub fn length_segment_count(&self, length: f64) -> u32 {
        let count = match *self {
            Self::Fixed { count } => count.max(MIN_FIXED_SEGMENTS),
            Self::Adaptive { min_size, .. } => {
                (length / min_size.max(f64::EPSILON)).max(MIN_ADAPTIVE_SEGMENTS as f64).ceil()
                    as u32
            }
        };
        count.min(MAX_SEGMENTS)
    }

    /// Scales `min_size` by `1 / scale`, for use under a transform.
    ///
    /// Fixed segmentation is unaffected by scale.
    pub fn scaled(&self, scale: f64) -> Self {
        match *self {
            Self::Fixed { count } => Self::Fixed { count },
            Self::Adaptive {
                min_angle,
                min_size,
            } => Self::Adaptive {
                min_angle,
                min_size: if scale.abs() > f64::EPSILON {
                    min_size / scale
                } else {
                    min_size
                },
            },
        }
    }
}

impl Default for Segmentation {
    fn default() -> Self {
        Self::Adaptive {
            min_angle: Angle::degrees(DEFAULT_MIN_ANGLE_DEGREES),
            min_size: DEFAULT_MIN_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clamps_to_minimum() {
        assert_eq!(Segmentation::fixed(1).segment_count(10.0), 3);
        assert_eq!(Segmentation::fixed(7).segment_count(10.0), 7);
    }

    #[test]
    fn test_adaptive_floor_of_min() {
        let seg = Segmentation::adaptive(Angle::degrees(10.0), 1.0);
        // by_angle = 36, by_length = 2*pi*r. Small radius: length-bound wins.
        assert_eq!(seg.segment_count(1.0), 6); // floor(2*pi)
        // Large radius: angle-bound wins.
        assert_eq!(seg.segment_count(100.0), 36);
    }

    #[test]
    fn test_adaptive_minimum_is_five() {
        let seg = Segmentation::adaptive(Angle::degrees(10.0), 100.0);
        assert_eq!(seg.segment_count(0.01), 5);
    }

    #[test]
    fn test_monotone_in_radius() {
        let seg = Segmentation::default();
        let mut last = 0;
        for r in [0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 50.0, 200.0] {
            let n = seg.segment_count(r);
            assert!(n >= last, "segment count decreased at r={r}");
            last = n;
        }
    }

    #[test]
    fn test_arc_count() {
        let seg = Segmentation::fixed(12);
        assert_eq!(seg.arc_segment_count(5.0, Angle::degrees(90.0)), 3);
        assert_eq!(seg.arc_segment_count(5.0, Angle::degrees(1.0)), 2);
    }

    #[test]
    fn test_length_count() {
        let seg = Segmentation::adaptive(Angle::degrees(10.0), 0.5);
        assert_eq!(seg.length_segment_count(10.0), 20);
        assert_eq!(seg.length_segment_count(0.1), 5);
        assert_eq!(Segmentation::fixed(8).length_segment_count(100.0), 8);
    }

    #[test]
    fn test_scaled_divides_min_size() {
        let seg = Segmentation::adaptive(Angle::degrees(10.0), 1.0).scaled(2.0);
        match seg {
            Segmentation::Adaptive { min_size, .. } => assert!((min_size - 0.5).abs() < 1e-12),
            _ => panic!("expected adaptive"),
        }
    }
}
