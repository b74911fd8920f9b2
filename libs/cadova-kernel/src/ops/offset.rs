//! # 2D Offset
//!
//! Grows or shrinks a polygon set by a distance, the Minkowski sum with a
//! disk. Outer contours wind counter-clockwise and holes clockwise, so the
//! same rightward edge normal grows the solid on both.

use crate::error::KernelError;
use crate::polygon_set::PolygonSet;
use cadova_math::SimplePolygon;
use config::constants::{EPSILON, PLANE_EPSILON};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Corner treatment for offset joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinStyle {
    /// Extend edges to their intersection, falling back to bevel past the
    /// miter limit.
    Miter,
    /// Connect with a sampled circular arc.
    Round,
    /// Connect offset edge endpoints directly.
    Bevel,
}

/// Miter length limit as a multiple of the offset distance.
const MITER_LIMIT: f64 = 2.0;

/// Offsets every contour of `set` by `distance`.
///
/// `arc_segments` is the full-circle segment count used to sample round
/// joins; the scene layer derives it from its segmentation policy.
pub fn offset(
    set: &PolygonSet,
    distance: f64,
    join: JoinStyle,
    arc_segments: u32,
) -> Result<PolygonSet, KernelError> {
    if distance.abs() < EPSILON {
        return Ok(set.clone());
    }
    let mut contours = Vec::new();
    for contour in set.contours() {
        if let Some(result) = offset_contour(contour, distance, join, arc_segments) {
            contours.push(result);
        }
    }
    Ok(PolygonSet::from_contours(contours))
}

fn offset_contour(
    contour: &SimplePolygon,
    distance: f64,
    join: JoinStyle,
    arc_segments: u32,
) -> Option<SimplePolygon> {
    let points = contour.points();
    let n = points.len();
    if n < 3 {
        return None;
    }

    let mut result = Vec::with_capacity(n * 2);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let here = points[i];
        let next = points[(i + 1) % n];

        let incoming = (here - prev).normalize_or_zero();
        let outgoing = (next - here).normalize_or_zero();
        if incoming.length_squared() < 0.5 || outgoing.length_squared() < 0.5 {
            continue;
        }
        // Rightward normals grow the enclosed region for CCW contours.
        let normal_in = DVec2::new(incoming.y, -incoming.x);
        let normal_out = DVec2::new(outgoing.y, -outgoing.x);

        let entry = here + normal_in * distance;
        let exit = here + normal_out * distance;
        let cross = incoming.perp_dot(outgoing);

        if cross * distance > EPSILON {
            // Gap side: the offset edges separate and need a join.
            match join {
                JoinStyle::Bevel => {
                    result.push(entry);
                    result.push(exit);
                }
                JoinStyle::Miter => {
                    match line_intersection(entry, incoming, exit, outgoing) {
                        Some(tip)
                            if (tip - here).length() <= MITER_LIMIT * distance.abs() =>
                        {
                            result.push(tip);
                        }
                        _ => {
                            result.push(entry);
                            result.push(exit);
                        }
                    }
                }
                JoinStyle::Round => {
                    let total = normal_in.perp_dot(normal_out).atan2(normal_in.dot(normal_out));
                    let steps = ((arc_segments.max(4) as f64 * total.abs()
                        / std::f64::consts::TAU)
                        .ceil() as u32)
                        .max(1);
                    for step in 0..=steps {
                        let angle = total * step as f64 / steps as f64;
                        let rotated = DVec2::new(
                            normal_in.x * angle.cos() - normal_in.y * angle.sin(),
                            normal_in.x * angle.sin() + normal_in.y * angle.cos(),
                        );
                        result.push(here + rotated * distance);
                    }
                }
            }
        } else {
            // Overlap side: meet at the offset-line intersection.
            match line_intersection(entry, incoming, exit, outgoing) {
                Some(meet) => result.push(meet),
                None => result.push(entry),
            }
        }
    }

    let polygon = SimplePolygon::new(result).simplified(PLANE_EPSILON);
    // A shrink can consume the contour entirely.
    if polygon.len() < 3 || polygon.area() < EPSILON {
        return None;
    }
    // Winding flip means the contour collapsed through itself.
    if polygon.is_counter_clockwise() != contour.is_counter_clockwise() {
        return None;
    }
    Some(polygon)
}

fn line_intersection(
    point_a: DVec2,
    direction_a: DVec2,
    point_b: DVec2,
    direction_b: DVec2,
) -> Option<DVec2> {
    let denominator = direction_a.perp_dot(direction_b);
    if denominator.abs() < EPSILON {
        return None;
    }
    let t = (point_b - point_a).perp_dot(direction_b) / denominator;
    Some(point_a + direction_a * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{circle, rectangle};

    #[test]
    fn test_grow_square_miter() {
        let set = rectangle(DVec2::splat(2.0)).unwrap();
        let grown = offset(&set, 1.0, JoinStyle::Miter, 16).unwrap();
        // Miter corners keep the square shape: (2 + 2)^2.
        assert!((grown.area() - 16.0).abs() < 1e-6, "area {}", grown.area());
    }

    #[test]
    fn test_grow_square_round_area() {
        let set = rectangle(DVec2::splat(2.0)).unwrap();
        let grown = offset(&set, 1.0, JoinStyle::Round, 64).unwrap();
        // Square + four edge strips + quarter-circle corners.
        let ideal = 4.0 + 4.0 * 2.0 + std::f64::consts::PI;
        assert!((grown.area() - ideal).abs() / ideal < 0.01);
    }

    #[test]
    fn test_shrink_square() {
        let set = rectangle(DVec2::splat(4.0)).unwrap();
        let shrunk = offset(&set, -1.0, JoinStyle::Miter, 16).unwrap();
        assert!((shrunk.area() - 4.0).abs() < 1e-6, "area {}", shrunk.area());
    }

    #[test]
    fn test_shrink_to_nothing() {
        let set = rectangle(DVec2::splat(1.0)).unwrap();
        let gone = offset(&set, -2.0, JoinStyle::Miter, 16).unwrap();
        assert!(gone.is_empty());
    }

    #[test]
    fn test_circle_offset_keeps_roundness() {
        let set = circle(5.0, 64).unwrap();
        let grown = offset(&set, 1.0, JoinStyle::Round, 64).unwrap();
        let ideal = std::f64::consts::PI * 36.0;
        assert!((grown.area() - ideal).abs() / ideal < 0.01);
    }

    #[test]
    fn test_zero_offset_is_identity() {
        let set = rectangle(DVec2::splat(2.0)).unwrap();
        let same = offset(&set, 0.0, JoinStyle::Round, 16).unwrap();
        assert_eq!(same, set);
    }
}
