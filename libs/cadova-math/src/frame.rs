//! # Sweep Frames
//!
//! Per-sample local coordinate frames along a 3D Bezier path, used to place
//! 2D cross-sections during sweep operations.
//!
//! Frames carry X through parallel transport, then solve a per-sample roll
//! angle so a chosen in-plane reference direction points at a target. Gaps
//! where the targeting projection degenerates are interpolated, the angle
//! sequence is normalized to avoid full-turn jumps, and the per-step twist
//! is damped against arc length.

use crate::angle::Angle;
use crate::bezier::{BezierPath, PathPosition};
use crate::direction::{Direction2, Direction3};
use crate::error::InvalidGeometry;
use crate::line::Line3;
use crate::segmentation::Segmentation;
use crate::transform::Transform3;
use config::constants::EPSILON;
use glam::{DQuat, DVec3};

/// What the in-plane reference direction should point at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RollTarget {
    /// A fixed world direction.
    Direction(Direction3),
    /// A fixed world point.
    Point(DVec3),
    /// The nearest point of a world line.
    Line(Line3),
}

/// Options controlling frame computation.
#[derive(Debug, Clone, Copy)]
pub struct FrameOptions {
    /// The in-plane direction that should point at `target`.
    pub reference: Direction2,
    /// The roll target; `None` keeps the parallel-transported frame.
    pub target: Option<RollTarget>,
    /// Maximum roll change per unit of arc length, in radians.
    pub max_twist_rate: Option<f64>,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            reference: Direction2::X,
            target: None,
            max_twist_rate: None,
        }
    }
}

/// A computed frame at one path sample.
#[derive(Debug, Clone, Copy)]
pub struct SweepFrame {
    /// Path position of the sample.
    pub position: PathPosition,
    /// Sample point.
    pub point: DVec3,
    /// Unit tangent at the sample.
    pub tangent: DVec3,
    /// Resolved roll angle relative to the transported frame.
    pub angle: Angle,
    /// Frame placing a cross-section: X = rolled reference, Z = tangent.
    pub transform: Transform3,
}

/// Computes sweep frames along `path`.
///
/// Straight-run pruning applies only under adaptive segmentation: interior
/// frames are dropped when the tangent has not turned past the policy's
/// minimum angle and both the linear and the roll displacement since the
/// last retained frame stay below the policy's thresholds.
pub fn sweep_frames(
    path: &BezierPath<DVec3>,
    segmentation: &Segmentation,
    options: &FrameOptions,
) -> Result<Vec<SweepFrame>, InvalidGeometry> {
    let samples = path.sample(segmentation);
    if samples.is_empty() {
        return Err(InvalidGeometry::new("sweep path produced no samples"));
    }

    // Tangents, with a polyline fallback where the derivative vanishes
    // (e.g. at a cusp of a degenerate control polygon).
    let tangents: Vec<DVec3> = samples
        .iter()
        .enumerate()
        .map(|(i, (position, point))| {
            let d = path.derivative(*position);
            if d.length() > EPSILON {
                d.normalize()
            } else if i + 1 < samples.len() {
                (samples[i + 1].1 - *point).normalize_or_zero()
            } else if i > 0 {
                (*point - samples[i - 1].1).normalize_or_zero()
            } else {
                DVec3::X
            }
        })
        .collect();

    // Parallel transport of the X axis.
    let mut x_axes = Vec::with_capacity(samples.len());
    let first_tangent = tangents[0];
    let seed = if first_tangent.x.abs() < first_tangent.y.abs() {
        DVec3::X
    } else {
        DVec3::Y
    };
    let mut x = (seed - first_tangent * seed.dot(first_tangent)).normalize();
    x_axes.push(x);
    for i in 1..samples.len() {
        let rotation = DQuat::from_rotation_arc(tangents[i - 1], tangents[i]);
        x = rotation * x;
        // Re-orthogonalize against accumulated drift.
        x = (x - tangents[i] * x.dot(tangents[i])).normalize_or_zero();
        if x.length_squared() < 0.5 {
            let seed = if tangents[i].x.abs() < tangents[i].y.abs() {
                DVec3::X
            } else {
                DVec3::Y
            };
            x = (seed - tangents[i] * seed.dot(tangents[i])).normalize();
        }
        x_axes.push(x);
    }

    // Roll angle per sample; `None` where the projection degenerates.
    let mut angles: Vec<Option<f64>> = Vec::with_capacity(samples.len());
    for i in 0..samples.len() {
        let angle = match &options.target {
            None => Some(0.0),
            Some(target) => {
                let aim = match target {
                    RollTarget::Direction(d) => d.vector(),
                    RollTarget::Point(p) => *p - samples[i].1,
                    RollTarget::Line(line) => line.closest_point(samples[i].1) - samples[i].1,
                };
                let tangent = tangents[i];
                let aim_in_plane = aim - tangent * aim.dot(tangent);
                let reference = x_axes[i] * options.reference.vector().x
                    + tangent.cross(x_axes[i]) * options.reference.vector().y;
                if aim_in_plane.length() < EPSILON || reference.length() < EPSILON {
                    None
                } else {
                    let aim_in_plane = aim_in_plane.normalize();
                    let reference = reference.normalize();
                    Some(
                        reference
                            .cross(aim_in_plane)
                            .dot(tangent)
                            .atan2(reference.dot(aim_in_plane)),
                    )
                }
            }
        };
        angles.push(angle);
    }

    let mut resolved = interpolate_missing(&angles, &samples);
    normalize_continuous(&mut resolved);

    if let Some(rate) = options.max_twist_rate {
        for i in 1..resolved.len() {
            let step = (samples[i].1 - samples[i - 1].1).length();
            let limit = rate * step;
            let delta = (resolved[i] - resolved[i - 1]).clamp(-limit, limit);
            resolved[i] = resolved[i - 1] + delta;
        }
    }

    let mut frames: Vec<SweepFrame> = Vec::with_capacity(samples.len());
    for i in 0..samples.len() {
        frames.push(make_frame(
            samples[i].0,
            samples[i].1,
            tangents[i],
            x_axes[i],
            resolved[i],
        ));
    }

    if let Segmentation::Adaptive {
        min_angle,
        min_size,
    } = *segmentation
    {
        frames = prune_straight_runs(frames, min_angle, min_size);
    }

    Ok(frames)
}

fn make_frame(
    position: PathPosition,
    point: DVec3,
    tangent: DVec3,
    x_axis: DVec3,
    angle: f64,
) -> SweepFrame {
    let y_axis = tangent.cross(x_axis);
    let rolled_x = x_axis * angle.cos() + y_axis * angle.sin();
    let rolled_y = tangent.cross(rolled_x);
    SweepFrame {
        position,
        point,
        tangent,
        angle: Angle::from_radians(angle),
        transform: Transform3::from_basis(rolled_x, rolled_y, tangent, point),
    }
}

/// Fills `None` gaps linearly between known neighbors, weighting by arc
/// length. Leading and trailing gaps copy the nearest known angle; a fully
/// unknown sequence resolves to zero.
fn interpolate_missing(angles: &[Option<f64>], samples: &[(PathPosition, DVec3)]) -> Vec<f64> {
    let known: Vec<usize> = angles
        .iter()
        .enumerate()
        .filter_map(|(i, a)| a.map(|_| i))
        .collect();
    if known.is_empty() {
        return vec![0.0; angles.len()];
    }

    let mut out = vec![0.0; angles.len()];
    for i in 0..angles.len() {
        if let Some(a) = angles[i] {
            out[i] = a;
            continue;
        }
        let before = known.iter().rev().find(|&&k| k < i).copied();
        let after = known.iter().find(|&&k| k > i).copied();
        out[i] = match (before, after) {
            (Some(b), Some(a)) => {
                let total = arc_length(samples, b, a);
                let partial = arc_length(samples, b, i);
                let start = angles[b].unwrap_or(0.0);
                let end = angles[a].unwrap_or(0.0);
                // Interpolate along the shortest signed difference.
                let delta = Angle::from_radians(end - start).normalized_signed().radians();
                if total > EPSILON {
                    start + delta * (partial / total)
                } else {
                    start
                }
            }
            (Some(b), None) => angles[b].unwrap_or(0.0),
            (None, Some(a)) => angles[a].unwrap_or(0.0),
            (None, None) => 0.0,
        };
    }
    out
}

fn arc_length(samples: &[(PathPosition, DVec3)], from: usize, to: usize) -> f64 {
    samples[from..=to]
        .windows(2)
        .map(|w| (w[1].1 - w[0].1).length())
        .sum()
}

/// Rewrites the sequence so each step takes the shortest signed delta,
/// keeping it continuous instead of jumping by full turns.
fn normalize_continuous(angles: &mut [f64]) {
    for i in 1..angles.len() {
        let delta = Angle::from_radians(angles[i] - angles[i - 1])
            .normalized_signed()
            .radians();
        angles[i] = angles[i - 1] + delta;
    }
}

fn prune_straight_runs(frames: Vec<SweepFrame>, min_angle: Angle, min_size: f64) -> Vec<SweepFrame> {
    if frames.len() <= 2 {
        return frames;
    }
    let threshold = min_angle.radians().cos();
    let mut kept: Vec<SweepFrame> = vec![frames[0]];
    let last_index = frames.len() - 1;
    for (i, frame) in frames.iter().enumerate().skip(1) {
        if i == last_index {
            kept.push(*frame);
            break;
        }
        let anchor = kept[kept.len() - 1];
        let straight = frame.tangent.dot(anchor.tangent) > threshold;
        let near = (frame.point - anchor.point).length() < min_size;
        let untwisted =
            (frame.angle.radians() - anchor.angle.radians()).abs() < min_angle.radians();
        if !(straight && near && untwisted) {
            kept.push(*frame);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bezier::BezierCurve;
    use approx::assert_relative_eq;

    fn straight_path() -> BezierPath<DVec3> {
        BezierPath::from_curve(BezierCurve::line(DVec3::ZERO, DVec3::new(0.0, 0.0, 10.0)))
    }

    #[test]
    fn test_frames_are_orthonormal() {
        let path = straight_path();
        let frames =
            sweep_frames(&path, &Segmentation::fixed(8), &FrameOptions::default()).unwrap();
        for f in &frames {
            let m = f.transform.linear();
            assert_relative_eq!(m.x_axis.length(), 1.0, epsilon = 1e-9);
            assert_relative_eq!(m.y_axis.length(), 1.0, epsilon = 1e-9);
            assert_relative_eq!(m.z_axis.length(), 1.0, epsilon = 1e-9);
            assert_relative_eq!(m.x_axis.dot(m.y_axis), 0.0, epsilon = 1e-9);
            assert_relative_eq!(m.z_axis.dot(f.tangent), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_tangent_continuity_on_curve() {
        let path = BezierPath::from_curve(
            BezierCurve::new(vec![
                DVec3::ZERO,
                DVec3::new(10.0, 0.0, 5.0),
                DVec3::new(10.0, 10.0, 10.0),
            ])
            .unwrap(),
        );
        let frames =
            sweep_frames(&path, &Segmentation::fixed(24), &FrameOptions::default()).unwrap();
        for pair in frames.windows(2) {
            assert!(pair[0].tangent.dot(pair[1].tangent) > 0.0);
        }
    }

    #[test]
    fn test_direction_target_rolls_x_toward_target() {
        let path = straight_path();
        let options = FrameOptions {
            target: Some(RollTarget::Direction(Direction3::Y)),
            ..FrameOptions::default()
        };
        let frames = sweep_frames(&path, &Segmentation::fixed(4), &FrameOptions::default())
            .unwrap();
        let aimed = sweep_frames(&path, &Segmentation::fixed(4), &options).unwrap();
        assert_eq!(frames.len(), aimed.len());
        for f in &aimed {
            let x = f.transform.linear().x_axis;
            assert_relative_eq!(x.dot(DVec3::Y), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_degenerate_target_interpolates() {
        // Target direction parallel to the tangent everywhere: every angle
        // is missing and resolves to zero.
        let path = straight_path();
        let options = FrameOptions {
            target: Some(RollTarget::Direction(Direction3::Z)),
            ..FrameOptions::default()
        };
        let frames = sweep_frames(&path, &Segmentation::fixed(4), &options).unwrap();
        for f in &frames {
            assert_relative_eq!(f.angle.radians(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_twist_damping_limits_steps() {
        let path = straight_path();
        let rate = 0.05;
        let options = FrameOptions {
            target: Some(RollTarget::Point(DVec3::new(5.0, 5.0, 10.0))),
            max_twist_rate: Some(rate),
            ..FrameOptions::default()
        };
        let frames = sweep_frames(&path, &Segmentation::fixed(16), &options).unwrap();
        for pair in frames.windows(2) {
            let step = (pair[1].point - pair[0].point).length();
            let delta = (pair[1].angle.radians() - pair[0].angle.radians()).abs();
            assert!(delta <= rate * step + 1e-9);
        }
    }

    #[test]
    fn test_straight_run_pruning_drops_interior() {
        let path = straight_path();
        let adaptive = Segmentation::adaptive(Angle::degrees(5.0), 100.0);
        let frames = sweep_frames(&path, &adaptive, &FrameOptions::default()).unwrap();
        // A straight path with a huge min_size collapses to its endpoints.
        assert_eq!(frames.len(), 2);
    }
}
