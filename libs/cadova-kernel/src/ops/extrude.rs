//! # Extrusion
//!
//! Lifts 2D polygon sets into solids: linear extrusion with twist and
//! scale, helical extrusion, and revolution about the Z axis.

use crate::error::{KernelError, KernelErrorKind};
use crate::mesh::Mesh;
use crate::original_id::OriginalId;
use crate::polygon_set::PolygonSet;
use crate::triangulate::triangulate_set;
use cadova_math::Angle;
use config::constants::EPSILON;
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Parameters for linear extrusion along +Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearExtrusion {
    /// Extrusion height.
    pub height: f64,
    /// Total counter-clockwise twist applied over the height.
    pub twist: Angle,
    /// Cross-section scale at the top.
    pub scale_top: DVec2,
    /// Number of intermediate slices for twist/scale interpolation.
    pub slices: u32,
}

impl LinearExtrusion {
    /// A straight extrusion without twist or scale.
    pub fn straight(height: f64) -> Self {
        Self {
            height,
            twist: Angle::ZERO,
            scale_top: DVec2::ONE,
            slices: 1,
        }
    }
}

/// Extrudes a polygon set along +Z from `z = 0`.
pub fn extrude_linear(
    set: &PolygonSet,
    spec: &LinearExtrusion,
    original: OriginalId,
) -> Result<Mesh, KernelError> {
    if spec.height <= 0.0 {
        return Err(KernelError::degenerate("extrude"));
    }
    if set.is_empty() {
        return Err(KernelError::empty("extrude"));
    }

    let needs_slices = spec.twist.radians().abs() > EPSILON
        || (spec.scale_top - DVec2::ONE).length() > EPSILON;
    let slices = if needs_slices { spec.slices.max(1) } else { 1 };

    let slice_point = |p: DVec2, t: f64| -> DVec3 {
        let scale = DVec2::ONE.lerp(spec.scale_top, t);
        let scaled = p * scale;
        let angle = spec.twist.radians() * t;
        let rotated = DVec2::new(
            scaled.x * angle.cos() - scaled.y * angle.sin(),
            scaled.x * angle.sin() + scaled.y * angle.cos(),
        );
        DVec3::new(rotated.x, rotated.y, t * spec.height)
    };

    let mut mesh = Mesh::new();

    // Side ribbons, one per contour. Hole contours wind clockwise, which
    // turns the same quad pattern inward.
    for contour in set.contours() {
        let points = contour.points();
        let n = points.len();
        let mut rings: Vec<Vec<u32>> = Vec::with_capacity(slices as usize + 1);
        for slice in 0..=slices {
            let t = slice as f64 / slices as f64;
            rings.push(
                points
                    .iter()
                    .map(|&p| mesh.add_vertex(slice_point(p, t)))
                    .collect(),
            );
        }
        for pair in rings.windows(2) {
            for i in 0..n {
                let j = (i + 1) % n;
                mesh.add_triangle(pair[0][i], pair[0][j], pair[1][j], original);
                mesh.add_triangle(pair[0][i], pair[1][j], pair[1][i], original);
            }
        }
    }

    // Caps.
    for [a, b, c] in triangulate_set(set) {
        let bottom: Vec<u32> = [a, c, b]
            .iter()
            .map(|&p| mesh.add_vertex(slice_point(p, 0.0)))
            .collect();
        mesh.add_triangle(bottom[0], bottom[1], bottom[2], original);
        let top: Vec<u32> = [a, b, c]
            .iter()
            .map(|&p| mesh.add_vertex(slice_point(p, 1.0)))
            .collect();
        mesh.add_triangle(top[0], top[1], top[2], original);
    }

    Ok(mesh.welded(0.0))
}

/// Extrudes a polygon set along a helix: the cross-section rises by
/// `pitch` per full turn while rotating about +Z.
///
/// Equivalent to a twisted linear extrusion with one full turn of twist
/// per `pitch` of height.
pub fn extrude_helical(
    set: &PolygonSet,
    pitch: f64,
    height: f64,
    segments_per_turn: u32,
    original: OriginalId,
) -> Result<Mesh, KernelError> {
    if pitch.abs() < EPSILON || height <= 0.0 {
        return Err(KernelError::degenerate("extrude_helical"));
    }
    let turns = height / pitch;
    let spec = LinearExtrusion {
        height,
        twist: Angle::from_radians(TAU * turns),
        scale_top: DVec2::ONE,
        slices: ((segments_per_turn.max(3) as f64 * turns.abs()).ceil() as u32).max(1),
    };
    extrude_linear(set, &spec, original)
}

/// Revolves a profile about the Z axis.
///
/// The profile's X becomes the radius and its Y becomes Z. All profile
/// points must satisfy `x >= 0`. A partial `angle` produces flat caps at
/// both ends of the sweep.
pub fn revolve(
    set: &PolygonSet,
    angle: Angle,
    segments: u32,
    original: OriginalId,
) -> Result<Mesh, KernelError> {
    if set.is_empty() {
        return Err(KernelError::empty("revolve"));
    }
    let sweep = angle.radians().clamp(0.0, TAU);
    if sweep < EPSILON {
        return Err(KernelError::degenerate("revolve"));
    }
    if set
        .all_points()
        .iter()
        .any(|p| p.x < -EPSILON)
    {
        return Err(KernelError::new("revolve", KernelErrorKind::Unsupported));
    }
    let full_turn = (TAU - sweep).abs() < EPSILON;
    let n = segments.max(3) as usize;
    let ring_count = if full_turn { n } else { n + 1 };

    let place = |p: DVec2, step: usize| -> DVec3 {
        let theta = sweep * step as f64 / n as f64;
        DVec3::new(p.x * theta.cos(), p.x * theta.sin(), p.y)
    };

    let mut mesh = Mesh::new();
    for contour in set.contours() {
        let points = contour.points();
        let count = points.len();
        let rings: Vec<Vec<u32>> = (0..ring_count)
            .map(|step| {
                points
                    .iter()
                    .map(|&p| mesh.add_vertex(place(p, step)))
                    .collect()
            })
            .collect();
        for step in 0..n {
            let next = (step + 1) % ring_count;
            for i in 0..count {
                let j = (i + 1) % count;
                // Skip zero-radius degenerate quads on the axis.
                let on_axis = points[i].x < EPSILON && points[j].x < EPSILON;
                if on_axis {
                    continue;
                }
                mesh.add_triangle(rings[step][i], rings[next][i], rings[next][j], original);
                mesh.add_triangle(rings[step][i], rings[next][j], rings[step][j], original);
            }
        }
    }

    if !full_turn {
        for [a, b, c] in triangulate_set(set) {
            let start: Vec<u32> = [a, b, c]
                .iter()
                .map(|&p| mesh.add_vertex(place(p, 0)))
                .collect();
            mesh.add_triangle(start[0], start[1], start[2], original);
            let end: Vec<u32> = [a, c, b]
                .iter()
                .map(|&p| mesh.add_vertex(place(p, n)))
                .collect();
            mesh.add_triangle(end[0], end[1], end[2], original);
        }
    }

    Ok(mesh.welded(0.0))
}

/// Sweeps a profile along a sequence of frames, stitching consecutive
/// cross-sections and capping both ends.
///
/// Each frame places the profile's XY plane; frames come from the sweep
/// frame computation (X = reference direction, Z = tangent).
pub fn sweep(
    set: &PolygonSet,
    frames: &[cadova_math::Transform3],
    original: OriginalId,
) -> Result<Mesh, KernelError> {
    if set.is_empty() {
        return Err(KernelError::empty("sweep"));
    }
    if frames.len() < 2 {
        return Err(KernelError::degenerate("sweep"));
    }

    let place = |frame: &cadova_math::Transform3, p: DVec2| -> DVec3 {
        frame.apply(DVec3::new(p.x, p.y, 0.0))
    };

    let mut mesh = Mesh::new();
    for contour in set.contours() {
        let points = contour.points();
        let n = points.len();
        let rings: Vec<Vec<u32>> = frames
            .iter()
            .map(|frame| {
                points
                    .iter()
                    .map(|&p| mesh.add_vertex(place(frame, p)))
                    .collect()
            })
            .collect();
        for pair in rings.windows(2) {
            for i in 0..n {
                let j = (i + 1) % n;
                mesh.add_triangle(pair[0][i], pair[0][j], pair[1][j], original);
                mesh.add_triangle(pair[0][i], pair[1][j], pair[1][i], original);
            }
        }
    }

    let first = &frames[0];
    let last = &frames[frames.len() - 1];
    for [a, b, c] in triangulate_set(set) {
        let start: Vec<u32> = [a, c, b]
            .iter()
            .map(|&p| mesh.add_vertex(place(first, p)))
            .collect();
        mesh.add_triangle(start[0], start[1], start[2], original);
        let end: Vec<u32> = [a, b, c]
            .iter()
            .map(|&p| mesh.add_vertex(place(last, p)))
            .collect();
        mesh.add_triangle(end[0], end[1], end[2], original);
    }
    Ok(mesh.welded(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{circle, polygon, rectangle};
    use approx::assert_relative_eq;

    #[test]
    fn test_straight_extrusion_volume() {
        let set = rectangle(DVec2::new(2.0, 3.0)).unwrap();
        let mesh =
            extrude_linear(&set, &LinearExtrusion::straight(4.0), OriginalId::UNTRACKED).unwrap();
        assert!(mesh.is_manifold());
        assert_relative_eq!(mesh.volume(), 24.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.bounding_box().maximum.z, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_twisted_extrusion_is_manifold() {
        let set = rectangle(DVec2::new(2.0, 1.0)).unwrap();
        let spec = LinearExtrusion {
            height: 10.0,
            twist: Angle::degrees(90.0),
            scale_top: DVec2::ONE,
            slices: 20,
        };
        let mesh = extrude_linear(&set, &spec, OriginalId::UNTRACKED).unwrap();
        assert!(mesh.is_manifold());
        // Twist preserves cross-section area, so volume is unchanged.
        assert_relative_eq!(mesh.volume(), 20.0, epsilon = 0.2);
    }

    #[test]
    fn test_scaled_extrusion_volume() {
        let set = rectangle(DVec2::splat(2.0)).unwrap();
        let spec = LinearExtrusion {
            height: 3.0,
            twist: Angle::ZERO,
            scale_top: DVec2::splat(0.5),
            slices: 8,
        };
        let mesh = extrude_linear(&set, &spec, OriginalId::UNTRACKED).unwrap();
        assert!(mesh.is_manifold());
        // Frustum volume: h/3 * (A0 + A1 + sqrt(A0*A1)).
        let ideal = 3.0 / 3.0 * (4.0 + 1.0 + 2.0);
        assert_relative_eq!(mesh.volume(), ideal, epsilon = 0.05);
    }

    #[test]
    fn test_extrusion_with_hole() {
        let outer: Vec<DVec2> = vec![
            DVec2::ZERO,
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(0.0, 4.0),
        ];
        let hole = vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(3.0, 1.0),
            DVec2::new(3.0, 3.0),
            DVec2::new(1.0, 3.0),
        ];
        let set = polygon(&outer, &[hole]).unwrap();
        let mesh =
            extrude_linear(&set, &LinearExtrusion::straight(2.0), OriginalId::UNTRACKED).unwrap();
        assert!(mesh.is_manifold());
        assert_relative_eq!(mesh.volume(), (16.0 - 4.0) * 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_helical_extrusion_two_turns() {
        let set = rectangle(DVec2::new(2.0, 1.0)).unwrap();
        let mesh = extrude_helical(&set, 10.0, 20.0, 16, OriginalId::UNTRACKED).unwrap();
        assert!(mesh.is_manifold());
        let bounds = mesh.bounding_box();
        assert_relative_eq!(bounds.maximum.z - bounds.minimum.z, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_full_revolve_torus_volume() {
        // A square profile at radius 3 revolved into a square torus.
        let profile: Vec<DVec2> = vec![
            DVec2::new(2.5, -0.5),
            DVec2::new(3.5, -0.5),
            DVec2::new(3.5, 0.5),
            DVec2::new(2.5, 0.5),
        ];
        let set = polygon(&profile, &[]).unwrap();
        let mesh = revolve(&set, Angle::FULL_TURN, 128, OriginalId::UNTRACKED).unwrap();
        assert!(mesh.is_manifold());
        // Pappus: area * travel of the centroid.
        let ideal = 1.0 * TAU * 3.0;
        assert!((mesh.volume() - ideal).abs() / ideal < 0.01);
    }

    #[test]
    fn test_half_revolve_has_caps() {
        let profile: Vec<DVec2> = vec![
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(1.0, 1.0),
        ];
        let set = polygon(&profile, &[]).unwrap();
        let mesh = revolve(&set, Angle::degrees(180.0), 64, OriginalId::UNTRACKED).unwrap();
        assert!(mesh.is_manifold());
        let ideal = 1.0 * std::f64::consts::PI * 1.5;
        assert!((mesh.volume() - ideal).abs() / ideal < 0.01);
    }

    #[test]
    fn test_negative_radius_profile_rejected() {
        let set = circle(1.0, 16).unwrap();
        assert!(revolve(&set, Angle::FULL_TURN, 32, OriginalId::UNTRACKED).is_err());
    }

    #[test]
    fn test_sweep_along_straight_frames_matches_extrusion() {
        use cadova_math::Transform3;
        let set = rectangle(DVec2::new(2.0, 1.0)).unwrap();
        let frames: Vec<Transform3> = (0..=4)
            .map(|i| Transform3::translation(DVec3::new(0.0, 0.0, i as f64 * 2.5)))
            .collect();
        let mesh = sweep(&set, &frames, OriginalId::UNTRACKED).unwrap();
        assert!(mesh.is_manifold());
        assert_relative_eq!(mesh.volume(), 20.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sweep_needs_two_frames() {
        use cadova_math::Transform3;
        let set = rectangle(DVec2::ONE).unwrap();
        assert!(sweep(&set, &[Transform3::IDENTITY], OriginalId::UNTRACKED).is_err());
    }
}
