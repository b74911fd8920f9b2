//! # Projection and Slicing
//!
//! 3D to 2D reductions: planar cross-sections (slice) and the
//! orthographic shadow (projection).

use crate::error::KernelError;
use crate::mesh::Mesh;
use crate::ops::boolean::{boolean_2d, BooleanOp};
use crate::polygon_set::PolygonSet;
use cadova_math::{Plane, SimplePolygon};
use config::constants::{EPSILON, PLANE_EPSILON, VERTEX_MERGE_EPSILON};
use glam::{DVec2, DVec3};
use std::collections::HashMap;

/// The cross-section of a mesh with a plane, in the plane's local 2D
/// coordinates (+Z = plane normal).
///
/// Solid regions come out as counter-clockwise contours, holes clockwise.
pub fn cross_section(mesh: &Mesh, plane: &Plane) -> Result<PolygonSet, KernelError> {
    let frame = plane.local_to_world();
    let world_to_local = frame
        .inverse()
        .map_err(|_| KernelError::degenerate("cross_section"))?;
    let normal = plane.normal.vector();

    let mut segments: Vec<(DVec2, DVec2)> = Vec::new();
    for index in 0..mesh.triangle_count() {
        let corners = mesh.triangle_points(index);
        let distances: Vec<f64> = corners
            .iter()
            .map(|&p| plane.signed_distance(p))
            .collect();
        let mut crossings: Vec<DVec3> = Vec::new();
        for i in 0..3 {
            let j = (i + 1) % 3;
            let (da, db) = (distances[i], distances[j]);
            if (da > PLANE_EPSILON && db < -PLANE_EPSILON)
                || (da < -PLANE_EPSILON && db > PLANE_EPSILON)
            {
                let t = da / (da - db);
                crossings.push(corners[i].lerp(corners[j], t));
            } else if da.abs() <= PLANE_EPSILON && db.abs() > PLANE_EPSILON {
                crossings.push(corners[i]);
            }
        }
        crossings.dedup_by(|a, b| (*a - *b).length_squared() < EPSILON);
        if crossings.len() != 2 {
            continue;
        }
        // Orient so solid interior lies to the left: segment direction is
        // plane normal x face normal.
        let face_normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or_zero();
        let direction = normal.cross(face_normal);
        let (mut from, mut to) = (crossings[0], crossings[1]);
        if (to - from).dot(direction) < 0.0 {
            std::mem::swap(&mut from, &mut to);
        }
        let from_local = world_to_local.apply(from);
        let to_local = world_to_local.apply(to);
        let from_2d = DVec2::new(from_local.x, from_local.y);
        let to_2d = DVec2::new(to_local.x, to_local.y);
        if (to_2d - from_2d).length_squared() > EPSILON {
            segments.push((from_2d, to_2d));
        }
    }
    Ok(chain_segments(segments))
}

/// The cross-section at height `z`, in world XY coordinates.
pub fn slice_at(mesh: &Mesh, z: f64) -> Result<PolygonSet, KernelError> {
    cross_section(mesh, &Plane::z(z))
}

/// The orthographic shadow of a mesh onto the XY plane.
///
/// The union of the projections of all downward-facing triangles, which
/// for a closed manifold equals the full footprint.
pub fn project(mesh: &Mesh) -> Result<PolygonSet, KernelError> {
    let mut shadows: Vec<PolygonSet> = Vec::new();
    for index in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle_points(index);
        let normal = (b - a).cross(c - a);
        if normal.z >= -EPSILON {
            continue;
        }
        // A downward face projects clockwise; reverse for CCW.
        let triangle = SimplePolygon::new(vec![
            DVec2::new(a.x, a.y),
            DVec2::new(c.x, c.y),
            DVec2::new(b.x, b.y),
        ]);
        if triangle.area() > EPSILON {
            shadows.push(PolygonSet::from_single(triangle));
        }
    }
    boolean_2d(&shadows, BooleanOp::Union)
}

/// Chains loose oriented segments into closed contours.
pub(crate) fn chain_segments(segments: Vec<(DVec2, DVec2)>) -> PolygonSet {
    let quantize = |p: DVec2| {
        (
            (p.x / VERTEX_MERGE_EPSILON).round() as i64,
            (p.y / VERTEX_MERGE_EPSILON).round() as i64,
        )
    };
    let mut by_start: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (index, segment) in segments.iter().enumerate() {
        by_start.entry(quantize(segment.0)).or_default().push(index);
    }

    let mut used = vec![false; segments.len()];
    let mut contours = Vec::new();
    for seed in 0..segments.len() {
        if used[seed] {
            continue;
        }
        let mut loop_points = Vec::new();
        let mut current = seed;
        loop {
            used[current] = true;
            loop_points.push(segments[current].0);
            let key = quantize(segments[current].1);
            match by_start
                .get(&key)
                .and_then(|candidates| candidates.iter().find(|&&i| !used[i]).copied())
            {
                Some(next) => current = next,
                None => break,
            }
        }
        let closes = quantize(segments[current].1) == quantize(segments[seed].0);
        if closes && loop_points.len() >= 3 {
            let contour = SimplePolygon::new(loop_points).simplified(PLANE_EPSILON);
            if contour.area() > VERTEX_MERGE_EPSILON {
                contours.push(contour);
            }
        }
    }
    PolygonSet::from_contours(contours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::original_id::OriginalId;
    use crate::ops::boolean::boolean;
    use crate::primitives::{cuboid, cylinder};
    use cadova_math::Transform3;
    use approx::assert_relative_eq;

    #[test]
    fn test_slice_through_cube() {
        let mesh = cuboid(DVec3::new(2.0, 3.0, 4.0), OriginalId::UNTRACKED).unwrap();
        let section = slice_at(&mesh, 2.0).unwrap();
        assert_eq!(section.contour_count(), 1);
        assert_relative_eq!(section.area(), 6.0, epsilon = 1e-6);
        assert!(section.contours()[0].is_counter_clockwise());
    }

    #[test]
    fn test_slice_of_annulus_has_hole() {
        let outer = cylinder(10.0, 10.0, 10.0, 48, OriginalId::UNTRACKED).unwrap();
        let inner = cylinder(5.0, 5.0, 10.0, 48, OriginalId::UNTRACKED).unwrap();
        let ring = boolean(&[&outer, &inner], BooleanOp::Difference).unwrap();
        let section = slice_at(&ring, 5.0).unwrap();
        assert_eq!(section.contour_count(), 2);
        let ideal = std::f64::consts::PI * (100.0 - 25.0);
        assert!((section.area() - ideal).abs() / ideal < 0.02);
    }

    #[test]
    fn test_slice_misses_mesh() {
        let mesh = cuboid(DVec3::ONE, OriginalId::UNTRACKED).unwrap();
        let section = slice_at(&mesh, 5.0).unwrap();
        assert!(section.is_empty());
    }

    #[test]
    fn test_projection_of_tilted_cube() {
        let mesh = cuboid(DVec3::splat(2.0), OriginalId::UNTRACKED).unwrap()
            .transformed(&Transform3::translation(DVec3::new(0.0, 0.0, 3.0)));
        let shadow = project(&mesh).unwrap();
        assert_relative_eq!(shadow.area(), 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_projection_of_cylinder() {
        let mesh = cylinder(5.0, 5.0, 4.0, 32, OriginalId::UNTRACKED).unwrap();
        let shadow = project(&mesh).unwrap();
        let ideal = std::f64::consts::PI * 25.0;
        assert!((shadow.area() - ideal).abs() / ideal < 0.02);
    }
}
