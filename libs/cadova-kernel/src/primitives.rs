//! # Primitives
//!
//! Concrete constructors for the leaf shapes: cuboid, cylinder (cone
//! frustum), sphere, polyhedron, patch sheet, circle, rectangle, polygon.
//!
//! Curved primitives take an explicit segment count; the scene layer
//! samples its segmentation policy before lowering so the count is part of
//! the node value.

use crate::error::{KernelError, KernelErrorKind};
use crate::mesh::Mesh;
use crate::original_id::OriginalId;
use crate::polygon_set::PolygonSet;
use crate::triangulate::triangulate_polygon;
use cadova_math::SimplePolygon;
use config::constants::EPSILON;
use glam::{DVec2, DVec3};
use std::f64::consts::TAU;

/// An axis-aligned box with one corner at the origin.
pub fn cuboid(size: DVec3, original: OriginalId) -> Result<Mesh, KernelError> {
    if size.min_element() <= 0.0 {
        return Err(KernelError::degenerate("cuboid"));
    }
    let mut mesh = Mesh::with_capacity(8, 12);
    for z in [0.0, size.z] {
        for y in [0.0, size.y] {
            for x in [0.0, size.x] {
                mesh.add_vertex(DVec3::new(x, y, z));
            }
        }
    }
    // Vertex layout: bit 0 = +x, bit 1 = +y, bit 2 = +z.
    const FACES: [[u32; 4]; 6] = [
        [0, 2, 3, 1], // bottom (-z)
        [4, 5, 7, 6], // top (+z)
        [0, 1, 5, 4], // -y
        [2, 6, 7, 3], // +y
        [0, 4, 6, 2], // -x
        [1, 3, 7, 5], // +x
    ];
    for [a, b, c, d] in FACES {
        mesh.add_triangle(a, b, c, original);
        mesh.add_triangle(a, c, d, original);
    }
    Ok(mesh)
}

/// A cone frustum from `z = 0` to `z = height`.
///
/// Either radius may be zero, collapsing that end to an apex. Both zero is
/// rejected; the scene layer normalizes that case to an empty node before
/// lowering.
pub fn cylinder(
    bottom_radius: f64,
    top_radius: f64,
    height: f64,
    segments: u32,
    original: OriginalId,
) -> Result<Mesh, KernelError> {
    if height <= 0.0 || bottom_radius < 0.0 || top_radius < 0.0 {
        return Err(KernelError::degenerate("cylinder"));
    }
    if bottom_radius < EPSILON && top_radius < EPSILON {
        return Err(KernelError::degenerate("cylinder"));
    }
    let n = segments.max(3) as usize;
    let mut mesh = Mesh::new();

    let ring = |radius: f64, z: f64, mesh: &mut Mesh| -> Vec<u32> {
        (0..n)
            .map(|i| {
                let angle = TAU * i as f64 / n as f64;
                mesh.add_vertex(DVec3::new(radius * angle.cos(), radius * angle.sin(), z))
            })
            .collect()
    };

    let bottom_is_apex = bottom_radius < EPSILON;
    let top_is_apex = top_radius < EPSILON;

    if bottom_is_apex {
        let apex = mesh.add_vertex(DVec3::ZERO);
        let top = ring(top_radius, height, &mut mesh);
        for i in 0..n {
            let j = (i + 1) % n;
            mesh.add_triangle(apex, top[j], top[i], original);
        }
        // Top cap, facing +z.
        for i in 1..n - 1 {
            mesh.add_triangle(top[0], top[i], top[i + 1], original);
        }
    } else if top_is_apex {
        let bottom = ring(bottom_radius, 0.0, &mut mesh);
        let apex = mesh.add_vertex(DVec3::new(0.0, 0.0, height));
        for i in 0..n {
            let j = (i + 1) % n;
            mesh.add_triangle(bottom[i], bottom[j], apex, original);
        }
        // Bottom cap, facing -z.
        for i in 1..n - 1 {
            mesh.add_triangle(bottom[0], bottom[i + 1], bottom[i], original);
        }
    } else {
        let bottom = ring(bottom_radius, 0.0, &mut mesh);
        let top = ring(top_radius, height, &mut mesh);
        for i in 0..n {
            let j = (i + 1) % n;
            mesh.add_triangle(bottom[i], bottom[j], top[j], original);
            mesh.add_triangle(bottom[i], top[j], top[i], original);
        }
        for i in 1..n - 1 {
            mesh.add_triangle(bottom[0], bottom[i + 1], bottom[i], original);
            mesh.add_triangle(top[0], top[i], top[i + 1], original);
        }
    }
    Ok(mesh)
}

/// A UV sphere centered at the origin.
pub fn sphere(radius: f64, segments: u32, original: OriginalId) -> Result<Mesh, KernelError> {
    if radius <= 0.0 {
        return Err(KernelError::degenerate("sphere"));
    }
    let meridians = segments.max(3) as usize;
    let bands = (meridians / 2).max(2);
    let mut mesh = Mesh::new();

    let south = mesh.add_vertex(DVec3::new(0.0, 0.0, -radius));
    let mut rings: Vec<Vec<u32>> = Vec::with_capacity(bands - 1);
    for band in 1..bands {
        let polar = std::f64::consts::PI * band as f64 / bands as f64 - std::f64::consts::FRAC_PI_2;
        let z = radius * polar.sin();
        let ring_radius = radius * polar.cos();
        let ring = (0..meridians)
            .map(|i| {
                let angle = TAU * i as f64 / meridians as f64;
                mesh.add_vertex(DVec3::new(
                    ring_radius * angle.cos(),
                    ring_radius * angle.sin(),
                    z,
                ))
            })
            .collect();
        rings.push(ring);
    }
    let north = mesh.add_vertex(DVec3::new(0.0, 0.0, radius));

    // South fan.
    for i in 0..meridians {
        let j = (i + 1) % meridians;
        mesh.add_triangle(south, rings[0][j], rings[0][i], original);
    }
    // Bands.
    for pair in rings.windows(2) {
        for i in 0..meridians {
            let j = (i + 1) % meridians;
            mesh.add_triangle(pair[0][i], pair[0][j], pair[1][j], original);
            mesh.add_triangle(pair[0][i], pair[1][j], pair[1][i], original);
        }
    }
    // North fan.
    let last = &rings[rings.len() - 1];
    for i in 0..meridians {
        let j = (i + 1) % meridians;
        mesh.add_triangle(north, last[i], last[j], original);
    }
    Ok(mesh)
}

/// A mesh from explicit vertices and polygonal faces.
///
/// Faces may have more than three vertices; each is triangulated in its
/// own plane. Face winding is taken as given (outward).
pub fn polyhedron(
    points: &[DVec3],
    faces: &[Vec<usize>],
    original: OriginalId,
) -> Result<Mesh, KernelError> {
    if points.is_empty() || faces.is_empty() {
        return Err(KernelError::empty("polyhedron"));
    }
    let mut mesh = Mesh::with_capacity(points.len(), faces.len() * 2);
    for &point in points {
        mesh.add_vertex(point);
    }
    for face in faces {
        if face.len() < 3 {
            return Err(KernelError::degenerate("polyhedron"));
        }
        if face.iter().any(|&i| i >= points.len()) {
            return Err(KernelError::new("polyhedron", KernelErrorKind::Unsupported));
        }
        if face.len() == 3 {
            mesh.add_triangle(face[0] as u32, face[1] as u32, face[2] as u32, original);
            continue;
        }
        // Project the face into its best-fit plane and ear-clip there.
        let positions: Vec<DVec3> = face.iter().map(|&i| points[i]).collect();
        let normal = face_normal(&positions);
        let (u_axis, v_axis) = plane_basis(normal);
        let projected: Vec<DVec2> = positions
            .iter()
            .map(|&p| DVec2::new(p.dot(u_axis), p.dot(v_axis)))
            .collect();
        for [a, b, c] in triangulate_polygon(&projected) {
            mesh.add_triangle(face[a] as u32, face[b] as u32, face[c] as u32, original);
        }
    }
    Ok(mesh)
}

/// An open sheet over a sampled patch grid.
///
/// The grid rows must share a length. A sheet is not watertight on its
/// own; callers combine sheets into closed solids before CSG.
pub fn patch_sheet(grid: &[Vec<DVec3>], original: OriginalId) -> Result<Mesh, KernelError> {
    if grid.len() < 2 || grid[0].len() < 2 {
        return Err(KernelError::degenerate("patch"));
    }
    let width = grid[0].len();
    if grid.iter().any(|row| row.len() != width) {
        return Err(KernelError::degenerate("patch"));
    }
    let mut mesh = Mesh::with_capacity(grid.len() * width, (grid.len() - 1) * (width - 1) * 2);
    for row in grid {
        for &point in row {
            mesh.add_vertex(point);
        }
    }
    let index = |r: usize, c: usize| (r * width + c) as u32;
    for r in 0..grid.len() - 1 {
        for c in 0..width - 1 {
            mesh.add_triangle(index(r, c), index(r, c + 1), index(r + 1, c + 1), original);
            mesh.add_triangle(index(r, c), index(r + 1, c + 1), index(r + 1, c), original);
        }
    }
    Ok(mesh)
}

fn face_normal(positions: &[DVec3]) -> DVec3 {
    // Newell's method tolerates slightly non-planar faces.
    let mut normal = DVec3::ZERO;
    let n = positions.len();
    for i in 0..n {
        let a = positions[i];
        let b = positions[(i + 1) % n];
        normal += DVec3::new(
            (a.y - b.y) * (a.z + b.z),
            (a.z - b.z) * (a.x + b.x),
            (a.x - b.x) * (a.y + b.y),
        );
    }
    normal.normalize_or_zero()
}

fn plane_basis(normal: DVec3) -> (DVec3, DVec3) {
    let seed = if normal.x.abs() < normal.y.abs() {
        DVec3::X
    } else {
        DVec3::Y
    };
    let u = (seed - normal * seed.dot(normal)).normalize_or_zero();
    let v = normal.cross(u);
    (u, v)
}

// =============================================================================
// 2D PRIMITIVES
// =============================================================================

/// A regular polygon approximating a circle, centered at the origin.
pub fn circle(radius: f64, segments: u32) -> Result<PolygonSet, KernelError> {
    if radius <= 0.0 {
        return Err(KernelError::degenerate("circle"));
    }
    let n = segments.max(3) as usize;
    let points = (0..n)
        .map(|i| {
            let angle = TAU * i as f64 / n as f64;
            DVec2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect();
    Ok(PolygonSet::from_single(SimplePolygon::new(points)))
}

/// An axis-aligned rectangle with one corner at the origin.
pub fn rectangle(size: DVec2) -> Result<PolygonSet, KernelError> {
    if size.min_element() <= 0.0 {
        return Err(KernelError::degenerate("rectangle"));
    }
    Ok(PolygonSet::from_single(SimplePolygon::new(vec![
        DVec2::ZERO,
        DVec2::new(size.x, 0.0),
        size,
        DVec2::new(0.0, size.y),
    ])))
}

/// A polygon set from an outer loop and optional holes.
pub fn polygon(
    outer: &[DVec2],
    holes: &[Vec<DVec2>],
) -> Result<PolygonSet, KernelError> {
    if outer.len() < 3 {
        return Err(KernelError::degenerate("polygon"));
    }
    let mut contours = Vec::with_capacity(1 + holes.len());
    let outer_polygon = SimplePolygon::new(outer.to_vec());
    contours.push(if outer_polygon.is_counter_clockwise() {
        outer_polygon
    } else {
        outer_polygon.reversed()
    });
    for hole in holes {
        if hole.len() < 3 {
            return Err(KernelError::degenerate("polygon"));
        }
        let hole_polygon = SimplePolygon::new(hole.clone());
        contours.push(if hole_polygon.is_counter_clockwise() {
            hole_polygon.reversed()
        } else {
            hole_polygon
        });
    }
    Ok(PolygonSet::from_contours(contours))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_triangular_prism_counts() {
        // A cylinder at fixed(3) is a right triangular prism.
        let prism = cylinder(10.0, 10.0, 5.0, 3, OriginalId::UNTRACKED).unwrap();
        assert_eq!(prism.vertex_count(), 6);
        assert_eq!(prism.triangle_count(), 8);
        assert!(prism.is_manifold());
        let expected_volume = 3.0 * 3.0_f64.sqrt() / 4.0 * 100.0 * 5.0;
        assert_relative_eq!(prism.volume(), expected_volume, epsilon = 1e-6);
        let base = 3.0 * 3.0_f64.sqrt() / 4.0 * 100.0;
        let side = 3.0 * (10.0 * 3.0_f64.sqrt()) * 5.0;
        assert_relative_eq!(prism.surface_area(), 2.0 * base + side, epsilon = 1e-6);
    }

    #[test]
    fn test_cone_is_manifold() {
        let cone = cylinder(5.0, 0.0, 8.0, 16, OriginalId::UNTRACKED).unwrap();
        assert!(cone.is_manifold());
        assert!(cone.volume() > 0.0);
        let inverted = cylinder(0.0, 5.0, 8.0, 16, OriginalId::UNTRACKED).unwrap();
        assert!(inverted.is_manifold());
        assert_relative_eq!(inverted.volume(), cone.volume(), epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_cylinder_rejected() {
        assert!(cylinder(0.0, 0.0, 5.0, 8, OriginalId::UNTRACKED).is_err());
        assert!(cylinder(1.0, 1.0, 0.0, 8, OriginalId::UNTRACKED).is_err());
    }

    #[test]
    fn test_sphere_volume_approaches_ideal() {
        let radius = 5.0;
        let mesh = sphere(radius, 64, OriginalId::UNTRACKED).unwrap();
        assert!(mesh.is_manifold());
        let ideal = 4.0 / 3.0 * std::f64::consts::PI * radius.powi(3);
        let error = (mesh.volume() - ideal).abs() / ideal;
        assert!(error < 0.01, "relative error was {error}");
    }

    #[test]
    fn test_polyhedron_quad_faces() {
        // A unit cube given as six quads.
        let points = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(0.0, 1.0, 1.0),
        ];
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![1, 2, 6, 5],
            vec![2, 3, 7, 6],
            vec![3, 0, 4, 7],
        ];
        let mesh = polyhedron(&points, &faces, OriginalId::UNTRACKED).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.is_manifold());
        assert_relative_eq!(mesh.volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_circle_area_converges() {
        let set = circle(10.0, 128).unwrap();
        let ideal = std::f64::consts::PI * 100.0;
        assert!((set.area() - ideal).abs() / ideal < 0.01);
    }

    #[test]
    fn test_rectangle_origin_corner() {
        let set = rectangle(DVec2::new(3.0, 2.0)).unwrap();
        assert!((set.area() - 6.0).abs() < 1e-12);
        assert_eq!(set.bounding_box().minimum, DVec2::ZERO);
    }
}
