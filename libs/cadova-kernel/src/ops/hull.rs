//! # Convex Hull
//!
//! Quickhull in 3D and Andrew's monotone chain in 2D.

use crate::error::{KernelError, KernelErrorKind};
use crate::mesh::Mesh;
use crate::original_id::OriginalId;
use crate::polygon_set::PolygonSet;
use cadova_math::SimplePolygon;
use config::constants::{EPSILON, PLANE_EPSILON, VERTEX_MERGE_EPSILON};
use glam::{DVec2, DVec3};

/// Computes the convex hull of a 3D point set.
///
/// Needs at least four points not all coplanar. Every hull triangle is
/// attributed to `original`.
pub fn convex_hull(points: &[DVec3], original: OriginalId) -> Result<Mesh, KernelError> {
    let points = dedupe(points);
    if points.len() < 4 {
        return Err(KernelError::degenerate("convex_hull"));
    }

    let mut faces = initial_simplex(&points)?;

    // Assign every point to the first face it lies outside of.
    let mut claimed = vec![false; points.len()];
    for face in &mut faces {
        for (index, &point) in points.iter().enumerate() {
            if !claimed[index] && face.signed_distance(point) > PLANE_EPSILON {
                face.outside.push(index);
                claimed[index] = true;
            }
        }
    }

    loop {
        let Some(face_index) = faces
            .iter()
            .position(|f| f.alive && !f.outside.is_empty())
        else {
            break;
        };
        let apex = faces[face_index]
            .outside
            .iter()
            .copied()
            .max_by(|&a, &b| {
                faces[face_index]
                    .signed_distance(points[a])
                    .total_cmp(&faces[face_index].signed_distance(points[b]))
            })
            .unwrap_or(faces[face_index].outside[0]);
        let apex_point = points[apex];

        // All faces visible from the apex.
        let visible: Vec<usize> = faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.alive && f.signed_distance(apex_point) > PLANE_EPSILON)
            .map(|(i, _)| i)
            .collect();

        // Horizon: directed edges of visible faces whose reverse edge is
        // not in the visible set.
        let mut edges = std::collections::HashSet::new();
        for &face_index in &visible {
            let [a, b, c] = faces[face_index].vertices;
            for edge in [(a, b), (b, c), (c, a)] {
                edges.insert(edge);
            }
        }
        let horizon: Vec<(usize, usize)> = edges
            .iter()
            .copied()
            .filter(|&(a, b)| !edges.contains(&(b, a)))
            .collect();

        // Orphaned outside points get reassigned to the new cone faces.
        let mut orphans = Vec::new();
        for &face_index in &visible {
            orphans.append(&mut faces[face_index].outside);
            faces[face_index].alive = false;
        }

        for (a, b) in horizon {
            let mut face = HullFace::new(a, b, apex, &points)?;
            for &orphan in &orphans {
                if orphan != apex && face.signed_distance(points[orphan]) > PLANE_EPSILON {
                    face.outside.push(orphan);
                }
            }
            faces.push(face);
        }
    }

    let mut mesh = Mesh::new();
    for &point in &points {
        mesh.add_vertex(point);
    }
    for face in faces.iter().filter(|f| f.alive) {
        let [a, b, c] = face.vertices;
        mesh.add_triangle(a as u32, b as u32, c as u32, original);
    }
    let mesh = mesh.welded(0.0);
    if mesh.is_empty() {
        return Err(KernelError::empty("convex_hull"));
    }
    Ok(mesh)
}

/// Hull of a mesh's vertices plus extra seed points.
pub fn convex_hull_adding(
    mesh: &Mesh,
    extra: &[DVec3],
    original: OriginalId,
) -> Result<Mesh, KernelError> {
    let mut points = mesh.vertices().to_vec();
    points.extend_from_slice(extra);
    convex_hull(&points, original)
}

#[derive(Debug, Clone)]
struct HullFace {
    vertices: [usize; 3],
    normal: DVec3,
    offset: f64,
    outside: Vec<usize>,
    alive: bool,
}

impl HullFace {
    fn new(a: usize, b: usize, c: usize, points: &[DVec3]) -> Result<Self, KernelError> {
        let normal = (points[b] - points[a]).cross(points[c] - points[a]);
        if normal.length_squared() < EPSILON {
            return Err(KernelError::degenerate("convex_hull"));
        }
        let normal = normal.normalize();
        Ok(Self {
            vertices: [a, b, c],
            normal,
            offset: normal.dot(points[a]),
            outside: Vec::new(),
            alive: true,
        })
    }

    fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.offset
    }
}

fn dedupe(points: &[DVec3]) -> Vec<DVec3> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(points.len());
    for &p in points {
        let key = (
            (p.x / VERTEX_MERGE_EPSILON).round() as i64,
            (p.y / VERTEX_MERGE_EPSILON).round() as i64,
            (p.z / VERTEX_MERGE_EPSILON).round() as i64,
        );
        if seen.insert(key) {
            out.push(p);
        }
    }
    out
}

/// Builds the starting tetrahedron: an extreme pair, the point farthest
/// from their line, and the point farthest from that plane.
fn initial_simplex(points: &[DVec3]) -> Result<Vec<HullFace>, KernelError> {
    let extremes: Vec<usize> = (0..3)
        .flat_map(|axis| {
            let min = (0..points.len()).min_by(|&a, &b| points[a][axis].total_cmp(&points[b][axis]));
            let max = (0..points.len()).max_by(|&a, &b| points[a][axis].total_cmp(&points[b][axis]));
            [min, max]
        })
        .flatten()
        .collect();

    let (mut p0, mut p1) = (extremes[0], extremes[1]);
    let mut best = f64::NEG_INFINITY;
    for &a in &extremes {
        for &b in &extremes {
            let distance = (points[a] - points[b]).length_squared();
            if distance > best {
                best = distance;
                p0 = a;
                p1 = b;
            }
        }
    }
    if best < EPSILON {
        return Err(KernelError::degenerate("convex_hull"));
    }

    let line_direction = (points[p1] - points[p0]).normalize();
    let p2 = (0..points.len())
        .max_by(|&a, &b| {
            let da = distance_to_line(points[a], points[p0], line_direction);
            let db = distance_to_line(points[b], points[p0], line_direction);
            da.total_cmp(&db)
        })
        .ok_or_else(|| KernelError::degenerate("convex_hull"))?;
    if distance_to_line(points[p2], points[p0], line_direction) < EPSILON {
        return Err(KernelError::degenerate("convex_hull"));
    }

    let base_normal = (points[p1] - points[p0])
        .cross(points[p2] - points[p0])
        .normalize();
    let base_offset = base_normal.dot(points[p0]);
    let p3 = (0..points.len())
        .max_by(|&a, &b| {
            (base_normal.dot(points[a]) - base_offset)
                .abs()
                .total_cmp(&(base_normal.dot(points[b]) - base_offset).abs())
        })
        .ok_or_else(|| KernelError::degenerate("convex_hull"))?;
    let height = base_normal.dot(points[p3]) - base_offset;
    if height.abs() < PLANE_EPSILON {
        return Err(KernelError::new("convex_hull", KernelErrorKind::Degenerate));
    }

    // Order the base so every face winds outward.
    let (a, b, c, d) = if height < 0.0 {
        (p0, p1, p2, p3)
    } else {
        (p0, p2, p1, p3)
    };
    Ok(vec![
        HullFace::new(a, b, c, points)?,
        HullFace::new(a, d, b, points)?,
        HullFace::new(b, d, c, points)?,
        HullFace::new(c, d, a, points)?,
    ])
}

fn distance_to_line(point: DVec3, origin: DVec3, direction: DVec3) -> f64 {
    let offset = point - origin;
    (offset - direction * offset.dot(direction)).length()
}

/// Convex hull of a 2D point set by Andrew's monotone chain.
pub fn convex_hull_2d(points: &[DVec2]) -> Result<PolygonSet, KernelError> {
    let mut points: Vec<DVec2> = points.to_vec();
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    points.dedup_by(|a, b| (*a - *b).length_squared() < EPSILON);
    if points.len() < 3 {
        return Err(KernelError::degenerate("convex_hull_2d"));
    }

    let mut lower: Vec<DVec2> = Vec::new();
    for &p in &points {
        while lower.len() >= 2
            && (lower[lower.len() - 1] - lower[lower.len() - 2])
                .perp_dot(p - lower[lower.len() - 2])
                <= EPSILON
        {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<DVec2> = Vec::new();
    for &p in points.iter().rev() {
        while upper.len() >= 2
            && (upper[upper.len() - 1] - upper[upper.len() - 2])
                .perp_dot(p - upper[upper.len() - 2])
                <= EPSILON
        {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    if lower.len() < 3 {
        return Err(KernelError::degenerate("convex_hull_2d"));
    }
    Ok(PolygonSet::from_single(SimplePolygon::new(lower)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hull_of_cube_corners_with_interior_noise() {
        let mut points = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(0.0, 2.0, 0.0),
            DVec3::new(2.0, 2.0, 0.0),
            DVec3::new(0.0, 0.0, 2.0),
            DVec3::new(2.0, 0.0, 2.0),
            DVec3::new(0.0, 2.0, 2.0),
            DVec3::new(2.0, 2.0, 2.0),
        ];
        points.push(DVec3::splat(1.0));
        points.push(DVec3::new(0.5, 1.0, 1.5));
        let hull = convex_hull(&points, OriginalId::UNTRACKED).unwrap();
        assert!(hull.is_manifold());
        assert_relative_eq!(hull.volume(), 8.0, epsilon = 1e-9);
        assert_eq!(hull.vertex_count(), 8);
    }

    #[test]
    fn test_tetrahedron_hull() {
        let points = vec![
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            DVec3::Z,
        ];
        let hull = convex_hull(&points, OriginalId::UNTRACKED).unwrap();
        assert_eq!(hull.triangle_count(), 4);
        assert_relative_eq!(hull.volume(), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_coplanar_points_rejected() {
        let points = vec![
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            DVec3::new(1.0, 1.0, 0.0),
        ];
        assert!(convex_hull(&points, OriginalId::UNTRACKED).is_err());
    }

    #[test]
    fn test_hull_adding_extends_reach() {
        let base = crate::primitives::cuboid(DVec3::ONE, OriginalId::UNTRACKED).unwrap();
        let hull =
            convex_hull_adding(&base, &[DVec3::new(0.5, 0.5, 5.0)], OriginalId::UNTRACKED)
                .unwrap();
        assert_relative_eq!(hull.bounding_box().maximum.z, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hull_2d_square() {
        let points = vec![
            DVec2::ZERO,
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(0.0, 2.0),
            DVec2::ONE,
            DVec2::new(0.5, 0.5),
        ];
        let hull = convex_hull_2d(&points).unwrap();
        assert_eq!(hull.contours()[0].len(), 4);
        assert_relative_eq!(hull.area(), 4.0, epsilon = 1e-12);
    }
}
