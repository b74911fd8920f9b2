//! # Refine
//!
//! Subdivides a mesh until no edge exceeds a maximum length. Every edge
//! split is mirrored in both incident triangles, keeping the mesh
//! watertight; children inherit the face's original ID.

use crate::error::KernelError;
use crate::mesh::Mesh;
use glam::DVec3;
use std::collections::HashMap;

/// Refines `mesh` so that no edge is longer than `max_edge_length`.
pub fn refine(mesh: &Mesh, max_edge_length: f64) -> Result<Mesh, KernelError> {
    if max_edge_length <= 0.0 {
        return Err(KernelError::degenerate("refine"));
    }
    let mut current = mesh.clone();
    // Each pass halves the longest edges; iterate to convergence.
    loop {
        let (next, split_count) = refine_pass(&current, max_edge_length);
        current = next;
        if split_count == 0 {
            return Ok(current);
        }
    }
}

fn refine_pass(mesh: &Mesh, max_edge_length: f64) -> (Mesh, usize) {
    let limit_squared = max_edge_length * max_edge_length;

    // Global set of edges to split, so both incident triangles agree.
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut out = Mesh::with_capacity(mesh.vertex_count(), mesh.triangle_count());
    for &vertex in mesh.vertices() {
        out.add_vertex(vertex);
    }

    let edge_key = |a: u32, b: u32| (a.min(b), a.max(b));
    for &[a, b, c] in mesh.triangles() {
        for (u, v) in [(a, b), (b, c), (c, a)] {
            let pu = mesh.vertices()[u as usize];
            let pv = mesh.vertices()[v as usize];
            if (pv - pu).length_squared() > limit_squared {
                midpoints.entry(edge_key(u, v)).or_insert(u32::MAX);
            }
        }
    }
    if midpoints.is_empty() {
        return (mesh.clone(), 0);
    }
    let split_count = midpoints.len();
    for (&(u, v), slot) in midpoints.iter_mut() {
        let mid: DVec3 =
            (mesh.vertices()[u as usize] + mesh.vertices()[v as usize]) * 0.5;
        *slot = out.add_vertex(mid);
    }

    for (tri_index, &[a, b, c]) in mesh.triangles().iter().enumerate() {
        let original = mesh.originals()[tri_index];
        let ab = midpoints.get(&edge_key(a, b)).copied();
        let bc = midpoints.get(&edge_key(b, c)).copied();
        let ca = midpoints.get(&edge_key(c, a)).copied();

        match (ab, bc, ca) {
            (None, None, None) => out.add_triangle(a, b, c, original),
            (Some(m), None, None) => {
                out.add_triangle(a, m, c, original);
                out.add_triangle(m, b, c, original);
            }
            (None, Some(m), None) => {
                out.add_triangle(b, m, a, original);
                out.add_triangle(m, c, a, original);
            }
            (None, None, Some(m)) => {
                out.add_triangle(c, m, b, original);
                out.add_triangle(m, a, b, original);
            }
            (Some(mab), Some(mbc), None) => {
                out.add_triangle(a, mab, mbc, original);
                out.add_triangle(a, mbc, c, original);
                out.add_triangle(mab, b, mbc, original);
            }
            (Some(mab), None, Some(mca)) => {
                out.add_triangle(a, mab, mca, original);
                out.add_triangle(mab, b, mca, original);
                out.add_triangle(mca, b, c, original);
            }
            (None, Some(mbc), Some(mca)) => {
                out.add_triangle(a, b, mbc, original);
                out.add_triangle(a, mbc, mca, original);
                out.add_triangle(mca, mbc, c, original);
            }
            (Some(mab), Some(mbc), Some(mca)) => {
                out.add_triangle(a, mab, mca, original);
                out.add_triangle(mab, b, mbc, original);
                out.add_triangle(mca, mbc, c, original);
                out.add_triangle(mab, mbc, mca, original);
            }
        }
    }
    (out, split_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::original_id::OriginalId;
    use crate::primitives::cuboid;
    use approx::assert_relative_eq;
    use glam::DVec3;

    #[test]
    fn test_refine_bounds_edge_length() {
        let mesh = cuboid(DVec3::splat(4.0), OriginalId::UNTRACKED).unwrap();
        let refined = refine(&mesh, 1.5).unwrap();
        for &[a, b, c] in refined.triangles() {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                let length = (refined.vertices()[v as usize]
                    - refined.vertices()[u as usize])
                    .length();
                assert!(length <= 1.5 + 1e-9, "edge length {length}");
            }
        }
        assert!(refined.is_manifold());
        assert_relative_eq!(refined.volume(), 64.0, epsilon = 1e-9);
        assert_relative_eq!(refined.surface_area(), 96.0, epsilon = 1e-9);
    }

    #[test]
    fn test_refine_preserves_attribution() {
        let id = OriginalId::fresh();
        let mesh = cuboid(DVec3::ONE, id).unwrap();
        let refined = refine(&mesh, 0.4).unwrap();
        assert!(refined.originals().iter().all(|&o| o == id));
    }

    #[test]
    fn test_no_split_when_already_fine() {
        let mesh = cuboid(DVec3::ONE, OriginalId::UNTRACKED).unwrap();
        let refined = refine(&mesh, 10.0).unwrap();
        assert_eq!(refined.triangle_count(), mesh.triangle_count());
    }
}
