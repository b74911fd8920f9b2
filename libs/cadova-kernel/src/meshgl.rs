//! # MeshGL Decomposition
//!
//! The export-facing view of a mesh: `f32` vertex buffer, index buffer,
//! and original-ID runs. Triangles are reordered so each original ID
//! occupies one contiguous run, the layout file writers consume.

use crate::mesh::Mesh;
use crate::original_id::OriginalId;
use glam::DVec3;

/// GPU- and file-friendly mesh buffers with original-ID runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGl {
    /// Vertex positions as a flat `[x, y, z, ...]` array.
    pub vertex_properties: Vec<f32>,
    /// Triangle indices as a flat `[i0, i1, i2, ...]` array, grouped by
    /// original ID.
    pub triangle_vertices: Vec<u32>,
    /// Start offset (in triangles) of each run.
    pub run_index: Vec<u32>,
    /// The original ID of each run, parallel to `run_index`.
    pub run_original_id: Vec<OriginalId>,
}

impl MeshGl {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_properties.len() / 3
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangle_vertices.len() / 3
    }

    /// The vertex at `index` as `f64`.
    pub fn vertex(&self, index: usize) -> DVec3 {
        DVec3::new(
            self.vertex_properties[index * 3] as f64,
            self.vertex_properties[index * 3 + 1] as f64,
            self.vertex_properties[index * 3 + 2] as f64,
        )
    }

    /// The original ID owning triangle `index`.
    pub fn original_of_triangle(&self, index: usize) -> OriginalId {
        let position = self
            .run_index
            .partition_point(|&start| start as usize <= index);
        self.run_original_id[position.saturating_sub(1)]
    }
}

impl Mesh {
    /// Decomposes the mesh into export buffers.
    pub fn to_mesh_gl(&self) -> MeshGl {
        let mut order: Vec<usize> = (0..self.triangle_count()).collect();
        order.sort_by_key(|&i| self.originals()[i]);

        let mut gl = MeshGl {
            vertex_properties: Vec::with_capacity(self.vertex_count() * 3),
            triangle_vertices: Vec::with_capacity(self.triangle_count() * 3),
            run_index: Vec::new(),
            run_original_id: Vec::new(),
        };
        for vertex in self.vertices() {
            gl.vertex_properties.push(vertex.x as f32);
            gl.vertex_properties.push(vertex.y as f32);
            gl.vertex_properties.push(vertex.z as f32);
        }
        let mut current_run: Option<OriginalId> = None;
        for (position, &triangle_index) in order.iter().enumerate() {
            let original = self.originals()[triangle_index];
            if current_run != Some(original) {
                gl.run_index.push(position as u32);
                gl.run_original_id.push(original);
                current_run = Some(original);
            }
            let [a, b, c] = self.triangles()[triangle_index];
            gl.triangle_vertices.extend([a, b, c]);
        }
        gl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::cuboid;

    #[test]
    fn test_runs_partition_triangles() {
        let first = OriginalId::fresh();
        let second = OriginalId::fresh();
        let a = cuboid(DVec3::ONE, first).unwrap();
        let b = cuboid(DVec3::ONE, second).unwrap();
        let merged = Mesh::merged([&a, &b]);
        let gl = merged.to_mesh_gl();
        assert_eq!(gl.triangle_count(), 24);
        assert_eq!(gl.run_index.len(), 2);
        assert_eq!(gl.run_index[0], 0);
        assert_eq!(gl.run_index[1], 12);
        // Every triangle resolves to exactly one run.
        for i in 0..gl.triangle_count() {
            let original = gl.original_of_triangle(i);
            assert!(original == first || original == second);
        }
        assert_eq!(gl.original_of_triangle(0), gl.original_of_triangle(11));
        assert_ne!(gl.original_of_triangle(11), gl.original_of_triangle(12));
    }

    #[test]
    fn test_vertex_round_trip() {
        let mesh = cuboid(DVec3::new(1.0, 2.0, 3.0), OriginalId::UNTRACKED).unwrap();
        let gl = mesh.to_mesh_gl();
        assert_eq!(gl.vertex_count(), 8);
        assert!((gl.vertex(7) - mesh.vertices()[7]).length() < 1e-6);
    }
}
