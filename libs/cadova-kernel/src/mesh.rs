//! # Mesh
//!
//! The 3D concrete: an indexed triangle mesh with per-triangle original
//! IDs. All coordinates are `f64`; `f32` appears only at the export
//! boundary.

use crate::original_id::OriginalId;
use cadova_math::{BoundingBox3, Transform3};
use config::constants::VERTEX_MERGE_EPSILON;
use glam::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A triangle mesh with vertices, indices, and original-ID attribution.
///
/// # Example
///
/// ```rust
/// use cadova_kernel::{Mesh, OriginalId};
/// use glam::DVec3;
///
/// let mut mesh = Mesh::new();
/// let a = mesh.add_vertex(DVec3::ZERO);
/// let b = mesh.add_vertex(DVec3::X);
/// let c = mesh.add_vertex(DVec3::Y);
/// mesh.add_triangle(a, b, c, OriginalId::UNTRACKED);
/// assert_eq!(mesh.triangle_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    vertices: Vec<DVec3>,
    triangles: Vec<[u32; 3]>,
    /// One original ID per triangle.
    originals: Vec<OriginalId>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
            originals: Vec::with_capacity(triangle_count),
        }
    }

    /// Builds a mesh from raw parts.
    ///
    /// `originals` must be one entry per triangle.
    pub fn from_parts(
        vertices: Vec<DVec3>,
        triangles: Vec<[u32; 3]>,
        originals: Vec<OriginalId>,
    ) -> Self {
        debug_assert_eq!(triangles.len(), originals.len());
        Self {
            vertices,
            triangles,
            originals,
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True when the mesh has no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        index
    }

    /// Adds a triangle by vertex indices with its attribution.
    pub fn add_triangle(&mut self, v0: u32, v1: u32, v2: u32, original: OriginalId) {
        self.triangles.push([v0, v1, v2]);
        self.originals.push(original);
    }

    /// The vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// The triangle index list.
    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Per-triangle original IDs.
    #[inline]
    pub fn originals(&self) -> &[OriginalId] {
        &self.originals
    }

    /// The three corner positions of triangle `index`.
    pub fn triangle_points(&self, index: usize) -> [DVec3; 3] {
        let [a, b, c] = self.triangles[index];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Groups triangle indices by original ID.
    pub fn original_index_sets(&self) -> HashMap<OriginalId, Vec<u32>> {
        let mut map: HashMap<OriginalId, Vec<u32>> = HashMap::new();
        for (index, original) in self.originals.iter().enumerate() {
            map.entry(*original).or_default().push(index as u32);
        }
        map
    }

    /// A copy with every triangle attributed to `original`.
    pub fn retagged(&self, original: OriginalId) -> Self {
        Self {
            vertices: self.vertices.clone(),
            triangles: self.triangles.clone(),
            originals: vec![original; self.triangles.len()],
        }
    }

    /// Axis-aligned bounding box of the vertices.
    pub fn bounding_box(&self) -> BoundingBox3 {
        BoundingBox3::around(self.vertices.iter().copied())
    }

    /// Signed volume by summing tetrahedra against the origin.
    ///
    /// Positive for outward-wound closed meshes.
    pub fn volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|&[a, b, c]| {
                let p0 = self.vertices[a as usize];
                let p1 = self.vertices[b as usize];
                let p2 = self.vertices[c as usize];
                p0.dot(p1.cross(p2)) / 6.0
            })
            .sum()
    }

    /// Total triangle area.
    pub fn surface_area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|&[a, b, c]| {
                let p0 = self.vertices[a as usize];
                let p1 = self.vertices[b as usize];
                let p2 = self.vertices[c as usize];
                (p1 - p0).cross(p2 - p0).length() / 2.0
            })
            .sum()
    }

    /// Number of unique undirected edges.
    pub fn edge_count(&self) -> usize {
        let mut edges = std::collections::HashSet::new();
        for &[a, b, c] in &self.triangles {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                edges.insert((u.min(v), u.max(v)));
            }
        }
        edges.len()
    }

    /// True when every undirected edge is shared by exactly two triangles
    /// with opposite orientation.
    pub fn is_manifold(&self) -> bool {
        let mut directed: HashMap<(u32, u32), i32> = HashMap::new();
        for &[a, b, c] in &self.triangles {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *directed.entry((u.min(v), u.max(v))).or_insert(0) +=
                    if u < v { 1 } else { -1 };
            }
        }
        !self.triangles.is_empty() && directed.values().all(|&count| count == 0)
    }

    /// The mesh under an affine transform.
    ///
    /// Original IDs are preserved. Winding is flipped when the transform
    /// inverts orientation, keeping normals outward.
    pub fn transformed(&self, transform: &Transform3) -> Self {
        let vertices: Vec<DVec3> = self
            .vertices
            .par_iter()
            .map(|&v| transform.apply(v))
            .collect();
        let triangles = if transform.flips_orientation() {
            self.triangles.iter().map(|&[a, b, c]| [a, c, b]).collect()
        } else {
            self.triangles.clone()
        };
        Self {
            vertices,
            triangles,
            originals: self.originals.clone(),
        }
    }

    /// Concatenates meshes without any boolean resolution.
    pub fn merged<'a, I: IntoIterator<Item = &'a Mesh>>(meshes: I) -> Self {
        let mut out = Mesh::new();
        for mesh in meshes {
            let base = out.vertices.len() as u32;
            out.vertices.extend_from_slice(&mesh.vertices);
            out.triangles
                .extend(mesh.triangles.iter().map(|&[a, b, c]| {
                    [a + base, b + base, c + base]
                }));
            out.originals.extend_from_slice(&mesh.originals);
        }
        out
    }

    /// Merges vertices closer than `epsilon`, drops triangles that
    /// degenerate in the process, and compacts away vertices no triangle
    /// references. Passing `0.0` merges exact duplicates only.
    pub fn welded(&self, epsilon: f64) -> Self {
        let cell = if epsilon > 0.0 {
            epsilon
        } else {
            VERTEX_MERGE_EPSILON * 1e-4
        };
        let mut keys: HashMap<(i64, i64, i64), u32> = HashMap::new();
        let mut remap = vec![0u32; self.vertices.len()];
        let mut merged = Vec::new();
        for (index, &v) in self.vertices.iter().enumerate() {
            let key = (
                (v.x / cell).round() as i64,
                (v.y / cell).round() as i64,
                (v.z / cell).round() as i64,
            );
            let target = *keys.entry(key).or_insert_with(|| {
                let id = merged.len() as u32;
                merged.push(v);
                id
            });
            remap[index] = target;
        }

        let mut triangles = Vec::with_capacity(self.triangles.len());
        let mut originals = Vec::with_capacity(self.originals.len());
        for (tri, original) in self.triangles.iter().zip(&self.originals) {
            let [a, b, c] = [
                remap[tri[0] as usize],
                remap[tri[1] as usize],
                remap[tri[2] as usize],
            ];
            if a == b || b == c || c == a {
                continue;
            }
            triangles.push([a, b, c]);
            originals.push(*original);
        }

        // Compact to the vertices the surviving triangles reference.
        let mut compacted = vec![u32::MAX; merged.len()];
        let mut vertices = Vec::new();
        for tri in &mut triangles {
            for index in tri.iter_mut() {
                let slot = &mut compacted[*index as usize];
                if *slot == u32::MAX {
                    *slot = vertices.len() as u32;
                    vertices.push(merged[*index as usize]);
                }
                *index = *slot;
            }
        }
        Self {
            vertices,
            triangles,
            originals,
        }
    }
}
