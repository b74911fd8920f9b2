//! Leaf shape specifications.
//!
//! Curved shapes capture their segment count at construction, so the node
//! value is independent of the environment it was built in and two
//! equal-resolution leaves share a fingerprint.

use crate::fingerprint::FingerprintHasher;
use cadova_math::BezierPatch;
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// Raw mesh data with polygonal faces.
///
/// Faces may have more than three vertices; the kernel triangulates them
/// when lowering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    /// Vertex positions.
    pub vertices: Vec<DVec3>,
    /// Faces as vertex index loops, each of length >= 3.
    pub faces: Vec<Vec<u32>>,
}

impl MeshData {
    /// Feeds the mesh content into a fingerprint hasher.
    pub fn feed(&self, hasher: &mut FingerprintHasher) {
        hasher.write_u64(self.vertices.len() as u64);
        for vertex in &self.vertices {
            hasher.write_vec3(*vertex);
        }
        hasher.write_u64(self.faces.len() as u64);
        for face in &self.faces {
            hasher.write_u64(face.len() as u64);
            for &index in face {
                hasher.write_u32(index);
            }
        }
    }
}

/// A 3D primitive specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape3 {
    /// An axis-aligned box with one corner at the origin.
    Cuboid {
        /// Edge lengths.
        size: DVec3,
    },
    /// A cone frustum from `z = 0` to `z = height`.
    Cylinder {
        /// Radius at the bottom.
        bottom_radius: f64,
        /// Radius at the top.
        top_radius: f64,
        /// Height along +Z.
        height: f64,
        /// Captured segment count.
        segment_count: u32,
    },
    /// A sphere centered at the origin.
    Sphere {
        /// Radius.
        radius: f64,
        /// Captured segment count.
        segment_count: u32,
    },
    /// Explicit mesh data.
    Mesh(MeshData),
    /// A sampled Bezier patch sheet.
    Patch {
        /// The control grid.
        patch: BezierPatch,
        /// Captured sample count along `u`.
        segments_u: u32,
        /// Captured sample count along `v`.
        segments_v: u32,
    },
}

impl Shape3 {
    /// Feeds the shape into a fingerprint hasher.
    pub fn feed(&self, hasher: &mut FingerprintHasher) {
        match self {
            Self::Cuboid { size } => {
                hasher.write_tag("cuboid");
                hasher.write_vec3(*size);
            }
            Self::Cylinder {
                bottom_radius,
                top_radius,
                height,
                segment_count,
            } => {
                hasher.write_tag("cylinder");
                hasher.write_f64(*bottom_radius);
                hasher.write_f64(*top_radius);
                hasher.write_f64(*height);
                hasher.write_u32(*segment_count);
            }
            Self::Sphere {
                radius,
                segment_count,
            } => {
                hasher.write_tag("sphere");
                hasher.write_f64(*radius);
                hasher.write_u32(*segment_count);
            }
            Self::Mesh(data) => {
                hasher.write_tag("mesh");
                data.feed(hasher);
            }
            Self::Patch {
                patch,
                segments_u,
                segments_v,
            } => {
                hasher.write_tag("patch");
                let rows = patch.control_rows();
                hasher.write_u64(rows.len() as u64);
                for row in rows {
                    hasher.write_u64(row.len() as u64);
                    for &point in row {
                        hasher.write_vec3(point);
                    }
                }
                hasher.write_u32(*segments_u);
                hasher.write_u32(*segments_v);
            }
        }
    }
}

/// A 2D primitive specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape2 {
    /// An axis-aligned rectangle with one corner at the origin.
    Rectangle {
        /// Edge lengths.
        size: DVec2,
    },
    /// A circle centered at the origin.
    Circle {
        /// Radius.
        radius: f64,
        /// Captured segment count.
        segment_count: u32,
    },
    /// A polygon with optional holes.
    Polygon {
        /// The outer loop.
        outer: Vec<DVec2>,
        /// Hole loops.
        holes: Vec<Vec<DVec2>>,
    },
}

impl Shape2 {
    /// Feeds the shape into a fingerprint hasher.
    pub fn feed(&self, hasher: &mut FingerprintHasher) {
        match self {
            Self::Rectangle { size } => {
                hasher.write_tag("rectangle");
                hasher.write_vec2(*size);
            }
            Self::Circle {
                radius,
                segment_count,
            } => {
                hasher.write_tag("circle");
                hasher.write_f64(*radius);
                hasher.write_u32(*segment_count);
            }
            Self::Polygon { outer, holes } => {
                hasher.write_tag("polygon");
                hasher.write_u64(outer.len() as u64);
                for &point in outer {
                    hasher.write_vec2(point);
                }
                hasher.write_u64(holes.len() as u64);
                for hole in holes {
                    hasher.write_u64(hole.len() as u64);
                    for &point in hole {
                        hasher.write_vec2(point);
                    }
                }
            }
        }
    }
}
