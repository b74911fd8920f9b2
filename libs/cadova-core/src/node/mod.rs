//! # Scene Nodes
//!
//! The canonical, fingerprinted value representation of every composable
//! geometric operation. Nodes are immutable, share children by reference
//! count, and hash to content fingerprints that serve as cache keys.

mod node2;
mod node3;
mod shape;

pub use node2::{GeometryNode2, NodeKind2};
pub use node3::{GeometryNode3, NodeKind3};
pub use shape::{MeshData, Shape2, Shape3};

use crate::fingerprint::FingerprintHasher;
use cadova_kernel::{KernelError, Mesh, PolygonSet};
use cadova_math::{Angle, Plane};
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pointwise 3D vertex remap carried by warp nodes.
pub type WarpFn3 = Arc<dyn Fn(DVec3) -> DVec3 + Send + Sync>;

/// Pointwise 2D vertex remap carried by warp nodes.
pub type WarpFn2 = Arc<dyn Fn(DVec2) -> DVec2 + Send + Sync>;

/// Opaque mesh-to-mesh operation carried by cached-operation nodes.
pub type PrimitiveFn3 = Arc<dyn Fn(&Mesh) -> Result<Mesh, KernelError> + Send + Sync>;

/// Opaque polygon-set operation carried by cached-operation nodes.
pub type PrimitiveFn2 = Arc<dyn Fn(&PolygonSet) -> Result<PolygonSet, KernelError> + Send + Sync>;

/// How a 2D cross-section becomes a solid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtrusionSpec {
    /// Linear extrusion along +Z with optional twist and top scale.
    Linear {
        /// Extrusion height.
        height: f64,
        /// Total twist over the height.
        twist: Angle,
        /// Cross-section scale at the top.
        scale_top: DVec2,
        /// Intermediate slice count for twist/scale interpolation.
        slices: u32,
    },
    /// Helical extrusion: one full turn per `pitch` of height.
    Helical {
        /// Height gained per full turn.
        pitch: f64,
        /// Total height.
        height: f64,
        /// Segments per full turn.
        segments_per_turn: u32,
    },
    /// Revolution about the Z axis.
    Revolve {
        /// Swept angle.
        angle: Angle,
        /// Captured segment count over the sweep.
        segment_count: u32,
    },
}

impl ExtrusionSpec {
    pub(crate) fn feed(&self, hasher: &mut FingerprintHasher) {
        match self {
            Self::Linear {
                height,
                twist,
                scale_top,
                slices,
            } => {
                hasher.write_tag("linear");
                hasher.write_f64(*height);
                hasher.write_angle(*twist);
                hasher.write_vec2(*scale_top);
                hasher.write_u32(*slices);
            }
            Self::Helical {
                pitch,
                height,
                segments_per_turn,
            } => {
                hasher.write_tag("helical");
                hasher.write_f64(*pitch);
                hasher.write_f64(*height);
                hasher.write_u32(*segments_per_turn);
            }
            Self::Revolve {
                angle,
                segment_count,
            } => {
                hasher.write_tag("revolve");
                hasher.write_angle(*angle);
                hasher.write_u32(*segment_count);
            }
        }
    }
}

/// How a solid becomes a 2D shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectionKind {
    /// Cross-section at a fixed height.
    Slice {
        /// Slicing height.
        z: f64,
    },
    /// The full orthographic shadow onto the XY plane.
    Orthographic,
    /// Cross-section along an arbitrary plane, in plane-local coordinates.
    AlongPlane(Plane),
}

impl ProjectionKind {
    pub(crate) fn feed(&self, hasher: &mut FingerprintHasher) {
        match self {
            Self::Slice { z } => {
                hasher.write_tag("slice");
                hasher.write_f64(*z);
            }
            Self::Orthographic => hasher.write_tag("orthographic"),
            Self::AlongPlane(plane) => {
                hasher.write_tag("along-plane");
                hasher.write_vec3(plane.point);
                hasher.write_vec3(plane.normal.vector());
            }
        }
    }
}

/// Which half of a plane split a node denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitSide {
    /// The half on the plane normal's side.
    Positive,
    /// The other half.
    Negative,
}

/// Which piece of a mask split a node denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskSplitSide {
    /// `input - mask`.
    Remainder,
    /// `input ∩ mask`.
    Overlap,
}

pub(crate) fn feed_plane(plane: &Plane, hasher: &mut FingerprintHasher) {
    hasher.write_vec3(plane.point);
    hasher.write_vec3(plane.normal.vector());
}
