//! # Cadova Kernel
//!
//! Concrete geometry for the Cadova pipeline: an indexed triangle mesh and
//! an oriented polygon set, plus the solid-modelling operation set the
//! evaluation engine lowers scene nodes through.
//!
//! Every triangle carries an [`OriginalId`] identifying the surface it came
//! from. All operations propagate these IDs so material attribution
//! survives CSG.

pub mod error;
pub mod mesh;
pub mod meshgl;
pub mod ops;
pub mod original_id;
pub mod polygon_set;
pub mod primitives;
pub mod triangulate;

pub use error::{KernelError, KernelErrorKind};
pub use mesh::Mesh;
pub use meshgl::MeshGl;
pub use original_id::OriginalId;
pub use polygon_set::PolygonSet;
