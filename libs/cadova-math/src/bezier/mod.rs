//! # Bezier Curves and Paths
//!
//! Parametric curves of degree 1 to 3, paths built from curves sharing
//! endpoints, and rectangular patches. Curves are generic over the control
//! point type so the same algebra serves 2D profiles and 3D sweep paths.

mod curve;
mod patch;
mod path;

pub use curve::{BezierCurve, ControlPoint};
pub use patch::BezierPatch;
pub use path::{BezierPath, PathPosition};
