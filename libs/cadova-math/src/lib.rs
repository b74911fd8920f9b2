//! # Cadova Math
//!
//! Immutable value algebra shared by the Cadova pipeline: vectors,
//! directions, affine transforms, bounding boxes, planes, lines, angles,
//! colors, simple polygons, the segmentation policy, and Bezier curves with
//! sweep-frame computation.
//!
//! All geometry calculations use `f64` via `glam`'s double-precision types.

pub mod angle;
pub mod bbox;
pub mod bezier;
pub mod color;
pub mod direction;
pub mod error;
pub mod frame;
pub mod line;
pub mod plane;
pub mod polygon;
pub mod segmentation;
pub mod transform;

pub use angle::Angle;
pub use bbox::{BoundingBox2, BoundingBox3};
pub use bezier::{BezierCurve, BezierPatch, BezierPath, PathPosition};
pub use color::Color;
pub use direction::{Direction2, Direction3};
pub use error::InvalidGeometry;
pub use frame::{sweep_frames, FrameOptions, RollTarget, SweepFrame};
pub use line::{Line2, Line3};
pub use plane::Plane;
pub use polygon::SimplePolygon;
pub use segmentation::Segmentation;
pub use transform::{Transform2, Transform3};

pub use glam::{DVec2, DVec3, DVec4};
