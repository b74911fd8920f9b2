//! # Kernel Operations
//!
//! The solid-modelling operation set: booleans, hull, offset, extrusion,
//! refinement, simplification, splitting, warping, and projection.

pub mod boolean;
pub mod extrude;
pub mod hull;
pub mod offset;
pub mod project;
pub mod refine;
pub mod simplify;
pub mod split;
pub mod warp;

pub use boolean::{boolean, boolean_2d, split_by_mask, BooleanOp};
pub use extrude::{extrude_helical, extrude_linear, revolve, sweep, LinearExtrusion};
pub use hull::{convex_hull, convex_hull_2d, convex_hull_adding};
pub use offset::{offset, JoinStyle};
pub use project::{cross_section, project, slice_at};
pub use refine::refine;
pub use simplify::{simplify, simplify_2d};
pub use split::split_by_plane;
pub use warp::{warp, warp_2d};
