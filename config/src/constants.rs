//! # Configuration Constants
//!
//! Centralized constants for the Cadova pipeline. Geometry comparisons,
//! segmentation bounds, and solver limits are defined here.
//!
//! ## Categories
//!
//! - **Precision**: Floating-point comparison tolerances
//! - **Segmentation**: Lower bounds and defaults for curve discretization
//! - **Solvers**: Iteration limits for parametric-curve solving

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Epsilon for floating-point comparisons.
///
/// Used for determining if two floating-point values are "equal" within
/// numerical tolerance.
///
/// # Example
///
/// ```rust
/// use config::constants::EPSILON;
///
/// fn approximately_equal(a: f64, b: f64) -> bool {
///     (a - b).abs() < EPSILON
/// }
///
/// assert!(approximately_equal(1.0, 1.0 + 1e-11));
/// ```
pub const EPSILON: f64 = 1e-10;

/// Epsilon for vertex deduplication.
///
/// Slightly larger tolerance used when merging nearly-identical vertices
/// during mesh optimization. This cleans up numerical noise from boolean
/// operations and transformations.
pub const VERTEX_MERGE_EPSILON: f64 = 1e-8;

/// Plane-classification thickness used by the CSG splitter.
///
/// Points closer than this to a plane are treated as coplanar.
pub const PLANE_EPSILON: f64 = 1e-7;

/// Default model tolerance carried in the environment.
///
/// Scaled by the inverse of the accumulated transform scale when read.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

// =============================================================================
// SEGMENTATION CONSTANTS
// =============================================================================

/// Minimum segment count produced by adaptive segmentation for a full circle.
pub const MIN_ADAPTIVE_SEGMENTS: u32 = 5;

/// Minimum segment count accepted for fixed segmentation.
pub const MIN_FIXED_SEGMENTS: u32 = 3;

/// Minimum segment count for a partial arc.
pub const MIN_ARC_SEGMENTS: u32 = 2;

/// Default minimum angle per segment (degrees) for adaptive segmentation.
pub const DEFAULT_MIN_ANGLE_DEGREES: f64 = 5.0;

/// Default minimum segment length for adaptive segmentation.
pub const DEFAULT_MIN_SIZE: f64 = 0.5;

/// Safety clamp on segment counts to bound memory use.
pub const MAX_SEGMENTS: u32 = 4096;

// =============================================================================
// SOLVER CONSTANTS
// =============================================================================

/// Maximum Newton iterations when solving a monotone curve parameter.
///
/// When Newton fails to converge within this budget the solver falls back
/// to bisection.
pub const NEWTON_MAX_ITERATIONS: u32 = 8;

/// Convergence tolerance for parametric-curve solving.
pub const CURVE_PARAMETER_TOLERANCE: f64 = 1e-6;

/// Bisection iteration limit for the Newton fallback.
pub const BISECTION_MAX_ITERATIONS: u32 = 64;
