//! # Math Errors
//!
//! Error type for user precondition violations in value construction.

use thiserror::Error;

/// A user precondition was violated while constructing a geometric value.
///
/// Raised for inputs such as zero-length directions, negative radii, or
/// degenerate control polygons. These are programmer errors; callers are not
/// expected to recover.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid geometry: {0}")]
pub struct InvalidGeometry(pub String);

impl InvalidGeometry {
    /// Creates an error from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
