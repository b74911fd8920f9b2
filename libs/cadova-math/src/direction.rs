//! # Directions
//!
//! Unit-vector newtypes. Construction from a zero-length vector fails, so a
//! held value is always normalized.

use crate::error::InvalidGeometry;
use config::constants::EPSILON;
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// A 3D unit vector.
///
/// # Example
///
/// ```rust
/// use cadova_math::Direction3;
/// use glam::DVec3;
///
/// let d = Direction3::new(DVec3::new(0.0, 0.0, 2.0)).unwrap();
/// assert_eq!(d.vector(), DVec3::Z);
/// assert!(Direction3::new(DVec3::ZERO).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction3(DVec3);

impl Direction3 {
    /// Unit X.
    pub const X: Self = Self(DVec3::X);
    /// Unit Y.
    pub const Y: Self = Self(DVec3::Y);
    /// Unit Z.
    pub const Z: Self = Self(DVec3::Z);
    /// The conventional "up" direction (+Z).
    pub const UP: Self = Self(DVec3::Z);
    /// The conventional "down" direction (-Z).
    pub const DOWN: Self = Self(DVec3::NEG_Z);

    /// Normalizes `vector` into a direction.
    pub fn new(vector: DVec3) -> Result<Self, InvalidGeometry> {
        let length = vector.length();
        if length < EPSILON {
            return Err(InvalidGeometry::new("direction from zero-length vector"));
        }
        Ok(Self(vector / length))
    }

    /// Wraps a vector that is already unit length.
    ///
    /// The caller guarantees `|vector| == 1`.
    pub(crate) fn from_unit(vector: DVec3) -> Self {
        debug_assert!((vector.length() - 1.0).abs() < 1e-6);
        Self(vector)
    }

    /// The underlying unit vector.
    pub fn vector(self) -> DVec3 {
        self.0
    }

    /// The opposite direction.
    pub fn opposite(self) -> Self {
        Self(-self.0)
    }

    /// Dot product against another direction.
    pub fn dot(self, other: Self) -> f64 {
        self.0.dot(other.0)
    }

    /// Cross product; fails when the directions are parallel.
    pub fn cross(self, other: Self) -> Result<Self, InvalidGeometry> {
        Self::new(self.0.cross(other.0))
    }

    /// True when the two directions are parallel within tolerance.
    pub fn is_parallel_to(self, other: Self) -> bool {
        self.0.cross(other.0).length() < EPSILON
    }
}

/// A 2D unit vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction2(DVec2);

impl Direction2 {
    /// Unit X.
    pub const X: Self = Self(DVec2::X);
    /// Unit Y.
    pub const Y: Self = Self(DVec2::Y);

    /// Normalizes `vector` into a direction.
    pub fn new(vector: DVec2) -> Result<Self, InvalidGeometry> {
        let length = vector.length();
        if length < EPSILON {
            return Err(InvalidGeometry::new("direction from zero-length vector"));
        }
        Ok(Self(vector / length))
    }

    /// The underlying unit vector.
    pub fn vector(self) -> DVec2 {
        self.0
    }

    /// The direction rotated a quarter turn counter-clockwise.
    pub fn perpendicular(self) -> Self {
        Self(DVec2::new(-self.0.y, self.0.x))
    }

    /// The opposite direction.
    pub fn opposite(self) -> Self {
        Self(-self.0)
    }

    /// Signed angle from +X, in radians.
    pub fn angle(self) -> f64 {
        self.0.y.atan2(self.0.x)
    }
}
