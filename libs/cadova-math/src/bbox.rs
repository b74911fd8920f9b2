//! # Bounding Boxes
//!
//! Axis-aligned bounding boxes in 2D and 3D. The empty box is represented
//! by an inverted extent so that `union` works without special cases.

use crate::transform::{Transform2, Transform3};
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// An axis-aligned 3D bounding box.
///
/// # Example
///
/// ```rust
/// use cadova_math::BoundingBox3;
/// use glam::DVec3;
///
/// let mut b = BoundingBox3::EMPTY;
/// assert!(b.is_empty());
/// b = b.including(DVec3::ZERO).including(DVec3::ONE);
/// assert_eq!(b.size(), DVec3::ONE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3 {
    /// Component-wise minimum corner.
    pub minimum: DVec3,
    /// Component-wise maximum corner.
    pub maximum: DVec3,
}

impl BoundingBox3 {
    /// The empty box.
    pub const EMPTY: Self = Self {
        minimum: DVec3::INFINITY,
        maximum: DVec3::NEG_INFINITY,
    };

    /// A box from explicit corners.
    pub fn new(minimum: DVec3, maximum: DVec3) -> Self {
        Self { minimum, maximum }
    }

    /// The tightest box around a point set.
    pub fn around<I: IntoIterator<Item = DVec3>>(points: I) -> Self {
        points
            .into_iter()
            .fold(Self::EMPTY, |b, p| b.including(p))
    }

    /// True when the box contains no points.
    pub fn is_empty(&self) -> bool {
        self.minimum.x > self.maximum.x
            || self.minimum.y > self.maximum.y
            || self.minimum.z > self.maximum.z
    }

    /// Extends the box to contain `point`.
    pub fn including(&self, point: DVec3) -> Self {
        Self {
            minimum: self.minimum.min(point),
            maximum: self.maximum.max(point),
        }
    }

    /// The union of two boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            minimum: self.minimum.min(other.minimum),
            maximum: self.maximum.max(other.maximum),
        }
    }

    /// The intersection of two boxes; empty when they do not overlap.
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            minimum: self.minimum.max(other.minimum),
            maximum: self.maximum.min(other.maximum),
        }
    }

    /// The box shifted by `offset`.
    pub fn translated(&self, offset: DVec3) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self {
            minimum: self.minimum + offset,
            maximum: self.maximum + offset,
        }
    }

    /// The tightest axis-aligned box around the transformed corners.
    pub fn transformed(&self, transform: &Transform3) -> Self {
        if self.is_empty() {
            return *self;
        }
        let mut out = Self::EMPTY;
        for corner in self.corners() {
            out = out.including(transform.apply(corner));
        }
        out
    }

    /// The eight corners; meaningless for the empty box.
    pub fn corners(&self) -> [DVec3; 8] {
        let (lo, hi) = (self.minimum, self.maximum);
        [
            DVec3::new(lo.x, lo.y, lo.z),
            DVec3::new(hi.x, lo.y, lo.z),
            DVec3::new(lo.x, hi.y, lo.z),
            DVec3::new(hi.x, hi.y, lo.z),
            DVec3::new(lo.x, lo.y, hi.z),
            DVec3::new(hi.x, lo.y, hi.z),
            DVec3::new(lo.x, hi.y, hi.z),
            DVec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Extent per axis; zero for the empty box.
    pub fn size(&self) -> DVec3 {
        if self.is_empty() {
            DVec3::ZERO
        } else {
            self.maximum - self.minimum
        }
    }

    /// Center point of the box.
    pub fn center(&self) -> DVec3 {
        (self.minimum + self.maximum) * 0.5
    }

    /// True when the box contains `point` (inclusive).
    pub fn contains(&self, point: DVec3) -> bool {
        !self.is_empty()
            && point.cmpge(self.minimum).all()
            && point.cmple(self.maximum).all()
    }
}

/// An axis-aligned 2D bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    /// Component-wise minimum corner.
    pub minimum: DVec2,
    /// Component-wise maximum corner.
    pub maximum: DVec2,
}

impl BoundingBox2 {
    /// The empty box.
    pub const EMPTY: Self = Self {
        minimum: DVec2::INFINITY,
        maximum: DVec2::NEG_INFINITY,
    };

    /// A box from explicit corners.
    pub fn new(minimum: DVec2, maximum: DVec2) -> Self {
        Self { minimum, maximum }
    }

    /// The tightest box around a point set.
    pub fn around<I: IntoIterator<Item = DVec2>>(points: I) -> Self {
        points
            .into_iter()
            .fold(Self::EMPTY, |b, p| b.including(p))
    }

    /// True when the box contains no points.
    pub fn is_empty(&self) -> bool {
        self.minimum.x > self.maximum.x || self.minimum.y > self.maximum.y
    }

    /// Extends the box to contain `point`.
    pub fn including(&self, point: DVec2) -> Self {
        Self {
            minimum: self.minimum.min(point),
            maximum: self.maximum.max(point),
        }
    }

    /// The union of two boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            minimum: self.minimum.min(other.minimum),
            maximum: self.maximum.max(other.maximum),
        }
    }

    /// The intersection of two boxes; empty when they do not overlap.
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            minimum: self.minimum.max(other.minimum),
            maximum: self.maximum.min(other.maximum),
        }
    }

    /// The box shifted by `offset`.
    pub fn translated(&self, offset: DVec2) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self {
            minimum: self.minimum + offset,
            maximum: self.maximum + offset,
        }
    }

    /// The tightest axis-aligned box around the transformed corners.
    pub fn transformed(&self, transform: &Transform2) -> Self {
        if self.is_empty() {
            return *self;
        }
        let (lo, hi) = (self.minimum, self.maximum);
        let corners = [
            lo,
            DVec2::new(hi.x, lo.y),
            DVec2::new(lo.x, hi.y),
            hi,
        ];
        let mut out = Self::EMPTY;
        for corner in corners {
            out = out.including(transform.apply(corner));
        }
        out
    }

    /// Extent per axis; zero for the empty box.
    pub fn size(&self) -> DVec2 {
        if self.is_empty() {
            DVec2::ZERO
        } else {
            self.maximum - self.minimum
        }
    }

    /// Center point of the box.
    pub fn center(&self) -> DVec2 {
        (self.minimum + self.maximum) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_union_is_identity() {
        let b = BoundingBox3::new(DVec3::ZERO, DVec3::ONE);
        assert_eq!(BoundingBox3::EMPTY.union(&b), b);
        assert_eq!(b.union(&BoundingBox3::EMPTY), b);
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let a = BoundingBox3::new(DVec3::ZERO, DVec3::ONE);
        let b = BoundingBox3::new(DVec3::splat(2.0), DVec3::splat(3.0));
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn test_transformed_covers_rotated_corners() {
        use crate::angle::Angle;
        use crate::direction::Direction3;
        let b = BoundingBox3::new(DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0));
        let t = Transform3::rotation(Direction3::Z, Angle::degrees(90.0));
        let r = b.transformed(&t);
        assert!((r.minimum.y - 0.0).abs() < 1e-9);
        assert!((r.maximum.y - 2.0).abs() < 1e-9);
        assert!((r.minimum.x + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_contains() {
        let b = BoundingBox3::new(DVec3::ZERO, DVec3::ONE);
        assert!(b.contains(DVec3::splat(0.5)));
        assert!(!b.contains(DVec3::splat(1.5)));
        assert!(!BoundingBox3::EMPTY.contains(DVec3::ZERO));
    }
}
