//! # Lines
//!
//! Infinite lines in 2D and 3D, defined by a point and a direction.

use crate::direction::{Direction2, Direction3};
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// An infinite 3D line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3 {
    /// A point on the line.
    pub point: DVec3,
    /// The line direction.
    pub direction: Direction3,
}

impl Line3 {
    /// A line through `point` along `direction`.
    pub fn new(point: DVec3, direction: Direction3) -> Self {
        Self { point, direction }
    }

    /// The point at signed parameter `t` along the direction.
    pub fn point_at(&self, t: f64) -> DVec3 {
        self.point + self.direction.vector() * t
    }

    /// The point on the line closest to `target`.
    pub fn closest_point(&self, target: DVec3) -> DVec3 {
        let d = self.direction.vector();
        self.point + d * (target - self.point).dot(d)
    }

    /// Distance from `target` to the line.
    pub fn distance(&self, target: DVec3) -> f64 {
        (target - self.closest_point(target)).length()
    }
}

/// An infinite 2D line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line2 {
    /// A point on the line.
    pub point: DVec2,
    /// The line direction.
    pub direction: Direction2,
}

impl Line2 {
    /// A line through `point` along `direction`.
    pub fn new(point: DVec2, direction: Direction2) -> Self {
        Self { point, direction }
    }

    /// The point at signed parameter `t` along the direction.
    pub fn point_at(&self, t: f64) -> DVec2 {
        self.point + self.direction.vector() * t
    }

    /// The point on the line closest to `target`.
    pub fn closest_point(&self, target: DVec2) -> DVec2 {
        let d = self.direction.vector();
        self.point + d * (target - self.point).dot(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_point() {
        let line = Line3::new(DVec3::ZERO, Direction3::X);
        let p = line.closest_point(DVec3::new(3.0, 4.0, 0.0));
        assert!((p - DVec3::new(3.0, 0.0, 0.0)).length() < 1e-12);
        assert!((line.distance(DVec3::new(3.0, 4.0, 0.0)) - 4.0).abs() < 1e-12);
    }
}
