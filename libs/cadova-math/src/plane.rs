//! # Plane
//!
//! An oriented plane in 3D, defined by a point and a unit normal.

use crate::direction::Direction3;
use crate::error::InvalidGeometry;
use crate::line::Line3;
use crate::transform::Transform3;
use config::constants::EPSILON;
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// An oriented plane.
///
/// The positive half-space is the side the normal points into.
///
/// # Example
///
/// ```rust
/// use cadova_math::Plane;
/// use glam::DVec3;
///
/// let plane = Plane::z(0.0);
/// assert!((plane.signed_distance(DVec3::new(1.0, 2.0, 3.0)) - 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// A point on the plane.
    pub point: DVec3,
    /// The plane normal.
    pub normal: Direction3,
}

impl Plane {
    /// A plane through `point` with the given `normal`.
    pub fn new(point: DVec3, normal: Direction3) -> Self {
        Self { point, normal }
    }

    /// The horizontal plane at height `z`, normal +Z.
    pub fn z(z: f64) -> Self {
        Self {
            point: DVec3::new(0.0, 0.0, z),
            normal: Direction3::Z,
        }
    }

    /// The vertical plane at `x`, normal +X.
    pub fn x(x: f64) -> Self {
        Self {
            point: DVec3::new(x, 0.0, 0.0),
            normal: Direction3::X,
        }
    }

    /// The vertical plane at `y`, normal +Y.
    pub fn y(y: f64) -> Self {
        Self {
            point: DVec3::new(0.0, y, 0.0),
            normal: Direction3::Y,
        }
    }

    /// A plane through three points; fails when they are collinear.
    pub fn through(a: DVec3, b: DVec3, c: DVec3) -> Result<Self, InvalidGeometry> {
        let normal = Direction3::new((b - a).cross(c - a))
            .map_err(|_| InvalidGeometry::new("plane through collinear points"))?;
        Ok(Self { point: a, normal })
    }

    /// Signed distance from `target` to the plane.
    ///
    /// Positive on the normal side.
    pub fn signed_distance(&self, target: DVec3) -> f64 {
        (target - self.point).dot(self.normal.vector())
    }

    /// Orthogonal projection of `target` onto the plane.
    pub fn project(&self, target: DVec3) -> DVec3 {
        target - self.normal.vector() * self.signed_distance(target)
    }

    /// Intersection with a line.
    ///
    /// Returns `None` when the line is parallel to the plane (including the
    /// contained case).
    pub fn intersection_with_line(&self, line: &Line3) -> Option<DVec3> {
        let denom = line.direction.vector().dot(self.normal.vector());
        if denom.abs() < EPSILON {
            return None;
        }
        let t = -self.signed_distance(line.point) / denom;
        Some(line.point_at(t))
    }

    /// Intersection with another plane.
    ///
    /// Returns `None` when the planes are parallel.
    pub fn intersection_with_plane(&self, other: &Plane) -> Option<Line3> {
        let direction = Direction3::new(self.normal.vector().cross(other.normal.vector())).ok()?;
        // Solve for a point on both planes, restricted to the span of the
        // two normals.
        let n1 = self.normal.vector();
        let n2 = other.normal.vector();
        let d1 = n1.dot(self.point);
        let d2 = n2.dot(other.point);
        let n1n2 = n1.dot(n2);
        let det = 1.0 - n1n2 * n1n2;
        let c1 = (d1 - d2 * n1n2) / det;
        let c2 = (d2 - d1 * n1n2) / det;
        Some(Line3::new(n1 * c1 + n2 * c2, direction))
    }

    /// The plane's local-to-world frame with +Z along the normal.
    pub fn local_to_world(&self) -> Transform3 {
        let z = self.normal.vector();
        // Pick the world axis least parallel to the normal as the X seed.
        let seed = if z.x.abs() < z.y.abs() { DVec3::X } else { DVec3::Y };
        let x = (seed - z * seed.dot(z)).normalize();
        let y = z.cross(x);
        Transform3::from_basis(x, y, z, self.point)
    }

    /// The plane carried through an affine transform.
    pub fn transformed(&self, transform: &Transform3) -> Result<Self, InvalidGeometry> {
        let point = transform.apply(self.point);
        // Normals transform by the inverse-transpose of the linear part.
        let inv = transform.inverse()?;
        let normal_vector = inv.linear().transpose() * self.normal.vector();
        Ok(Self {
            point,
            normal: Direction3::new(normal_vector)?,
        })
    }

    /// The same plane facing the other way.
    pub fn flipped(&self) -> Self {
        Self {
            point: self.point,
            normal: self.normal.opposite(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_line_misses() {
        let plane = Plane::z(0.0);
        let line = Line3::new(DVec3::new(0.0, 0.0, 5.0), Direction3::X);
        assert_eq!(plane.intersection_with_line(&line), None);
    }

    #[test]
    fn test_perpendicular_line_hits() {
        let plane = Plane::z(0.0);
        let line = Line3::new(DVec3::new(1.0, 2.0, -3.0), Direction3::Z);
        let hit = plane.intersection_with_line(&line).unwrap();
        assert!((hit - DVec3::new(1.0, 2.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_plane_plane_intersection() {
        let a = Plane::z(0.0);
        let b = Plane::x(1.0);
        let line = a.intersection_with_plane(&b).unwrap();
        assert!((line.point.x - 1.0).abs() < 1e-9);
        assert!(line.point.z.abs() < 1e-9);
        assert!(line.direction.vector().cross(DVec3::Y).length() < 1e-9);
        assert!(a.intersection_with_plane(&Plane::z(2.0)).is_none());
    }

    #[test]
    fn test_local_to_world_maps_z_to_normal() {
        let plane = Plane::new(
            DVec3::new(1.0, 1.0, 1.0),
            Direction3::new(DVec3::new(1.0, 1.0, 1.0)).unwrap(),
        );
        let frame = plane.local_to_world();
        let mapped = frame.apply_vector(DVec3::Z);
        assert!((mapped.normalize() - plane.normal.vector()).length() < 1e-9);
        assert!((frame.apply(DVec3::ZERO) - plane.point).length() < 1e-12);
    }

    #[test]
    fn test_project() {
        let plane = Plane::z(2.0);
        let p = plane.project(DVec3::new(1.0, 1.0, 5.0));
        assert!((p - DVec3::new(1.0, 1.0, 2.0)).length() < 1e-12);
    }
}
