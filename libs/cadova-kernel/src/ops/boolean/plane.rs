//! Splitting plane for BSP construction.

use config::constants::PLANE_EPSILON;
use glam::DVec3;

/// Classification of a point against a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSide {
    /// Within the plane thickness.
    Coplanar,
    /// On the normal side.
    Front,
    /// Opposite the normal.
    Back,
}

/// Classification of a polygon against a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonSide {
    /// All vertices within the plane thickness.
    Coplanar,
    /// All vertices in front.
    Front,
    /// All vertices behind.
    Back,
    /// Vertices on both sides.
    Spanning,
}

/// A plane in implicit form `normal . p == w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPlane {
    /// Unit normal.
    pub normal: DVec3,
    /// Signed offset along the normal.
    pub w: f64,
}

impl SplitPlane {
    /// A plane through three points; `None` when they are collinear.
    pub fn from_points(a: DVec3, b: DVec3, c: DVec3) -> Option<Self> {
        let normal = (b - a).cross(c - a);
        if normal.length_squared() < PLANE_EPSILON * PLANE_EPSILON {
            return None;
        }
        let normal = normal.normalize();
        Some(Self {
            normal,
            w: normal.dot(a),
        })
    }

    /// A plane from a unit normal and a point on the plane.
    pub fn from_normal_and_point(normal: DVec3, point: DVec3) -> Self {
        Self {
            normal,
            w: normal.dot(point),
        }
    }

    /// Signed distance from a point.
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.w
    }

    /// Classifies a point within the plane thickness.
    pub fn classify_point(&self, point: DVec3) -> PointSide {
        let distance = self.signed_distance(point);
        if distance > PLANE_EPSILON {
            PointSide::Front
        } else if distance < -PLANE_EPSILON {
            PointSide::Back
        } else {
            PointSide::Coplanar
        }
    }

    /// Flips the plane to face the other way.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_and_classify() {
        let plane = SplitPlane::from_points(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
        assert!((plane.normal - DVec3::Z).length() < 1e-12);
        assert_eq!(plane.classify_point(DVec3::new(0.0, 0.0, 1.0)), PointSide::Front);
        assert_eq!(plane.classify_point(DVec3::new(0.0, 0.0, -1.0)), PointSide::Back);
        assert_eq!(plane.classify_point(DVec3::new(5.0, 5.0, 0.0)), PointSide::Coplanar);
    }

    #[test]
    fn test_collinear_points_have_no_plane() {
        assert!(SplitPlane::from_points(DVec3::ZERO, DVec3::X, DVec3::X * 2.0).is_none());
    }
}
