//! # Affine Transforms
//!
//! 2D and 3D affine transforms wrapping `glam` matrices.
//!
//! Composition is right-to-left: `t.concatenated(u)` applies `t` first and
//! `u` second, matching how a parent node wraps a child's local frame.

use crate::angle::Angle;
use crate::direction::Direction3;
use crate::error::InvalidGeometry;
use config::constants::EPSILON;
use glam::{DMat2, DMat3, DMat4, DQuat, DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// A 3D affine transform (4x4 matrix, last row `0 0 0 1`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3 {
    matrix: DMat4,
}

impl Default for Transform3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform3 {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        matrix: DMat4::IDENTITY,
    };

    /// Wraps a raw matrix.
    pub fn from_matrix(matrix: DMat4) -> Self {
        Self { matrix }
    }

    /// A pure translation.
    pub fn translation(offset: DVec3) -> Self {
        Self {
            matrix: DMat4::from_translation(offset),
        }
    }

    /// A per-axis scale.
    pub fn scaling(factors: DVec3) -> Self {
        Self {
            matrix: DMat4::from_scale(factors),
        }
    }

    /// A rotation about an axis.
    pub fn rotation(axis: Direction3, angle: Angle) -> Self {
        Self {
            matrix: DMat4::from_quat(DQuat::from_axis_angle(axis.vector(), angle.radians())),
        }
    }

    /// A rotation from a quaternion.
    pub fn from_quat(quat: DQuat) -> Self {
        Self {
            matrix: DMat4::from_quat(quat),
        }
    }

    /// Builds a frame from three basis vectors and an origin.
    ///
    /// The basis is used as-is; callers wanting an orthonormal frame pass
    /// orthonormal vectors.
    pub fn from_basis(x: DVec3, y: DVec3, z: DVec3, origin: DVec3) -> Self {
        Self {
            matrix: DMat4::from_cols(
                x.extend(0.0),
                y.extend(0.0),
                z.extend(0.0),
                origin.extend(1.0),
            ),
        }
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> DMat4 {
        self.matrix
    }

    /// Applies the transform to a point.
    pub fn apply(&self, point: DVec3) -> DVec3 {
        self.matrix.transform_point3(point)
    }

    /// Applies only the linear part to a vector (no translation).
    pub fn apply_vector(&self, vector: DVec3) -> DVec3 {
        self.matrix.transform_vector3(vector)
    }

    /// Applies the transform to a direction, renormalizing.
    pub fn apply_direction(&self, direction: Direction3) -> Result<Direction3, InvalidGeometry> {
        Direction3::new(self.apply_vector(direction.vector()))
    }

    /// Returns `self` followed by `other`.
    pub fn concatenated(&self, other: &Self) -> Self {
        Self {
            matrix: other.matrix * self.matrix,
        }
    }

    /// The inverse transform; fails when the matrix is singular.
    pub fn inverse(&self) -> Result<Self, InvalidGeometry> {
        if self.matrix.determinant().abs() < EPSILON {
            return Err(InvalidGeometry::new("inverse of singular transform"));
        }
        Ok(Self {
            matrix: self.matrix.inverse(),
        })
    }

    /// The translation component.
    pub fn offset(&self) -> DVec3 {
        self.matrix.w_axis.truncate()
    }

    /// The upper-left 3x3 linear part.
    pub fn linear(&self) -> DMat3 {
        DMat3::from_cols(
            self.matrix.x_axis.truncate(),
            self.matrix.y_axis.truncate(),
            self.matrix.z_axis.truncate(),
        )
    }

    /// Per-axis scale magnitudes (lengths of the basis columns).
    pub fn scale_components(&self) -> DVec3 {
        DVec3::new(
            self.matrix.x_axis.truncate().length(),
            self.matrix.y_axis.truncate().length(),
            self.matrix.z_axis.truncate().length(),
        )
    }

    /// The scalar scale of the transform: the minimum absolute singular
    /// value of the linear part.
    ///
    /// Used to scale tolerances and segmentation under transform; the
    /// minimum is the conservative choice for a non-uniform map.
    pub fn scale(&self) -> f64 {
        min_singular_value_3(self.linear())
    }

    /// True when the linear part flips orientation.
    pub fn flips_orientation(&self) -> bool {
        self.linear().determinant() < 0.0
    }

    /// True when this is (numerically) the identity.
    pub fn is_identity(&self) -> bool {
        let d = self.matrix - DMat4::IDENTITY;
        d.to_cols_array().iter().all(|c| c.abs() < EPSILON)
    }
}

/// A 2D affine transform (3x3 matrix, last row `0 0 1`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2 {
    matrix: DMat3,
}

impl Default for Transform2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2 {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        matrix: DMat3::IDENTITY,
    };

    /// Wraps a raw matrix.
    pub fn from_matrix(matrix: DMat3) -> Self {
        Self { matrix }
    }

    /// A pure translation.
    pub fn translation(offset: DVec2) -> Self {
        Self {
            matrix: DMat3::from_translation(offset),
        }
    }

    /// A per-axis scale.
    pub fn scaling(factors: DVec2) -> Self {
        Self {
            matrix: DMat3::from_scale(factors),
        }
    }

    /// A counter-clockwise rotation.
    pub fn rotation(angle: Angle) -> Self {
        Self {
            matrix: DMat3::from_angle(angle.radians()),
        }
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> DMat3 {
        self.matrix
    }

    /// Applies the transform to a point.
    pub fn apply(&self, point: DVec2) -> DVec2 {
        self.matrix.transform_point2(point)
    }

    /// Applies only the linear part to a vector.
    pub fn apply_vector(&self, vector: DVec2) -> DVec2 {
        self.matrix.transform_vector2(vector)
    }

    /// Returns `self` followed by `other`.
    pub fn concatenated(&self, other: &Self) -> Self {
        Self {
            matrix: other.matrix * self.matrix,
        }
    }

    /// The inverse transform; fails when the matrix is singular.
    pub fn inverse(&self) -> Result<Self, InvalidGeometry> {
        if self.matrix.determinant().abs() < EPSILON {
            return Err(InvalidGeometry::new("inverse of singular transform"));
        }
        Ok(Self {
            matrix: self.matrix.inverse(),
        })
    }

    /// The translation component.
    pub fn offset(&self) -> DVec2 {
        self.matrix.z_axis.truncate()
    }

    /// The upper-left 2x2 linear part.
    pub fn linear(&self) -> DMat2 {
        DMat2::from_cols(self.matrix.x_axis.truncate(), self.matrix.y_axis.truncate())
    }

    /// Per-axis scale magnitudes.
    pub fn scale_components(&self) -> DVec2 {
        DVec2::new(
            self.matrix.x_axis.truncate().length(),
            self.matrix.y_axis.truncate().length(),
        )
    }

    /// Minimum absolute singular value of the linear part.
    pub fn scale(&self) -> f64 {
        min_singular_value_2(self.linear())
    }

    /// True when the linear part flips orientation.
    pub fn flips_orientation(&self) -> bool {
        self.linear().determinant() < 0.0
    }

    /// True when this is (numerically) the identity.
    pub fn is_identity(&self) -> bool {
        let d = self.matrix - DMat3::IDENTITY;
        d.to_cols_array().iter().all(|c| c.abs() < EPSILON)
    }

    /// Embeds the 2D transform into 3D, acting on the XY plane.
    pub fn to_3d(&self) -> Transform3 {
        let l = self.linear();
        let o = self.offset();
        Transform3::from_basis(
            DVec3::new(l.x_axis.x, l.x_axis.y, 0.0),
            DVec3::new(l.y_axis.x, l.y_axis.y, 0.0),
            DVec3::Z,
            DVec3::new(o.x, o.y, 0.0),
        )
    }
}

/// Smaller singular value of a 2x2 matrix, in closed form.
fn min_singular_value_2(m: DMat2) -> f64 {
    let (a, b) = (m.x_axis.x, m.y_axis.x);
    let (c, d) = (m.x_axis.y, m.y_axis.y);
    let s1 = a * a + b * b + c * c + d * d;
    let s2 = ((a * a + b * b - c * c - d * d).powi(2) + 4.0 * (a * c + b * d).powi(2)).sqrt();
    (((s1 - s2) / 2.0).max(0.0)).sqrt()
}

/// Smallest singular value of a 3x3 matrix.
///
/// Computed as the square root of the smallest eigenvalue of `A^T A` using
/// the trigonometric closed form for symmetric 3x3 eigenvalues.
fn min_singular_value_3(m: DMat3) -> f64 {
    let s = m.transpose() * m;
    let (m11, m22, m33) = (s.x_axis.x, s.y_axis.y, s.z_axis.z);
    let (m12, m13, m23) = (s.y_axis.x, s.z_axis.x, s.z_axis.y);

    let p1 = m12 * m12 + m13 * m13 + m23 * m23;
    let min_eig = if p1 < EPSILON {
        m11.min(m22).min(m33)
    } else {
        let q = (m11 + m22 + m33) / 3.0;
        let p2 = (m11 - q).powi(2) + (m22 - q).powi(2) + (m33 - q).powi(2) + 2.0 * p1;
        let p = (p2 / 6.0).sqrt();
        let b = DMat3::from_cols(
            (s.x_axis - DVec3::new(q, 0.0, 0.0)) / p,
            (s.y_axis - DVec3::new(0.0, q, 0.0)) / p,
            (s.z_axis - DVec3::new(0.0, 0.0, q)) / p,
        );
        let r = (b.determinant() / 2.0).clamp(-1.0, 1.0);
        let phi = r.acos() / 3.0;
        // Smallest eigenvalue corresponds to phi + 2*pi/3.
        q + 2.0 * p * (phi + 2.0 * std::f64::consts::FRAC_PI_3).cos()
    };
    min_eig.max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_concatenated_order_is_right_to_left() {
        let scale = Transform3::scaling(DVec3::splat(2.0));
        let shift = Transform3::translation(DVec3::X);
        // Scale first, then shift.
        let t = scale.concatenated(&shift);
        assert_relative_eq!(t.apply(DVec3::X).x, 3.0, epsilon = 1e-12);
        // Shift first, then scale.
        let u = shift.concatenated(&scale);
        assert_relative_eq!(u.apply(DVec3::X).x, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = Transform3::translation(DVec3::new(1.0, 2.0, 3.0))
            .concatenated(&Transform3::rotation(Direction3::Z, Angle::degrees(30.0)));
        let p = DVec3::new(0.5, -1.0, 2.0);
        let back = t.inverse().unwrap().apply(t.apply(p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-9);
        assert_relative_eq!(back.z, p.z, epsilon = 1e-9);
    }

    #[test]
    fn test_scale_is_min_singular_value() {
        let t = Transform3::scaling(DVec3::new(2.0, 3.0, 0.5));
        assert_relative_eq!(t.scale(), 0.5, epsilon = 1e-9);
        // Rotation does not change singular values.
        let r = t.concatenated(&Transform3::rotation(Direction3::X, Angle::degrees(37.0)));
        assert_relative_eq!(r.scale(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_scale_2d() {
        let t = Transform2::scaling(DVec2::new(4.0, 0.25))
            .concatenated(&Transform2::rotation(Angle::degrees(45.0)));
        assert_relative_eq!(t.scale(), 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_flips_orientation() {
        assert!(Transform3::scaling(DVec3::new(-1.0, 1.0, 1.0)).flips_orientation());
        assert!(!Transform3::scaling(DVec3::new(2.0, 1.0, 1.0)).flips_orientation());
    }

    #[test]
    fn test_identity_detection() {
        assert!(Transform3::IDENTITY.is_identity());
        assert!(!Transform3::translation(DVec3::X).is_identity());
    }

    #[test]
    fn test_2d_embedding() {
        let t = Transform2::translation(DVec2::new(1.0, 2.0)).to_3d();
        let p = t.apply(DVec3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 5.0, epsilon = 1e-12);
    }
}
