//! # Simplify
//!
//! Reduces detail: vertices closer than epsilon merge, triangles that
//! degenerate in the process are dropped, and 2D contours lose
//! near-collinear runs. At `epsilon = 0` only exact duplicates merge,
//! making the operation idempotent.

use crate::error::KernelError;
use crate::mesh::Mesh;
use crate::polygon_set::PolygonSet;

/// Simplifies a mesh by merging vertices within `epsilon`.
pub fn simplify(mesh: &Mesh, epsilon: f64) -> Result<Mesh, KernelError> {
    if epsilon < 0.0 {
        return Err(KernelError::degenerate("simplify"));
    }
    Ok(mesh.welded(epsilon))
}

/// Simplifies a polygon set: vertex merge plus collinear-run removal per
/// contour.
pub fn simplify_2d(set: &PolygonSet, epsilon: f64) -> Result<PolygonSet, KernelError> {
    if epsilon < 0.0 {
        return Err(KernelError::degenerate("simplify"));
    }
    Ok(set.simplified(epsilon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::original_id::OriginalId;
    use crate::primitives::cuboid;
    use crate::ops::refine::refine;
    use glam::DVec3;

    #[test]
    fn test_simplify_zero_is_idempotent() {
        let mesh = refine(
            &cuboid(DVec3::splat(2.0), OriginalId::UNTRACKED).unwrap(),
            0.6,
        )
        .unwrap();
        let once = simplify(&mesh, 0.0).unwrap();
        let twice = simplify(&once, 0.0).unwrap();
        assert_eq!(once.vertex_count(), twice.vertex_count());
        assert_eq!(once.triangle_count(), twice.triangle_count());
    }

    #[test]
    fn test_simplify_collapses_fine_detail() {
        let mesh = refine(
            &cuboid(DVec3::splat(2.0), OriginalId::UNTRACKED).unwrap(),
            0.3,
        )
        .unwrap();
        let coarse = simplify(&mesh, 0.5).unwrap();
        assert!(coarse.vertex_count() < mesh.vertex_count());
    }

    #[test]
    fn test_negative_epsilon_rejected() {
        let mesh = cuboid(DVec3::ONE, OriginalId::UNTRACKED).unwrap();
        assert!(simplify(&mesh, -1.0).is_err());
    }
}
