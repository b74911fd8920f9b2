//! # Warp
//!
//! Pointwise vertex remapping. Face topology and original IDs are
//! untouched; the function must be pure for memoization to be sound.

use crate::error::KernelError;
use crate::mesh::Mesh;
use crate::polygon_set::PolygonSet;
use cadova_math::SimplePolygon;
use glam::{DVec2, DVec3};

/// Applies `f` to every vertex of a mesh.
pub fn warp<F>(mesh: &Mesh, f: F) -> Result<Mesh, KernelError>
where
    F: Fn(DVec3) -> DVec3 + Sync,
{
    let vertices: Vec<DVec3> = mesh.vertices().iter().map(|&v| f(v)).collect();
    Ok(Mesh::from_parts(
        vertices,
        mesh.triangles().to_vec(),
        mesh.originals().to_vec(),
    ))
}

/// Applies `f` to every vertex of a polygon set.
pub fn warp_2d<F>(set: &PolygonSet, f: F) -> Result<PolygonSet, KernelError>
where
    F: Fn(DVec2) -> DVec2 + Sync,
{
    let contours = set
        .contours()
        .iter()
        .map(|contour| {
            SimplePolygon::new(contour.points().iter().map(|&p| f(p)).collect())
        })
        .collect();
    Ok(PolygonSet::from_contours(contours))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::original_id::OriginalId;
    use crate::primitives::cuboid;
    use approx::assert_relative_eq;

    #[test]
    fn test_warp_shifts_vertices() {
        let mesh = cuboid(DVec3::ONE, OriginalId::UNTRACKED).unwrap();
        let warped = warp(&mesh, |v| v + DVec3::new(0.0, 0.0, v.x)).unwrap();
        assert_eq!(warped.triangle_count(), mesh.triangle_count());
        assert_relative_eq!(warped.bounding_box().maximum.z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_warp_preserves_attribution() {
        let id = OriginalId::fresh();
        let mesh = cuboid(DVec3::ONE, id).unwrap();
        let warped = warp(&mesh, |v| v * 2.0).unwrap();
        assert!(warped.originals().iter().all(|&o| o == id));
    }
}
