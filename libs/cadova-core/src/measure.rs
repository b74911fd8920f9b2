//! # Measurements
//!
//! Post-evaluation metrics read from kernel concretes. A measurement can
//! cover the main model alone or sum over part-catalog buckets.

use cadova_kernel::{Mesh, PolygonSet};
use cadova_math::{BoundingBox2, BoundingBox3};
use serde::{Deserialize, Serialize};

/// Which geometry a measurement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasurementScope {
    /// Only the inline main model.
    MainPart,
    /// The main model plus solid-semantic parts.
    SolidParts,
    /// The main model plus every part.
    AllParts,
}

/// Metrics of a 3D concrete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements3 {
    /// Axis-aligned bounds.
    pub bounding_box: BoundingBox3,
    /// Vertex count.
    pub point_count: usize,
    /// True when there are no triangles.
    pub is_empty: bool,
    /// Total triangle area.
    pub surface_area: f64,
    /// Signed enclosed volume.
    pub volume: f64,
    /// Unique undirected edge count.
    pub edge_count: usize,
    /// Triangle count.
    pub triangle_count: usize,
}

impl Measurements3 {
    /// Reads the metrics of one mesh.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        Self {
            bounding_box: mesh.bounding_box(),
            point_count: mesh.vertex_count(),
            is_empty: mesh.is_empty(),
            surface_area: mesh.surface_area(),
            volume: mesh.volume(),
            edge_count: mesh.edge_count(),
            triangle_count: mesh.triangle_count(),
        }
    }

    /// Sums metrics over several concretes: counts add, bounds union.
    pub fn combined<'a, I: IntoIterator<Item = &'a Measurements3>>(measurements: I) -> Self {
        let mut out = Self {
            bounding_box: BoundingBox3::EMPTY,
            point_count: 0,
            is_empty: true,
            surface_area: 0.0,
            volume: 0.0,
            edge_count: 0,
            triangle_count: 0,
        };
        for m in measurements {
            out.bounding_box = out.bounding_box.union(&m.bounding_box);
            out.point_count += m.point_count;
            out.is_empty &= m.is_empty;
            out.surface_area += m.surface_area;
            out.volume += m.volume;
            out.edge_count += m.edge_count;
            out.triangle_count += m.triangle_count;
        }
        out
    }
}

/// Metrics of a 2D concrete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements2 {
    /// Axis-aligned bounds.
    pub bounding_box: BoundingBox2,
    /// Vertex count.
    pub point_count: usize,
    /// True when there are no contours.
    pub is_empty: bool,
    /// Net enclosed area.
    pub area: f64,
    /// Contour count.
    pub contour_count: usize,
    /// True for a single convex outer contour.
    pub is_convex: bool,
}

impl Measurements2 {
    /// Reads the metrics of one polygon set.
    pub fn from_polygon_set(set: &PolygonSet) -> Self {
        Self {
            bounding_box: set.bounding_box(),
            point_count: set.point_count(),
            is_empty: set.is_empty(),
            area: set.area(),
            contour_count: set.contour_count(),
            is_convex: set.is_convex(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadova_kernel::primitives::cuboid;
    use cadova_kernel::OriginalId;
    use glam::DVec3;

    #[test]
    fn test_box_measurements() {
        let mesh = cuboid(DVec3::new(10.0, 20.0, 30.0), OriginalId::UNTRACKED).unwrap();
        let m = Measurements3::from_mesh(&mesh);
        assert_eq!(m.volume, 6000.0);
        assert_eq!(m.surface_area, 2200.0);
        assert_eq!(m.bounding_box.minimum, DVec3::ZERO);
        assert_eq!(m.bounding_box.maximum, DVec3::new(10.0, 20.0, 30.0));
        assert!(!m.is_empty);
    }

    #[test]
    fn test_combined_sums_and_unions() {
        let a = Measurements3::from_mesh(
            &cuboid(DVec3::ONE, OriginalId::UNTRACKED).unwrap(),
        );
        let combined = Measurements3::combined([&a, &a]);
        assert_eq!(combined.volume, 2.0);
        assert_eq!(combined.triangle_count, 24);
        assert_eq!(combined.bounding_box, a.bounding_box);
    }
}
