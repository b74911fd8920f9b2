//! Attribute-carrying polygon for BSP boolean operations.

use super::plane::{PointSide, PolygonSide, SplitPlane};
use crate::original_id::OriginalId;
use glam::DVec3;

/// A convex planar polygon carrying its source surface's original ID.
///
/// Splitting produces fragments with the same ID, which is how material
/// attribution survives CSG.
#[derive(Debug, Clone)]
pub struct BspPolygon {
    /// Vertices in counter-clockwise order viewed from the front.
    pub vertices: Vec<DVec3>,
    /// The polygon's plane.
    pub plane: SplitPlane,
    /// Attribution inherited by every fragment.
    pub original: OriginalId,
}

impl BspPolygon {
    /// A polygon from at least three vertices; `None` when degenerate.
    pub fn new(vertices: Vec<DVec3>, original: OriginalId) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = first_valid_plane(&vertices)?;
        Some(Self {
            vertices,
            plane,
            original,
        })
    }

    /// Flips the polygon to face the opposite direction.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }

    /// Classifies this polygon relative to a plane.
    pub fn classify(&self, plane: &SplitPlane) -> PolygonSide {
        let mut front = 0;
        let mut back = 0;
        for &vertex in &self.vertices {
            match plane.classify_point(vertex) {
                PointSide::Front => front += 1,
                PointSide::Back => back += 1,
                PointSide::Coplanar => {}
            }
        }
        match (front > 0, back > 0) {
            (true, true) => PolygonSide::Spanning,
            (true, false) => PolygonSide::Front,
            (false, true) => PolygonSide::Back,
            (false, false) => PolygonSide::Coplanar,
        }
    }

    /// Splits this polygon by `plane` into the five csg.js buckets.
    ///
    /// Coplanar polygons go to `coplanar_front` or `coplanar_back`
    /// depending on facing; spanning polygons are cut along the plane and
    /// both fragments inherit the original ID.
    pub fn split(
        &self,
        plane: &SplitPlane,
        coplanar_front: &mut Vec<BspPolygon>,
        coplanar_back: &mut Vec<BspPolygon>,
        front: &mut Vec<BspPolygon>,
        back: &mut Vec<BspPolygon>,
    ) {
        match self.classify(plane) {
            PolygonSide::Coplanar => {
                if self.plane.normal.dot(plane.normal) > 0.0 {
                    coplanar_front.push(self.clone());
                } else {
                    coplanar_back.push(self.clone());
                }
            }
            PolygonSide::Front => front.push(self.clone()),
            PolygonSide::Back => back.push(self.clone()),
            PolygonSide::Spanning => {
                let mut front_vertices = Vec::with_capacity(self.vertices.len() + 1);
                let mut back_vertices = Vec::with_capacity(self.vertices.len() + 1);
                let n = self.vertices.len();
                for i in 0..n {
                    let j = (i + 1) % n;
                    let vi = self.vertices[i];
                    let vj = self.vertices[j];
                    let si = plane.classify_point(vi);
                    let sj = plane.classify_point(vj);

                    if si != PointSide::Back {
                        front_vertices.push(vi);
                    }
                    if si != PointSide::Front {
                        back_vertices.push(vi);
                    }
                    if (si == PointSide::Front && sj == PointSide::Back)
                        || (si == PointSide::Back && sj == PointSide::Front)
                    {
                        let t = plane.signed_distance(vi)
                            / (plane.signed_distance(vi) - plane.signed_distance(vj));
                        let cut = vi.lerp(vj, t);
                        front_vertices.push(cut);
                        back_vertices.push(cut);
                    }
                }
                if let Some(polygon) = BspPolygon::new(front_vertices, self.original) {
                    front.push(polygon);
                }
                if let Some(polygon) = BspPolygon::new(back_vertices, self.original) {
                    back.push(polygon);
                }
            }
        }
    }
}

fn first_valid_plane(vertices: &[DVec3]) -> Option<SplitPlane> {
    let n = vertices.len();
    for i in 1..n - 1 {
        if let Some(plane) = SplitPlane::from_points(vertices[0], vertices[i], vertices[i + 1]) {
            return Some(plane);
        }
    }
    None
}
