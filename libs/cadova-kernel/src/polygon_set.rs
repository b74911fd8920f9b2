//! # Polygon Set
//!
//! The 2D concrete: a set of oriented contours. Outer boundaries wind
//! counter-clockwise, holes clockwise; containment follows the even-odd
//! rule.

use cadova_math::{BoundingBox2, SimplePolygon, Transform2};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A set of oriented polygon contours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonSet {
    contours: Vec<SimplePolygon>,
}

impl PolygonSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A set from contours.
    pub fn from_contours(contours: Vec<SimplePolygon>) -> Self {
        Self {
            contours: contours.into_iter().filter(|c| c.len() >= 3).collect(),
        }
    }

    /// A set holding a single counter-clockwise contour.
    pub fn from_single(contour: SimplePolygon) -> Self {
        let oriented = if contour.is_counter_clockwise() {
            contour
        } else {
            contour.reversed()
        };
        Self::from_contours(vec![oriented])
    }

    /// The contours.
    pub fn contours(&self) -> &[SimplePolygon] {
        &self.contours
    }

    /// Number of contours.
    pub fn contour_count(&self) -> usize {
        self.contours.len()
    }

    /// Total number of vertices.
    pub fn point_count(&self) -> usize {
        self.contours.iter().map(SimplePolygon::len).sum()
    }

    /// True when the set has no contours.
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Net enclosed area: outer contours add, holes subtract.
    pub fn area(&self) -> f64 {
        self.contours.iter().map(SimplePolygon::signed_area).sum()
    }

    /// True when the set is a single convex outer contour.
    pub fn is_convex(&self) -> bool {
        self.contours.len() == 1 && self.contours[0].is_convex()
    }

    /// Bounding box over all contours.
    pub fn bounding_box(&self) -> BoundingBox2 {
        self.contours
            .iter()
            .fold(BoundingBox2::EMPTY, |b, c| b.union(&c.bounding_box()))
    }

    /// Even-odd containment across all contours.
    pub fn contains(&self, point: DVec2) -> bool {
        let mut crossings = 0;
        for contour in &self.contours {
            if contour.contains(point) {
                crossings += 1;
            }
        }
        crossings % 2 == 1
    }

    /// All vertices, flattened.
    pub fn all_points(&self) -> Vec<DVec2> {
        self.contours
            .iter()
            .flat_map(|c| c.points().iter().copied())
            .collect()
    }

    /// The set under an affine transform.
    ///
    /// Contour winding is flipped back when the transform inverts
    /// orientation so outer loops stay counter-clockwise.
    pub fn transformed(&self, transform: &Transform2) -> Self {
        let flips = transform.flips_orientation();
        let contours = self
            .contours
            .iter()
            .map(|contour| {
                let mapped = SimplePolygon::new(
                    contour.points().iter().map(|&p| transform.apply(p)).collect(),
                );
                if flips {
                    mapped.reversed()
                } else {
                    mapped
                }
            })
            .collect();
        Self { contours }
    }

    /// Concatenates sets without boolean resolution.
    pub fn merged<'a, I: IntoIterator<Item = &'a PolygonSet>>(sets: I) -> Self {
        let mut contours = Vec::new();
        for set in sets {
            contours.extend(set.contours.iter().cloned());
        }
        Self { contours }
    }

    /// Collinear-run removal applied to every contour.
    pub fn simplified(&self, epsilon: f64) -> Self {
        Self {
            contours: self
                .contours
                .iter()
                .map(|c| c.simplified(epsilon))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> SimplePolygon {
        SimplePolygon::new(vec![
            DVec2::ZERO,
            DVec2::new(size, 0.0),
            DVec2::new(size, size),
            DVec2::new(0.0, size),
        ])
    }

    #[test]
    fn test_area_subtracts_holes() {
        let outer = square(4.0);
        let hole = SimplePolygon::new(vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(3.0, 1.0),
            DVec2::new(3.0, 3.0),
            DVec2::new(1.0, 3.0),
        ])
        .reversed();
        let set = PolygonSet::from_contours(vec![outer, hole]);
        assert!((set.area() - 12.0).abs() < 1e-12);
        assert!(set.contains(DVec2::new(0.5, 0.5)));
        assert!(!set.contains(DVec2::new(2.0, 2.0)));
    }

    #[test]
    fn test_from_single_normalizes_winding() {
        let set = PolygonSet::from_single(square(2.0).reversed());
        assert!(set.contours()[0].is_counter_clockwise());
    }

    #[test]
    fn test_mirror_keeps_winding() {
        let set = PolygonSet::from_single(square(2.0));
        let mirrored = set.transformed(&Transform2::scaling(DVec2::new(-1.0, 1.0)));
        assert!(mirrored.contours()[0].is_counter_clockwise());
        assert!((mirrored.area() - 4.0).abs() < 1e-12);
    }
}
