//! Binary space partitioning tree for CSG boolean operations, after the
//! csg.js construction: clip, invert, and collect.

use super::plane::SplitPlane;
use super::polygon::BspPolygon;

/// A node in the BSP tree.
///
/// Each node stores the polygons coplanar with its dividing plane and the
/// front/back subtrees.
#[derive(Debug, Clone, Default)]
pub struct BspNode {
    plane: Option<SplitPlane>,
    polygons: Vec<BspPolygon>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
}

impl BspNode {
    /// Builds a tree from a polygon soup.
    pub fn new(polygons: Vec<BspPolygon>) -> Self {
        let mut node = Self::default();
        if !polygons.is_empty() {
            node.build(polygons);
        }
        node
    }

    /// Inserts polygons, splitting them down the existing tree.
    pub fn build(&mut self, polygons: Vec<BspPolygon>) {
        if polygons.is_empty() {
            return;
        }
        let plane = match self.plane {
            Some(plane) => plane,
            None => {
                let plane = polygons[0].plane;
                self.plane = Some(plane);
                plane
            }
        };

        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in polygons {
            polygon.split(
                &plane,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        self.polygons.extend(coplanar_front);
        self.polygons.extend(coplanar_back);
        if !front.is_empty() {
            self.front
                .get_or_insert_with(|| Box::new(BspNode::default()))
                .build(front);
        }
        if !back.is_empty() {
            self.back
                .get_or_insert_with(|| Box::new(BspNode::default()))
                .build(back);
        }
    }

    /// Flips solid and empty space: all polygons reverse and subtrees
    /// swap.
    pub fn invert(&mut self) {
        for polygon in &mut self.polygons {
            polygon.flip();
        }
        if let Some(plane) = &mut self.plane {
            plane.flip();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Removes the parts of `polygons` inside this tree's solid.
    pub fn clip_polygons(&self, polygons: Vec<BspPolygon>) -> Vec<BspPolygon> {
        let plane = match self.plane {
            Some(plane) => plane,
            None => return polygons,
        };

        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in polygons {
            polygon.split(
                &plane,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        front.extend(coplanar_front);
        back.extend(coplanar_back);
        let mut front = match &self.front {
            Some(node) => node.clip_polygons(front),
            None => front,
        };
        let back = match &self.back {
            Some(node) => node.clip_polygons(back),
            // No back subtree: back space is solid, discard.
            None => Vec::new(),
        };
        front.extend(back);
        front
    }

    /// Clips this tree's polygons to the solid of `other`.
    pub fn clip_to(&mut self, other: &BspNode) {
        self.polygons = other.clip_polygons(std::mem::take(&mut self.polygons));
        if let Some(front) = &mut self.front {
            front.clip_to(other);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(other);
        }
    }

    /// Collects every polygon in the tree.
    pub fn all_polygons(&self) -> Vec<BspPolygon> {
        let mut out = self.polygons.clone();
        if let Some(front) = &self.front {
            out.extend(front.all_polygons());
        }
        if let Some(back) = &self.back {
            out.extend(back.all_polygons());
        }
        out
    }
}
