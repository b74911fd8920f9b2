//! # Boolean Operations
//!
//! CSG on meshes and polygon sets via binary space partitioning.
//! Difference is defined as the first operand minus the union of the rest;
//! operand order is otherwise irrelevant.

mod bsp;
mod clip2;
mod plane;
mod polygon;

pub use plane::{PointSide, PolygonSide, SplitPlane};
pub use polygon::BspPolygon;

use crate::error::KernelError;
use crate::mesh::Mesh;
use crate::polygon_set::PolygonSet;
use bsp::BspNode;
use config::constants::VERTEX_MERGE_EPSILON;

/// The CSG combination kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    /// All operands merged into one solid.
    Union,
    /// The region common to every operand.
    Intersection,
    /// The first operand minus the union of the rest.
    Difference,
}

/// Converts a mesh into the BSP polygon soup, one polygon per triangle.
pub fn mesh_to_polygons(mesh: &Mesh) -> Vec<BspPolygon> {
    mesh.triangles()
        .iter()
        .zip(mesh.originals())
        .filter_map(|(&[a, b, c], &original)| {
            BspPolygon::new(
                vec![
                    mesh.vertices()[a as usize],
                    mesh.vertices()[b as usize],
                    mesh.vertices()[c as usize],
                ],
                original,
            )
        })
        .collect()
}

/// Rebuilds a welded triangle mesh from BSP polygons.
///
/// Convex polygons are fan-triangulated; every triangle inherits its
/// polygon's original ID.
pub fn polygons_to_mesh(polygons: &[BspPolygon]) -> Mesh {
    let mut mesh = Mesh::new();
    for polygon in polygons {
        let base: Vec<u32> = polygon
            .vertices
            .iter()
            .map(|&v| mesh.add_vertex(v))
            .collect();
        for i in 1..base.len() - 1 {
            mesh.add_triangle(base[0], base[i], base[i + 1], polygon.original);
        }
    }
    mesh.welded(VERTEX_MERGE_EPSILON)
}

fn union_pair(a: Vec<BspPolygon>, b: Vec<BspPolygon>) -> Vec<BspPolygon> {
    let mut a_tree = BspNode::new(a);
    let mut b_tree = BspNode::new(b);
    a_tree.clip_to(&b_tree);
    b_tree.clip_to(&a_tree);
    b_tree.invert();
    b_tree.clip_to(&a_tree);
    b_tree.invert();
    a_tree.build(b_tree.all_polygons());
    a_tree.all_polygons()
}

fn intersection_pair(a: Vec<BspPolygon>, b: Vec<BspPolygon>) -> Vec<BspPolygon> {
    let mut a_tree = BspNode::new(a);
    let mut b_tree = BspNode::new(b);
    a_tree.invert();
    b_tree.clip_to(&a_tree);
    b_tree.invert();
    a_tree.clip_to(&b_tree);
    b_tree.clip_to(&a_tree);
    a_tree.build(b_tree.all_polygons());
    a_tree.invert();
    a_tree.all_polygons()
}

fn difference_pair(a: Vec<BspPolygon>, b: Vec<BspPolygon>) -> Vec<BspPolygon> {
    let mut a_tree = BspNode::new(a);
    let mut b_tree = BspNode::new(b);
    a_tree.invert();
    a_tree.clip_to(&b_tree);
    b_tree.clip_to(&a_tree);
    b_tree.invert();
    b_tree.clip_to(&a_tree);
    b_tree.invert();
    a_tree.build(b_tree.all_polygons());
    a_tree.invert();
    a_tree.all_polygons()
}

/// Combines meshes with the given boolean kind.
///
/// Operand order matters only for [`BooleanOp::Difference`], which
/// subtracts the union of the tail from the head. Empty operands are
/// absorbed by union, annihilate intersection, and are ignored as
/// subtrahends.
pub fn boolean(operands: &[&Mesh], op: BooleanOp) -> Result<Mesh, KernelError> {
    match op {
        BooleanOp::Union => {
            let solids: Vec<&Mesh> = operands
                .iter()
                .copied()
                .filter(|m| !m.is_empty())
                .collect();
            match solids.len() {
                0 => Ok(Mesh::new()),
                1 => Ok(solids[0].clone()),
                _ => {
                    let mut acc = mesh_to_polygons(solids[0]);
                    for mesh in &solids[1..] {
                        acc = union_pair(acc, mesh_to_polygons(mesh));
                    }
                    Ok(polygons_to_mesh(&acc))
                }
            }
        }
        BooleanOp::Intersection => {
            if operands.is_empty() {
                return Ok(Mesh::new());
            }
            if operands.iter().any(|m| m.is_empty()) {
                return Ok(Mesh::new());
            }
            let mut acc = mesh_to_polygons(operands[0]);
            for mesh in &operands[1..] {
                acc = intersection_pair(acc, mesh_to_polygons(mesh));
            }
            Ok(polygons_to_mesh(&acc))
        }
        BooleanOp::Difference => {
            let Some((&head, tail)) = operands.split_first() else {
                return Ok(Mesh::new());
            };
            if head.is_empty() {
                return Ok(Mesh::new());
            }
            let solid_tail: Vec<&Mesh> = tail
                .iter()
                .copied()
                .filter(|m| !m.is_empty())
                .collect();
            if solid_tail.is_empty() {
                return Ok(head.clone());
            }
            let subtrahend = boolean(&solid_tail, BooleanOp::Union)?;
            let result =
                difference_pair(mesh_to_polygons(head), mesh_to_polygons(&subtrahend));
            Ok(polygons_to_mesh(&result))
        }
    }
}

/// Combines polygon sets with the given boolean kind.
pub fn boolean_2d(operands: &[PolygonSet], op: BooleanOp) -> Result<PolygonSet, KernelError> {
    match op {
        BooleanOp::Union => Ok(operands
            .iter()
            .fold(PolygonSet::new(), |acc, set| clip2::union_2d(&acc, set))),
        BooleanOp::Intersection => {
            let Some((head, tail)) = operands.split_first() else {
                return Ok(PolygonSet::new());
            };
            Ok(tail
                .iter()
                .fold(head.clone(), |acc, set| clip2::intersection_2d(&acc, set)))
        }
        BooleanOp::Difference => {
            let Some((head, tail)) = operands.split_first() else {
                return Ok(PolygonSet::new());
            };
            let subtrahend = tail
                .iter()
                .fold(PolygonSet::new(), |acc, set| clip2::union_2d(&acc, set));
            Ok(clip2::difference_2d(head, &subtrahend))
        }
    }
}

/// `input - mask` and `input ∩ mask`, in that order.
pub fn split_by_mask(input: &Mesh, mask: &Mesh) -> Result<(Mesh, Mesh), KernelError> {
    let remainder = boolean(&[input, mask], BooleanOp::Difference)?;
    let overlap = boolean(&[input, mask], BooleanOp::Intersection)?;
    Ok((remainder, overlap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::original_id::OriginalId;
    use crate::primitives::{cuboid, cylinder};
    use cadova_math::Transform3;
    use glam::DVec3;
    use approx::assert_relative_eq;

    fn unit_cube(original: OriginalId) -> Mesh {
        cuboid(DVec3::splat(2.0), original).unwrap()
    }

    fn shifted(mesh: &Mesh, offset: DVec3) -> Mesh {
        mesh.transformed(&Transform3::translation(offset))
    }

    #[test]
    fn test_union_volume_of_overlapping_cubes() {
        let a = unit_cube(OriginalId::fresh());
        let b = shifted(&unit_cube(OriginalId::fresh()), DVec3::new(1.0, 0.0, 0.0));
        let result = boolean(&[&a, &b], BooleanOp::Union).unwrap();
        // 8 + 8 - 4 overlap.
        assert_relative_eq!(result.volume(), 12.0, epsilon = 1e-6);
    }

    #[test]
    fn test_intersection_volume() {
        let a = unit_cube(OriginalId::fresh());
        let b = shifted(&unit_cube(OriginalId::fresh()), DVec3::new(1.0, 1.0, 0.0));
        let result = boolean(&[&a, &b], BooleanOp::Intersection).unwrap();
        assert_relative_eq!(result.volume(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_difference_order_matters() {
        let a = unit_cube(OriginalId::fresh());
        let b = shifted(&unit_cube(OriginalId::fresh()), DVec3::new(1.0, 0.0, 0.0));
        let ab = boolean(&[&a, &b], BooleanOp::Difference).unwrap();
        assert_relative_eq!(ab.volume(), 4.0, epsilon = 1e-6);
        let bounds = ab.bounding_box();
        assert_relative_eq!(bounds.maximum.x, 1.0, epsilon = 1e-6);
        let ba = boolean(&[&b, &a], BooleanOp::Difference).unwrap();
        assert_relative_eq!(ba.bounding_box().minimum.x, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_difference_is_head_minus_union_of_rest() {
        let a = cuboid(DVec3::new(6.0, 2.0, 2.0), OriginalId::fresh()).unwrap();
        let b = unit_cube(OriginalId::fresh());
        let c = shifted(&unit_cube(OriginalId::fresh()), DVec3::new(4.0, 0.0, 0.0));
        let result = boolean(&[&a, &b, &c], BooleanOp::Difference).unwrap();
        assert_relative_eq!(result.volume(), 24.0 - 8.0 - 8.0, epsilon = 1e-6);
    }

    #[test]
    fn test_annular_prism() {
        let outer = cylinder(10.0, 10.0, 10.0, 64, OriginalId::fresh()).unwrap();
        let inner = cylinder(5.0, 5.0, 10.0, 64, OriginalId::fresh()).unwrap();
        let ring = boolean(&[&outer, &inner], BooleanOp::Difference).unwrap();
        let ideal = std::f64::consts::PI * (100.0 - 25.0) * 10.0;
        let error = (ring.volume() - ideal).abs() / ideal;
        assert!(error < 0.01, "relative error {error}");
    }

    #[test]
    fn test_attribution_survives_boolean() {
        let first = OriginalId::fresh();
        let second = OriginalId::fresh();
        let a = unit_cube(first);
        let b = shifted(&unit_cube(second), DVec3::new(1.0, 0.0, 0.0));
        let result = boolean(&[&a, &b], BooleanOp::Union).unwrap();
        let sets = result.original_index_sets();
        assert!(sets.contains_key(&first));
        assert!(sets.contains_key(&second));
        let total: usize = sets.values().map(Vec::len).sum();
        assert_eq!(total, result.triangle_count());
    }

    #[test]
    fn test_union_with_empty_is_identity() {
        let a = unit_cube(OriginalId::fresh());
        let result = boolean(&[&a, &Mesh::new()], BooleanOp::Union).unwrap();
        assert_relative_eq!(result.volume(), a.volume(), epsilon = 1e-9);
    }

    #[test]
    fn test_split_by_mask_partitions() {
        let input = unit_cube(OriginalId::fresh());
        let mask = shifted(&unit_cube(OriginalId::fresh()), DVec3::new(1.0, 0.0, 0.0));
        let (remainder, overlap) = split_by_mask(&input, &mask).unwrap();
        assert_relative_eq!(remainder.volume() + overlap.volume(), 8.0, epsilon = 1e-6);
        assert_relative_eq!(overlap.volume(), 4.0, epsilon = 1e-6);
    }
}
