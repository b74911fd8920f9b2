//! # Split
//!
//! Cuts a mesh into two watertight halves along a plane. The half on the
//! normal side comes first; both halves are capped with the triangulated
//! cross-section.

use crate::error::KernelError;
use crate::mesh::Mesh;
use crate::ops::boolean::{BspPolygon, SplitPlane};
use crate::ops::project::cross_section;
use crate::original_id::OriginalId;
use crate::triangulate::triangulate_set;
use cadova_math::Plane;
use config::constants::VERTEX_MERGE_EPSILON;
use glam::DVec3;

/// Splits `mesh` by `plane`, returning `(positive, negative)` halves.
///
/// Cap triangles carry [`OriginalId::UNTRACKED`]; surface fragments keep
/// their source attribution.
pub fn split_by_plane(mesh: &Mesh, plane: &Plane) -> Result<(Mesh, Mesh), KernelError> {
    if mesh.is_empty() {
        return Ok((Mesh::new(), Mesh::new()));
    }
    let split_plane =
        SplitPlane::from_normal_and_point(plane.normal.vector(), plane.point);

    let mut front_polygons: Vec<BspPolygon> = Vec::new();
    let mut back_polygons: Vec<BspPolygon> = Vec::new();
    for index in 0..mesh.triangle_count() {
        let corners = mesh.triangle_points(index);
        let original = mesh.originals()[index];
        if let Some(polygon) = BspPolygon::new(corners.to_vec(), original) {
            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            polygon.split(
                &split_plane,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front_polygons,
                &mut back_polygons,
            );
            front_polygons.extend(coplanar_front);
            back_polygons.extend(coplanar_back);
        }
    }

    let section = cross_section(mesh, plane)?;
    let cap_triangles = triangulate_set(&section);
    let frame = plane.local_to_world();

    let build_half = |polygons: Vec<BspPolygon>, cap_faces_negative: bool| -> Mesh {
        let mut half = Mesh::new();
        for polygon in &polygons {
            let base: Vec<u32> = polygon
                .vertices
                .iter()
                .map(|&v| half.add_vertex(v))
                .collect();
            for i in 1..base.len() - 1 {
                half.add_triangle(base[0], base[i], base[i + 1], polygon.original);
            }
        }
        for [a, b, c] in &cap_triangles {
            let order: [glam::DVec2; 3] = if cap_faces_negative {
                [*a, *c, *b]
            } else {
                [*a, *b, *c]
            };
            let world: Vec<u32> = order
                .iter()
                .map(|p| half.add_vertex(frame.apply(DVec3::new(p.x, p.y, 0.0))))
                .collect();
            half.add_triangle(world[0], world[1], world[2], OriginalId::UNTRACKED);
        }
        half.welded(VERTEX_MERGE_EPSILON)
    };

    // The positive half's cut face looks back along the normal.
    let positive = build_half(front_polygons, true);
    let negative = build_half(back_polygons, false);
    Ok((positive, negative))
}
