//! # Binary STL Writer
//!
//! 80-byte header, little-endian `u32` triangle count, then 50 bytes per
//! triangle: normal, three vertices (IEEE-754 single precision), and a
//! zero attribute word.

use crate::error::ExportError;
use crate::provider::ExportModel;
use byteorder::{LittleEndian, WriteBytesExt};
use cadova_kernel::MeshGl;
use glam::DVec3;
use std::io::Write;

/// Writes the model as binary STL.
///
/// All exported parts are emitted in sequence; the provider has already
/// flattened multi-part models for this format.
pub fn write_stl<W: Write>(writer: &mut W, model: &ExportModel) -> Result<(), ExportError> {
    let mut header = [0u8; 80];
    let title = model.options.display_title();
    for (slot, byte) in header.iter_mut().zip(title.bytes()) {
        *slot = byte;
    }
    writer.write_all(&header)?;

    let triangle_count: usize = model.parts.iter().map(|p| p.mesh.triangle_count()).sum();
    writer.write_u32::<LittleEndian>(triangle_count as u32)?;

    for part in &model.parts {
        write_mesh_triangles(writer, &part.mesh)?;
    }
    Ok(())
}

fn write_mesh_triangles<W: Write>(writer: &mut W, mesh: &MeshGl) -> Result<(), ExportError> {
    let vertex_normals = vertex_normals(mesh);
    for triangle in 0..mesh.triangle_count() {
        let indices = [
            mesh.triangle_vertices[triangle * 3] as usize,
            mesh.triangle_vertices[triangle * 3 + 1] as usize,
            mesh.triangle_vertices[triangle * 3 + 2] as usize,
        ];
        let corners = [
            mesh.vertex(indices[0]),
            mesh.vertex(indices[1]),
            mesh.vertex(indices[2]),
        ];

        // The record normal is the normalized average of the three vertex
        // normals, falling back to the face normal when they cancel.
        let averaged = (vertex_normals[indices[0]]
            + vertex_normals[indices[1]]
            + vertex_normals[indices[2]])
        .normalize_or_zero();
        let normal = if averaged.length_squared() > 0.5 {
            averaged
        } else {
            (corners[1] - corners[0])
                .cross(corners[2] - corners[0])
                .normalize_or_zero()
        };

        for component in [normal.x, normal.y, normal.z] {
            writer.write_f32::<LittleEndian>(component as f32)?;
        }
        for corner in corners {
            for component in [corner.x, corner.y, corner.z] {
                writer.write_f32::<LittleEndian>(component as f32)?;
            }
        }
        writer.write_u16::<LittleEndian>(0)?;
    }
    Ok(())
}

/// Area-weighted vertex normals over the export buffers.
fn vertex_normals(mesh: &MeshGl) -> Vec<DVec3> {
    let mut normals = vec![DVec3::ZERO; mesh.vertex_count()];
    for triangle in 0..mesh.triangle_count() {
        let a = mesh.triangle_vertices[triangle * 3] as usize;
        let b = mesh.triangle_vertices[triangle * 3 + 1] as usize;
        let c = mesh.triangle_vertices[triangle * 3 + 2] as usize;
        let face = (mesh.vertex(b) - mesh.vertex(a)).cross(mesh.vertex(c) - mesh.vertex(a));
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    for normal in &mut normals {
        *normal = normal.normalize_or_zero();
    }
    normals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::assemble;
    use cadova_core::{Environment, EvaluationContext, FileFormat3D, Geometry3, GeometryNode3, ModelOptions};
    use glam::DVec3 as V3;

    async fn cube_model(title: Option<&str>) -> ExportModel {
        let ctx = EvaluationContext::new();
        let geometry = Geometry3::Node(GeometryNode3::cuboid(V3::splat(2.0)).unwrap());
        let model = ctx.evaluate(&geometry, &Environment::new()).await.unwrap();
        let mut options = ModelOptions {
            format: FileFormat3D::Stl,
            ..ModelOptions::default()
        };
        options.metadata.title = title.map(str::to_string);
        assemble(&ctx, &model.build_result, &options).await.unwrap()
    }

    #[tokio::test]
    async fn test_stl_byte_layout() {
        let export = cube_model(Some("test cube")).await;
        let mut bytes = Vec::new();
        write_stl(&mut bytes, &export).unwrap();

        // Header + count + 12 triangles of 50 bytes.
        assert_eq!(bytes.len(), 80 + 4 + 12 * 50);
        assert_eq!(&bytes[..9], &b"test cube"[..]);
        assert!(bytes[9..80].iter().all(|&b| b == 0));
        let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]);
        assert_eq!(count, 12);
        // Attribute word of the first triangle is zero.
        let attr_offset = 84 + 48;
        assert_eq!(bytes[attr_offset], 0);
        assert_eq!(bytes[attr_offset + 1], 0);
    }

    #[tokio::test]
    async fn test_default_header_title() {
        let export = cube_model(None).await;
        let mut bytes = Vec::new();
        write_stl(&mut bytes, &export).unwrap();
        assert_eq!(&bytes[..12], &b"Cadova model"[..]);
    }
}
