//! # 3MF Writer
//!
//! Writes the OPC archive: `[Content_Types].xml`, `_rels/.rels`, and the
//! model document. Parts become separate objects with per-triangle
//! material property references; the `production` extension is declared
//! when more than one part is exported, with deterministic UUIDs derived
//! from part content.

use crate::error::ExportError;
use crate::provider::{ExportModel, ExportPart};
use cadova_core::{Compression, Material, PartSemantic};
use std::io::{Seek, Write};
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CORE_NAMESPACE: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";
const MATERIAL_NAMESPACE: &str =
    "http://schemas.microsoft.com/3dmanufacturing/material/2015/02";
const PRODUCTION_NAMESPACE: &str =
    "http://schemas.microsoft.com/3dmanufacturing/production/2015/06";
const VENDOR_NAMESPACE: &str = "https://cadova.org/3mf";

const COLOR_GROUP_ID: u32 = 1;
const DISPLAY_PROPERTIES_ID: u32 = 2;
const FIRST_OBJECT_ID: u32 = 3;

/// Writes the model as a 3MF archive.
pub fn write_threemf<W: Write + Seek>(
    writer: W,
    model: &ExportModel,
) -> Result<(), ExportError> {
    let mut archive = ZipWriter::new(writer);
    let level = match model.options.compression {
        Compression::Fastest => 1,
        Compression::Standard => 6,
        Compression::Smallest => 9,
    };
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .compression_level(Some(level));

    archive.start_file("[Content_Types].xml", options)?;
    archive.write_all(content_types_xml().as_bytes())?;

    archive.start_file("_rels/.rels", options)?;
    archive.write_all(rels_xml().as_bytes())?;

    archive.start_file("3D/3dmodel.model", options)?;
    archive.write_all(model_xml(model).as_bytes())?;

    archive.finish()?;
    Ok(())
}

fn content_types_xml() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        "\n",
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        "\n",
        r#"  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        "\n",
        r#"  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>"#,
        "\n",
        "</Types>\n",
    )
    .to_string()
}

fn rels_xml() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        "\n",
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        "\n",
        r#"  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>"#,
        "\n",
        "</Relationships>\n",
    )
    .to_string()
}

/// Materials referenced anywhere in the model, in first-use order.
fn collect_materials(model: &ExportModel) -> Vec<Material> {
    let mut materials: Vec<Material> = Vec::new();
    for part in &model.parts {
        for (_, material) in part.materials.iter() {
            if !materials.contains(material) {
                materials.push(material.clone());
            }
        }
    }
    materials.sort_by(|a, b| {
        a.name
            .as_deref()
            .unwrap_or("")
            .cmp(b.name.as_deref().unwrap_or(""))
            .then(a.base_color.to_hex_rgba().cmp(&b.base_color.to_hex_rgba()))
    });
    materials
}

fn model_xml(model: &ExportModel) -> String {
    let multi_part = model.parts.len() > 1;
    let materials = collect_materials(model);
    let has_metallic = materials.iter().any(|m| m.physical.is_some());

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<model unit="millimeter" xml:lang="en-US" xmlns="{CORE_NAMESPACE}" xmlns:m="{MATERIAL_NAMESPACE}" xmlns:c="{VENDOR_NAMESPACE}""#
    ));
    if multi_part {
        xml.push_str(&format!(
            r#" xmlns:p="{PRODUCTION_NAMESPACE}" requiredextensions="p""#
        ));
    }
    xml.push_str(">\n");

    write_metadata(&mut xml, model);

    xml.push_str("  <resources>\n");
    if !materials.is_empty() {
        if has_metallic {
            xml.push_str(&format!(
                "    <m:pbmetallicdisplayproperties id=\"{DISPLAY_PROPERTIES_ID}\">\n"
            ));
            for material in &materials {
                let (metallicness, roughness) = material
                    .physical
                    .map(|p| (p.metallicness, p.roughness))
                    .unwrap_or((0.0, 1.0));
                xml.push_str(&format!(
                    "      <m:pbmetallic name=\"{}\" metallicness=\"{metallicness}\" roughness=\"{roughness}\"/>\n",
                    escape(material.name.as_deref().unwrap_or("material")),
                ));
            }
            xml.push_str("    </m:pbmetallicdisplayproperties>\n");
        }
        xml.push_str(&format!("    <m:colorgroup id=\"{COLOR_GROUP_ID}\""));
        if has_metallic {
            xml.push_str(&format!(" displaypropertiesid=\"{DISPLAY_PROPERTIES_ID}\""));
        }
        xml.push_str(">\n");
        for material in &materials {
            xml.push_str(&format!(
                "      <m:color color=\"{}\"/>\n",
                material.base_color.to_hex_rgba()
            ));
        }
        xml.push_str("    </m:colorgroup>\n");
    }

    for (index, part) in model.parts.iter().enumerate() {
        write_object(&mut xml, part, FIRST_OBJECT_ID + index as u32, &materials, multi_part);
    }
    xml.push_str("  </resources>\n");

    xml.push_str("  <build");
    if multi_part {
        xml.push_str(&format!(" p:UUID=\"{}\"", build_uuid(model)));
    }
    xml.push_str(">\n");
    for (index, part) in model.parts.iter().enumerate() {
        xml.push_str(&format!(
            "    <item objectid=\"{}\" printable=\"{}\"",
            FIRST_OBJECT_ID + index as u32,
            if part.printable { 1 } else { 0 },
        ));
        if multi_part {
            xml.push_str(&format!(" p:UUID=\"{}\"", part_uuid(part, "item")));
        }
        xml.push_str("/>\n");
    }
    xml.push_str("  </build>\n");
    xml.push_str("</model>\n");
    xml
}

fn write_metadata(xml: &mut String, model: &ExportModel) {
    let metadata = &model.options.metadata;
    let mut write = |name: &str, value: &Option<String>| {
        if let Some(value) = value {
            xml.push_str(&format!(
                "  <metadata name=\"{name}\">{}</metadata>\n",
                escape(value)
            ));
        }
    };
    write("Title", &metadata.title);
    write("Designer", &metadata.author);
    write("Description", &metadata.description);
    write("LicenseTerms", &metadata.license);
    write("CreationDate", &metadata.date);
    write("Application", &metadata.application);
}

fn write_object(
    xml: &mut String,
    part: &ExportPart,
    object_id: u32,
    materials: &[Material],
    multi_part: bool,
) {
    let semantic = match part.semantic {
        PartSemantic::Solid => "solid",
        PartSemantic::Visual => "visual",
        PartSemantic::Context => "context",
    };
    xml.push_str(&format!(
        "    <object id=\"{object_id}\" type=\"model\" name=\"{}\" c:semantic=\"{semantic}\"",
        escape(&part.name),
    ));
    if multi_part {
        xml.push_str(&format!(" p:UUID=\"{}\"", part_uuid(part, "object")));
    }
    xml.push_str(">\n      <mesh>\n        <vertices>\n");
    for index in 0..part.mesh.vertex_count() {
        let vertex = part.mesh.vertex(index);
        xml.push_str(&format!(
            "          <vertex x=\"{}\" y=\"{}\" z=\"{}\"/>\n",
            vertex.x, vertex.y, vertex.z
        ));
    }
    xml.push_str("        </vertices>\n        <triangles>\n");
    for triangle in 0..part.mesh.triangle_count() {
        let v1 = part.mesh.triangle_vertices[triangle * 3];
        let v2 = part.mesh.triangle_vertices[triangle * 3 + 1];
        let v3 = part.mesh.triangle_vertices[triangle * 3 + 2];
        let original = part.mesh.original_of_triangle(triangle);
        let property = part
            .materials
            .get(original)
            .and_then(|material| materials.iter().position(|m| m == material));
        match property {
            Some(index) => xml.push_str(&format!(
                "          <triangle v1=\"{v1}\" v2=\"{v2}\" v3=\"{v3}\" pid=\"{COLOR_GROUP_ID}\" p1=\"{index}\"/>\n"
            )),
            None => xml.push_str(&format!(
                "          <triangle v1=\"{v1}\" v2=\"{v2}\" v3=\"{v3}\"/>\n"
            )),
        }
    }
    xml.push_str("        </triangles>\n      </mesh>\n    </object>\n");
}

/// Deterministic UUID derived from part content, so identical exports
/// produce identical archives.
fn part_uuid(part: &ExportPart, role: &str) -> Uuid {
    let mut hasher = blake3::Hasher::new();
    hasher.update(role.as_bytes());
    hasher.update(part.identifier.as_bytes());
    for value in &part.mesh.triangle_vertices {
        hasher.update(&value.to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest.as_bytes()[..16]);
    Uuid::from_bytes(bytes)
}

fn build_uuid(model: &ExportModel) -> Uuid {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"build");
    for part in &model.parts {
        hasher.update(part.identifier.as_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest.as_bytes()[..16]);
    Uuid::from_bytes(bytes)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::assemble;
    use cadova_core::{
        Environment, EvaluationContext, Geometry3, GeometryNode3, ModelOptions, Part,
    };
    use cadova_math::Color;
    use glam::DVec3;
    use std::io::{Cursor, Read};

    async fn export(geometry: Geometry3) -> Vec<u8> {
        let ctx = EvaluationContext::new();
        let model = ctx.evaluate(&geometry, &Environment::new()).await.unwrap();
        let export = assemble(&ctx, &model.build_result, &ModelOptions::default())
            .await
            .unwrap();
        let mut cursor = Cursor::new(Vec::new());
        write_threemf(&mut cursor, &export).unwrap();
        cursor.into_inner()
    }

    fn read_model_xml(bytes: &[u8]) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert!(names.contains(&"[Content_Types].xml".to_string()));
        assert!(names.contains(&"_rels/.rels".to_string()));
        assert!(names.contains(&"3D/3dmodel.model".to_string()));
        let mut xml = String::new();
        archive
            .by_name("3D/3dmodel.model")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        xml
    }

    #[tokio::test]
    async fn test_single_part_archive() {
        let bytes =
            export(Geometry3::Node(GeometryNode3::cuboid(DVec3::ONE).unwrap())).await;
        let xml = read_model_xml(&bytes);
        assert!(xml.contains(r#"xmlns:c="https://cadova.org/3mf""#));
        assert!(xml.contains(r#"c:semantic="solid""#));
        assert!(xml.contains(r#"<item objectid="3" printable="1"/>"#));
        // Single-part files stay core-spec only.
        assert!(!xml.contains("requiredextensions"));
    }

    #[tokio::test]
    async fn test_multi_part_declares_production_extension() {
        let part = Part::solid("insert");
        let geometry = Geometry3::Node(GeometryNode3::cuboid(DVec3::ONE).unwrap()).union(
            Geometry3::Node(GeometryNode3::sphere(1.0, 12).unwrap()).in_part(part),
        );
        let bytes = export(geometry).await;
        let xml = read_model_xml(&bytes);
        assert!(xml.contains(r#"requiredextensions="p""#));
        assert!(xml.contains("p:UUID"));
        assert_eq!(xml.matches("<object ").count(), 2);
    }

    #[tokio::test]
    async fn test_material_color_group() {
        let red = cadova_core::Material::named("red", Color::rgb(1.0, 0.0, 0.0));
        let geometry = Geometry3::Node(GeometryNode3::cuboid(DVec3::ONE).unwrap())
            .with_material(red);
        let bytes = export(geometry).await;
        let xml = read_model_xml(&bytes);
        assert!(xml.contains(r##"<m:color color="#FF0000FF"/>"##));
        assert!(xml.contains(r#"pid="1" p1="0""#));
    }

    #[tokio::test]
    async fn test_deterministic_output() {
        let make = || {
            Geometry3::Node(GeometryNode3::cuboid(DVec3::splat(2.0)).unwrap())
        };
        let first = export(make()).await;
        let second = export(make()).await;
        assert_eq!(first, second);
    }
}
