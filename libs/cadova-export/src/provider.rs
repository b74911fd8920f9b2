//! # Export Provider
//!
//! Assembles a fully evaluated model into the neutral structure the file
//! writers consume: one entry per exported part, each with its mesh
//! buffers, material mapping, and a unique identifier.

use crate::error::ExportError;
use cadova_core::{
    BuildResult3, EvaluationContext, FileFormat3D, GeometryNode3, MaterialMapping,
    ModelOptions, PartSemantic,
};
use cadova_kernel::ops::BooleanOp;
use cadova_kernel::MeshGl;
use std::collections::HashSet;

/// One exported object.
#[derive(Debug, Clone)]
pub struct ExportPart {
    /// Unique identifier derived from the part name.
    pub identifier: String,
    /// The user-visible part name.
    pub name: String,
    /// The part semantic.
    pub semantic: PartSemantic,
    /// Derived printability: solids print, the rest do not.
    pub printable: bool,
    /// Export mesh buffers with original-ID runs.
    pub mesh: MeshGl,
    /// Material attribution for the mesh's triangle runs.
    pub materials: MaterialMapping,
}

/// The neutral export structure handed to file writers.
#[derive(Debug, Clone)]
pub struct ExportModel {
    /// Exported parts; the inline main model comes first when non-empty.
    pub parts: Vec<ExportPart>,
    /// The options the model was evaluated under.
    pub options: ModelOptions,
}

/// Assembles an evaluated build result for the requested format.
///
/// The inline main model becomes the first part; catalog buckets whose
/// semantics the format includes follow in identity order, each unioned
/// from everything routed into it. For STL the main model and all
/// included parts are flattened into a single solid.
pub async fn assemble(
    ctx: &EvaluationContext,
    result: &BuildResult3,
    options: &ModelOptions,
) -> Result<ExportModel, ExportError> {
    let included = options.included_part_semantics(options.format);

    let mut entries: Vec<(String, PartSemantic, GeometryNode3)> = Vec::new();
    if !result.node.is_empty() {
        entries.push((
            options
                .model_name
                .clone()
                .unwrap_or_else(|| "model".to_string()),
            PartSemantic::Solid,
            result.node.clone(),
        ));
    }
    for (part, bucket) in result.elements.parts.iter() {
        if !included.contains(&part.semantic()) {
            continue;
        }
        let nodes: Vec<GeometryNode3> = bucket.iter().map(|entry| entry.node.clone()).collect();
        let unioned = GeometryNode3::boolean(nodes, BooleanOp::Union);
        if unioned.is_empty() {
            continue;
        }
        entries.push((part.name().to_string(), part.semantic(), unioned));
    }

    if entries.is_empty() {
        return Err(ExportError::EmptyModel);
    }

    // STL flattens everything into one solid.
    if options.format == FileFormat3D::Stl && entries.len() > 1 {
        let nodes: Vec<GeometryNode3> =
            entries.iter().map(|(_, _, node)| node.clone()).collect();
        let merged = GeometryNode3::boolean(nodes, BooleanOp::Union);
        let name = entries[0].0.clone();
        entries = vec![(name, PartSemantic::Solid, merged)];
    }

    let mut parts = Vec::with_capacity(entries.len());
    let mut taken = HashSet::new();
    for (name, semantic, node) in entries {
        let concrete = ctx.result3(&node).await?;
        log::debug!(
            "export part '{name}': {} triangles",
            concrete.concrete.triangle_count()
        );
        parts.push(ExportPart {
            identifier: unique_identifier(&name, &mut taken),
            name,
            semantic,
            printable: semantic == PartSemantic::Solid,
            mesh: concrete.concrete.to_mesh_gl(),
            materials: concrete.materials.clone(),
        });
    }

    Ok(ExportModel {
        parts,
        options: options.clone(),
    })
}

/// Derives a unique identifier from a part name, resolving collisions by
/// suffixing `_2`, `_3`, and so on.
fn unique_identifier(name: &str, taken: &mut HashSet<String>) -> String {
    let base: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let base = if base.is_empty() { "part".to_string() } else { base };
    if taken.insert(base.clone()) {
        return base;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{base}_{counter}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadova_core::{Environment, Geometry3, Part};
    use glam::DVec3;

    #[tokio::test]
    async fn test_assemble_main_and_parts() {
        let ctx = EvaluationContext::new();
        let part = Part::new("insert", PartSemantic::Solid);
        let geometry = Geometry3::Node(GeometryNode3::cuboid(DVec3::splat(2.0)).unwrap())
            .union(
                Geometry3::Node(GeometryNode3::sphere(1.0, 16).unwrap())
                    .in_part(part.clone()),
            );
        let model = ctx.evaluate(&geometry, &Environment::new()).await.unwrap();
        let options = ModelOptions::default();
        let export = assemble(&ctx, &model.build_result, &options).await.unwrap();
        assert_eq!(export.parts.len(), 2);
        assert_eq!(export.parts[0].identifier, "model");
        assert_eq!(export.parts[1].identifier, "insert");
        assert!(export.parts.iter().all(|p| p.printable));
    }

    #[tokio::test]
    async fn test_stl_flattens_to_single_part() {
        let ctx = EvaluationContext::new();
        let part = Part::new("boss", PartSemantic::Solid);
        let geometry = Geometry3::Node(GeometryNode3::cuboid(DVec3::splat(2.0)).unwrap())
            .union(
                Geometry3::Node(GeometryNode3::cuboid(DVec3::ONE).unwrap())
                    .translated(DVec3::new(3.0, 0.0, 0.0))
                    .in_part(part),
            );
        let model = ctx.evaluate(&geometry, &Environment::new()).await.unwrap();
        let options = ModelOptions {
            format: FileFormat3D::Stl,
            ..ModelOptions::default()
        };
        let export = assemble(&ctx, &model.build_result, &options).await.unwrap();
        assert_eq!(export.parts.len(), 1);
        assert_eq!(export.parts[0].mesh.triangle_count(), 24);
    }

    #[tokio::test]
    async fn test_context_parts_excluded() {
        let ctx = EvaluationContext::new();
        let part = Part::new("room", PartSemantic::Context);
        let geometry = Geometry3::Node(GeometryNode3::cuboid(DVec3::ONE).unwrap())
            .union(
                Geometry3::Node(GeometryNode3::cuboid(DVec3::splat(50.0)).unwrap())
                    .in_part(part),
            );
        let model = ctx.evaluate(&geometry, &Environment::new()).await.unwrap();
        let export = assemble(&ctx, &model.build_result, &ModelOptions::default())
            .await
            .unwrap();
        assert_eq!(export.parts.len(), 1);
    }

    #[test]
    fn test_identifier_collision_suffixes() {
        let mut taken = HashSet::new();
        assert_eq!(unique_identifier("lid", &mut taken), "lid");
        assert_eq!(unique_identifier("lid", &mut taken), "lid_2");
        assert_eq!(unique_identifier("lid", &mut taken), "lid_3");
        assert_eq!(unique_identifier("left wing", &mut taken), "left_wing");
    }

    #[tokio::test]
    async fn test_empty_model_rejected() {
        let ctx = EvaluationContext::new();
        let model = ctx
            .evaluate(&Geometry3::empty(), &Environment::new())
            .await
            .unwrap();
        let result = assemble(&ctx, &model.build_result, &ModelOptions::default()).await;
        assert!(matches!(result, Err(ExportError::EmptyModel)));
    }
}
