//! Engine integration tests: structural caching, at-most-one lowering,
//! part routing, material attribution, and the end-to-end scenarios.

use cadova_core::{
    Environment, EvaluationContext, Geometry2, Geometry3, GeometryNode2, GeometryNode3,
    Material, MeasurementScope, Part, PartSemantic,
};
use cadova_kernel::ops::BooleanOp;
use cadova_math::{Color, Segmentation, Transform3};
use glam::{DVec2, DVec3};
use std::sync::Arc;

fn fixed_env(segments: u32) -> Environment {
    Environment::new().with_segmentation(Segmentation::fixed(segments))
}

#[tokio::test]
async fn test_cylinder_prism_scenario() {
    // A cylinder at fixed(3) is a right triangular prism.
    let ctx = EvaluationContext::new();
    let node = GeometryNode3::cylinder(10.0, 10.0, 5.0, 3).unwrap();
    let result = ctx.result3(&node).await.unwrap();
    assert_eq!(result.concrete.vertex_count(), 6);
    assert_eq!(result.concrete.triangle_count(), 8);
    let expected_volume = 3.0 * 3.0_f64.sqrt() / 4.0 * 100.0 * 5.0;
    assert!((result.concrete.volume() - expected_volume).abs() < 1e-6);
    let base = 3.0 * 3.0_f64.sqrt() / 4.0 * 100.0;
    let sides = 3.0 * (10.0 * 3.0_f64.sqrt()) * 5.0;
    assert!((result.concrete.surface_area() - (2.0 * base + sides)).abs() < 1e-6);
}

#[tokio::test]
async fn test_box_scenario() {
    let ctx = EvaluationContext::new();
    let node = GeometryNode3::cuboid(DVec3::new(10.0, 20.0, 30.0)).unwrap();
    let result = ctx
        .measure(
            &cadova_core::BuildResult3::from_node(node),
            MeasurementScope::MainPart,
        )
        .await
        .unwrap();
    assert!((result.volume - 6000.0).abs() < 1e-9);
    assert!((result.surface_area - 2200.0).abs() < 1e-9);
    assert_eq!(result.bounding_box.minimum, DVec3::ZERO);
    assert_eq!(result.bounding_box.maximum, DVec3::new(10.0, 20.0, 30.0));
}

#[tokio::test]
async fn test_scaled_sphere_scenario() {
    let ctx = EvaluationContext::new();
    let sphere = Geometry3::Node(GeometryNode3::sphere(5.0, 12).unwrap())
        .scaled(DVec3::new(2.0, 1.0, 1.0));
    let env = fixed_env(12);
    let model = ctx.evaluate(&sphere, &env).await.unwrap();
    let measured = ctx
        .measure(&model.build_result, MeasurementScope::MainPart)
        .await
        .unwrap();
    let bounds = measured.bounding_box;
    assert!((bounds.minimum.x + 10.0).abs() < 1e-6);
    assert!((bounds.maximum.x - 10.0).abs() < 1e-6);
    assert!((bounds.minimum.y + 5.0).abs() < 1e-6);
    assert!((bounds.maximum.z - 5.0).abs() < 1e-6);
    let ideal = 4.0 / 3.0 * std::f64::consts::PI * 125.0 * 2.0;
    // Coarse segmentation undershoots the ideal volume substantially.
    assert!(measured.volume > ideal * 0.8 && measured.volume < ideal * 1.05);
}

#[tokio::test]
async fn test_annular_prism_fingerprints_match() {
    let make = || {
        let outer = GeometryNode3::cylinder(10.0, 10.0, 10.0, 32).unwrap();
        let inner = GeometryNode3::cylinder(5.0, 5.0, 10.0, 32).unwrap();
        GeometryNode3::boolean(vec![outer, inner], BooleanOp::Difference)
    };
    assert_eq!(make().fingerprint(), make().fingerprint());
}

#[tokio::test]
async fn test_structural_cache_hit_invokes_kernel_once() {
    let ctx = EvaluationContext::new();
    let a = GeometryNode3::sphere(5.0, 24).unwrap();
    let b = GeometryNode3::sphere(5.0, 24).unwrap();
    let first = ctx.result3(&a).await.unwrap();
    let calls_after_first = ctx.kernel_invocation_count();
    let second = ctx.result3(&b).await.unwrap();
    assert_eq!(ctx.kernel_invocation_count(), calls_after_first);
    assert_eq!(
        first.concrete.triangle_count(),
        second.concrete.triangle_count()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_at_most_one_computation_under_contention() {
    let ctx = EvaluationContext::new();
    let node = GeometryNode3::sphere(4.0, 48).unwrap();
    let mut handles = Vec::new();
    for _ in 0..16 {
        let ctx = ctx.clone();
        let node = node.clone();
        handles.push(tokio::spawn(async move { ctx.result3(&node).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(ctx.kernel_invocation_count(), 1);
}

#[tokio::test]
async fn test_part_routing() {
    let ctx = EvaluationContext::new();
    let part = Part::new("insert", PartSemantic::Solid);
    let main = Geometry3::Node(GeometryNode3::cuboid(DVec3::splat(2.0)).unwrap());
    let routed = Geometry3::Node(GeometryNode3::sphere(1.0, 16).unwrap())
        .in_part(part.clone());
    let model = ctx
        .evaluate(&main.union(routed), &Environment::new())
        .await
        .unwrap();

    // The routed geometry does not appear inline.
    let main_concrete = ctx.result3(&model.build_result.node).await.unwrap();
    assert!((main_concrete.concrete.volume() - 8.0).abs() < 1e-6);

    // It appears in the catalog exactly once.
    let bucket = model.build_result.elements.parts.get(&part).unwrap();
    assert_eq!(bucket.len(), 1);
    let routed_concrete = ctx.result3(&bucket[0].node).await.unwrap();
    assert!(routed_concrete.concrete.volume() > 0.0);
}

#[tokio::test]
async fn test_part_transform_follows_routing() {
    let ctx = EvaluationContext::new();
    let part = Part::new("shifted", PartSemantic::Solid);
    let routed = Geometry3::Node(GeometryNode3::cuboid(DVec3::ONE).unwrap())
        .in_part(part.clone())
        .translated(DVec3::new(5.0, 0.0, 0.0));
    let model = ctx.evaluate(&routed, &Environment::new()).await.unwrap();
    let bucket = model.build_result.elements.parts.get(&part).unwrap();
    let concrete = ctx.result3(&bucket[0].node).await.unwrap();
    assert!((concrete.concrete.bounding_box().minimum.x - 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_material_attribution_partitions_triangles() {
    let ctx = EvaluationContext::new();
    let red = Material::named("red", Color::rgb(1.0, 0.0, 0.0));
    let blue = Material::named("blue", Color::rgb(0.0, 0.0, 1.0));
    let a = Geometry3::Node(GeometryNode3::cuboid(DVec3::splat(2.0)).unwrap())
        .with_material(red.clone());
    let b = Geometry3::Node(GeometryNode3::cuboid(DVec3::splat(2.0)).unwrap())
        .translated(DVec3::new(1.0, 0.0, 0.0))
        .with_material(blue.clone());
    let model = ctx.evaluate(&a.union(b), &Environment::new()).await.unwrap();
    let result = ctx.result3(&model.build_result.node).await.unwrap();

    assert_eq!(result.materials.len(), 2);
    // Every triangle's ID maps to exactly one material.
    for &original in result.concrete.originals() {
        let material = result.materials.get(original).expect("unmapped triangle");
        assert!(material == &red || material == &blue);
    }
}

#[tokio::test]
async fn test_difference_subtrahend_sees_subtraction_environment() {
    use cadova_core::Operation;
    let ctx = EvaluationContext::new();
    let observed = Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = observed.clone();
    let probe = Geometry3::read_environment(move |env| {
        log.lock().unwrap().push(env.operation());
        Geometry3::Node(GeometryNode3::cuboid(DVec3::ONE).unwrap())
    });
    let base = Geometry3::Node(GeometryNode3::cuboid(DVec3::splat(3.0)).unwrap());
    ctx.evaluate(&base.difference(probe), &Environment::new())
        .await
        .unwrap();
    assert_eq!(*observed.lock().unwrap(), vec![Operation::Subtraction]);
}

#[tokio::test]
async fn test_helical_extrusion_scenario() {
    let ctx = EvaluationContext::new();
    let profile = Geometry2::Node(GeometryNode2::rectangle(DVec2::new(2.0, 1.0)).unwrap());
    let helix = Geometry3::Extruded {
        child: Box::new(profile),
        request: cadova_core::ExtrusionRequest::Helical {
            pitch: 10.0,
            height: 20.0,
        },
    };
    let model = ctx.evaluate(&helix, &fixed_env(16)).await.unwrap();
    let result = ctx.result3(&model.build_result.node).await.unwrap();
    assert!(result.concrete.is_manifold());
    let bounds = result.concrete.bounding_box();
    assert!((bounds.maximum.z - bounds.minimum.z - 20.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_measure_combinator_reenters_composition() {
    // Grow a pedestal to match the measured height of the target.
    let ctx = EvaluationContext::new();
    let target = Geometry3::Node(GeometryNode3::cuboid(DVec3::new(1.0, 1.0, 7.0)).unwrap());
    let with_pedestal = Geometry3::Measure {
        target: Box::new(target),
        builder: Arc::new(|result, measurements| {
            let height = measurements.bounding_box.size().z;
            let pedestal = GeometryNode3::cuboid(DVec3::new(4.0, 4.0, height / 2.0))
                .expect("pedestal");
            Geometry3::Node(result.node.clone())
                .union(Geometry3::Node(pedestal))
        }),
    };
    let model = ctx
        .evaluate(&with_pedestal, &Environment::new())
        .await
        .unwrap();
    let measured = ctx
        .measure(&model.build_result, MeasurementScope::MainPart)
        .await
        .unwrap();
    // 1x1x7 target plus 4x4x3.5 pedestal, overlapping 1x1x3.5.
    let expected = 7.0 + 56.0 - 3.5;
    assert!((measured.volume - expected).abs() < 0.1, "volume {}", measured.volume);
}

#[tokio::test]
async fn test_cached_boxed_builds_once() {
    let ctx = EvaluationContext::new();
    let builds = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = builds.clone();
    let geometry = Geometry3::CachedBoxed {
        name: "imported-part".into(),
        parameters: vec![],
        thunk: Arc::new(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Geometry3::Node(GeometryNode3::cuboid(DVec3::ONE).unwrap())
        }),
    };
    let env = Environment::new();
    ctx.evaluate(&geometry, &env).await.unwrap();
    ctx.evaluate(&geometry, &env).await.unwrap();
    assert_eq!(builds.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failure_is_replayed_not_retried() {
    let ctx = EvaluationContext::new();
    let attempts = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = attempts.clone();
    let node = GeometryNode3::cached_operation(
        &GeometryNode3::cuboid(DVec3::ONE).unwrap(),
        "explode",
        vec![],
        Arc::new(move |_mesh| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(cadova_kernel::KernelError::empty("explode"))
        }),
    );
    let first = ctx.result3(&node).await;
    let second = ctx.result3(&node).await;
    assert!(first.is_err());
    assert_eq!(first.unwrap_err(), second.unwrap_err());
    assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancellation_surfaces() {
    let ctx = EvaluationContext::new();
    ctx.cancel();
    let node = GeometryNode3::cuboid(DVec3::ONE).unwrap();
    assert!(matches!(
        ctx.result3(&node).await,
        Err(cadova_core::EvaluationError::Cancelled)
    ));
}

#[tokio::test]
async fn test_transform_distributivity() {
    // concrete(transform(t, c)) == kernel.transform(concrete(c), t).
    let ctx = EvaluationContext::new();
    let child = GeometryNode3::sphere(3.0, 16).unwrap();
    let t = Transform3::translation(DVec3::new(1.0, 2.0, 3.0))
        .concatenated(&Transform3::scaling(DVec3::new(2.0, 1.0, 1.0)));
    let wrapped = GeometryNode3::transform(t, &child);
    let via_node = ctx.result3(&wrapped).await.unwrap();
    let direct = ctx.result3(&child).await.unwrap().concrete.transformed(&t);
    assert_eq!(via_node.concrete.triangle_count(), direct.triangle_count());
    assert!(
        (via_node.concrete.volume() - direct.volume()).abs() < 1e-9,
        "volumes diverge"
    );
}

#[tokio::test]
async fn test_swept_profile_is_manifold() {
    use cadova_math::{BezierCurve, BezierPath};
    let ctx = EvaluationContext::new();
    let profile = Geometry2::Node(GeometryNode2::circle(1.0, 16).unwrap());
    let path = BezierPath::from_curve(
        BezierCurve::new(vec![
            DVec3::ZERO,
            DVec3::new(0.0, 5.0, 5.0),
            DVec3::new(0.0, 0.0, 10.0),
        ])
        .unwrap(),
    );
    let swept = Geometry3::Swept {
        child: Box::new(profile),
        path,
    };
    let model = ctx.evaluate(&swept, &fixed_env(16)).await.unwrap();
    let result = ctx.result3(&model.build_result.node).await.unwrap();
    assert!(result.concrete.is_manifold());
    assert!(result.concrete.volume() > 0.0);
}

#[tokio::test]
async fn test_projection_roundtrip_through_engine() {
    use cadova_core::ProjectionKind;
    let ctx = EvaluationContext::new();
    let solid = GeometryNode3::cuboid(DVec3::new(2.0, 3.0, 4.0)).unwrap();
    let sliced = GeometryNode2::projection(&solid, ProjectionKind::Slice { z: 1.0 });
    let section = ctx.result2(&sliced).await.unwrap();
    assert!((section.concrete.area() - 6.0).abs() < 1e-6);
}
