//! # Evaluation Engine
//!
//! Asynchronous, deduplicating, structurally-cached lowering of geometry
//! to concretes. Building turns a [`Geometry3`]/[`Geometry2`] into a
//! scene node plus result elements; concretization turns a node into a
//! kernel mesh or polygon set, at most once per fingerprint over the
//! process lifetime.

mod cache;

pub use cache::PromiseCache;

use crate::build_result::{BuildResult2, BuildResult3, EvaluatedModel};
use crate::elements::{MaterialMapping, PartSemantic};
use crate::environment::Environment;
use crate::error::EvaluationError;
use crate::fingerprint::{fingerprint_of_key, Fingerprint, FingerprintHasher};
use crate::geometry::{ExtrusionRequest, Geometry2, Geometry3};
use crate::measure::{MeasurementScope, Measurements2, Measurements3};
use crate::node::{
    ExtrusionSpec, GeometryNode2, GeometryNode3, MaskSplitSide, NodeKind2, NodeKind3,
    ProjectionKind, Shape2, Shape3, SplitSide,
};
use cadova_kernel::ops::{self, BooleanOp, LinearExtrusion};
use cadova_kernel::{Mesh, OriginalId, PolygonSet};
use cadova_math::{sweep_frames, FrameOptions, Transform3};
use glam::DVec2;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, EvaluationError>> + Send + 'a>>;

/// A concretized 3D node: the mesh and the material attribution produced
/// while lowering it.
#[derive(Debug, Clone, Default)]
pub struct ConcreteResult3 {
    /// The kernel mesh.
    pub concrete: Arc<Mesh>,
    /// Original-ID to material mapping for the mesh's triangles.
    pub materials: MaterialMapping,
}

/// A concretized 2D node.
#[derive(Debug, Clone, Default)]
pub struct ConcreteResult2 {
    /// The kernel polygon set.
    pub concrete: Arc<PolygonSet>,
}

struct ContextInner {
    meshes: PromiseCache<Fingerprint, ConcreteResult3>,
    polygons: PromiseCache<Fingerprint, ConcreteResult2>,
    builds3: PromiseCache<Fingerprint, BuildResult3>,
    builds2: PromiseCache<Fingerprint, BuildResult2>,
    cancelled: AtomicBool,
    kernel_calls: AtomicU64,
}

/// The evaluation context: shared caches plus cooperative cancellation.
///
/// Cloning shares the same caches; a context is meant to live for the
/// whole process so structurally equal nodes concretize once.
#[derive(Clone)]
pub struct EvaluationContext {
    inner: Arc<ContextInner>,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationContext {
    /// A fresh context with empty caches.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                meshes: PromiseCache::new(),
                polygons: PromiseCache::new(),
                builds3: PromiseCache::new(),
                builds2: PromiseCache::new(),
                cancelled: AtomicBool::new(false),
                kernel_calls: AtomicU64::new(0),
            }),
        }
    }

    /// Requests cooperative cancellation; in-flight work stops at its
    /// next checkpoint.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// Number of kernel computations performed so far.
    pub fn kernel_invocation_count(&self) -> u64 {
        self.inner.kernel_calls.load(Ordering::SeqCst)
    }

    fn check_cancelled(&self) -> Result<(), EvaluationError> {
        if self.inner.cancelled.load(Ordering::SeqCst) {
            Err(EvaluationError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn count_kernel_call(&self) {
        self.inner.kernel_calls.fetch_add(1, Ordering::SeqCst);
    }

    // =========================================================================
    // TOP LEVEL
    // =========================================================================

    /// Builds a 3D geometry into a fully evaluated model.
    pub async fn evaluate(
        &self,
        geometry: &Geometry3,
        environment: &Environment,
    ) -> Result<EvaluatedModel, EvaluationError> {
        let build_result = self.build3(geometry, environment).await?;
        let mut warnings = Vec::new();
        if build_result.node.is_empty() && build_result.elements.parts.is_empty() {
            warnings.push("model evaluated to empty geometry".to_string());
        }
        Ok(EvaluatedModel {
            build_result,
            warnings,
        })
    }

    /// Measures a build result over the requested scope.
    pub async fn measure(
        &self,
        result: &BuildResult3,
        scope: MeasurementScope,
    ) -> Result<Measurements3, EvaluationError> {
        let mut collected = Vec::new();
        let main = self.result3(&result.node).await?;
        collected.push(Measurements3::from_mesh(&main.concrete));
        if !matches!(scope, MeasurementScope::MainPart) {
            for (part, results) in result.elements.parts.iter() {
                let included = match scope {
                    MeasurementScope::MainPart => false,
                    MeasurementScope::SolidParts => part.semantic() == PartSemantic::Solid,
                    MeasurementScope::AllParts => true,
                };
                if !included {
                    continue;
                }
                for entry in results {
                    let concrete = self.result3(&entry.node).await?;
                    collected.push(Measurements3::from_mesh(&concrete.concrete));
                }
            }
        }
        Ok(Measurements3::combined(collected.iter()))
    }

    // =========================================================================
    // BUILDING
    // =========================================================================

    /// Builds a 3D geometry in an environment.
    pub fn build3<'a>(
        &'a self,
        geometry: &'a Geometry3,
        environment: &'a Environment,
    ) -> BoxFuture<'a, BuildResult3> {
        Box::pin(async move {
            self.check_cancelled()?;
            match geometry {
                Geometry3::Node(node) => Ok(BuildResult3::from_node(node.clone())),
                Geometry3::Boolean { children, kind } => {
                    let mut results = Vec::with_capacity(children.len());
                    for (index, child) in children.iter().enumerate() {
                        let child_environment =
                            if *kind == BooleanOp::Difference && index > 0 {
                                environment.subtracting()
                            } else {
                                environment.clone()
                            };
                        results.push(self.build3(child, &child_environment).await?);
                    }
                    Ok(BuildResult3::merge_boolean(results, *kind))
                }
                Geometry3::Transformed { child, transform } => {
                    let child_environment = environment.applying_transform(transform);
                    let result = self.build3(child, &child_environment).await?;
                    Ok(result.transformed(transform))
                }
                Geometry3::ModifyEnvironment { child, modifier } => {
                    let rewritten = modifier(environment);
                    self.build3(child, &rewritten).await
                }
                Geometry3::RewriteNode { child, function } => {
                    let result = self.build3(child, environment).await?;
                    Ok(BuildResult3 {
                        node: function(result.node),
                        elements: result.elements,
                    })
                }
                Geometry3::CachingPrimitive {
                    child,
                    name,
                    parameters,
                    function,
                } => {
                    let result = self.build3(child, environment).await?;
                    Ok(BuildResult3 {
                        node: GeometryNode3::cached_operation(
                            &result.node,
                            name.clone(),
                            parameters.clone(),
                            function.clone(),
                        ),
                        elements: result.elements,
                    })
                }
                Geometry3::Warped {
                    child,
                    name,
                    parameters,
                    function,
                } => {
                    let result = self.build3(child, environment).await?;
                    Ok(BuildResult3 {
                        node: GeometryNode3::warp(
                            &result.node,
                            name.clone(),
                            parameters.clone(),
                            function.clone(),
                        ),
                        elements: result.elements,
                    })
                }
                Geometry3::Measure { target, builder } => {
                    let result = self.build3(target, environment).await?;
                    let measurements =
                        self.measure(&result, MeasurementScope::MainPart).await?;
                    let continued = builder(&result, &measurements);
                    self.build3(&continued, environment).await
                }
                Geometry3::ReadPrimitive { child, action } => {
                    let result = self.build3(child, environment).await?;
                    let concrete = self.result3(&result.node).await?;
                    let continued = action(&concrete.concrete, &result);
                    self.build3(&continued, environment).await
                }
                Geometry3::CachedBoxed {
                    name,
                    parameters,
                    thunk,
                } => {
                    let key = cached_build_key(name, parameters, environment);
                    let ctx = self.clone();
                    let thunk = thunk.clone();
                    let environment = environment.clone();
                    self.inner
                        .builds3
                        .get_or_compute(key, move || async move {
                            let produced = thunk();
                            ctx.build3(&produced, &environment).await
                        })
                        .await
                }
                Geometry3::ReadEnvironment { function } => {
                    let continued = function(environment);
                    self.build3(&continued, environment).await
                }
                Geometry3::InPart { part, child } => {
                    let environment = match part.default_material() {
                        Some(material) => environment.with_material(material.clone()),
                        None => environment.clone(),
                    };
                    let result = self.build3(child, &environment).await?;
                    let mut elements = result.elements.clone();
                    elements.parts.insert(part.clone(), result);
                    // The subtree is routed aside, not inlined.
                    Ok(BuildResult3 {
                        node: GeometryNode3::empty(),
                        elements,
                    })
                }
                Geometry3::MainPart { part, child } => {
                    let result = self.build3(child, environment).await?;
                    let mut elements = result.elements.clone();
                    elements.parts.insert(part.clone(), result.clone());
                    Ok(BuildResult3 {
                        node: result.node,
                        elements,
                    })
                }
                Geometry3::WithMaterial { material, child } => {
                    let child_environment = environment.with_material(material.clone());
                    let result = self.build3(child, &child_environment).await?;
                    Ok(BuildResult3 {
                        node: GeometryNode3::with_material(&result.node, material.clone()),
                        elements: result.elements,
                    })
                }
                Geometry3::Anchor { name, child } => {
                    let mut result = self.build3(child, environment).await?;
                    result
                        .elements
                        .anchors
                        .insert(name.clone(), Transform3::IDENTITY);
                    Ok(result)
                }
                Geometry3::Tagged { name, child } => {
                    let result = self.build3(child, environment).await?;
                    let mut elements = result.elements.clone();
                    elements.tags.insert(name.clone(), result.clone());
                    Ok(BuildResult3 {
                        node: result.node,
                        elements,
                    })
                }
                Geometry3::Extruded { child, request } => {
                    let profile = self.build2(child, environment).await?;
                    let spec = self
                        .resolve_extrusion(&profile.node, request, environment)
                        .await?;
                    Ok(BuildResult3 {
                        node: GeometryNode3::extrusion(profile.node, spec),
                        elements: profile.elements,
                    })
                }
                Geometry3::Swept { child, path } => {
                    let profile = self.build2(child, environment).await?;
                    let options = FrameOptions {
                        max_twist_rate: environment.max_twist_rate(),
                        ..FrameOptions::default()
                    };
                    let frames = sweep_frames(
                        path,
                        &environment.scaled_segmentation(),
                        &options,
                    )?;
                    let transforms = frames.iter().map(|f| f.transform).collect();
                    Ok(BuildResult3 {
                        node: GeometryNode3::sweep(profile.node, transforms),
                        elements: profile.elements,
                    })
                }
            }
        })
    }

    /// Builds a 2D geometry in an environment.
    pub fn build2<'a>(
        &'a self,
        geometry: &'a Geometry2,
        environment: &'a Environment,
    ) -> BoxFuture<'a, BuildResult2> {
        Box::pin(async move {
            self.check_cancelled()?;
            match geometry {
                Geometry2::Node(node) => Ok(BuildResult2::from_node(node.clone())),
                Geometry2::Boolean { children, kind } => {
                    let mut results = Vec::with_capacity(children.len());
                    for (index, child) in children.iter().enumerate() {
                        let child_environment =
                            if *kind == BooleanOp::Difference && index > 0 {
                                environment.subtracting()
                            } else {
                                environment.clone()
                            };
                        results.push(self.build2(child, &child_environment).await?);
                    }
                    Ok(BuildResult2::merge_boolean(results, *kind))
                }
                Geometry2::Transformed { child, transform } => {
                    let child_environment =
                        environment.applying_transform(&transform.to_3d());
                    let result = self.build2(child, &child_environment).await?;
                    Ok(BuildResult2 {
                        node: GeometryNode2::transform(*transform, &result.node),
                        elements: result.elements,
                    })
                }
                Geometry2::ModifyEnvironment { child, modifier } => {
                    let rewritten = modifier(environment);
                    self.build2(child, &rewritten).await
                }
                Geometry2::RewriteNode { child, function } => {
                    let result = self.build2(child, environment).await?;
                    Ok(BuildResult2 {
                        node: function(result.node),
                        elements: result.elements,
                    })
                }
                Geometry2::CachingPrimitive {
                    child,
                    name,
                    parameters,
                    function,
                } => {
                    let result = self.build2(child, environment).await?;
                    Ok(BuildResult2 {
                        node: GeometryNode2::cached_operation(
                            &result.node,
                            name.clone(),
                            parameters.clone(),
                            function.clone(),
                        ),
                        elements: result.elements,
                    })
                }
                Geometry2::Warped {
                    child,
                    name,
                    parameters,
                    function,
                } => {
                    let result = self.build2(child, environment).await?;
                    Ok(BuildResult2 {
                        node: GeometryNode2::warp(
                            &result.node,
                            name.clone(),
                            parameters.clone(),
                            function.clone(),
                        ),
                        elements: result.elements,
                    })
                }
                Geometry2::Measure { target, builder } => {
                    let result = self.build2(target, environment).await?;
                    let concrete = self.result2(&result.node).await?;
                    let measurements = Measurements2::from_polygon_set(&concrete.concrete);
                    let continued = builder(&result, &measurements);
                    self.build2(&continued, environment).await
                }
                Geometry2::ReadPrimitive { child, action } => {
                    let result = self.build2(child, environment).await?;
                    let concrete = self.result2(&result.node).await?;
                    let continued = action(&concrete.concrete, &result);
                    self.build2(&continued, environment).await
                }
                Geometry2::CachedBoxed {
                    name,
                    parameters,
                    thunk,
                } => {
                    let key = cached_build_key(name, parameters, environment);
                    let ctx = self.clone();
                    let thunk = thunk.clone();
                    let environment = environment.clone();
                    self.inner
                        .builds2
                        .get_or_compute(key, move || async move {
                            let produced = thunk();
                            ctx.build2(&produced, &environment).await
                        })
                        .await
                }
                Geometry2::ReadEnvironment { function } => {
                    let continued = function(environment);
                    self.build2(&continued, environment).await
                }
                Geometry2::Projected { child, kind } => {
                    let result = self.build3(child, environment).await?;
                    Ok(BuildResult2 {
                        node: GeometryNode2::projection(&result.node, kind.clone()),
                        elements: result.elements,
                    })
                }
                Geometry2::Offset {
                    child,
                    distance,
                    join,
                } => {
                    let result = self.build2(child, environment).await?;
                    let arc_segments = environment
                        .scaled_segmentation()
                        .segment_count(distance.abs());
                    Ok(BuildResult2 {
                        node: GeometryNode2::offset(
                            &result.node,
                            *distance,
                            *join,
                            arc_segments,
                        ),
                        elements: result.elements,
                    })
                }
            }
        })
    }

    /// Resolves an extrusion request's sampling against the environment,
    /// concretizing the profile when a radius is needed.
    async fn resolve_extrusion(
        &self,
        profile: &GeometryNode2,
        request: &ExtrusionRequest,
        environment: &Environment,
    ) -> Result<ExtrusionSpec, EvaluationError> {
        let segmentation = environment.scaled_segmentation();
        match request {
            ExtrusionRequest::Linear {
                height,
                twist,
                scale_top,
            } => {
                let slices = if twist.radians().abs() < f64::EPSILON {
                    1
                } else {
                    let radius = self.profile_radius(profile).await?;
                    segmentation.arc_segment_count(radius, *twist).max(1)
                };
                Ok(ExtrusionSpec::Linear {
                    height: *height,
                    twist: *twist,
                    scale_top: *scale_top,
                    slices,
                })
            }
            ExtrusionRequest::Helical { pitch, height } => {
                let radius = self.profile_radius(profile).await?;
                Ok(ExtrusionSpec::Helical {
                    pitch: *pitch,
                    height: *height,
                    segments_per_turn: segmentation.segment_count(radius),
                })
            }
            ExtrusionRequest::Revolve { angle } => {
                let radius = self.profile_radius(profile).await?;
                Ok(ExtrusionSpec::Revolve {
                    angle: *angle,
                    segment_count: segmentation.arc_segment_count(radius, *angle),
                })
            }
        }
    }

    /// The largest distance of the profile from the origin, used to drive
    /// angular sampling.
    async fn profile_radius(&self, profile: &GeometryNode2) -> Result<f64, EvaluationError> {
        let concrete = self.result2(profile).await?;
        let bounds = concrete.concrete.bounding_box();
        if bounds.is_empty() {
            return Ok(0.0);
        }
        let corners = [
            bounds.minimum,
            DVec2::new(bounds.maximum.x, bounds.minimum.y),
            DVec2::new(bounds.minimum.x, bounds.maximum.y),
            bounds.maximum,
        ];
        Ok(corners
            .iter()
            .map(|c| c.length())
            .fold(0.0, f64::max))
    }

    // =========================================================================
    // CONCRETIZATION
    // =========================================================================

    /// Concretizes a 3D node, at most once per fingerprint.
    pub async fn result3(
        &self,
        node: &GeometryNode3,
    ) -> Result<ConcreteResult3, EvaluationError> {
        self.check_cancelled()?;
        let key = node.fingerprint();
        let ctx = self.clone();
        let node = node.clone();
        self.inner
            .meshes
            .get_or_compute(key, move || async move { ctx.lower3(&node).await })
            .await
    }

    /// Concretizes a 2D node, at most once per fingerprint.
    pub async fn result2(
        &self,
        node: &GeometryNode2,
    ) -> Result<ConcreteResult2, EvaluationError> {
        self.check_cancelled()?;
        let key = node.fingerprint();
        let ctx = self.clone();
        let node = node.clone();
        self.inner
            .polygons
            .get_or_compute(key, move || async move { ctx.lower2(&node).await })
            .await
    }

    fn lower3<'a>(&'a self, node: &'a GeometryNode3) -> BoxFuture<'a, ConcreteResult3> {
        Box::pin(async move {
            self.check_cancelled()?;
            log::debug!("lowering 3d node: {}", node.variant_tag());
            match node.kind() {
                NodeKind3::Empty => Ok(ConcreteResult3::default()),
                NodeKind3::Shape(shape) => {
                    self.count_kernel_call();
                    let mesh = lower_shape3(shape)?;
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(mesh),
                        materials: MaterialMapping::new(),
                    })
                }
                NodeKind3::Transform { child, transform } => {
                    let child_result = self.result3(child).await?;
                    self.count_kernel_call();
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(child_result.concrete.transformed(transform)),
                        materials: child_result.materials,
                    })
                }
                NodeKind3::Boolean { children, kind } => {
                    let results = self.lower_children(children).await?;
                    self.count_kernel_call();
                    let operands: Vec<&Mesh> =
                        results.iter().map(|r| r.concrete.as_ref()).collect();
                    let combined = ops::boolean(&operands, *kind)?;
                    let materials =
                        MaterialMapping::merged(results.iter().map(|r| &r.materials));
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(combined),
                        materials,
                    })
                }
                NodeKind3::Extrusion { child, spec } => {
                    let profile = self.result2(child).await?;
                    self.count_kernel_call();
                    let mesh = match spec {
                        ExtrusionSpec::Linear {
                            height,
                            twist,
                            scale_top,
                            slices,
                        } => ops::extrude_linear(
                            &profile.concrete,
                            &LinearExtrusion {
                                height: *height,
                                twist: *twist,
                                scale_top: *scale_top,
                                slices: *slices,
                            },
                            OriginalId::UNTRACKED,
                        )?,
                        ExtrusionSpec::Helical {
                            pitch,
                            height,
                            segments_per_turn,
                        } => ops::extrude_helical(
                            &profile.concrete,
                            *pitch,
                            *height,
                            *segments_per_turn,
                            OriginalId::UNTRACKED,
                        )?,
                        ExtrusionSpec::Revolve {
                            angle,
                            segment_count,
                        } => ops::revolve(
                            &profile.concrete,
                            *angle,
                            *segment_count,
                            OriginalId::UNTRACKED,
                        )?,
                    };
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(mesh),
                        materials: MaterialMapping::new(),
                    })
                }
                NodeKind3::Sweep { child, frames } => {
                    let profile = self.result2(child).await?;
                    self.count_kernel_call();
                    let mesh = ops::sweep(&profile.concrete, frames, OriginalId::UNTRACKED)?;
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(mesh),
                        materials: MaterialMapping::new(),
                    })
                }
                NodeKind3::ConvexHull { child } => {
                    let child_result = self.result3(child).await?;
                    self.count_kernel_call();
                    let hull =
                        ops::convex_hull(child_result.concrete.vertices(), OriginalId::UNTRACKED)?;
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(hull),
                        materials: child_result.materials,
                    })
                }
                NodeKind3::HullWithPoints { points, child } => {
                    let child_result = self.result3(child).await?;
                    self.count_kernel_call();
                    let hull = ops::convex_hull_adding(
                        &child_result.concrete,
                        points,
                        OriginalId::UNTRACKED,
                    )?;
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(hull),
                        materials: child_result.materials,
                    })
                }
                NodeKind3::Refine {
                    child,
                    max_edge_length,
                } => {
                    let child_result = self.result3(child).await?;
                    self.count_kernel_call();
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(ops::refine(
                            &child_result.concrete,
                            *max_edge_length,
                        )?),
                        materials: child_result.materials,
                    })
                }
                NodeKind3::Simplify { child, epsilon } => {
                    let child_result = self.result3(child).await?;
                    self.count_kernel_call();
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(ops::simplify(&child_result.concrete, *epsilon)?),
                        materials: child_result.materials,
                    })
                }
                NodeKind3::SplitPlane { child, plane, side } => {
                    let child_result = self.result3(child).await?;
                    self.count_kernel_call();
                    let (positive, negative) =
                        ops::split_by_plane(&child_result.concrete, plane)?;
                    let kept = match side {
                        SplitSide::Positive => positive,
                        SplitSide::Negative => negative,
                    };
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(kept),
                        materials: child_result.materials,
                    })
                }
                NodeKind3::SplitMask { child, mask, side } => {
                    let child_result = self.result3(child).await?;
                    let mask_result = self.result3(mask).await?;
                    self.count_kernel_call();
                    let (remainder, overlap) =
                        ops::split_by_mask(&child_result.concrete, &mask_result.concrete)?;
                    let kept = match side {
                        MaskSplitSide::Remainder => remainder,
                        MaskSplitSide::Overlap => overlap,
                    };
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(kept),
                        materials: MaterialMapping::merged([
                            &child_result.materials,
                            &mask_result.materials,
                        ]),
                    })
                }
                NodeKind3::Warp {
                    child, function, ..
                } => {
                    let child_result = self.result3(child).await?;
                    self.count_kernel_call();
                    let function = function.clone();
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(ops::warp(&child_result.concrete, move |v| {
                            function(v)
                        })?),
                        materials: child_result.materials,
                    })
                }
                NodeKind3::CachedOperation {
                    child, function, ..
                } => {
                    let child_result = self.result3(child).await?;
                    self.count_kernel_call();
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(function(&child_result.concrete)?),
                        materials: child_result.materials,
                    })
                }
                NodeKind3::Material { child, material } => {
                    let child_result = self.result3(child).await?;
                    let fresh = OriginalId::fresh();
                    // Inner materials win: only untagged triangles take
                    // this subtree's material.
                    let retagged = retag_unmapped(
                        &child_result.concrete,
                        &child_result.materials,
                        fresh,
                    );
                    let mut materials = child_result.materials.clone();
                    materials.insert(fresh, material.clone());
                    Ok(ConcreteResult3 {
                        concrete: Arc::new(retagged),
                        materials,
                    })
                }
            }
        })
    }

    /// Lowers boolean operands concurrently, preserving declared order.
    async fn lower_children(
        &self,
        children: &[GeometryNode3],
    ) -> Result<Vec<ConcreteResult3>, EvaluationError> {
        let mut join_set = tokio::task::JoinSet::new();
        for (index, child) in children.iter().enumerate() {
            let ctx = self.clone();
            let child = child.clone();
            join_set.spawn(async move { (index, ctx.result3(&child).await) });
        }
        let mut results: Vec<Option<ConcreteResult3>> = vec![None; children.len()];
        while let Some(joined) = join_set.join_next().await {
            let (index, result) = joined.map_err(|_| EvaluationError::Cancelled)?;
            results[index] = Some(result?);
        }
        Ok(results.into_iter().flatten().collect())
    }

    fn lower2<'a>(&'a self, node: &'a GeometryNode2) -> BoxFuture<'a, ConcreteResult2> {
        Box::pin(async move {
            self.check_cancelled()?;
            log::debug!("lowering 2d node: {}", node.variant_tag());
            match node.kind() {
                NodeKind2::Empty => Ok(ConcreteResult2::default()),
                NodeKind2::Shape(shape) => {
                    self.count_kernel_call();
                    let set = lower_shape2(shape)?;
                    Ok(ConcreteResult2 {
                        concrete: Arc::new(set),
                    })
                }
                NodeKind2::Transform { child, transform } => {
                    let child_result = self.result2(child).await?;
                    self.count_kernel_call();
                    Ok(ConcreteResult2 {
                        concrete: Arc::new(child_result.concrete.transformed(transform)),
                    })
                }
                NodeKind2::Boolean { children, kind } => {
                    let mut operands = Vec::with_capacity(children.len());
                    for child in children {
                        let result = self.result2(child).await?;
                        operands.push((*result.concrete).clone());
                    }
                    self.count_kernel_call();
                    Ok(ConcreteResult2 {
                        concrete: Arc::new(ops::boolean_2d(&operands, *kind)?),
                    })
                }
                NodeKind2::Projection { child, kind } => {
                    let solid = self.result3(child).await?;
                    self.count_kernel_call();
                    let set = match kind {
                        ProjectionKind::Slice { z } => ops::slice_at(&solid.concrete, *z)?,
                        ProjectionKind::Orthographic => ops::project(&solid.concrete)?,
                        ProjectionKind::AlongPlane(plane) => {
                            ops::cross_section(&solid.concrete, plane)?
                        }
                    };
                    Ok(ConcreteResult2 {
                        concrete: Arc::new(set),
                    })
                }
                NodeKind2::Offset {
                    child,
                    distance,
                    join,
                    arc_segments,
                } => {
                    let child_result = self.result2(child).await?;
                    self.count_kernel_call();
                    Ok(ConcreteResult2 {
                        concrete: Arc::new(ops::offset(
                            &child_result.concrete,
                            *distance,
                            *join,
                            *arc_segments,
                        )?),
                    })
                }
                NodeKind2::ConvexHull { child } => {
                    let child_result = self.result2(child).await?;
                    self.count_kernel_call();
                    let points = child_result.concrete.all_points();
                    Ok(ConcreteResult2 {
                        concrete: Arc::new(ops::convex_hull_2d(&points)?),
                    })
                }
                NodeKind2::Simplify { child, epsilon } => {
                    let child_result = self.result2(child).await?;
                    self.count_kernel_call();
                    Ok(ConcreteResult2 {
                        concrete: Arc::new(ops::simplify_2d(
                            &child_result.concrete,
                            *epsilon,
                        )?),
                    })
                }
                NodeKind2::Warp {
                    child, function, ..
                } => {
                    let child_result = self.result2(child).await?;
                    self.count_kernel_call();
                    let function = function.clone();
                    Ok(ConcreteResult2 {
                        concrete: Arc::new(ops::warp_2d(&child_result.concrete, move |p| {
                            function(p)
                        })?),
                    })
                }
                NodeKind2::CachedOperation {
                    child, function, ..
                } => {
                    let child_result = self.result2(child).await?;
                    self.count_kernel_call();
                    Ok(ConcreteResult2 {
                        concrete: Arc::new(function(&child_result.concrete)?),
                    })
                }
            }
        })
    }
}

fn lower_shape3(shape: &Shape3) -> Result<Mesh, EvaluationError> {
    let mesh = match shape {
        Shape3::Cuboid { size } => {
            cadova_kernel::primitives::cuboid(*size, OriginalId::UNTRACKED)?
        }
        Shape3::Cylinder {
            bottom_radius,
            top_radius,
            height,
            segment_count,
        } => cadova_kernel::primitives::cylinder(
            *bottom_radius,
            *top_radius,
            *height,
            *segment_count,
            OriginalId::UNTRACKED,
        )?,
        Shape3::Sphere {
            radius,
            segment_count,
        } => cadova_kernel::primitives::sphere(
            *radius,
            *segment_count,
            OriginalId::UNTRACKED,
        )?,
        Shape3::Mesh(data) => {
            let faces: Vec<Vec<usize>> = data
                .faces
                .iter()
                .map(|face| face.iter().map(|&i| i as usize).collect())
                .collect();
            cadova_kernel::primitives::polyhedron(
                &data.vertices,
                &faces,
                OriginalId::UNTRACKED,
            )?
        }
        Shape3::Patch {
            patch,
            segments_u,
            segments_v,
        } => {
            let grid = patch.grid(*segments_u, *segments_v);
            cadova_kernel::primitives::patch_sheet(&grid, OriginalId::UNTRACKED)?
        }
    };
    Ok(mesh)
}

fn lower_shape2(shape: &Shape2) -> Result<PolygonSet, EvaluationError> {
    let set = match shape {
        Shape2::Rectangle { size } => cadova_kernel::primitives::rectangle(*size)?,
        Shape2::Circle {
            radius,
            segment_count,
        } => cadova_kernel::primitives::circle(*radius, *segment_count)?,
        Shape2::Polygon { outer, holes } => {
            cadova_kernel::primitives::polygon(outer, holes)?
        }
    };
    Ok(set)
}

/// Retags triangles whose original ID has no material yet.
fn retag_unmapped(mesh: &Mesh, mapped: &MaterialMapping, fresh: OriginalId) -> Mesh {
    let originals = mesh
        .originals()
        .iter()
        .map(|&original| {
            if mapped.contains(original) {
                original
            } else {
                fresh
            }
        })
        .collect();
    Mesh::from_parts(
        mesh.vertices().to_vec(),
        mesh.triangles().to_vec(),
        originals,
    )
}

fn cached_build_key(
    name: &str,
    parameters: &[crate::fingerprint::CacheParameter],
    environment: &Environment,
) -> Fingerprint {
    let mut hasher = FingerprintHasher::new();
    hasher.write_tag("cached-build");
    hasher.write_fingerprint(fingerprint_of_key(name, parameters));
    hasher.write_fingerprint(environment.fingerprint());
    hasher.finish()
}
