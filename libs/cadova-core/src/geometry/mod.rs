//! # Geometry Protocol
//!
//! The user-facing composable geometry values. A `Geometry3`/`Geometry2`
//! is a lazy description; the evaluation engine builds it in an
//! environment into a [`BuildResult3`]/[`BuildResult2`].
//!
//! Dispatch is a closed tagged sum: the evaluator pattern-matches, and
//! the only open points are the closures certain variants carry
//! (environment modifiers, measure builders, cached thunks).

use crate::build_result::{BuildResult2, BuildResult3};
use crate::elements::{Material, Part};
use crate::environment::Environment;
use crate::fingerprint::CacheParameter;
use crate::measure::{Measurements2, Measurements3};
use crate::node::{
    GeometryNode2, GeometryNode3, PrimitiveFn2, PrimitiveFn3, ProjectionKind, WarpFn2, WarpFn3,
};
use cadova_kernel::ops::{BooleanOp, JoinStyle};
use cadova_kernel::{Mesh, PolygonSet};
use cadova_math::{Angle, BezierPath, Transform2, Transform3};
use glam::{DVec2, DVec3};
use std::sync::Arc;

/// Rewrites the inherited environment for a subtree.
pub type EnvironmentModifierFn = Arc<dyn Fn(&Environment) -> Environment + Send + Sync>;

/// Rewraps a built 3D node.
pub type NodeRewriteFn3 = Arc<dyn Fn(GeometryNode3) -> GeometryNode3 + Send + Sync>;

/// Rewraps a built 2D node.
pub type NodeRewriteFn2 = Arc<dyn Fn(GeometryNode2) -> GeometryNode2 + Send + Sync>;

/// Continues a build with the target's measurements.
pub type MeasureBuilderFn3 =
    Arc<dyn Fn(&BuildResult3, &Measurements3) -> Geometry3 + Send + Sync>;

/// Continues a 2D build with the target's measurements.
pub type MeasureBuilderFn2 =
    Arc<dyn Fn(&BuildResult2, &Measurements2) -> Geometry2 + Send + Sync>;

/// Continues a build with the target's raw concrete and build result.
pub type ReadPrimitiveFn3 = Arc<dyn Fn(&Mesh, &BuildResult3) -> Geometry3 + Send + Sync>;

/// Continues a 2D build with the target's raw concrete and build result.
pub type ReadPrimitiveFn2 =
    Arc<dyn Fn(&PolygonSet, &BuildResult2) -> Geometry2 + Send + Sync>;

/// Produces a geometry on first use of a cached key.
pub type ThunkFn3 = Arc<dyn Fn() -> Geometry3 + Send + Sync>;

/// Produces a 2D geometry on first use of a cached key.
pub type ThunkFn2 = Arc<dyn Fn() -> Geometry2 + Send + Sync>;

/// Continues a build with the inherited environment.
pub type ReadEnvironmentFn3 = Arc<dyn Fn(&Environment) -> Geometry3 + Send + Sync>;

/// Continues a 2D build with the inherited environment.
pub type ReadEnvironmentFn2 = Arc<dyn Fn(&Environment) -> Geometry2 + Send + Sync>;

/// How a 2D geometry becomes a solid; segment and slice counts are
/// resolved from the environment during building.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtrusionRequest {
    /// Linear extrusion along +Z.
    Linear {
        /// Extrusion height.
        height: f64,
        /// Total twist over the height.
        twist: Angle,
        /// Cross-section scale at the top.
        scale_top: DVec2,
    },
    /// Helical extrusion.
    Helical {
        /// Height per full turn.
        pitch: f64,
        /// Total height.
        height: f64,
    },
    /// Revolution about the Z axis.
    Revolve {
        /// Swept angle.
        angle: Angle,
    },
}

/// A lazy, composable 3D geometry.
#[derive(Clone)]
pub enum Geometry3 {
    /// A ready scene node.
    Node(GeometryNode3),
    /// A CSG composition; difference subtrahends build in a subtraction
    /// environment.
    Boolean {
        /// Operands in declared order.
        children: Vec<Geometry3>,
        /// The combination kind.
        kind: BooleanOp,
    },
    /// An affine transform; result elements follow the wrap.
    Transformed {
        /// The wrapped geometry.
        child: Box<Geometry3>,
        /// The applied transform.
        transform: Transform3,
    },
    /// A subtree built under a rewritten environment.
    ModifyEnvironment {
        /// The wrapped geometry.
        child: Box<Geometry3>,
        /// The environment rewrite.
        modifier: EnvironmentModifierFn,
    },
    /// A node-level rewrap after building.
    RewriteNode {
        /// The wrapped geometry.
        child: Box<Geometry3>,
        /// The node rewrite.
        function: NodeRewriteFn3,
    },
    /// An opaque concrete-level operation memoized by child fingerprint,
    /// name, and parameters.
    CachingPrimitive {
        /// The wrapped geometry.
        child: Box<Geometry3>,
        /// Cache identity: operation name.
        name: String,
        /// Cache identity: parameters.
        parameters: Vec<CacheParameter>,
        /// The operation.
        function: PrimitiveFn3,
    },
    /// A pointwise warp.
    Warped {
        /// The wrapped geometry.
        child: Box<Geometry3>,
        /// Cache identity: operation name.
        name: String,
        /// Cache identity: parameters.
        parameters: Vec<CacheParameter>,
        /// The pure vertex remap.
        function: WarpFn3,
    },
    /// Builds the target, measures it, and continues with the builder's
    /// output. The only way measurements re-enter a composition.
    Measure {
        /// The measured geometry.
        target: Box<Geometry3>,
        /// The continuation.
        builder: MeasureBuilderFn3,
    },
    /// Like [`Geometry3::Measure`] with access to the raw concrete.
    ReadPrimitive {
        /// The concretized geometry.
        child: Box<Geometry3>,
        /// The continuation.
        action: ReadPrimitiveFn3,
    },
    /// Memoizes the entire build result under an explicit key.
    CachedBoxed {
        /// Cache key name.
        name: String,
        /// Cache key parameters.
        parameters: Vec<CacheParameter>,
        /// Produces the geometry on first use.
        thunk: ThunkFn3,
    },
    /// Reads the inherited environment.
    ReadEnvironment {
        /// The continuation.
        function: ReadEnvironmentFn3,
    },
    /// Routes the subtree into a part bucket, removing it from the
    /// inline model.
    InPart {
        /// The destination part.
        part: Part,
        /// The routed geometry.
        child: Box<Geometry3>,
    },
    /// Catalogs the subtree under a part while keeping it inline.
    MainPart {
        /// The catalog part.
        part: Part,
        /// The wrapped geometry.
        child: Box<Geometry3>,
    },
    /// Attaches a material to the subtree.
    WithMaterial {
        /// The material.
        material: Material,
        /// The wrapped geometry.
        child: Box<Geometry3>,
    },
    /// Records the local frame under an anchor name.
    Anchor {
        /// The anchor name.
        name: String,
        /// The wrapped geometry.
        child: Box<Geometry3>,
    },
    /// Records the subtree's build result under a tag name.
    Tagged {
        /// The tag name.
        name: String,
        /// The wrapped geometry.
        child: Box<Geometry3>,
    },
    /// A 2D geometry lifted to a solid.
    Extruded {
        /// The 2D profile.
        child: Box<Geometry2>,
        /// The lift.
        request: ExtrusionRequest,
    },
    /// A 2D profile swept along a path using computed frames.
    Swept {
        /// The 2D profile.
        child: Box<Geometry2>,
        /// The sweep path.
        path: BezierPath<DVec3>,
    },
}

/// A lazy, composable 2D geometry.
#[derive(Clone)]
pub enum Geometry2 {
    /// A ready scene node.
    Node(GeometryNode2),
    /// A boolean composition.
    Boolean {
        /// Operands in declared order.
        children: Vec<Geometry2>,
        /// The combination kind.
        kind: BooleanOp,
    },
    /// An affine transform.
    Transformed {
        /// The wrapped geometry.
        child: Box<Geometry2>,
        /// The applied transform.
        transform: Transform2,
    },
    /// A subtree built under a rewritten environment.
    ModifyEnvironment {
        /// The wrapped geometry.
        child: Box<Geometry2>,
        /// The environment rewrite.
        modifier: EnvironmentModifierFn,
    },
    /// A node-level rewrap after building.
    RewriteNode {
        /// The wrapped geometry.
        child: Box<Geometry2>,
        /// The node rewrite.
        function: NodeRewriteFn2,
    },
    /// An opaque concrete-level operation with explicit cache identity.
    CachingPrimitive {
        /// The wrapped geometry.
        child: Box<Geometry2>,
        /// Cache identity: operation name.
        name: String,
        /// Cache identity: parameters.
        parameters: Vec<CacheParameter>,
        /// The operation.
        function: PrimitiveFn2,
    },
    /// A pointwise warp.
    Warped {
        /// The wrapped geometry.
        child: Box<Geometry2>,
        /// Cache identity: operation name.
        name: String,
        /// Cache identity: parameters.
        parameters: Vec<CacheParameter>,
        /// The pure vertex remap.
        function: WarpFn2,
    },
    /// Builds the target, measures it, and continues.
    Measure {
        /// The measured geometry.
        target: Box<Geometry2>,
        /// The continuation.
        builder: MeasureBuilderFn2,
    },
    /// Like [`Geometry2::Measure`] with access to the raw concrete.
    ReadPrimitive {
        /// The concretized geometry.
        child: Box<Geometry2>,
        /// The continuation.
        action: ReadPrimitiveFn2,
    },
    /// Memoizes the entire build result under an explicit key.
    CachedBoxed {
        /// Cache key name.
        name: String,
        /// Cache key parameters.
        parameters: Vec<CacheParameter>,
        /// Produces the geometry on first use.
        thunk: ThunkFn2,
    },
    /// Reads the inherited environment.
    ReadEnvironment {
        /// The continuation.
        function: ReadEnvironmentFn2,
    },
    /// A solid reduced to 2D.
    Projected {
        /// The 3D source.
        child: Box<Geometry3>,
        /// The reduction.
        kind: ProjectionKind,
    },
    /// Minkowski sum with a disk; round-join sampling is resolved from
    /// the environment during building.
    Offset {
        /// The wrapped geometry.
        child: Box<Geometry2>,
        /// Signed offset distance.
        distance: f64,
        /// Corner treatment.
        join: JoinStyle,
    },
}

impl Geometry3 {
    /// The empty geometry.
    pub fn empty() -> Self {
        Self::Node(GeometryNode3::empty())
    }

    /// Wraps in a transform.
    pub fn transformed(self, transform: Transform3) -> Self {
        Self::Transformed {
            child: Box::new(self),
            transform,
        }
    }

    /// Translates the geometry.
    pub fn translated(self, offset: DVec3) -> Self {
        self.transformed(Transform3::translation(offset))
    }

    /// Scales the geometry.
    pub fn scaled(self, factors: DVec3) -> Self {
        self.transformed(Transform3::scaling(factors))
    }

    /// Unions with other geometry.
    pub fn union(self, other: Geometry3) -> Self {
        Self::Boolean {
            children: vec![self, other],
            kind: BooleanOp::Union,
        }
    }

    /// Intersects with other geometry.
    pub fn intersection(self, other: Geometry3) -> Self {
        Self::Boolean {
            children: vec![self, other],
            kind: BooleanOp::Intersection,
        }
    }

    /// Subtracts other geometry.
    pub fn difference(self, other: Geometry3) -> Self {
        Self::Boolean {
            children: vec![self, other],
            kind: BooleanOp::Difference,
        }
    }

    /// Routes the geometry into a part bucket.
    pub fn in_part(self, part: Part) -> Self {
        Self::InPart {
            part,
            child: Box::new(self),
        }
    }

    /// Attaches a material.
    pub fn with_material(self, material: Material) -> Self {
        Self::WithMaterial {
            material,
            child: Box::new(self),
        }
    }

    /// Builds the child under a modified environment.
    pub fn with_environment(self, modifier: EnvironmentModifierFn) -> Self {
        Self::ModifyEnvironment {
            child: Box::new(self),
            modifier,
        }
    }

    /// Reads the inherited environment.
    pub fn read_environment<F>(function: F) -> Self
    where
        F: Fn(&Environment) -> Geometry3 + Send + Sync + 'static,
    {
        Self::ReadEnvironment {
            function: Arc::new(function),
        }
    }
}

impl Geometry2 {
    /// The empty geometry.
    pub fn empty() -> Self {
        Self::Node(GeometryNode2::empty())
    }

    /// Wraps in a transform.
    pub fn transformed(self, transform: Transform2) -> Self {
        Self::Transformed {
            child: Box::new(self),
            transform,
        }
    }

    /// Lifts to a solid by linear extrusion.
    pub fn extruded(self, height: f64) -> Geometry3 {
        Geometry3::Extruded {
            child: Box::new(self),
            request: ExtrusionRequest::Linear {
                height,
                twist: Angle::ZERO,
                scale_top: DVec2::ONE,
            },
        }
    }

    /// Lifts to a solid by revolution.
    pub fn revolved(self, angle: Angle) -> Geometry3 {
        Geometry3::Extruded {
            child: Box::new(self),
            request: ExtrusionRequest::Revolve { angle },
        }
    }

    /// Grows or shrinks by `distance`.
    pub fn offset(self, distance: f64, join: JoinStyle) -> Self {
        Self::Offset {
            child: Box::new(self),
            distance,
            join,
        }
    }
}

impl std::fmt::Debug for Geometry3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Node(node) => return write!(f, "Geometry3::Node({node:?})"),
            Self::Boolean { .. } => "Boolean",
            Self::Transformed { .. } => "Transformed",
            Self::ModifyEnvironment { .. } => "ModifyEnvironment",
            Self::RewriteNode { .. } => "RewriteNode",
            Self::CachingPrimitive { .. } => "CachingPrimitive",
            Self::Warped { .. } => "Warped",
            Self::Measure { .. } => "Measure",
            Self::ReadPrimitive { .. } => "ReadPrimitive",
            Self::CachedBoxed { .. } => "CachedBoxed",
            Self::ReadEnvironment { .. } => "ReadEnvironment",
            Self::InPart { .. } => "InPart",
            Self::MainPart { .. } => "MainPart",
            Self::WithMaterial { .. } => "WithMaterial",
            Self::Anchor { .. } => "Anchor",
            Self::Tagged { .. } => "Tagged",
            Self::Extruded { .. } => "Extruded",
            Self::Swept { .. } => "Swept",
        };
        write!(f, "Geometry3::{tag}")
    }
}

impl std::fmt::Debug for Geometry2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Node(node) => return write!(f, "Geometry2::Node({node:?})"),
            Self::Boolean { .. } => "Boolean",
            Self::Transformed { .. } => "Transformed",
            Self::ModifyEnvironment { .. } => "ModifyEnvironment",
            Self::RewriteNode { .. } => "RewriteNode",
            Self::CachingPrimitive { .. } => "CachingPrimitive",
            Self::Warped { .. } => "Warped",
            Self::Measure { .. } => "Measure",
            Self::ReadPrimitive { .. } => "ReadPrimitive",
            Self::CachedBoxed { .. } => "CachedBoxed",
            Self::ReadEnvironment { .. } => "ReadEnvironment",
            Self::Projected { .. } => "Projected",
            Self::Offset { .. } => "Offset",
        };
        write!(f, "Geometry2::{tag}")
    }
}
