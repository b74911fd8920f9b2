//! The 3D scene node.

use super::node2::GeometryNode2;
use super::shape::{MeshData, Shape3};
use super::{
    feed_plane, ExtrusionSpec, MaskSplitSide, PrimitiveFn3, SplitSide, WarpFn3,
};
use crate::elements::Material;
use crate::fingerprint::{CacheParameter, Fingerprint, FingerprintHasher};
use cadova_kernel::ops::BooleanOp;
use cadova_math::{BezierPatch, InvalidGeometry, Plane, Transform3};
use config::constants::EPSILON;
use glam::DVec3;
use std::sync::{Arc, OnceLock};

/// An immutable, fingerprinted node in the 3D scene DAG.
///
/// Cloning is cheap (reference counted); equality and hashing go through
/// the content fingerprint, so structurally identical subtrees compare
/// equal regardless of provenance.
///
/// # Example
///
/// ```rust
/// use cadova_core::node::GeometryNode3;
/// use glam::DVec3;
///
/// let a = GeometryNode3::cuboid(DVec3::ONE).unwrap();
/// let b = GeometryNode3::cuboid(DVec3::ONE).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.fingerprint(), b.fingerprint());
/// ```
#[derive(Clone)]
pub struct GeometryNode3 {
    inner: Arc<Node3Inner>,
}

struct Node3Inner {
    kind: NodeKind3,
    fingerprint: OnceLock<Fingerprint>,
}

/// The node variants.
pub enum NodeKind3 {
    /// No geometry.
    Empty,
    /// A primitive leaf.
    Shape(Shape3),
    /// An affine transform over a child.
    Transform {
        /// The wrapped subtree.
        child: GeometryNode3,
        /// The transform applied after the child's local frame.
        transform: Transform3,
    },
    /// A CSG composition.
    Boolean {
        /// Operands in declared order.
        children: Vec<GeometryNode3>,
        /// The combination kind.
        kind: BooleanOp,
    },
    /// A 2D cross-section lifted to a solid.
    Extrusion {
        /// The 2D profile.
        child: GeometryNode2,
        /// How the profile is lifted.
        spec: ExtrusionSpec,
    },
    /// A 2D profile swept along precomputed frames.
    Sweep {
        /// The 2D profile.
        child: GeometryNode2,
        /// Frames placing the profile, X = reference, Z = tangent.
        frames: Vec<Transform3>,
    },
    /// The convex hull of a child.
    ConvexHull {
        /// The wrapped subtree.
        child: GeometryNode3,
    },
    /// The convex hull of a child with extra seed points.
    HullWithPoints {
        /// Seed points appended before hulling.
        points: Vec<DVec3>,
        /// The wrapped subtree.
        child: GeometryNode3,
    },
    /// Subdivision until no edge exceeds a maximum length.
    Refine {
        /// The wrapped subtree.
        child: GeometryNode3,
        /// Longest allowed edge.
        max_edge_length: f64,
    },
    /// Vertex merging within an epsilon.
    Simplify {
        /// The wrapped subtree.
        child: GeometryNode3,
        /// Merge distance.
        epsilon: f64,
    },
    /// One deterministic half of a plane split.
    SplitPlane {
        /// The wrapped subtree.
        child: GeometryNode3,
        /// The cutting plane.
        plane: Plane,
        /// Which half this node denotes.
        side: SplitSide,
    },
    /// One deterministic piece of a mask split.
    SplitMask {
        /// The wrapped subtree.
        child: GeometryNode3,
        /// The mask solid.
        mask: GeometryNode3,
        /// Which piece this node denotes.
        side: MaskSplitSide,
    },
    /// A pointwise vertex remap.
    Warp {
        /// The wrapped subtree.
        child: GeometryNode3,
        /// Operation name contributing to the fingerprint.
        name: String,
        /// Parameters contributing to the fingerprint.
        parameters: Vec<CacheParameter>,
        /// The pure remap function.
        function: WarpFn3,
    },
    /// An opaque concrete-level operation with a stable cache identity.
    CachedOperation {
        /// The wrapped subtree.
        child: GeometryNode3,
        /// Operation name contributing to the fingerprint.
        name: String,
        /// Parameters contributing to the fingerprint.
        parameters: Vec<CacheParameter>,
        /// The operation applied to the child's concrete.
        function: PrimitiveFn3,
    },
    /// A material attached to a subtree.
    Material {
        /// The wrapped subtree.
        child: GeometryNode3,
        /// The attached material.
        material: Material,
    },
}

impl GeometryNode3 {
    fn from_kind(kind: NodeKind3) -> Self {
        Self {
            inner: Arc::new(Node3Inner {
                kind,
                fingerprint: OnceLock::new(),
            }),
        }
    }

    /// The empty node.
    pub fn empty() -> Self {
        Self::from_kind(NodeKind3::Empty)
    }

    /// A primitive leaf.
    pub fn shape(shape: Shape3) -> Self {
        Self::from_kind(NodeKind3::Shape(shape))
    }

    /// An axis-aligned box.
    pub fn cuboid(size: DVec3) -> Result<Self, InvalidGeometry> {
        if size.min_element() < 0.0 {
            return Err(InvalidGeometry::new("cuboid with negative size"));
        }
        if size.min_element() < EPSILON {
            return Ok(Self::empty());
        }
        Ok(Self::shape(Shape3::Cuboid { size }))
    }

    /// A cone frustum.
    ///
    /// A zero radius collapses that end to an apex; both radii zero
    /// normalizes to the empty node.
    pub fn cylinder(
        bottom_radius: f64,
        top_radius: f64,
        height: f64,
        segment_count: u32,
    ) -> Result<Self, InvalidGeometry> {
        if bottom_radius < 0.0 || top_radius < 0.0 || height < 0.0 {
            return Err(InvalidGeometry::new("cylinder with negative measure"));
        }
        if height < EPSILON || (bottom_radius < EPSILON && top_radius < EPSILON) {
            return Ok(Self::empty());
        }
        Ok(Self::shape(Shape3::Cylinder {
            bottom_radius,
            top_radius,
            height,
            segment_count: segment_count.max(3),
        }))
    }

    /// A sphere.
    pub fn sphere(radius: f64, segment_count: u32) -> Result<Self, InvalidGeometry> {
        if radius < 0.0 {
            return Err(InvalidGeometry::new("sphere with negative radius"));
        }
        if radius < EPSILON {
            return Ok(Self::empty());
        }
        Ok(Self::shape(Shape3::Sphere {
            radius,
            segment_count: segment_count.max(3),
        }))
    }

    /// Explicit mesh data.
    pub fn mesh(data: MeshData) -> Self {
        if data.vertices.is_empty() || data.faces.is_empty() {
            return Self::empty();
        }
        Self::shape(Shape3::Mesh(data))
    }

    /// A sampled Bezier patch sheet.
    pub fn patch(patch: BezierPatch, segments_u: u32, segments_v: u32) -> Self {
        Self::shape(Shape3::Patch {
            patch,
            segments_u: segments_u.max(1),
            segments_v: segments_v.max(1),
        })
    }

    /// An affine transform over a child.
    ///
    /// Identity transforms vanish, empty children stay empty, and nested
    /// transforms collapse into one node.
    pub fn transform(transform: Transform3, child: &GeometryNode3) -> Self {
        if child.is_empty() {
            return child.clone();
        }
        if transform.is_identity() {
            return child.clone();
        }
        if let NodeKind3::Transform {
            child: inner_child,
            transform: inner_transform,
        } = child.kind()
        {
            return Self::from_kind(NodeKind3::Transform {
                child: inner_child.clone(),
                transform: inner_transform.concatenated(&transform),
            });
        }
        Self::from_kind(NodeKind3::Transform {
            child: child.clone(),
            transform,
        })
    }

    /// A CSG composition.
    ///
    /// Empty operands are dropped where they cannot matter; single-child
    /// and empty compositions normalize away.
    pub fn boolean(children: Vec<GeometryNode3>, kind: BooleanOp) -> Self {
        let children: Vec<GeometryNode3> = match kind {
            BooleanOp::Union => children.into_iter().filter(|c| !c.is_empty()).collect(),
            BooleanOp::Intersection => {
                if children.iter().any(GeometryNode3::is_empty) {
                    return Self::empty();
                }
                children
            }
            BooleanOp::Difference => {
                let mut iterator = children.into_iter();
                let Some(head) = iterator.next() else {
                    return Self::empty();
                };
                if head.is_empty() {
                    return Self::empty();
                }
                let mut kept = vec![head];
                kept.extend(iterator.filter(|c| !c.is_empty()));
                kept
            }
        };
        match children.len() {
            0 => Self::empty(),
            1 => children.into_iter().next().unwrap_or_else(Self::empty),
            _ => Self::from_kind(NodeKind3::Boolean { children, kind }),
        }
    }

    /// A 2D profile lifted to a solid.
    pub fn extrusion(child: GeometryNode2, spec: ExtrusionSpec) -> Self {
        if child.is_empty() {
            return Self::empty();
        }
        Self::from_kind(NodeKind3::Extrusion { child, spec })
    }

    /// A 2D profile swept along precomputed frames.
    pub fn sweep(child: GeometryNode2, frames: Vec<Transform3>) -> Self {
        if child.is_empty() || frames.len() < 2 {
            return Self::empty();
        }
        Self::from_kind(NodeKind3::Sweep { child, frames })
    }

    /// The convex hull of a child.
    pub fn convex_hull(child: &GeometryNode3) -> Self {
        if child.is_empty() {
            return Self::empty();
        }
        Self::from_kind(NodeKind3::ConvexHull {
            child: child.clone(),
        })
    }

    /// The convex hull of a child with extra seed points.
    pub fn hull_with_points(points: Vec<DVec3>, child: &GeometryNode3) -> Self {
        if points.is_empty() {
            return Self::convex_hull(child);
        }
        Self::from_kind(NodeKind3::HullWithPoints {
            points,
            child: child.clone(),
        })
    }

    /// Subdivision until no edge exceeds `max_edge_length`.
    pub fn refine(child: &GeometryNode3, max_edge_length: f64) -> Self {
        if child.is_empty() {
            return child.clone();
        }
        Self::from_kind(NodeKind3::Refine {
            child: child.clone(),
            max_edge_length,
        })
    }

    /// Vertex merging within `epsilon`.
    pub fn simplify(child: &GeometryNode3, epsilon: f64) -> Self {
        if child.is_empty() {
            return child.clone();
        }
        Self::from_kind(NodeKind3::Simplify {
            child: child.clone(),
            epsilon,
        })
    }

    /// One half of a plane split.
    pub fn split_plane(child: &GeometryNode3, plane: Plane, side: SplitSide) -> Self {
        if child.is_empty() {
            return child.clone();
        }
        Self::from_kind(NodeKind3::SplitPlane {
            child: child.clone(),
            plane,
            side,
        })
    }

    /// One piece of a mask split.
    pub fn split_mask(child: &GeometryNode3, mask: &GeometryNode3, side: MaskSplitSide) -> Self {
        if child.is_empty() {
            return child.clone();
        }
        Self::from_kind(NodeKind3::SplitMask {
            child: child.clone(),
            mask: mask.clone(),
            side,
        })
    }

    /// A pointwise vertex remap.
    ///
    /// `name` and `parameters` identify the operation in the fingerprint;
    /// `function` must be pure.
    pub fn warp(
        child: &GeometryNode3,
        name: impl Into<String>,
        parameters: Vec<CacheParameter>,
        function: WarpFn3,
    ) -> Self {
        if child.is_empty() {
            return child.clone();
        }
        Self::from_kind(NodeKind3::Warp {
            child: child.clone(),
            name: name.into(),
            parameters,
            function,
        })
    }

    /// An opaque concrete-level operation with a stable cache identity.
    pub fn cached_operation(
        child: &GeometryNode3,
        name: impl Into<String>,
        parameters: Vec<CacheParameter>,
        function: PrimitiveFn3,
    ) -> Self {
        Self::from_kind(NodeKind3::CachedOperation {
            child: child.clone(),
            name: name.into(),
            parameters,
            function,
        })
    }

    /// A material attached to a subtree.
    pub fn with_material(child: &GeometryNode3, material: Material) -> Self {
        if child.is_empty() {
            return child.clone();
        }
        Self::from_kind(NodeKind3::Material {
            child: child.clone(),
            material,
        })
    }

    /// The node variant.
    pub fn kind(&self) -> &NodeKind3 {
        &self.inner.kind
    }

    /// True for the empty node.
    pub fn is_empty(&self) -> bool {
        matches!(self.inner.kind, NodeKind3::Empty)
    }

    /// The variant tag, for diagnostics.
    pub fn variant_tag(&self) -> &'static str {
        match &self.inner.kind {
            NodeKind3::Empty => "empty",
            NodeKind3::Shape(_) => "shape",
            NodeKind3::Transform { .. } => "transform",
            NodeKind3::Boolean { .. } => "boolean",
            NodeKind3::Extrusion { .. } => "extrusion",
            NodeKind3::Sweep { .. } => "sweep",
            NodeKind3::ConvexHull { .. } => "convex-hull",
            NodeKind3::HullWithPoints { .. } => "hull-with-points",
            NodeKind3::Refine { .. } => "refine",
            NodeKind3::Simplify { .. } => "simplify",
            NodeKind3::SplitPlane { .. } => "split-plane",
            NodeKind3::SplitMask { .. } => "split-mask",
            NodeKind3::Warp { .. } => "warp",
            NodeKind3::CachedOperation { .. } => "cached-operation",
            NodeKind3::Material { .. } => "material",
        }
    }

    /// Direct 3D children.
    pub fn children(&self) -> Vec<&GeometryNode3> {
        match &self.inner.kind {
            NodeKind3::Empty
            | NodeKind3::Shape(_)
            | NodeKind3::Extrusion { .. }
            | NodeKind3::Sweep { .. } => Vec::new(),
            NodeKind3::Transform { child, .. }
            | NodeKind3::ConvexHull { child }
            | NodeKind3::HullWithPoints { child, .. }
            | NodeKind3::Refine { child, .. }
            | NodeKind3::Simplify { child, .. }
            | NodeKind3::SplitPlane { child, .. }
            | NodeKind3::Warp { child, .. }
            | NodeKind3::CachedOperation { child, .. }
            | NodeKind3::Material { child, .. } => vec![child],
            NodeKind3::SplitMask { child, mask, .. } => vec![child, mask],
            NodeKind3::Boolean { children, .. } => children.iter().collect(),
        }
    }

    /// The content fingerprint, computed once per node.
    pub fn fingerprint(&self) -> Fingerprint {
        *self.inner.fingerprint.get_or_init(|| {
            let mut hasher = FingerprintHasher::new();
            self.feed(&mut hasher);
            hasher.finish()
        })
    }

    fn feed(&self, hasher: &mut FingerprintHasher) {
        match &self.inner.kind {
            NodeKind3::Empty => hasher.write_tag("empty3"),
            NodeKind3::Shape(shape) => {
                hasher.write_tag("shape3");
                shape.feed(hasher);
            }
            NodeKind3::Transform { child, transform } => {
                hasher.write_tag("transform3");
                hasher.write_transform3(transform);
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind3::Boolean { children, kind } => {
                hasher.write_tag("boolean3");
                hasher.write_tag(match kind {
                    BooleanOp::Union => "union",
                    BooleanOp::Intersection => "intersection",
                    BooleanOp::Difference => "difference",
                });
                hasher.write_u64(children.len() as u64);
                for child in children {
                    hasher.write_fingerprint(child.fingerprint());
                }
            }
            NodeKind3::Extrusion { child, spec } => {
                hasher.write_tag("extrusion");
                spec.feed(hasher);
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind3::Sweep { child, frames } => {
                hasher.write_tag("sweep");
                hasher.write_u64(frames.len() as u64);
                for frame in frames {
                    hasher.write_transform3(frame);
                }
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind3::ConvexHull { child } => {
                hasher.write_tag("convex-hull3");
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind3::HullWithPoints { points, child } => {
                hasher.write_tag("hull-with-points");
                hasher.write_u64(points.len() as u64);
                for &point in points {
                    hasher.write_vec3(point);
                }
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind3::Refine {
                child,
                max_edge_length,
            } => {
                hasher.write_tag("refine");
                hasher.write_f64(*max_edge_length);
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind3::Simplify { child, epsilon } => {
                hasher.write_tag("simplify3");
                hasher.write_f64(*epsilon);
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind3::SplitPlane { child, plane, side } => {
                hasher.write_tag("split-plane");
                feed_plane(plane, hasher);
                hasher.write_bool(matches!(side, SplitSide::Positive));
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind3::SplitMask { child, mask, side } => {
                hasher.write_tag("split-mask");
                hasher.write_bool(matches!(side, MaskSplitSide::Remainder));
                hasher.write_fingerprint(child.fingerprint());
                hasher.write_fingerprint(mask.fingerprint());
            }
            NodeKind3::Warp {
                child,
                name,
                parameters,
                ..
            } => {
                hasher.write_tag("warp3");
                hasher.write_str(name);
                hasher.write_u64(parameters.len() as u64);
                for parameter in parameters {
                    parameter.feed(hasher);
                }
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind3::CachedOperation {
                child,
                name,
                parameters,
                ..
            } => {
                hasher.write_tag("cached-op3");
                hasher.write_str(name);
                hasher.write_u64(parameters.len() as u64);
                for parameter in parameters {
                    parameter.feed(hasher);
                }
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind3::Material { child, material } => {
                hasher.write_tag("material");
                material.feed(hasher);
                hasher.write_fingerprint(child.fingerprint());
            }
        }
    }
}

impl Default for GeometryNode3 {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for GeometryNode3 {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.fingerprint() == other.fingerprint()
    }
}

impl Eq for GeometryNode3 {}

impl std::hash::Hash for GeometryNode3 {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.fingerprint().hash(state);
    }
}

impl std::fmt::Debug for GeometryNode3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GeometryNode3({})", self.variant_tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::GeometryNode2;

    #[test]
    fn test_identity_transform_vanishes() {
        let cube = GeometryNode3::cuboid(DVec3::ONE).unwrap();
        let wrapped = GeometryNode3::transform(Transform3::IDENTITY, &cube);
        assert_eq!(wrapped, cube);
    }

    #[test]
    fn test_nested_transforms_collapse() {
        let cube = GeometryNode3::cuboid(DVec3::ONE).unwrap();
        let t1 = Transform3::translation(DVec3::X);
        let t2 = Transform3::scaling(DVec3::splat(2.0));
        let nested = GeometryNode3::transform(t1, &GeometryNode3::transform(t2, &cube));
        let collapsed = GeometryNode3::transform(t2.concatenated(&t1), &cube);
        assert_eq!(nested.fingerprint(), collapsed.fingerprint());
        assert!(matches!(nested.kind(), NodeKind3::Transform { child, .. } if child == &cube));
    }

    #[test]
    fn test_boolean_normalization() {
        let cube = GeometryNode3::cuboid(DVec3::ONE).unwrap();
        // Singleton union is the child itself.
        assert_eq!(
            GeometryNode3::boolean(vec![cube.clone()], BooleanOp::Union),
            cube
        );
        // Empty list is empty.
        assert!(GeometryNode3::boolean(vec![], BooleanOp::Union).is_empty());
        // Empty operands are dropped from unions.
        let with_empty = GeometryNode3::boolean(
            vec![cube.clone(), GeometryNode3::empty(), cube.clone()],
            BooleanOp::Union,
        );
        match with_empty.kind() {
            NodeKind3::Boolean { children, .. } => assert_eq!(children.len(), 2),
            _ => panic!("expected boolean"),
        }
        // Intersection with empty is empty.
        assert!(GeometryNode3::boolean(
            vec![cube.clone(), GeometryNode3::empty()],
            BooleanOp::Intersection
        )
        .is_empty());
        // Empty difference head is empty.
        assert!(GeometryNode3::boolean(
            vec![GeometryNode3::empty(), cube.clone()],
            BooleanOp::Difference
        )
        .is_empty());
    }

    #[test]
    fn test_cylinder_with_both_radii_zero_is_empty() {
        let node = GeometryNode3::cylinder(0.0, 0.0, 10.0, 16).unwrap();
        assert!(node.is_empty());
    }

    #[test]
    fn test_negative_radius_fails_fast() {
        assert!(GeometryNode3::cylinder(-1.0, 1.0, 1.0, 16).is_err());
        assert!(GeometryNode3::sphere(-1.0, 16).is_err());
    }

    #[test]
    fn test_structural_fingerprint_equality() {
        let make = || {
            let outer = GeometryNode3::cylinder(10.0, 10.0, 10.0, 32).unwrap();
            let inner = GeometryNode3::cylinder(5.0, 5.0, 10.0, 32).unwrap();
            GeometryNode3::boolean(vec![outer, inner], BooleanOp::Difference)
        };
        assert_eq!(make().fingerprint(), make().fingerprint());
    }

    #[test]
    fn test_operand_order_distinguishes_difference() {
        let a = GeometryNode3::cuboid(DVec3::ONE).unwrap();
        let b = GeometryNode3::sphere(1.0, 16).unwrap();
        let ab = GeometryNode3::boolean(vec![a.clone(), b.clone()], BooleanOp::Difference);
        let ba = GeometryNode3::boolean(vec![b, a], BooleanOp::Difference);
        assert_ne!(ab.fingerprint(), ba.fingerprint());
    }

    #[test]
    fn test_warp_fingerprint_ignores_function_identity() {
        let cube = GeometryNode3::cuboid(DVec3::ONE).unwrap();
        let a = GeometryNode3::warp(
            &cube,
            "bend",
            vec![CacheParameter::Double(0.5)],
            Arc::new(|v| v),
        );
        let b = GeometryNode3::warp(
            &cube,
            "bend",
            vec![CacheParameter::Double(0.5)],
            Arc::new(|v: DVec3| v + DVec3::ZERO),
        );
        assert_eq!(a.fingerprint(), b.fingerprint());
        let c = GeometryNode3::warp(
            &cube,
            "bend",
            vec![CacheParameter::Double(0.7)],
            Arc::new(|v| v),
        );
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_empty_extrusion_is_empty() {
        let node = GeometryNode3::extrusion(
            GeometryNode2::empty(),
            ExtrusionSpec::Linear {
                height: 5.0,
                twist: cadova_math::Angle::ZERO,
                scale_top: glam::DVec2::ONE,
                slices: 1,
            },
        );
        assert!(node.is_empty());
    }
}
