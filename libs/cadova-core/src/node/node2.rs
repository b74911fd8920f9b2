//! The 2D scene node.

use super::node3::GeometryNode3;
use super::shape::Shape2;
use super::{PrimitiveFn2, ProjectionKind, WarpFn2};
use crate::fingerprint::{CacheParameter, Fingerprint, FingerprintHasher};
use cadova_kernel::ops::{BooleanOp, JoinStyle};
use cadova_math::{InvalidGeometry, Transform2};
use config::constants::EPSILON;
use glam::DVec2;
use std::sync::{Arc, OnceLock};

/// An immutable, fingerprinted node in the 2D scene DAG.
#[derive(Clone)]
pub struct GeometryNode2 {
    inner: Arc<Node2Inner>,
}

struct Node2Inner {
    kind: NodeKind2,
    fingerprint: OnceLock<Fingerprint>,
}

/// The node variants.
pub enum NodeKind2 {
    /// No geometry.
    Empty,
    /// A primitive leaf.
    Shape(Shape2),
    /// An affine transform over a child.
    Transform {
        /// The wrapped subtree.
        child: GeometryNode2,
        /// The transform applied after the child's local frame.
        transform: Transform2,
    },
    /// A boolean composition.
    Boolean {
        /// Operands in declared order.
        children: Vec<GeometryNode2>,
        /// The combination kind.
        kind: BooleanOp,
    },
    /// A solid reduced to 2D.
    Projection {
        /// The 3D source.
        child: GeometryNode3,
        /// How the solid reduces to the plane.
        kind: ProjectionKind,
    },
    /// Minkowski sum with a disk.
    Offset {
        /// The wrapped subtree.
        child: GeometryNode2,
        /// Signed offset distance.
        distance: f64,
        /// Corner treatment.
        join: JoinStyle,
        /// Captured full-circle segment count for round joins.
        arc_segments: u32,
    },
    /// The convex hull of a child.
    ConvexHull {
        /// The wrapped subtree.
        child: GeometryNode2,
    },
    /// Collinear-run removal within an epsilon.
    Simplify {
        /// The wrapped subtree.
        child: GeometryNode2,
        /// Merge distance.
        epsilon: f64,
    },
    /// A pointwise vertex remap.
    Warp {
        /// The wrapped subtree.
        child: GeometryNode2,
        /// Operation name contributing to the fingerprint.
        name: String,
        /// Parameters contributing to the fingerprint.
        parameters: Vec<CacheParameter>,
        /// The pure remap function.
        function: WarpFn2,
    },
    /// An opaque concrete-level operation with a stable cache identity.
    CachedOperation {
        /// The wrapped subtree.
        child: GeometryNode2,
        /// Operation name contributing to the fingerprint.
        name: String,
        /// Parameters contributing to the fingerprint.
        parameters: Vec<CacheParameter>,
        /// The operation applied to the child's concrete.
        function: PrimitiveFn2,
    },
}

impl GeometryNode2 {
    fn from_kind(kind: NodeKind2) -> Self {
        Self {
            inner: Arc::new(Node2Inner {
                kind,
                fingerprint: OnceLock::new(),
            }),
        }
    }

    /// The empty node.
    pub fn empty() -> Self {
        Self::from_kind(NodeKind2::Empty)
    }

    /// A primitive leaf.
    pub fn shape(shape: Shape2) -> Self {
        Self::from_kind(NodeKind2::Shape(shape))
    }

    /// An axis-aligned rectangle.
    pub fn rectangle(size: DVec2) -> Result<Self, InvalidGeometry> {
        if size.min_element() < 0.0 {
            return Err(InvalidGeometry::new("rectangle with negative size"));
        }
        if size.min_element() < EPSILON {
            return Ok(Self::empty());
        }
        Ok(Self::shape(Shape2::Rectangle { size }))
    }

    /// A circle.
    pub fn circle(radius: f64, segment_count: u32) -> Result<Self, InvalidGeometry> {
        if radius < 0.0 {
            return Err(InvalidGeometry::new("circle with negative radius"));
        }
        if radius < EPSILON {
            return Ok(Self::empty());
        }
        Ok(Self::shape(Shape2::Circle {
            radius,
            segment_count: segment_count.max(3),
        }))
    }

    /// A polygon with optional holes.
    pub fn polygon(outer: Vec<DVec2>, holes: Vec<Vec<DVec2>>) -> Result<Self, InvalidGeometry> {
        if outer.len() < 3 {
            return Err(InvalidGeometry::new("polygon outer loop needs 3 points"));
        }
        Ok(Self::shape(Shape2::Polygon { outer, holes }))
    }

    /// An affine transform over a child, with the same normalizations as
    /// the 3D constructor.
    pub fn transform(transform: Transform2, child: &GeometryNode2) -> Self {
        if child.is_empty() || transform.is_identity() {
            return child.clone();
        }
        if let NodeKind2::Transform {
            child: inner_child,
            transform: inner_transform,
        } = child.kind()
        {
            return Self::from_kind(NodeKind2::Transform {
                child: inner_child.clone(),
                transform: inner_transform.concatenated(&transform),
            });
        }
        Self::from_kind(NodeKind2::Transform {
            child: child.clone(),
            transform,
        })
    }

    /// A boolean composition with the 3D constructor's normalizations.
    pub fn boolean(children: Vec<GeometryNode2>, kind: BooleanOp) -> Self {
        let children: Vec<GeometryNode2> = match kind {
            BooleanOp::Union => children.into_iter().filter(|c| !c.is_empty()).collect(),
            BooleanOp::Intersection => {
                if children.iter().any(GeometryNode2::is_empty) {
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
            _ => Self::from_kind(NodeKind2::Boolean { children, kind }),
        }
    }

    /// A solid reduced to 2D.
    pub fn projection(child: &GeometryNode3, kind: ProjectionKind) -> Self {
        if child.is_empty() {
            return Self::empty();
        }
        Self::from_kind(NodeKind2::Projection {
            child: child.clone(),
            kind,
        })
    }

    /// Minkowski sum with a disk.
    pub fn offset(
        child: &GeometryNode2,
        distance: f64,
        join: JoinStyle,
        arc_segments: u32,
    ) -> Self {
        if child.is_empty() || distance.abs() < EPSILON {
            return child.clone();
        }
        Self::from_kind(NodeKind2::Offset {
            child: child.clone(),
            distance,
            join,
            arc_segments: arc_segments.max(4),
        })
    }

    /// The convex hull of a child.
    pub fn convex_hull(child: &GeometryNode2) -> Self {
        if child.is_empty() {
            return child.clone();
        }
        Self::from_kind(NodeKind2::ConvexHull {
            child: child.clone(),
        })
    }

    /// Collinear-run removal within `epsilon`.
    pub fn simplify(child: &GeometryNode2, epsilon: f64) -> Self {
        if child.is_empty() {
            return child.clone();
        }
        Self::from_kind(NodeKind2::Simplify {
            child: child.clone(),
            epsilon,
        })
    }

    /// A pointwise vertex remap.
    pub fn warp(
        child: &GeometryNode2,
        name: impl Into<String>,
        parameters: Vec<CacheParameter>,
        function: WarpFn2,
    ) -> Self {
        if child.is_empty() {
            return child.clone();
        }
        Self::from_kind(NodeKind2::Warp {
            child: child.clone(),
            name: name.into(),
            parameters,
            function,
        })
    }

    /// An opaque concrete-level operation with a stable cache identity.
    pub fn cached_operation(
        child: &GeometryNode2,
        name: impl Into<String>,
        parameters: Vec<CacheParameter>,
        function: PrimitiveFn2,
    ) -> Self {
        Self::from_kind(NodeKind2::CachedOperation {
            child: child.clone(),
            name: name.into(),
            parameters,
            function,
        })
    }

    /// The node variant.
    pub fn kind(&self) -> &NodeKind2 {
        &self.inner.kind
    }

    /// True for the empty node.
    pub fn is_empty(&self) -> bool {
        matches!(self.inner.kind, NodeKind2::Empty)
    }

    /// The variant tag, for diagnostics.
    pub fn variant_tag(&self) -> &'static str {
        match &self.inner.kind {
            NodeKind2::Empty => "empty",
            NodeKind2::Shape(_) => "shape",
            NodeKind2::Transform { .. } => "transform",
            NodeKind2::Boolean { .. } => "boolean",
            NodeKind2::Projection { .. } => "projection",
            NodeKind2::Offset { .. } => "offset",
            NodeKind2::ConvexHull { .. } => "convex-hull",
            NodeKind2::Simplify { .. } => "simplify",
            NodeKind2::Warp { .. } => "warp",
            NodeKind2::CachedOperation { .. } => "cached-operation",
        }
    }

    /// Direct 2D children.
    pub fn children(&self) -> Vec<&GeometryNode2> {
        match &self.inner.kind {
            NodeKind2::Empty | NodeKind2::Shape(_) | NodeKind2::Projection { .. } => Vec::new(),
            NodeKind2::Transform { child, .. }
            | NodeKind2::Offset { child, .. }
            | NodeKind2::ConvexHull { child }
            | NodeKind2::Simplify { child, .. }
            | NodeKind2::Warp { child, .. }
            | NodeKind2::CachedOperation { child, .. } => vec![child],
            NodeKind2::Boolean { children, .. } => children.iter().collect(),
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
            NodeKind2::Empty => hasher.write_tag("empty2"),
            NodeKind2::Shape(shape) => {
                hasher.write_tag("shape2");
                shape.feed(hasher);
            }
            NodeKind2::Transform { child, transform } => {
                hasher.write_tag("transform2");
                hasher.write_transform2(transform);
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind2::Boolean { children, kind } => {
                hasher.write_tag("boolean2");
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
            NodeKind2::Projection { child, kind } => {
                hasher.write_tag("projection");
                kind.feed(hasher);
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind2::Offset {
                child,
                distance,
                join,
                arc_segments,
            } => {
                hasher.write_tag("offset");
                hasher.write_f64(*distance);
                hasher.write_tag(match join {
                    JoinStyle::Miter => "miter",
                    JoinStyle::Round => "round",
                    JoinStyle::Bevel => "bevel",
                });
                hasher.write_u32(*arc_segments);
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind2::ConvexHull { child } => {
                hasher.write_tag("convex-hull2");
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind2::Simplify { child, epsilon } => {
                hasher.write_tag("simplify2");
                hasher.write_f64(*epsilon);
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind2::Warp {
                child,
                name,
                parameters,
                ..
            } => {
                hasher.write_tag("warp2");
                hasher.write_str(name);
                hasher.write_u64(parameters.len() as u64);
                for parameter in parameters {
                    parameter.feed(hasher);
                }
                hasher.write_fingerprint(child.fingerprint());
            }
            NodeKind2::CachedOperation {
                child,
                name,
                parameters,
                ..
            } => {
                hasher.write_tag("cached-op2");
                hasher.write_str(name);
                hasher.write_u64(parameters.len() as u64);
                for parameter in parameters {
                    parameter.feed(hasher);
                }
                hasher.write_fingerprint(child.fingerprint());
            }
        }
    }
}

impl Default for GeometryNode2 {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for GeometryNode2 {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.fingerprint() == other.fingerprint()
    }
}

impl Eq for GeometryNode2 {}

impl std::hash::Hash for GeometryNode2 {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.fingerprint().hash(state);
    }
}

impl std::fmt::Debug for GeometryNode2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GeometryNode2({})", self.variant_tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform_vanishes() {
        let circle = GeometryNode2::circle(5.0, 32).unwrap();
        assert_eq!(GeometryNode2::transform(Transform2::IDENTITY, &circle), circle);
    }

    #[test]
    fn test_equal_resolution_circles_share_fingerprint() {
        let a = GeometryNode2::circle(5.0, 32).unwrap();
        let b = GeometryNode2::circle(5.0, 32).unwrap();
        let c = GeometryNode2::circle(5.0, 64).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_zero_offset_vanishes() {
        let circle = GeometryNode2::circle(5.0, 32).unwrap();
        let node = GeometryNode2::offset(&circle, 0.0, JoinStyle::Round, 16);
        assert_eq!(node, circle);
    }

    #[test]
    fn test_degenerate_polygon_rejected() {
        assert!(GeometryNode2::polygon(vec![DVec2::ZERO, DVec2::X], vec![]).is_err());
    }
}
