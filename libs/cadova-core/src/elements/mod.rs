//! # Result Elements
//!
//! Auxiliary side-products carried alongside geometry through building:
//! the part catalog, anchor frames, and tagged results. Each kind knows
//! how to combine across merged subtrees and how to follow a parent
//! re-wrap.

mod anchor;
mod material;
mod part;
mod tag;

pub use anchor::AnchorTable;
pub use material::{Material, MaterialMapping, PhysicalProperties};
pub use part::{Part, PartCatalog, PartId, PartSemantic};
pub use tag::TagTable;

use crate::node::GeometryNode3;
use cadova_math::Transform3;

/// The table of result elements attached to a build result.
#[derive(Debug, Clone, Default)]
pub struct ResultElements {
    /// Geometry routed into named parts.
    pub parts: PartCatalog,
    /// Anchor frames.
    pub anchors: AnchorTable,
    /// Tagged build results.
    pub tags: TagTable,
}

impl ResultElements {
    /// The empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every element kind is empty.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.anchors.is_empty() && self.tags.is_empty()
    }

    /// Combines tables from merged subtrees, element kind by element
    /// kind.
    pub fn combine<I: IntoIterator<Item = ResultElements>>(tables: I) -> Self {
        let mut parts = Vec::new();
        let mut anchors = Vec::new();
        let mut tags = Vec::new();
        for table in tables {
            parts.push(table.parts);
            anchors.push(table.anchors);
            tags.push(table.tags);
        }
        Self {
            parts: PartCatalog::combine(parts),
            anchors: AnchorTable::combine(anchors),
            tags: TagTable::combine(tags),
        }
    }

    /// Follows a parent transform wrap.
    pub fn applying_transform(&self, transform: &Transform3) -> Self {
        Self {
            parts: self.parts.applying_transform(transform),
            anchors: self.anchors.applying_transform(transform),
            tags: self.tags.applying_transform(transform),
        }
    }

    /// Follows an arbitrary parent node rewrite.
    pub fn modifying_nodes(&self, f: &dyn Fn(&GeometryNode3) -> GeometryNode3) -> Self {
        Self {
            parts: self.parts.modifying_nodes(f),
            anchors: self.anchors.clone(),
            tags: self.tags.modifying_nodes(f),
        }
    }
}
