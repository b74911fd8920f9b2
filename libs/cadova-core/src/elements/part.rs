//! Parts: named output buckets with identity equality.

use super::material::Material;
use crate::build_result::BuildResult3;
use crate::node::GeometryNode3;
use cadova_math::Transform3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What a part means for manufacturing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PartSemantic {
    /// Printable solid geometry.
    Solid,
    /// Non-printable display geometry.
    Visual,
    /// Surrounding context, excluded from most outputs.
    Context,
}

/// A generated, stable part identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(u64);

static NEXT_PART_ID: AtomicU64 = AtomicU64::new(1);

/// A named output bucket.
///
/// Equality is by generated identity, not by name: two parts created with
/// the same name are different buckets, while clones of one part refer to
/// the same bucket.
#[derive(Debug, Clone)]
pub struct Part {
    inner: Arc<PartData>,
}

#[derive(Debug)]
struct PartData {
    id: PartId,
    name: String,
    semantic: PartSemantic,
    default_material: Option<Material>,
}

impl Part {
    /// A new part with a fresh identity.
    pub fn new(name: impl Into<String>, semantic: PartSemantic) -> Self {
        Self {
            inner: Arc::new(PartData {
                id: PartId(NEXT_PART_ID.fetch_add(1, Ordering::Relaxed)),
                name: name.into(),
                semantic,
                default_material: None,
            }),
        }
    }

    /// A new solid part.
    pub fn solid(name: impl Into<String>) -> Self {
        Self::new(name, PartSemantic::Solid)
    }

    /// A copy of this part with a default material.
    ///
    /// The copy keeps the same identity; it still names the same bucket.
    pub fn with_default_material(&self, material: Material) -> Self {
        Self {
            inner: Arc::new(PartData {
                id: self.inner.id,
                name: self.inner.name.clone(),
                semantic: self.inner.semantic,
                default_material: Some(material),
            }),
        }
    }

    /// The generated identity.
    pub fn id(&self) -> PartId {
        self.inner.id
    }

    /// The user-visible name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The part semantic.
    pub fn semantic(&self) -> PartSemantic {
        self.inner.semantic
    }

    /// The default material, when set.
    pub fn default_material(&self) -> Option<&Material> {
        self.inner.default_material.as_ref()
    }
}

impl PartialEq for Part {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Part {}

impl std::hash::Hash for Part {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl PartialOrd for Part {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Part {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner.id.cmp(&other.inner.id)
    }
}

/// The catalog routing tagged geometry into parts.
///
/// Entries keep insertion-independent, identity-ordered iteration so
/// export output is deterministic.
#[derive(Debug, Clone, Default)]
pub struct PartCatalog {
    entries: BTreeMap<Part, Vec<BuildResult3>>,
}

impl PartCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no geometry is routed anywhere.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Routes a build result into `part`'s bucket.
    pub fn insert(&mut self, part: Part, result: BuildResult3) {
        self.entries.entry(part).or_default().push(result);
    }

    /// The contents of one bucket.
    pub fn get(&self, part: &Part) -> Option<&[BuildResult3]> {
        self.entries.get(part).map(Vec::as_slice)
    }

    /// All buckets in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&Part, &[BuildResult3])> {
        self.entries.iter().map(|(part, list)| (part, list.as_slice()))
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Map-union with list concatenation: identity-equal parts merge into
    /// one bucket.
    pub fn combine<I: IntoIterator<Item = PartCatalog>>(catalogs: I) -> Self {
        let mut out = Self::new();
        for catalog in catalogs {
            for (part, results) in catalog.entries {
                out.entries.entry(part).or_default().extend(results);
            }
        }
        out
    }

    /// Applies a node rewrite to every routed build result.
    pub fn modifying_nodes(&self, f: &dyn Fn(&GeometryNode3) -> GeometryNode3) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(part, results)| {
                let rewritten = results
                    .iter()
                    .map(|result| BuildResult3 {
                        node: f(&result.node),
                        elements: result.elements.clone(),
                    })
                    .collect();
                (part.clone(), rewritten)
            })
            .collect();
        Self { entries }
    }

    /// Pushes a parent transform onto every routed node.
    pub fn applying_transform(&self, transform: &Transform3) -> Self {
        self.modifying_nodes(&|node| GeometryNode3::transform(*transform, node))
    }
}
