//! Tags: named collections of build results.

use crate::build_result::BuildResult3;
use crate::node::GeometryNode3;
use cadova_math::Transform3;
use std::collections::BTreeMap;

/// Named lists of build results captured during building.
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    entries: BTreeMap<String, Vec<BuildResult3>>,
}

impl TagTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing is tagged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records a build result under `name`.
    pub fn insert(&mut self, name: impl Into<String>, result: BuildResult3) {
        self.entries.entry(name.into()).or_default().push(result);
    }

    /// The results recorded under `name`.
    pub fn get(&self, name: &str) -> Option<&[BuildResult3]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// All entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[BuildResult3])> {
        self.entries
            .iter()
            .map(|(name, results)| (name.as_str(), results.as_slice()))
    }

    /// Map-union with list concatenation.
    pub fn combine<I: IntoIterator<Item = TagTable>>(tables: I) -> Self {
        let mut out = Self::new();
        for table in tables {
            for (name, results) in table.entries {
                out.entries.entry(name).or_default().extend(results);
            }
        }
        out
    }

    /// Applies a node rewrite to every tagged result.
    pub fn modifying_nodes(&self, f: &dyn Fn(&GeometryNode3) -> GeometryNode3) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(name, results)| {
                let rewritten = results
                    .iter()
                    .map(|result| BuildResult3 {
                        node: f(&result.node),
                        elements: result.elements.clone(),
                    })
                    .collect();
                (name.clone(), rewritten)
            })
            .collect();
        Self { entries }
    }

    /// Pushes a parent transform onto every tagged node.
    pub fn applying_transform(&self, transform: &Transform3) -> Self {
        self.modifying_nodes(&|node| GeometryNode3::transform(*transform, node))
    }
}
