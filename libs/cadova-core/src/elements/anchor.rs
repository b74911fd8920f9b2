//! Anchors: named transforms captured during building.

use cadova_math::Transform3;
use std::collections::BTreeMap;

/// Named sets of transforms defining anchor points.
///
/// An anchor records the local frame where it was defined; parent
/// transforms accumulate as the build result is re-wrapped upward.
#[derive(Debug, Clone, Default)]
pub struct AnchorTable {
    entries: BTreeMap<String, Vec<Transform3>>,
}

impl AnchorTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no anchors are defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records an anchor frame under `name`.
    pub fn insert(&mut self, name: impl Into<String>, transform: Transform3) {
        self.entries.entry(name.into()).or_default().push(transform);
    }

    /// The frames recorded under `name`.
    pub fn get(&self, name: &str) -> Option<&[Transform3]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// All entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Transform3])> {
        self.entries
            .iter()
            .map(|(name, frames)| (name.as_str(), frames.as_slice()))
    }

    /// Map-union with list concatenation.
    pub fn combine<I: IntoIterator<Item = AnchorTable>>(tables: I) -> Self {
        let mut out = Self::new();
        for table in tables {
            for (name, frames) in table.entries {
                out.entries.entry(name).or_default().extend(frames);
            }
        }
        out
    }

    /// Applies a parent transform to every recorded frame.
    pub fn applying_transform(&self, transform: &Transform3) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(name, frames)| {
                (
                    name.clone(),
                    frames.iter().map(|f| f.concatenated(transform)).collect(),
                )
            })
            .collect();
        Self { entries }
    }
}
