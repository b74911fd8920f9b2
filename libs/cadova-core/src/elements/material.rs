//! Materials and the original-ID to material mapping.

use crate::fingerprint::FingerprintHasher;
use cadova_kernel::OriginalId;
use cadova_math::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Physically-based appearance parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalProperties {
    /// Metallic factor, `0..=1`.
    pub metallicness: f64,
    /// Roughness factor, `0..=1`.
    pub roughness: f64,
}

/// A surface material attached to a subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Optional display name.
    pub name: Option<String>,
    /// Base color with alpha.
    pub base_color: Color,
    /// Optional physical parameters; their presence selects the metallic
    /// display-properties group on export.
    pub physical: Option<PhysicalProperties>,
}

impl Material {
    /// A plain colored material.
    pub fn colored(base_color: Color) -> Self {
        Self {
            name: None,
            base_color,
            physical: None,
        }
    }

    /// A named material.
    pub fn named(name: impl Into<String>, base_color: Color) -> Self {
        Self {
            name: Some(name.into()),
            base_color,
            physical: None,
        }
    }

    /// Adds physical parameters.
    pub fn with_physical(mut self, metallicness: f64, roughness: f64) -> Self {
        self.physical = Some(PhysicalProperties {
            metallicness,
            roughness,
        });
        self
    }

    /// Feeds the material into a fingerprint hasher.
    pub fn feed(&self, hasher: &mut FingerprintHasher) {
        match &self.name {
            Some(name) => hasher.write_str(name),
            None => hasher.write_tag(""),
        }
        hasher.write_f64(self.base_color.red);
        hasher.write_f64(self.base_color.green);
        hasher.write_f64(self.base_color.blue);
        hasher.write_f64(self.base_color.alpha);
        match &self.physical {
            Some(physical) => {
                hasher.write_bool(true);
                hasher.write_f64(physical.metallicness);
                hasher.write_f64(physical.roughness);
            }
            None => hasher.write_bool(false),
        }
    }
}

/// The mapping from triangle attribution to materials, produced during
/// lowering and consumed on export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialMapping {
    entries: HashMap<OriginalId, Material>,
}

impl MaterialMapping {
    /// An empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a material for an original ID.
    pub fn insert(&mut self, original: OriginalId, material: Material) {
        self.entries.insert(original, material);
    }

    /// Looks up the material for an original ID.
    pub fn get(&self, original: OriginalId) -> Option<&Material> {
        self.entries.get(&original)
    }

    /// True when the ID carries a material.
    pub fn contains(&self, original: OriginalId) -> bool {
        self.entries.contains_key(&original)
    }

    /// Number of mapped IDs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no materials are mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries.
    pub fn iter(&self) -> impl Iterator<Item = (&OriginalId, &Material)> {
        self.entries.iter()
    }

    /// Map union; later operands win on conflicting IDs, which cannot
    /// happen for engine-allocated IDs.
    pub fn merged<'a, I: IntoIterator<Item = &'a MaterialMapping>>(mappings: I) -> Self {
        let mut out = Self::new();
        for mapping in mappings {
            for (original, material) in &mapping.entries {
                out.entries.insert(*original, material.clone());
            }
        }
        out
    }
}
