//! # Model Options
//!
//! The typed option table consumed by output providers: target format,
//! compression, model naming, and document metadata.

use crate::elements::PartSemantic;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The 3D output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileFormat3D {
    /// 3MF archive.
    ThreeMf,
    /// Binary STL.
    Stl,
}

/// Archive compression preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compression {
    /// Balanced default.
    Standard,
    /// Fastest compression.
    Fastest,
    /// Smallest output.
    Smallest,
}

impl Default for Compression {
    fn default() -> Self {
        Self::Standard
    }
}

/// Document metadata embedded in exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Author name.
    pub author: Option<String>,
    /// License string.
    pub license: Option<String>,
    /// Creation date, ISO-8601.
    pub date: Option<String>,
    /// Producing application.
    pub application: Option<String>,
}

/// Options governing evaluation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Output format for 3D exports.
    pub format: FileFormat3D,
    /// Archive compression.
    pub compression: Compression,
    /// Model name, used for file-level titles.
    pub model_name: Option<String>,
    /// Document metadata.
    pub metadata: Metadata,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            format: FileFormat3D::ThreeMf,
            compression: Compression::Standard,
            model_name: None,
            metadata: Metadata::default(),
        }
    }
}

impl ModelOptions {
    /// Which part semantics a format includes.
    ///
    /// STL flattens everything printable into one solid; 3MF keeps solid
    /// and visual parts as separate objects.
    pub fn included_part_semantics(&self, format: FileFormat3D) -> HashSet<PartSemantic> {
        match format {
            FileFormat3D::Stl => HashSet::from([PartSemantic::Solid]),
            FileFormat3D::ThreeMf => {
                HashSet::from([PartSemantic::Solid, PartSemantic::Visual])
            }
        }
    }

    /// The title used for file headers: metadata title, model name, or
    /// the application default.
    pub fn display_title(&self) -> String {
        self.metadata
            .title
            .clone()
            .or_else(|| self.model_name.clone())
            .unwrap_or_else(|| "Cadova model".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_fallback_chain() {
        let mut options = ModelOptions::default();
        assert_eq!(options.display_title(), "Cadova model");
        options.model_name = Some("bracket".into());
        assert_eq!(options.display_title(), "bracket");
        options.metadata.title = Some("Bracket v2".into());
        assert_eq!(options.display_title(), "Bracket v2");
    }

    #[test]
    fn test_stl_includes_only_solids() {
        let options = ModelOptions::default();
        let included = options.included_part_semantics(FileFormat3D::Stl);
        assert!(included.contains(&PartSemantic::Solid));
        assert!(!included.contains(&PartSemantic::Visual));
        assert!(!included.contains(&PartSemantic::Context));
    }
}
