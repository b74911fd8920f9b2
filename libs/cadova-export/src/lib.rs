//! # Cadova Export
//!
//! Output providers for the Cadova pipeline. The provider assembles an
//! evaluated model and its part catalog into a neutral export structure;
//! the writers serialize that structure as a 3MF archive, a binary STL,
//! or an SVG document.

pub mod error;
pub mod provider;
pub mod stl;
pub mod svg;
pub mod threemf;

pub use error::ExportError;
pub use provider::{assemble, ExportModel, ExportPart};
pub use stl::write_stl;
pub use svg::svg_document;
pub use threemf::write_threemf;
