//! # Export Errors

use cadova_core::EvaluationError;
use thiserror::Error;

/// An error surfaced while assembling or writing output files.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Evaluating geometry for export failed.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// Writing bytes failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Building the 3MF archive failed.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The model has nothing to export.
    #[error("model has no exportable geometry")]
    EmptyModel,
}
