//! # Evaluation Errors
//!
//! The error surface of the evaluation engine. Failures are stored in the
//! concretization cache, so identical requests observe the identical
//! error; nothing is retried.

use cadova_kernel::KernelError;
use cadova_math::InvalidGeometry;
use thiserror::Error;

/// An error surfaced by building or lowering geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// A user precondition was violated while constructing geometry.
    #[error(transparent)]
    InvalidGeometry(#[from] InvalidGeometry),

    /// A kernel operation failed.
    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// A named part was not found during import.
    #[error("missing part: {0}")]
    MissingPart(String),

    /// An object identifier was not found during import.
    #[error("missing object: {0}")]
    MissingObject(String),

    /// An imported file could not be parsed.
    #[error("decode error: {0}")]
    Decode(String),

    /// The evaluation pipeline was cancelled cooperatively.
    #[error("evaluation cancelled")]
    Cancelled,
}
