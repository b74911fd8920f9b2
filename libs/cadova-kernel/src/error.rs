//! # Kernel Errors
//!
//! Error type for solid-modelling operations.

use thiserror::Error;

/// How a kernel operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelErrorKind {
    /// The result (or an operand) is not a closed, watertight manifold.
    NonManifold,
    /// The operation produced or received empty geometry where it needs
    /// content.
    Empty,
    /// The operation is not supported for the given operands.
    Unsupported,
    /// An operand is degenerate (collinear hull seed, zero-area polygon).
    Degenerate,
}

impl std::fmt::Display for KernelErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NonManifold => "non-manifold",
            Self::Empty => "empty",
            Self::Unsupported => "unsupported",
            Self::Degenerate => "degenerate",
        };
        f.write_str(name)
    }
}

/// A solid-modelling operation failed.
///
/// Carries the operation name for diagnostics; the engine surfaces these
/// without attempting recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("kernel operation '{op_name}' failed: {kind}")]
pub struct KernelError {
    /// Name of the failing operation.
    pub op_name: String,
    /// Failure category.
    pub kind: KernelErrorKind,
}

impl KernelError {
    /// Creates an error for the named operation.
    pub fn new(op_name: impl Into<String>, kind: KernelErrorKind) -> Self {
        Self {
            op_name: op_name.into(),
            kind,
        }
    }

    /// Shorthand for an empty-result failure.
    pub fn empty(op_name: impl Into<String>) -> Self {
        Self::new(op_name, KernelErrorKind::Empty)
    }

    /// Shorthand for a degenerate-operand failure.
    pub fn degenerate(op_name: impl Into<String>) -> Self {
        Self::new(op_name, KernelErrorKind::Degenerate)
    }
}
