//! # Original IDs
//!
//! Opaque identifiers attached to triangles at creation and tracked
//! through every kernel operation. The evaluator maps them to materials
//! after lowering.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// An opaque per-surface identifier.
///
/// `OriginalId::UNTRACKED` marks triangles with no material attribution,
/// such as cut caps introduced by a plane split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OriginalId(pub u32);

impl OriginalId {
    /// The identifier for unattributed triangles.
    pub const UNTRACKED: Self = Self(0);

    /// True when this identifier carries attribution.
    pub fn is_tracked(self) -> bool {
        self != Self::UNTRACKED
    }
}

static NEXT_ORIGINAL_ID: AtomicU32 = AtomicU32::new(1);

impl OriginalId {
    /// Allocates a process-unique identifier.
    pub fn fresh() -> Self {
        Self(NEXT_ORIGINAL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique_and_tracked() {
        let a = OriginalId::fresh();
        let b = OriginalId::fresh();
        assert_ne!(a, b);
        assert!(a.is_tracked());
        assert!(!OriginalId::UNTRACKED.is_tracked());
    }
}
