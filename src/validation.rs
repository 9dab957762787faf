//! Prerequisite edge validation.
//!
//! Consulted before any edge reaches the collection. Only self-loops,
//! duplicates and direct two-node cycles are rejected; longer cycles
//! (A → B → C → A) are still constructible.

use serde::{Deserialize, Serialize};

use crate::types::PrerequisiteEdge;

/// Why a proposed edge was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRejection {
    /// `source == target`.
    #[error("A skill cannot require itself.")]
    SelfLoop,
    /// The same (source, target) pair already exists.
    #[error("That prerequisite already exists.")]
    Duplicate,
    /// The reverse pair already exists.
    #[error("That prerequisite would create a direct cycle.")]
    DirectCycle,
}

impl EdgeRejection {
    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::SelfLoop => "self_loop",
            Self::Duplicate => "duplicate",
            Self::DirectCycle => "direct_cycle",
        }
    }
}

/// Decide whether `source -> target` may be added to `existing`.
///
/// Checks run in order and the first failure wins:
/// self-loop, duplicate, direct cycle.
pub fn validate_edge_creation(
    source: &str,
    target: &str,
    existing: &[PrerequisiteEdge],
) -> Result<(), EdgeRejection> {
    if source == target {
        return Err(EdgeRejection::SelfLoop);
    }

    if existing.iter().any(|edge| edge.connects(source, target)) {
        return Err(EdgeRejection::Duplicate);
    }

    if existing.iter().any(|edge| edge.connects(target, source)) {
        return Err(EdgeRejection::DirectCycle);
    }

    Ok(())
}
