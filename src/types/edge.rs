//! Prerequisite edge types for the skill tree kernel.

use serde::{Deserialize, Serialize};

/// Key identifying an edge by its endpoints: `"source->target"`.
pub fn edge_key(source: &str, target: &str) -> String {
    format!("{source}->{target}")
}

/// Edge id used when a stored edge has none.
pub fn synthesized_edge_id(source: &str, target: &str) -> String {
    edge_key(source, target)
}

/// Directed prerequisite edge.
///
/// Completing `source` is required before `target` becomes eligible.
/// Implements `Ord` for deterministic ordering: (source, target, id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrerequisiteEdge {
    /// Edge identifier.
    pub id: String,
    /// Prerequisite skill id.
    pub source: String,
    /// Dependent skill id.
    pub target: String,
}

impl PrerequisiteEdge {
    /// Create a new edge.
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// Create an edge whose id is derived from its endpoints.
    pub fn between(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: synthesized_edge_id(&source, &target),
            source,
            target,
        }
    }

    /// `"source->target"` key of this edge.
    pub fn key(&self) -> String {
        edge_key(&self.source, &self.target)
    }

    /// Whether this edge connects exactly `source -> target`.
    pub fn connects(&self, source: &str, target: &str) -> bool {
        self.source == source && self.target == target
    }

    /// Whether either endpoint is `node_id`.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// Copy of this edge with a blank id replaced by the synthesized one.
    pub fn with_resolved_id(&self) -> Self {
        if self.id.trim().is_empty() {
            Self::between(self.source.clone(), self.target.clone())
        } else {
            self.clone()
        }
    }
}

impl PartialOrd for PrerequisiteEdge {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrerequisiteEdge {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.source
            .cmp(&other.source)
            .then_with(|| self.target.cmp(&other.target))
            .then_with(|| self.id.cmp(&other.id))
    }
}
