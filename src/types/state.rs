//! Whole-tree state, live and persisted.

use serde::{Deserialize, Serialize};

use super::edge::PrerequisiteEdge;
use super::skill::{PersistedNode, SkillNode};

/// Live graph state held by the host.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TreeState {
    /// User-editable point budget, if one has been set.
    pub skill_points_total: Option<u64>,
    /// All skill nodes.
    pub nodes: Vec<SkillNode>,
    /// All prerequisite edges.
    pub edges: Vec<PrerequisiteEdge>,
}

impl TreeState {
    /// Create a state from nodes and edges with no budget set.
    pub fn new(nodes: Vec<SkillNode>, edges: Vec<PrerequisiteEdge>) -> Self {
        Self {
            skill_points_total: None,
            nodes,
            edges,
        }
    }

    /// Set the point budget.
    pub fn with_points_total(mut self, total: u64) -> Self {
        self.skill_points_total = Some(total);
        self
    }

    /// Durable projection: derived statuses collapse, blank edge ids are filled.
    pub fn to_persisted(&self) -> PersistedTreeState {
        PersistedTreeState {
            skill_points_total: self.skill_points_total,
            nodes: self.nodes.iter().map(SkillNode::to_persisted).collect(),
            edges: self.edges.iter().map(PrerequisiteEdge::with_resolved_id).collect(),
        }
    }
}

impl From<PersistedTreeState> for TreeState {
    fn from(state: PersistedTreeState) -> Self {
        Self {
            skill_points_total: state.skill_points_total,
            nodes: state.nodes.into_iter().map(SkillNode::from).collect(),
            edges: state.edges,
        }
    }
}

/// Durable record of a skill tree.
///
/// Field names are part of the storage format and must not change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTreeState {
    /// Point budget, when one was saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_points_total: Option<u64>,
    /// Persisted nodes.
    pub nodes: Vec<PersistedNode>,
    /// Persisted edges.
    pub edges: Vec<PrerequisiteEdge>,
}

impl PersistedTreeState {
    /// The canonical empty state: no nodes, no edges, no budget.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the record holds no graph at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PersistedStatus, Position, SkillData, SkillStatus};

    #[test]
    fn test_to_persisted_collapses_unlockable() {
        let state = TreeState::new(
            vec![SkillNode::new(
                "A",
                Position::new(1.0, 2.0),
                SkillData::new("A", SkillStatus::Unlockable),
            )],
            vec![PrerequisiteEdge::new("", "A", "B")],
        );

        let persisted = state.to_persisted();
        assert_eq!(persisted.nodes[0].data.status, PersistedStatus::Locked);
        assert_eq!(persisted.edges[0].id, "A->B");
    }

    #[test]
    fn test_points_total_field_name() {
        let state = PersistedTreeState {
            skill_points_total: Some(12),
            ..PersistedTreeState::empty()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["skillPointsTotal"], 12);

        let json = serde_json::to_value(PersistedTreeState::empty()).unwrap();
        assert!(json.get("skillPointsTotal").is_none());
    }
}
