//! Status derivation over the prerequisite graph.
//!
//! `unlockable` is never authored. It is a projection of graph shape,
//! recomputed from scratch after every mutation:
//!
//! ```text
//! locked ──(all prereqs completed)──▶ unlockable      (derived)
//! unlockable ──(a prereq incomplete)──▶ locked        (derived)
//! unlockable ──(user unlock, budget ok)──▶ unlocked   (manual)
//! unlocked ──(user complete)──▶ completed             (manual)
//! ```
//!
//! Nothing leaves `completed`, and nothing re-enters `locked` from
//! `unlocked` or `completed`.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{PrerequisiteEdge, SkillNode, SkillStatus};

/// A single status flip produced by the derivation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Index of the node in the input collection.
    pub index: usize,
    /// Node id.
    pub node_id: String,
    /// Status before derivation.
    pub from: SkillStatus,
    /// Status after derivation.
    pub to: SkillStatus,
}

/// Unique prerequisite ids of `node_id`, in first-seen order.
pub fn inbound_prerequisites<'a>(edges: &'a [PrerequisiteEdge], node_id: &str) -> Vec<&'a str> {
    let mut seen: HashSet<&str> = HashSet::new();
    edges
        .iter()
        .filter(|edge| edge.target == node_id)
        .map(|edge| edge.source.as_str())
        .filter(|source| seen.insert(*source))
        .collect()
}

/// Index nodes by id. Later duplicates win.
pub fn index_nodes_by_id(nodes: &[SkillNode]) -> HashMap<&str, &SkillNode> {
    nodes.iter().map(|node| (node.id.as_str(), node)).collect()
}

/// Whether every prerequisite of `node_id` is completed.
///
/// Zero prerequisites means unlockable. A prerequisite id with no node
/// behind it can never be verified complete, so it blocks.
pub fn is_unlockable(
    nodes_by_id: &HashMap<&str, &SkillNode>,
    edges: &[PrerequisiteEdge],
    node_id: &str,
) -> bool {
    inbound_prerequisites(edges, node_id)
        .into_iter()
        .all(|prereq_id| {
            nodes_by_id
                .get(prereq_id)
                .is_some_and(|prereq| prereq.status() == SkillStatus::Completed)
        })
}

/// Status flips the derivation pass would apply, without applying them.
pub fn status_changes(nodes: &[SkillNode], edges: &[PrerequisiteEdge]) -> Vec<StatusChange> {
    let nodes_by_id = index_nodes_by_id(nodes);

    nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.status().is_derived())
        .filter_map(|(index, node)| {
            let next = if is_unlockable(&nodes_by_id, edges, &node.id) {
                SkillStatus::Unlockable
            } else {
                SkillStatus::Locked
            };
            (node.status() != next).then(|| StatusChange {
                index,
                node_id: node.id.clone(),
                from: node.status(),
                to: next,
            })
        })
        .collect()
}

/// Recompute derived statuses for every `locked`/`unlockable` node.
///
/// Returns `Cow::Borrowed` when nothing changes, so callers can detect a
/// no-op without comparing nodes. Idempotent: a second pass over the
/// result is always borrowed.
pub fn derive_statuses<'a>(
    nodes: &'a [SkillNode],
    edges: &[PrerequisiteEdge],
) -> Cow<'a, [SkillNode]> {
    let changes = status_changes(nodes, edges);
    if changes.is_empty() {
        return Cow::Borrowed(nodes);
    }

    tracing::debug!(changed = changes.len(), total = nodes.len(), "Derived skill statuses");

    let mut derived = nodes.to_vec();
    for change in changes {
        derived[change.index].data.status = change.to;
    }
    Cow::Owned(derived)
}

/// In-place variant of [`derive_statuses`]. Returns the applied changes.
pub fn apply_derived_statuses(
    nodes: &mut [SkillNode],
    edges: &[PrerequisiteEdge],
) -> Vec<StatusChange> {
    let changes = status_changes(nodes, edges);
    for change in &changes {
        nodes[change.index].data.status = change.to;
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Position, SkillData};

    fn node(id: &str, status: SkillStatus) -> SkillNode {
        SkillNode::new(id, Position::default(), SkillData::new(id, status))
    }

    fn edge(source: &str, target: &str) -> PrerequisiteEdge {
        PrerequisiteEdge::between(source, target)
    }

    fn status_of(nodes: &[SkillNode], id: &str) -> SkillStatus {
        nodes.iter().find(|n| n.id == id).unwrap().status()
    }

    #[test]
    fn test_inbound_prerequisites_unique_in_order() {
        let edges = vec![edge("A", "B"), edge("A", "B"), edge("C", "B"), edge("A", "D")];

        assert_eq!(inbound_prerequisites(&edges, "B"), vec!["A", "C"]);
        assert_eq!(inbound_prerequisites(&edges, "D"), vec!["A"]);
        assert!(inbound_prerequisites(&edges, "A").is_empty());
        assert!(inbound_prerequisites(&[], "A").is_empty());
    }

    #[test]
    fn test_no_prerequisites_is_unlockable() {
        let nodes = vec![node("A", SkillStatus::Locked)];
        let by_id = index_nodes_by_id(&nodes);
        assert!(is_unlockable(&by_id, &[], "A"));
    }

    #[test]
    fn test_unlockable_only_when_all_completed() {
        let edges = vec![edge("A", "B"), edge("C", "B")];

        let nodes = vec![
            node("A", SkillStatus::Completed),
            node("B", SkillStatus::Locked),
            node("C", SkillStatus::Unlocked),
        ];
        assert!(!is_unlockable(&index_nodes_by_id(&nodes), &edges, "B"));

        let nodes = vec![
            node("A", SkillStatus::Completed),
            node("B", SkillStatus::Locked),
            node("C", SkillStatus::Completed),
        ];
        assert!(is_unlockable(&index_nodes_by_id(&nodes), &edges, "B"));
    }

    #[test]
    fn test_missing_prerequisite_blocks() {
        let nodes = vec![node("B", SkillStatus::Locked)];
        let edges = vec![edge("MISSING", "B")];
        assert!(!is_unlockable(&index_nodes_by_id(&nodes), &edges, "B"));
    }

    #[test]
    fn test_derive_locked_to_unlockable_without_prereqs() {
        let nodes = vec![node("A", SkillStatus::Locked), node("B", SkillStatus::Unlocked)];
        let next = derive_statuses(&nodes, &[]);

        assert_eq!(status_of(&next, "A"), SkillStatus::Unlockable);
        assert_eq!(status_of(&next, "B"), SkillStatus::Unlocked);
    }

    #[test]
    fn test_derive_unlockable_to_locked_on_new_prereq() {
        let nodes = vec![node("A", SkillStatus::Locked), node("B", SkillStatus::Unlockable)];
        let next = derive_statuses(&nodes, &[edge("A", "B")]);
        assert_eq!(status_of(&next, "B"), SkillStatus::Locked);
    }

    #[test]
    fn test_derive_locked_to_unlockable_when_prereqs_completed() {
        let nodes = vec![node("A", SkillStatus::Completed), node("B", SkillStatus::Locked)];
        let next = derive_statuses(&nodes, &[edge("A", "B")]);
        assert_eq!(status_of(&next, "B"), SkillStatus::Unlockable);
    }

    #[test]
    fn test_derive_keeps_sticky_statuses() {
        let nodes = vec![
            node("A", SkillStatus::Locked),
            node("B", SkillStatus::Unlocked),
            node("C", SkillStatus::Completed),
        ];
        let edges = vec![edge("A", "B"), edge("A", "C")];
        let next = derive_statuses(&nodes, &edges);

        assert_eq!(status_of(&next, "B"), SkillStatus::Unlocked);
        assert_eq!(status_of(&next, "C"), SkillStatus::Completed);
    }

    #[test]
    fn test_derive_borrows_when_unchanged() {
        let nodes = vec![node("A", SkillStatus::Unlockable), node("B", SkillStatus::Locked)];
        let edges = vec![edge("A", "B")];

        let derived = derive_statuses(&nodes, &edges);
        assert!(matches!(derived, Cow::Borrowed(_)));
    }

    #[test]
    fn test_derive_is_idempotent() {
        let nodes = vec![
            node("A", SkillStatus::Completed),
            node("B", SkillStatus::Locked),
            node("C", SkillStatus::Unlockable),
            node("D", SkillStatus::Locked),
        ];
        let edges = vec![edge("A", "B"), edge("B", "C"), edge("GHOST", "D")];

        let once = derive_statuses(&nodes, &edges).into_owned();
        let twice = derive_statuses(&once, &edges);
        assert!(matches!(twice, Cow::Borrowed(_)));
        assert_eq!(once.as_slice(), twice.as_ref());
        assert_eq!(status_of(&once, "B"), SkillStatus::Unlockable);
        assert_eq!(status_of(&once, "C"), SkillStatus::Locked);
        assert_eq!(status_of(&once, "D"), SkillStatus::Locked);
    }

    #[test]
    fn test_status_changes_report() {
        let nodes = vec![node("A", SkillStatus::Locked), node("B", SkillStatus::Unlockable)];
        let changes = status_changes(&nodes, &[edge("A", "B")]);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].node_id, "A");
        assert_eq!(changes[0].to, SkillStatus::Unlockable);
        assert_eq!(changes[1].node_id, "B");
        assert_eq!(changes[1].from, SkillStatus::Unlockable);
        assert_eq!(changes[1].to, SkillStatus::Locked);
    }

    #[test]
    fn test_apply_in_place_matches_derive() {
        let mut nodes = vec![node("A", SkillStatus::Completed), node("B", SkillStatus::Locked)];
        let edges = vec![edge("A", "B")];
        let expected = derive_statuses(&nodes, &edges).into_owned();

        let applied = apply_derived_statuses(&mut nodes, &edges);
        assert_eq!(applied.len(), 1);
        assert_eq!(nodes, expected);
    }
}
