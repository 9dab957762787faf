//! Title search with one-hop neighbourhood highlighting.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{PrerequisiteEdge, SkillNode, edge_key};

/// Ids and edge keys to emphasise for a search query.
///
/// All three sets are empty when no filtering is active.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchHighlight {
    /// Nodes whose title contains the query.
    pub match_ids: BTreeSet<String>,
    /// Matches plus every node one hop away in either direction.
    pub highlighted_ids: BTreeSet<String>,
    /// `"source->target"` keys of edges with both endpoints highlighted.
    pub highlighted_edge_keys: BTreeSet<String>,
}

impl SearchHighlight {
    /// Whether the query matched anything.
    pub fn has_matches(&self) -> bool {
        !self.match_ids.is_empty()
    }

    /// Whether `node_id` should be shown de-emphasised.
    pub fn is_dimmed(&self, node_id: &str) -> bool {
        self.has_matches() && !self.highlighted_ids.contains(node_id)
    }
}

/// Trimmed, lowercased query.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Compute match and highlight sets for `query` over node titles.
pub fn search_highlight_sets(
    nodes: &[SkillNode],
    edges: &[PrerequisiteEdge],
    query: &str,
) -> SearchHighlight {
    let query = normalize_query(query);
    if query.is_empty() {
        return SearchHighlight::default();
    }

    let match_ids: BTreeSet<String> = nodes
        .iter()
        .filter(|node| node.data.title.to_lowercase().contains(&query))
        .map(|node| node.id.clone())
        .collect();

    let mut highlighted_ids = match_ids.clone();
    for edge in edges {
        if match_ids.contains(&edge.source) {
            highlighted_ids.insert(edge.target.clone());
        }
        if match_ids.contains(&edge.target) {
            highlighted_ids.insert(edge.source.clone());
        }
    }

    let highlighted_edge_keys = edges
        .iter()
        .filter(|edge| {
            highlighted_ids.contains(&edge.source) && highlighted_ids.contains(&edge.target)
        })
        .map(|edge| edge_key(&edge.source, &edge.target))
        .collect();

    SearchHighlight {
        match_ids,
        highlighted_ids,
        highlighted_edge_keys,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Position, SkillData, SkillStatus};

    fn node(id: &str, title: &str) -> SkillNode {
        SkillNode::new(id, Position::default(), SkillData::new(title, SkillStatus::Locked))
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn graph() -> (Vec<SkillNode>, Vec<PrerequisiteEdge>) {
        let nodes = vec![
            node("a", "Archery"),
            node("b", "Bow Mastery"),
            node("c", "Swordplay"),
            node("d", "Parry"),
            node("e", "Fletching"),
        ];
        let edges = vec![
            PrerequisiteEdge::between("e", "a"),
            PrerequisiteEdge::between("a", "b"),
            PrerequisiteEdge::between("c", "d"),
            PrerequisiteEdge::between("b", "d"),
        ];
        (nodes, edges)
    }

    #[test]
    fn test_empty_query_yields_empty_sets() {
        let (nodes, edges) = graph();
        assert_eq!(search_highlight_sets(&nodes, &edges, ""), SearchHighlight::default());
        assert_eq!(search_highlight_sets(&nodes, &edges, "   "), SearchHighlight::default());
    }

    #[test]
    fn test_case_insensitive_substring_match() {
        let (nodes, edges) = graph();
        let result = search_highlight_sets(&nodes, &edges, "  ARCH ");
        assert_eq!(result.match_ids, set(&["a"]));
    }

    #[test]
    fn test_one_hop_neighbourhood() {
        let (nodes, edges) = graph();
        let result = search_highlight_sets(&nodes, &edges, "archery");

        assert_eq!(result.highlighted_ids, set(&["a", "b", "e"]));
        assert_eq!(result.highlighted_edge_keys, set(&["a->b", "e->a"]));
        assert!(result.is_dimmed("d"));
        assert!(!result.is_dimmed("b"));
    }

    #[test]
    fn test_edge_between_two_neighbours_is_highlighted() {
        let nodes = vec![node("m", "Magic"), node("x", "X"), node("y", "Y")];
        let edges = vec![
            PrerequisiteEdge::between("m", "x"),
            PrerequisiteEdge::between("m", "y"),
            PrerequisiteEdge::between("x", "y"),
        ];
        let result = search_highlight_sets(&nodes, &edges, "magic");
        assert!(result.highlighted_edge_keys.contains("x->y"));
    }

    #[test]
    fn test_no_match() {
        let (nodes, edges) = graph();
        let result = search_highlight_sets(&nodes, &edges, "alchemy");
        assert!(!result.has_matches());
        assert!(result.highlighted_ids.is_empty());
        assert!(!result.is_dimmed("a"));
    }
}
