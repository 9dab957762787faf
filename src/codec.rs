//! Persistence codec for skill tree state.
//!
//! ## Strict document, lenient records
//!
//! `deserialize` fails only when the text is not JSON or the top-level
//! value is not an object. Every node and edge is validated on its own and
//! silently dropped when malformed, so one corrupted record never destroys
//! an otherwise valid tree.
//!
//! ## Round-trip law
//!
//! `deserialize(&serialize(state))` reproduces every node and edge, except
//! that `unlockable` comes back as `locked`.

use serde_json::{Map, Value};

use crate::canonical::to_canonical_string;
use crate::types::{
    PersistedNode, PersistedStatus, PersistedTreeState, Position, PrerequisiteEdge, SkillData,
    SkillNode, TreeState, synthesized_edge_id,
};

/// Error decoding a persisted document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Text is not parseable JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    /// JSON parsed but is not a tree document.
    #[error("Invalid persisted state shape: {0}")]
    InvalidShape(&'static str),
}

/// Encode live state. Derived statuses collapse to `locked`.
pub fn serialize(state: &TreeState) -> String {
    serialize_persisted(&state.to_persisted())
}

/// Encode an already-persisted state.
pub fn serialize_persisted(state: &PersistedTreeState) -> String {
    to_canonical_string(state)
}

/// Decode a persisted document, dropping malformed entries.
pub fn deserialize(text: &str) -> Result<PersistedTreeState, FormatError> {
    let parsed: Value =
        serde_json::from_str(text).map_err(|e| FormatError::InvalidJson(e.to_string()))?;

    let Value::Object(root) = parsed else {
        return Err(FormatError::InvalidShape("top-level value must be an object"));
    };

    Ok(coerce_tree_state(&root))
}

fn coerce_tree_state(root: &Map<String, Value>) -> PersistedTreeState {
    let raw_nodes = entries(root, "nodes");
    let raw_edges = entries(root, "edges");

    let nodes: Vec<PersistedNode> = raw_nodes.iter().filter_map(coerce_node).collect();
    let edges: Vec<PrerequisiteEdge> = raw_edges.iter().filter_map(coerce_edge).collect();

    let dropped_nodes = raw_nodes.len() - nodes.len();
    let dropped_edges = raw_edges.len() - edges.len();
    if dropped_nodes > 0 || dropped_edges > 0 {
        tracing::warn!(dropped_nodes, dropped_edges, "Dropped malformed persisted records");
    }

    let skill_points_total = root
        .get("skillPointsTotal")
        .and_then(finite_number)
        .filter(|total| *total >= 0.0)
        .map(|total| total.floor() as u64);

    PersistedTreeState {
        skill_points_total,
        nodes,
        edges,
    }
}

/// The array under `key`, or nothing when absent or not an array.
fn entries<'a>(root: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    root.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}

fn non_blank_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn coerce_position(value: Option<&Value>) -> Position {
    let coord = |axis: &str| {
        value
            .and_then(Value::as_object)
            .and_then(|position| position.get(axis))
            .and_then(finite_number)
            .unwrap_or(0.0)
    };
    Position::new(coord("x"), coord("y"))
}

fn coerce_node(value: &Value) -> Option<PersistedNode> {
    let node = value.as_object()?;
    let id = non_blank_str(node.get("id"))?;
    let data = node.get("data")?.as_object()?;
    let title = non_blank_str(data.get("title"))?;

    let data = SkillData {
        title: title.to_string(),
        description: data.get("description").and_then(Value::as_str).map(str::to_string),
        cost: data.get("cost").and_then(finite_number),
        level: data.get("level").and_then(finite_number),
        status: PersistedStatus::coerce(data.get("status").and_then(Value::as_str)),
    };

    Some(SkillNode::new(id, coerce_position(node.get("position")), data))
}

fn coerce_edge(value: &Value) -> Option<PrerequisiteEdge> {
    let edge = value.as_object()?;
    let source = non_blank_str(edge.get("source"))?;
    let target = non_blank_str(edge.get("target"))?;
    let id = non_blank_str(edge.get("id"))
        .map(str::to_string)
        .unwrap_or_else(|| synthesized_edge_id(source, target));

    Some(PrerequisiteEdge::new(id, source, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SkillStatus;
    use serde_json::json;

    fn live(id: &str, x: f64, y: f64, data: SkillData) -> SkillNode {
        SkillNode::new(id, Position::new(x, y), data)
    }

    #[test]
    fn test_round_trip_strips_unlockable() {
        let state = TreeState::new(
            vec![
                live("A", 1.0, 2.0, SkillData::new("A", SkillStatus::Unlockable)),
                live(
                    "B",
                    3.0,
                    4.0,
                    SkillData::new("B", SkillStatus::Completed)
                        .with_description("desc")
                        .with_points(Some(5.0), Some(2.0)),
                ),
            ],
            vec![PrerequisiteEdge::new("A->B", "A", "B")],
        );

        let restored = deserialize(&serialize(&state)).unwrap();
        assert_eq!(restored.nodes.len(), 2);
        assert_eq!(restored.nodes[0].data.status, PersistedStatus::Locked);
        assert_eq!(restored.nodes[1].data.status, PersistedStatus::Completed);
        assert_eq!(restored.nodes[1].data.description.as_deref(), Some("desc"));
        assert_eq!(restored.nodes[1].data.cost, Some(5.0));
        assert_eq!(restored.nodes[1].data.level, Some(2.0));
        assert_eq!(restored.nodes[1].position, Position::new(3.0, 4.0));
        assert_eq!(restored.edges, vec![PrerequisiteEdge::new("A->B", "A", "B")]);
    }

    #[test]
    fn test_invalid_json() {
        let err = deserialize("{not json").unwrap_err();
        assert!(matches!(err, FormatError::InvalidJson(_)));
        assert!(err.to_string().starts_with("Invalid JSON"));
    }

    #[test]
    fn test_non_object_document() {
        assert!(matches!(deserialize("[1,2,3]"), Err(FormatError::InvalidShape(_))));
        assert!(matches!(deserialize("null"), Err(FormatError::InvalidShape(_))));
        assert!(matches!(deserialize("\"text\""), Err(FormatError::InvalidShape(_))));
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let state = deserialize("{}").unwrap();
        assert!(state.is_empty());

        let state = deserialize(r#"{"nodes": 7, "edges": {"a": 1}}"#).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_drops_malformed_entries() {
        let text = json!({
            "nodes": [
                { "id": "A", "position": { "x": 0, "y": 0 }, "data": { "title": "A", "status": "unlocked" } },
                { "id": "", "position": { "x": 0, "y": 0 }, "data": { "title": "bad", "status": "locked" } },
                { "id": "B", "position": {}, "data": { "title": "B", "status": "nope" } },
                { "id": "C", "data": { "title": "C", "status": "locked" } },
                { "id": "D", "data": { "title": "   ", "status": "locked" } },
                { "id": "E" },
                "not an object"
            ],
            "edges": [
                { "source": "A", "target": "B" },
                { "id": "", "source": " ", "target": "B" },
                { "id": "x", "source": "A", "target": 123 }
            ]
        })
        .to_string();

        let state = deserialize(&text).unwrap();
        let ids: Vec<&str> = state.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(state.nodes[1].position, Position::new(0.0, 0.0));
        assert_eq!(state.nodes[1].data.status, PersistedStatus::Locked);
        assert_eq!(state.edges, vec![PrerequisiteEdge::new("A->B", "A", "B")]);
    }

    #[test]
    fn test_non_numeric_fields_become_absent() {
        let text = json!({
            "nodes": [{
                "id": "A",
                "position": { "x": "left", "y": 7.5 },
                "data": { "title": "A", "description": 4, "cost": "3", "level": 2, "status": "completed" }
            }],
            "edges": []
        })
        .to_string();

        let state = deserialize(&text).unwrap();
        let node = &state.nodes[0];
        assert_eq!(node.position, Position::new(0.0, 7.5));
        assert_eq!(node.data.description, None);
        assert_eq!(node.data.cost, None);
        assert_eq!(node.data.level, Some(2.0));
    }

    #[test]
    fn test_points_total() {
        let state = deserialize(r#"{"skillPointsTotal": 12.9, "nodes": [], "edges": []}"#).unwrap();
        assert_eq!(state.skill_points_total, Some(12));

        let state = deserialize(r#"{"skillPointsTotal": -1}"#).unwrap();
        assert_eq!(state.skill_points_total, None);

        let state = deserialize(r#"{"skillPointsTotal": "ten"}"#).unwrap();
        assert_eq!(state.skill_points_total, None);

        let text = serialize(&TreeState::default().with_points_total(7));
        assert!(text.contains("\"skillPointsTotal\":7"));
    }

    #[test]
    fn test_serialize_fills_blank_edge_ids() {
        let state = TreeState::new(vec![], vec![PrerequisiteEdge::new("", "A", "B")]);
        let restored = deserialize(&serialize(&state)).unwrap();
        assert_eq!(restored.edges[0].id, "A->B");
    }

    #[test]
    fn test_serialize_shape() {
        let state = TreeState::new(
            vec![live("A", 1.0, 2.0, SkillData::new("A", SkillStatus::Unlocked))],
            vec![],
        );
        let value: Value = serde_json::from_str(&serialize(&state)).unwrap();
        assert_eq!(
            value,
            json!({
                "nodes": [{ "id": "A", "position": { "x": 1.0, "y": 2.0 }, "data": { "title": "A", "status": "unlocked" } }],
                "edges": []
            })
        );
    }
}
