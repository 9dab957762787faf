//! Skill tree aggregate.
//!
//! Owns the node and edge collections and applies every user action
//! through the kernel rules: edges pass the validator, unlocks pass the
//! budget gate, and statuses are re-derived after each mutation.

use serde::{Deserialize, Serialize};

use crate::points::{
    check_unlock_budget, clamp_points_total, total_spent, BudgetShortfall, PointsAdjustment,
};
use crate::search::{search_highlight_sets, SearchHighlight};
use crate::status::apply_derived_statuses;
use crate::types::{
    PersistedTreeState, Position, PrerequisiteEdge, SkillData, SkillNode, SkillStatus, TreeState,
};
use crate::validation::{validate_edge_creation, EdgeRejection};
use crate::DEFAULT_SKILL_POINTS_TOTAL;

/// Id of the skill a fresh tree starts with.
pub const ROOT_SKILL_ID: &str = "root";
/// Title of the skill a fresh tree starts with.
pub const ROOT_SKILL_TITLE: &str = "Root Skill";
/// Base title for skills created from a prerequisite.
pub const NEW_SKILL_TITLE: &str = "New Skill";

/// Error for refused tree mutations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// No skill with this id.
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),
    /// No prerequisite edge with this id.
    #[error("Unknown prerequisite: {0}")]
    UnknownEdge(String),
    /// Title is empty after trimming.
    #[error("Title is required.")]
    TitleRequired,
    /// Another skill already uses this title (case-insensitive).
    #[error("Title must be unique: \"{0}\" already exists.")]
    DuplicateTitle(String),
    /// The edge validator refused the prerequisite.
    #[error(transparent)]
    InvalidEdge(#[from] EdgeRejection),
    /// Unlock requested for a skill that is not `unlockable`.
    #[error("That skill is not unlockable yet.")]
    NotUnlockable(String),
    /// Complete requested for a skill that is not `unlocked`.
    #[error("That skill is not unlocked yet.")]
    NotUnlocked(String),
    /// Unlocking would exceed the budget.
    #[error(transparent)]
    InsufficientPoints(#[from] BudgetShortfall),
    /// Requested budget is not a finite number.
    #[error("Total skill points must be a finite number.")]
    InvalidPointsTotal,
}

/// User-supplied fields for creating or editing a skill.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SkillDraft {
    /// Title, trimmed before use.
    pub title: String,
    /// Description, dropped when blank.
    pub description: Option<String>,
    /// Cost, dropped when non-finite.
    pub cost: Option<f64>,
    /// Level, dropped when non-finite.
    pub level: Option<f64>,
}

impl SkillDraft {
    /// Draft with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set cost and level.
    pub fn with_points(mut self, cost: Option<f64>, level: Option<f64>) -> Self {
        self.cost = cost;
        self.level = level;
        self
    }

    fn normalized(self) -> Result<Self, TreeError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(TreeError::TitleRequired);
        }

        Ok(Self {
            title,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            cost: self.cost.filter(|c| c.is_finite()),
            level: self.level.filter(|l| l.is_finite()),
        })
    }
}

fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A skill tree with a point budget.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillTree {
    nodes: Vec<SkillNode>,
    edges: Vec<PrerequisiteEdge>,
    points_total: u64,
}

impl Default for SkillTree {
    fn default() -> Self {
        Self::new(DEFAULT_SKILL_POINTS_TOTAL)
    }
}

impl SkillTree {
    /// Fresh tree: a single unlockable root skill.
    pub fn new(points_total: u64) -> Self {
        let root = SkillNode::new(
            ROOT_SKILL_ID,
            Position::default(),
            SkillData::new(ROOT_SKILL_TITLE, SkillStatus::Unlockable),
        );
        Self {
            nodes: vec![root],
            edges: Vec::new(),
            points_total,
        }
    }

    /// Build from existing collections, deriving statuses and repairing the budget.
    pub fn from_parts(nodes: Vec<SkillNode>, edges: Vec<PrerequisiteEdge>, points_total: u64) -> Self {
        let mut tree = Self {
            nodes,
            edges,
            points_total,
        };
        tree.refresh();

        let spent = tree.points_spent();
        if (tree.points_total as f64) < spent {
            let repaired = spent.ceil() as u64;
            tracing::warn!(
                points_total = tree.points_total,
                spent,
                repaired,
                "Point budget below spent points, raising it"
            );
            tree.points_total = repaired;
        }
        tree
    }

    /// Hydrate from a persisted record.
    ///
    /// A record with no nodes and no edges yields the fresh tree, keeping a
    /// stored budget if there is one.
    pub fn from_persisted(state: PersistedTreeState, default_points_total: u64) -> Self {
        let points_total = state.skill_points_total.unwrap_or(default_points_total);
        if state.is_empty() {
            return Self::new(points_total);
        }

        let TreeState { nodes, edges, .. } = TreeState::from(state);
        Self::from_parts(nodes, edges, points_total)
    }

    /// All skills in insertion order.
    pub fn nodes(&self) -> &[SkillNode] {
        &self.nodes
    }

    /// All prerequisite edges in insertion order.
    pub fn edges(&self) -> &[PrerequisiteEdge] {
        &self.edges
    }

    /// Look up a skill.
    pub fn node(&self, id: &str) -> Option<&SkillNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Current point budget.
    pub fn points_total(&self) -> u64 {
        self.points_total
    }

    /// Points committed to unlocked and completed skills.
    pub fn points_spent(&self) -> f64 {
        total_spent(&self.nodes)
    }

    /// Points left to spend.
    pub fn points_available(&self) -> f64 {
        self.points_total as f64 - self.points_spent()
    }

    /// Live state snapshot.
    pub fn to_state(&self) -> TreeState {
        TreeState::new(self.nodes.clone(), self.edges.clone()).with_points_total(self.points_total)
    }

    /// Durable projection.
    pub fn to_persisted(&self) -> PersistedTreeState {
        self.to_state().to_persisted()
    }

    /// Highlight sets for a title search.
    pub fn search(&self, query: &str) -> SearchHighlight {
        search_highlight_sets(&self.nodes, &self.edges, query)
    }

    /// First free title among "New Skill", "New Skill 2", ...
    pub fn next_new_skill_title(&self) -> String {
        let base_taken = self.title_taken(NEW_SKILL_TITLE, None);
        if !base_taken {
            return NEW_SKILL_TITLE.to_string();
        }

        (2..10_000)
            .map(|suffix| format!("{NEW_SKILL_TITLE} {suffix}"))
            .find(|candidate| !self.title_taken(candidate, None))
            .unwrap_or_else(|| format!("{NEW_SKILL_TITLE} {}", &new_id()[..6]))
    }

    /// Create a skill on the default grid. Returns its id.
    pub fn add_skill(&mut self, draft: SkillDraft) -> Result<String, TreeError> {
        let draft = draft.normalized()?;
        self.ensure_title_free(&draft.title, None)?;

        let id = new_id();
        let data = SkillData {
            title: draft.title,
            description: draft.description,
            cost: draft.cost,
            level: draft.level,
            status: SkillStatus::Locked,
        };
        self.nodes.push(SkillNode::new(id.clone(), Position::grid(self.nodes.len()), data));
        self.refresh();

        tracing::info!(skill_id = %id, "Created skill");
        Ok(id)
    }

    /// Create a placeholder skill at `position` that requires `source_id`.
    ///
    /// Returns the new skill's id.
    pub fn add_dependent_skill(
        &mut self,
        source_id: &str,
        position: Position,
    ) -> Result<String, TreeError> {
        self.require_node(source_id)?;

        let id = new_id();
        let data = SkillData::new(self.next_new_skill_title(), SkillStatus::Locked)
            .with_description("")
            .with_points(Some(1.0), Some(1.0));
        self.nodes.push(SkillNode::new(id.clone(), position, data));

        if let Err(rejection) = self.push_edge(source_id, &id) {
            tracing::warn!(source_id, skill_id = %id, reason = rejection.reason(), "Placeholder prerequisite refused");
        }
        self.refresh();

        tracing::info!(skill_id = %id, source_id, "Created dependent skill");
        Ok(id)
    }

    /// Replace a skill's title, description, cost and level. Status is untouched.
    pub fn update_skill(&mut self, id: &str, draft: SkillDraft) -> Result<(), TreeError> {
        let draft = draft.normalized()?;
        let index = self.require_node(id)?;
        self.ensure_title_free(&draft.title, Some(id))?;

        let data = &mut self.nodes[index].data;
        data.title = draft.title;
        data.description = draft.description;
        data.cost = draft.cost;
        data.level = draft.level;

        tracing::info!(skill_id = id, "Updated skill");
        Ok(())
    }

    /// Move a skill on the canvas.
    pub fn move_skill(&mut self, id: &str, position: Position) -> Result<(), TreeError> {
        let index = self.require_node(id)?;
        self.nodes[index].position = position;
        Ok(())
    }

    /// Delete a skill and every edge touching it.
    pub fn remove_skill(&mut self, id: &str) -> Result<SkillNode, TreeError> {
        let index = self.require_node(id)?;
        let removed = self.nodes.remove(index);

        let before = self.edges.len();
        self.edges.retain(|edge| !edge.touches(id));
        self.refresh();

        tracing::info!(skill_id = id, removed_edges = before - self.edges.len(), "Removed skill");
        Ok(removed)
    }

    /// Add prerequisite `source -> target`. Returns the new edge id.
    pub fn connect(&mut self, source: &str, target: &str) -> Result<String, TreeError> {
        self.require_node(source)?;
        self.require_node(target)?;

        let id = self.push_edge(source, target)?;
        self.refresh();

        tracing::info!(edge_id = %id, source, target, "Added prerequisite");
        Ok(id)
    }

    /// Remove a prerequisite edge by id.
    pub fn disconnect(&mut self, edge_id: &str) -> Result<PrerequisiteEdge, TreeError> {
        let index = self
            .edges
            .iter()
            .position(|edge| edge.id == edge_id)
            .ok_or_else(|| TreeError::UnknownEdge(edge_id.to_string()))?;
        let removed = self.edges.remove(index);
        self.refresh();

        tracing::info!(edge_id, "Removed prerequisite");
        Ok(removed)
    }

    /// Spend points on an unlockable skill. Returns the points spent.
    pub fn unlock(&mut self, id: &str) -> Result<f64, TreeError> {
        let index = self.require_node(id)?;
        let node = &self.nodes[index];
        if node.status() != SkillStatus::Unlockable {
            return Err(TreeError::NotUnlockable(id.to_string()));
        }

        let required = check_unlock_budget(node, &self.nodes, self.points_total)?;
        self.nodes[index].data.status = SkillStatus::Unlocked;
        self.refresh();

        tracing::info!(skill_id = id, required, "Unlocked skill");
        Ok(required)
    }

    /// Mark an unlocked skill completed.
    pub fn complete(&mut self, id: &str) -> Result<(), TreeError> {
        let index = self.require_node(id)?;
        if self.nodes[index].status() != SkillStatus::Unlocked {
            return Err(TreeError::NotUnlocked(id.to_string()));
        }

        self.nodes[index].data.status = SkillStatus::Completed;
        self.refresh();

        tracing::info!(skill_id = id, "Completed skill");
        Ok(())
    }

    /// Set the point budget, raising it to cover spent points if needed.
    pub fn set_points_total(&mut self, requested: f64) -> Result<PointsAdjustment, TreeError> {
        let spent = self.points_spent();
        let adjustment =
            clamp_points_total(requested, spent).ok_or(TreeError::InvalidPointsTotal)?;

        if adjustment.clamped {
            tracing::warn!(requested, spent, total = adjustment.total, "Point budget clamped to spent points");
        }
        self.points_total = adjustment.total;
        Ok(adjustment)
    }

    /// Replace everything with a fresh tree.
    pub fn reset(&mut self, points_total: u64) {
        *self = Self::new(points_total);
        tracing::info!(points_total, "Reset skill tree");
    }

    fn refresh(&mut self) {
        let changes = apply_derived_statuses(&mut self.nodes, &self.edges);
        for change in &changes {
            tracing::debug!(
                skill_id = %change.node_id,
                from = %change.from,
                to = %change.to,
                "Derived status changed"
            );
        }
    }

    fn push_edge(&mut self, source: &str, target: &str) -> Result<String, EdgeRejection> {
        validate_edge_creation(source, target, &self.edges)?;
        let id = new_id();
        self.edges.push(PrerequisiteEdge::new(id.clone(), source, target));
        Ok(id)
    }

    fn require_node(&self, id: &str) -> Result<usize, TreeError> {
        self.nodes
            .iter()
            .position(|node| node.id == id)
            .ok_or_else(|| TreeError::UnknownSkill(id.to_string()))
    }

    fn title_taken(&self, title: &str, excluding: Option<&str>) -> bool {
        let wanted = normalize_title(title);
        self.nodes
            .iter()
            .filter(|node| Some(node.id.as_str()) != excluding)
            .any(|node| normalize_title(&node.data.title) == wanted)
    }

    fn ensure_title_free(&self, title: &str, excluding: Option<&str>) -> Result<(), TreeError> {
        if self.title_taken(title, excluding) {
            return Err(TreeError::DuplicateTitle(title.to_string()));
        }
        Ok(())
    }
}
