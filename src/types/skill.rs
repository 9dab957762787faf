//! Skill node types for the skill tree kernel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a skill.
///
/// `Unlockable` is derived from the prerequisite graph and is never stored
/// as ground truth. `Unlocked` and `Completed` are sticky: only an explicit
/// user action changes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillStatus {
    /// Prerequisites are not all completed.
    Locked,
    /// Every prerequisite is completed (or there are none).
    Unlockable,
    /// Points have been spent on this skill.
    Unlocked,
    /// The skill has been finished.
    Completed,
}

impl SkillStatus {
    /// Parse status from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "locked" => Some(Self::Locked),
            "unlockable" => Some(Self::Unlockable),
            "unlocked" => Some(Self::Unlocked),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Whether the derivation pass may rewrite this status.
    pub fn is_derived(&self) -> bool {
        matches!(self, Self::Locked | Self::Unlockable)
    }

    /// Whether points are currently committed to a skill in this status.
    pub fn consumes_points(&self) -> bool {
        matches!(self, Self::Unlocked | Self::Completed)
    }

    /// Collapse to the persistable subset. `Unlockable` becomes `Locked`.
    pub fn to_persisted(self) -> PersistedStatus {
        match self {
            Self::Unlocked => PersistedStatus::Unlocked,
            Self::Completed => PersistedStatus::Completed,
            Self::Locked | Self::Unlockable => PersistedStatus::Locked,
        }
    }
}

impl Default for SkillStatus {
    fn default() -> Self {
        Self::Locked
    }
}

impl fmt::Display for SkillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "locked"),
            Self::Unlockable => write!(f, "unlockable"),
            Self::Unlocked => write!(f, "unlocked"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// The subset of [`SkillStatus`] allowed in durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistedStatus {
    /// Locked (also what `unlockable` collapses to).
    Locked,
    /// Unlocked.
    Unlocked,
    /// Completed.
    Completed,
}

impl PersistedStatus {
    /// Coerce an arbitrary stored value. Anything unrecognised is `Locked`.
    pub fn coerce(value: Option<&str>) -> Self {
        match value {
            Some("unlocked") => Self::Unlocked,
            Some("completed") => Self::Completed,
            _ => Self::Locked,
        }
    }
}

impl Default for PersistedStatus {
    fn default() -> Self {
        Self::Locked
    }
}

impl From<PersistedStatus> for SkillStatus {
    fn from(status: PersistedStatus) -> Self {
        match status {
            PersistedStatus::Locked => Self::Locked,
            PersistedStatus::Unlocked => Self::Unlocked,
            PersistedStatus::Completed => Self::Completed,
        }
    }
}

impl fmt::Display for PersistedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        SkillStatus::from(*self).fmt(f)
    }
}

/// Canvas position of a skill node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a new position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Position of the `index`-th skill on the default four-column grid.
    pub fn grid(index: usize) -> Self {
        Self {
            x: (index % 4) as f64 * 220.0,
            y: (index / 4) as f64 * 140.0,
        }
    }
}

/// Author-facing data carried by a skill node.
///
/// Generic over the status type so the same shape serves both the live
/// graph ([`SkillStatus`]) and the persisted record ([`PersistedStatus`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillData<S = SkillStatus> {
    /// Display title (non-empty).
    pub title: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Point cost per level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Level multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<f64>,
    /// Lifecycle status.
    pub status: S,
}

impl<S> SkillData<S> {
    /// Create data with only a title and status.
    pub fn new(title: impl Into<String>, status: S) -> Self {
        Self {
            title: title.into(),
            description: None,
            cost: None,
            level: None,
            status,
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
}

/// A skill in the prerequisite graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillNode<S = SkillStatus> {
    /// Unique, non-empty identifier.
    pub id: String,
    /// Canvas position.
    pub position: Position,
    /// Skill data.
    pub data: SkillData<S>,
}

/// A skill node as it appears in durable storage.
pub type PersistedNode = SkillNode<PersistedStatus>;

impl<S> SkillNode<S> {
    /// Create a new skill node.
    pub fn new(id: impl Into<String>, position: Position, data: SkillData<S>) -> Self {
        Self {
            id: id.into(),
            position,
            data,
        }
    }
}

impl SkillNode<SkillStatus> {
    /// Current lifecycle status.
    pub fn status(&self) -> SkillStatus {
        self.data.status
    }

    /// Project onto the persisted shape, collapsing derived statuses.
    pub fn to_persisted(&self) -> PersistedNode {
        SkillNode {
            id: self.id.clone(),
            position: self.position,
            data: SkillData {
                title: self.data.title.clone(),
                description: self.data.description.clone(),
                cost: self.data.cost,
                level: self.data.level,
                status: self.data.status.to_persisted(),
            },
        }
    }
}

impl From<PersistedNode> for SkillNode<SkillStatus> {
    fn from(node: PersistedNode) -> Self {
        SkillNode {
            id: node.id,
            position: node.position,
            data: SkillData {
                title: node.data.title,
                description: node.data.description,
                cost: node.data.cost,
                level: node.data.level,
                status: node.data.status.into(),
            },
        }
    }
}
