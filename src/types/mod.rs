//! Core types for the skill tree kernel.

pub mod skill;
pub mod edge;
pub mod state;

pub use skill::{SkillStatus, PersistedStatus, Position, SkillData, SkillNode, PersistedNode};
pub use edge::{PrerequisiteEdge, edge_key, synthesized_edge_id};
pub use state::{TreeState, PersistedTreeState};
