//! # skill-tree-kernel
//!
//! Graph-state engine for prerequisite skill trees.
//!
//! Skills form a directed prerequisite graph. Each skill has an optional
//! cost and level and moves through a four-state lifecycle gated by
//! prerequisite completion and a finite point budget.
//!
//! ## Core Contract
//!
//! 1. Derive each skill's `unlockable` status from the graph, never store it
//! 2. Refuse self-loops, duplicate edges and direct two-node cycles
//! 3. Account spent points and gate unlocks on the remaining budget
//! 4. Persist state durably, recovering what it can from corrupt records
//!
//! ## Architecture
//!
//! ```text
//! user action → SkillTree ─┬─ validation (edge gate)
//!                          ├─ points     (unlock gate)
//!                          └─ status     (re-derive) → codec → KeyValueStore
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Every kernel function is pure over its arguments
//! - Status derivation is idempotent
//! - Same tree → same serialized bytes → same fingerprint

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod status;
pub mod validation;
pub mod points;
pub mod codec;
pub mod canonical;
pub mod search;
pub mod store;
pub mod tree;
pub mod session;
pub mod config;

// Re-exports
pub use types::{
    SkillStatus, PersistedStatus, Position, SkillData, SkillNode, PersistedNode,
    PrerequisiteEdge, TreeState, PersistedTreeState, edge_key,
};
pub use status::{
    inbound_prerequisites, index_nodes_by_id, is_unlockable, status_changes, derive_statuses,
    apply_derived_statuses, StatusChange,
};
pub use validation::{validate_edge_creation, EdgeRejection};
pub use points::{
    required_points, spent_points, total_spent, available_points, check_unlock_budget,
    clamp_points_total, BudgetShortfall, PointsAdjustment,
};
pub use codec::{serialize, serialize_persisted, deserialize, FormatError};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex, state_fingerprint};
pub use search::{normalize_query, search_highlight_sets, SearchHighlight};
pub use store::{load, save, clear, KeyValueStore, StorageError, InMemoryStore, FileStore};
pub use tree::{SkillTree, SkillDraft, TreeError, ROOT_SKILL_ID, ROOT_SKILL_TITLE};
pub use session::TreeSession;
pub use config::EngineConfig;

/// Key the single skill tree record is stored under.
pub const SKILL_TREE_STORAGE_KEY: &str = "skill-tree-builder";

/// Point budget of a fresh or reset tree.
pub const DEFAULT_SKILL_POINTS_TOTAL: u64 = 10;
