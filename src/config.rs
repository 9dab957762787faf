//! Engine configuration.
//!
//! Environment variables:
//! - `SKILL_TREE_STORAGE_KEY`: key the tree is stored under (default: `skill-tree-builder`)
//! - `SKILL_TREE_DATA_DIR`: directory for the file store (default: `.skill-tree`)
//! - `SKILL_TREE_DEFAULT_POINTS`: point budget for new trees (default: 10)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_SKILL_POINTS_TOTAL, SKILL_TREE_STORAGE_KEY};

/// Default directory for the file store.
pub const DEFAULT_DATA_DIR: &str = ".skill-tree";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Key the single tree record lives under.
    pub storage_key: String,
    /// Directory for file-backed storage.
    pub data_dir: PathBuf,
    /// Point budget for fresh or reset trees.
    pub default_points_total: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_key: SKILL_TREE_STORAGE_KEY.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            default_points_total: DEFAULT_SKILL_POINTS_TOTAL,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables.
    ///
    /// Unset variables use defaults. Invalid values log a warning and
    /// fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup("SKILL_TREE_STORAGE_KEY") {
            if key.trim().is_empty() {
                tracing::warn!("SKILL_TREE_STORAGE_KEY is blank, using default");
            } else {
                config.storage_key = key;
            }
        }

        if let Some(dir) = lookup("SKILL_TREE_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup("SKILL_TREE_DEFAULT_POINTS") {
            match raw.trim().parse::<u64>() {
                Ok(points) => config.default_points_total = points,
                Err(e) => tracing::warn!(
                    value = %raw,
                    error = %e,
                    "Invalid SKILL_TREE_DEFAULT_POINTS, using default"
                ),
            }
        }

        config
    }

    /// Override the storage key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Override the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }
}
