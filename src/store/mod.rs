//! Key-value storage backends and the load/save boundary.
//!
//! One record lives under one key. [`load`] and [`save`] never propagate
//! storage failures: a failed load is an empty tree, a failed save is
//! `false`.

pub mod memory;
pub mod file;

use crate::codec::{deserialize, serialize};
use crate::types::{PersistedTreeState, TreeState};

/// Error raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend cannot be used at all.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    /// Writing would exceed the backend's capacity.
    #[error("Storage quota exceeded for key {key}: need {needed} bytes, quota is {quota}")]
    QuotaExceeded {
        /// Key being written.
        key: String,
        /// Bytes the store would hold after the write.
        needed: usize,
        /// Configured capacity in bytes.
        quota: usize,
    },
    /// Underlying I/O failure.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for string key-value backends.
///
/// Last write wins. Implementations must be safe to share between
/// threads but need no cross-writer coordination.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Load the tree stored under `key`.
///
/// Returns the empty state when the store fails, the key is absent or
/// blank, or the content does not decode.
pub fn load<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> PersistedTreeState {
    let stored = match store.get(key) {
        Ok(Some(text)) if !text.is_empty() => text,
        Ok(_) => {
            tracing::debug!(key, "No stored skill tree");
            return PersistedTreeState::empty();
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read stored skill tree");
            return PersistedTreeState::empty();
        }
    };

    match deserialize(&stored) {
        Ok(state) => {
            tracing::debug!(
                key,
                nodes = state.nodes.len(),
                edges = state.edges.len(),
                "Loaded skill tree"
            );
            state
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Stored skill tree is unreadable");
            PersistedTreeState::empty()
        }
    }
}

/// Save `state` under `key`. Returns whether the write succeeded.
pub fn save<S: KeyValueStore + ?Sized>(store: &S, state: &TreeState, key: &str) -> bool {
    match store.set(key, &serialize(state)) {
        Ok(()) => {
            tracing::info!(
                key,
                nodes = state.nodes.len(),
                edges = state.edges.len(),
                "Saved skill tree"
            );
            true
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to save skill tree");
            false
        }
    }
}

/// Remove the record under `key`. Returns whether the removal succeeded.
pub fn clear<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> bool {
    match store.remove(key) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to clear stored skill tree");
            false
        }
    }
}

pub use memory::InMemoryStore;
pub use file::FileStore;
