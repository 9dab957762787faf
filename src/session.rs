//! Store-backed skill tree session.
//!
//! A session loads the single record under its key on open and writes it
//! back after every successful mutation. Writes are skipped when the
//! persisted projection's fingerprint has not changed.

use crate::canonical::state_fingerprint;
use crate::codec::{deserialize, serialize, FormatError};
use crate::config::EngineConfig;
use crate::store::{clear, load, save, KeyValueStore};
use crate::tree::{SkillTree, TreeError};

/// A skill tree bound to a storage key.
pub struct TreeSession<S: KeyValueStore> {
    store: S,
    key: String,
    default_points_total: u64,
    tree: SkillTree,
    /// Fingerprint of the last record known to be in the store.
    saved_fingerprint: Option<String>,
}

impl<S: KeyValueStore> TreeSession<S> {
    /// Open the tree stored under `key`, or a fresh tree when there is none.
    pub fn open(store: S, key: impl Into<String>, default_points_total: u64) -> Self {
        let key = key.into();
        let persisted = load(&store, &key);
        let saved_fingerprint = (!persisted.is_empty()).then(|| state_fingerprint(&persisted));
        let tree = SkillTree::from_persisted(persisted, default_points_total);

        tracing::debug!(
            key = %key,
            nodes = tree.nodes().len(),
            edges = tree.edges().len(),
            "Opened skill tree session"
        );

        Self {
            store,
            key,
            default_points_total,
            tree,
            saved_fingerprint,
        }
    }

    /// Open using the key and default budget from `config`.
    pub fn from_config(store: S, config: &EngineConfig) -> Self {
        Self::open(store, config.storage_key.clone(), config.default_points_total)
    }

    /// The current tree.
    pub fn tree(&self) -> &SkillTree {
        &self.tree
    }

    /// Storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether the tree differs from the last saved record.
    pub fn is_dirty(&self) -> bool {
        let current = state_fingerprint(&self.tree.to_persisted());
        self.saved_fingerprint.as_deref() != Some(current.as_str())
    }

    /// Run a mutation and persist on success.
    ///
    /// A failed save is logged and leaves the session dirty; the mutation
    /// itself still stands.
    pub fn apply<T, F>(&mut self, mutation: F) -> Result<T, TreeError>
    where
        F: FnOnce(&mut SkillTree) -> Result<T, TreeError>,
    {
        let output = mutation(&mut self.tree)?;
        self.persist();
        Ok(output)
    }

    /// Write the tree if it changed. Returns whether the store is up to date.
    pub fn persist(&mut self) -> bool {
        let fingerprint = state_fingerprint(&self.tree.to_persisted());
        if self.saved_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            tracing::trace!(key = %self.key, "Skill tree unchanged, skipping save");
            return true;
        }

        let saved = save(&self.store, &self.tree.to_state(), &self.key);
        if saved {
            self.saved_fingerprint = Some(fingerprint);
        }
        saved
    }

    /// Clear the stored record and start over with a fresh tree.
    pub fn reset(&mut self) -> bool {
        let cleared = clear(&self.store, &self.key);
        self.saved_fingerprint = None;
        self.tree.reset(self.default_points_total);
        let saved = self.persist();
        cleared && saved
    }

    /// Replace the tree with an imported document.
    pub fn import(&mut self, text: &str) -> Result<bool, FormatError> {
        let persisted = deserialize(text)?;
        self.tree = SkillTree::from_persisted(persisted, self.default_points_total);
        Ok(self.persist())
    }

    /// Serialized form of the current tree.
    pub fn export(&self) -> String {
        serialize(&self.tree.to_state())
    }

    /// Consume the session, returning the tree.
    pub fn into_tree(self) -> SkillTree {
        self.tree
    }
}
