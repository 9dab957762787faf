//! File-backed key-value store.
//!
//! Each key maps to `<dir>/<key>.json`. Writes go to a sibling temp file
//! that is renamed into place, so a reader never sees a partial record.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StorageError};

/// File-backed key-value store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a store and its directory up front.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = Self::new(dir);
        fs::create_dir_all(&store.dir).map_err(|e| {
            StorageError::Unavailable(format!("cannot create {}: {e}", store.dir.display()))
        })?;
        Ok(store)
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

/// Map a key onto a safe file stem: `[A-Za-z0-9._-]`, never empty or dotted-only.
fn sanitize_key(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.chars().all(|c| c == '.') {
        format!("_{stem}")
    } else {
        stem
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;

        tracing::trace!(path = %path.display(), bytes = value.len(), "Wrote record");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("tree").unwrap(), None);

        store.set("tree", "{\"nodes\":[]}").unwrap();
        assert_eq!(store.get("tree").unwrap().as_deref(), Some("{\"nodes\":[]}"));
        assert!(store.path_for("tree").exists());
        assert!(!store.path_for("tree").with_extension("json.tmp").exists());

        store.remove("tree").unwrap();
        assert_eq!(store.get("tree").unwrap(), None);
        store.remove("tree").unwrap();
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("a").join("b");
        let store = FileStore::open(&root).unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_open_fails_on_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, "x").unwrap();

        let result = FileStore::open(file.join("sub"));
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("skill-tree-builder"), "skill-tree-builder");
        assert_eq!(sanitize_key("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_key(".."), "_..");
        assert_eq!(sanitize_key(""), "_");
        assert_eq!(sanitize_key("a b/c"), "a_b_c");
    }
}
