//! JSON-file-backed implementation of [`Storage`].
//!
//! The whole map is held in memory and rewritten to disk on every mutation,
//! via a temp-file-then-rename so a crash mid-write never leaves a truncated
//! store. A file that fails to parse at open time is treated as empty, not as
//! an error; the persisted blobs are a de facto schema owned by the callers.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{error, warn};

use super::Storage;

/// Errors opening a file-backed store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create storage directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to read storage file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

/// Durable storage persisted as a single JSON object on disk.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or create) a store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// existing file cannot be read. A file that reads fine but does not
    /// parse is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<HashMap<String, String>>(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "storage file is corrupt, starting empty");
                HashMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(StorageError::Read { path, source }),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// The file this store persists to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) {
        let serialized = match serde_json::to_string_pretty(entries) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "failed to serialize storage map");
                return;
            }
        };

        // Write-then-rename keeps the previous file intact on failure.
        let tmp = self.path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, serialized) {
            error!(path = %tmp.display(), error = %e, "failed to write storage file");
            return;
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            error!(path = %self.path.display(), error = %e, "failed to replace storage file");
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if entries.remove(key).is_some() {
            self.flush(&entries);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        {
            let storage = FileStorage::open(&path).unwrap();
            storage.set("cart.items", "[]");
            storage.set("auth.access_token", "tok");
        }

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("cart.items"), Some("[]".to_string()));
        assert_eq!(storage.get("auth.access_token"), Some("tok".to_string()));
    }

    #[test]
    fn test_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        {
            let storage = FileStorage::open(&path).unwrap();
            storage.set("k", "v");
            storage.remove("k");
        }

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("k"), None);
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("anything"), None);

        // And the store is usable afterwards.
        storage.set("k", "v");
        assert_eq!(storage.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_missing_parent_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("storage.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("k", "v");
        assert!(path.exists());
    }
}
