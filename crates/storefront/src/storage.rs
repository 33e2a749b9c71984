//! Local key-value storage for catalog snapshots and flags.
//!
//! Values are opaque strings (JSON in practice) stored under fixed keys. Access
//! is synchronous so that a cache-first load never waits on the network.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

/// Key holding the serialized product list.
pub const PRODUCTS_KEY: &str = "dorodango-products";

/// Key holding the one-time migration flag.
pub const MIGRATED_KEY: &str = "dorodango-products-migrated";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Synchronous string storage.
pub trait LocalStore: Send + Sync {
    /// Read a value, `None` if the key was never written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Storage with one file per key under a data directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl LocalStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StorageError::Io { path, source })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_set_get() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(PRODUCTS_KEY).unwrap(), None);

        storage.set(PRODUCTS_KEY, "[]").unwrap();
        storage.set(PRODUCTS_KEY, "[{}]").unwrap();
        assert_eq!(storage.get(PRODUCTS_KEY).unwrap().as_deref(), Some("[{}]"));
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("cache")).unwrap();
        storage.set(MIGRATED_KEY, "true").unwrap();

        let reopened = FileStorage::open(dir.path().join("cache")).unwrap();
        assert_eq!(reopened.get(MIGRATED_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(reopened.get(PRODUCTS_KEY).unwrap(), None);
        assert_eq!(reopened.dir(), storage.dir());
    }

    #[test]
    fn test_file_storage_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        storage.set("../escape", "x").unwrap();
        assert!(dir.path().join("___escape.json").exists());
    }
}
