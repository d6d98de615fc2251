//! Capability ports for the environment the adapter runs in
//!
//! The adapter never touches process-global state directly. Credentials live
//! behind a [`KeyValueStore`] and the current client-side route behind a
//! [`Location`]; both are injected at construction.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Persistent string key/value storage
pub trait KeyValueStore: Send + Sync {
    /// Raw value stored under `key`, if any
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Client-side navigation state
pub trait Location: Send + Sync {
    /// The current route fragment, e.g. `#/users` or `#/push-data/42`
    fn hash(&self) -> String;

    /// Navigate the whole application back to its root
    fn redirect_to_root(&self);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-process store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.items).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        lock(&self.items).remove(key);
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk
///
/// The file is re-read on every access so that separate invocations of the
/// same program observe each other's writes. It is created on first write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| Error::Storage {
            message: format!("Corrupt storage file {}: {}", self.path.display(), e),
            source: Some(e.into()),
        })
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(items)?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, content)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = lock(&self.guard);
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = lock(&self.guard);
        let mut items = self.load()?;
        items.insert(key.to_string(), value.to_string());
        self.save(&items)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = lock(&self.guard);
        let mut items = self.load()?;
        if items.remove(key).is_some() {
            self.save(&items)?;
        }
        Ok(())
    }
}

/// Location held in memory, recording redirects
#[derive(Debug)]
pub struct MemoryLocation {
    hash: Mutex<String>,
    redirects: AtomicUsize,
}

impl MemoryLocation {
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: Mutex::new(hash.into()),
            redirects: AtomicUsize::new(0),
        }
    }

    /// Move to another route
    pub fn set_hash(&self, hash: impl Into<String>) {
        *lock(&self.hash) = hash.into();
    }

    /// How many times `redirect_to_root` has been called
    pub fn redirect_count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::new("#/")
    }
}

impl Location for MemoryLocation {
    fn hash(&self) -> String {
        lock(&self.hash).clone()
    }

    fn redirect_to_root(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
        *lock(&self.hash) = "#/".to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set_item("token", "\"abc\"").unwrap();
        assert_eq!(store.get_item("token").unwrap().as_deref(), Some("\"abc\""));

        store.remove_item("token").unwrap();
        assert_eq!(store.get_item("token").unwrap(), None);
        // Removing twice is fine
        store.remove_item("token").unwrap();
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let first = FileStore::new(&path);
        assert_eq!(first.get_item("token").unwrap(), None);
        first.set_item("token", "\"abc\"").unwrap();
        first.set_item("xClientIdentifier", "\"desk-7\"").unwrap();

        let second = FileStore::new(&path);
        assert_eq!(second.get_item("token").unwrap().as_deref(), Some("\"abc\""));

        second.remove_item("token").unwrap();
        assert_eq!(first.get_item("token").unwrap(), None);
        assert_eq!(
            first.get_item("xClientIdentifier").unwrap().as_deref(),
            Some("\"desk-7\"")
        );
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        let err = store.get_item("token").unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }

    #[test]
    fn test_memory_location_redirect() {
        let location = MemoryLocation::new("#/users");
        assert_eq!(location.hash(), "#/users");

        location.redirect_to_root();
        assert_eq!(location.hash(), "#/");
        assert_eq!(location.redirect_count(), 1);
    }
}
