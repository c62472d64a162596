//! Durable key-value store backed by a single JSON file.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use tracing::warn;

use super::KeyValueStore;

/// Storage file name inside the store directory
const STORAGE_FILE: &str = "storage.json";

/// File-backed store. The whole map is held in memory and written through
/// on every mutation, which is fine at the handful-of-keys scale this
/// store is used at.
pub struct FileStore {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or create) a store in the given directory.
    /// An unreadable or corrupt storage file is treated as empty; the next
    /// write replaces it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create storage directory {}", dir.display()))?;
        let path = dir.join(STORAGE_FILE);

        let map = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read storage file {}", path.display()))?;
            match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(err) => {
                    warn!(error = %err, path = %path.display(), "corrupt storage file, starting empty");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, map: &HashMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("failed to write storage file {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.lock();
        map.insert(key.to_string(), value.to_string());
        self.flush(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.lock();
        if map.remove(key).is_some() {
            self.flush(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");

        {
            let store = FileStore::open(dir.path()).expect("open");
            store.set("userData", r#"{"email":"a@b.c"}"#).expect("set");
        }

        let store = FileStore::open(dir.path()).expect("reopen");
        assert_eq!(
            store.get("userData").expect("get").as_deref(),
            Some(r#"{"email":"a@b.c"}"#)
        );
    }

    #[test]
    fn removal_is_durable() {
        let dir = tempfile::tempdir().expect("tempdir");

        {
            let store = FileStore::open(dir.path()).expect("open");
            store.set("userData", "value").expect("set");
            store.remove("userData").expect("remove");
        }

        let store = FileStore::open(dir.path()).expect("reopen");
        assert_eq!(store.get("userData").expect("get"), None);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(STORAGE_FILE), "not json").expect("write");

        let store = FileStore::open(dir.path()).expect("open");
        assert_eq!(store.get("userData").expect("get"), None);
    }
}
