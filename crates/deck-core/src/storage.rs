//! Key/value persistence — one JSON file holding everything the app saves
//! between sessions (theme, volume, last channel, tasks, notes,
//! ambient levels).
//!
//! Values are stored as raw [`serde_json::Value`]s under string keys so
//! callers can evolve their schemas independently. A missing or corrupt
//! file degrades to an empty store rather than failing startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

pub struct KvStore {
    path: PathBuf,
    entries: BTreeMap<String, serde_json::Value>,
}

impl KvStore {
    /// Open the store at `path`, loading existing entries when present.
    /// Unreadable or unparseable content is discarded with a warning.
    pub fn open(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!("corrupt state file {}: {}; starting fresh", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    /// Deserialize the value under `key`. Returns `None` when the key is
    /// absent or the stored value no longer matches `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("stored value for '{}' has wrong shape: {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> anyhow::Result<()> {
        self.entries
            .insert(key.to_string(), serde_json::to_value(value)?);
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = KvStore::open(&path);
        assert_eq!(store.get::<u8>("volume"), None);
        store.set("volume", &70u8).unwrap();
        store.set("theme", &"synthwave".to_string()).unwrap();

        let store = KvStore::open(&path);
        assert_eq!(store.get::<u8>("volume"), Some(70));
        assert_eq!(store.get::<String>("theme"), Some("synthwave".to_string()));
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut store = KvStore::open(&path);
        assert_eq!(store.get::<u8>("volume"), None);
        // and it is writable again afterwards
        store.set("volume", &30u8).unwrap();
        assert_eq!(KvStore::open(&path).get::<u8>("volume"), Some(30));
    }

    #[test]
    fn test_wrong_shape_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut store = KvStore::open(&path);
        store.set("volume", &"loud".to_string()).unwrap();
        assert_eq!(store.get::<u8>("volume"), None);
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut store = KvStore::open(&path);
        store.set("notes", &"hello".to_string()).unwrap();
        store.remove("notes").unwrap();
        assert_eq!(KvStore::open(&path).get::<String>("notes"), None);
    }
}
