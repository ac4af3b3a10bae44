//! Persistent store adapter
//!
//! A minimal key-value contract modelled on extension local storage:
//! `get` returns whichever of the requested keys exist, `set` merges a
//! partial map into the record. There is no retry and no transaction; the
//! whole record is last-writer-wins.

use crate::error::StoreError;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Partial view of the persisted record
pub type StoreMap = Map<String, Value>;

/// Key holding the folder array
pub const KEY_FOLDERS: &str = "folders";
/// Key holding the active folder id
pub const KEY_ACTIVE_FOLDER: &str = "activeFolderId";
/// Key holding the flush counter
pub const KEY_REVISION: &str = "revision";

/// External key-value storage service.
///
/// Implementations take `&self` so one backend can be shared by several
/// surfaces (each owning its own repository copy).
pub trait Store {
    /// Fetch the requested keys. Missing keys are simply absent from the map.
    fn get(&self, keys: &[&str]) -> Result<StoreMap, StoreError>;

    /// Merge `items` into the record, overwriting existing keys.
    fn set(&self, items: StoreMap) -> Result<(), StoreError>;
}

impl<T: Store + ?Sized> Store for &T {
    fn get(&self, keys: &[&str]) -> Result<StoreMap, StoreError> {
        (**self).get(keys)
    }

    fn set(&self, items: StoreMap) -> Result<(), StoreError> {
        (**self).set(items)
    }
}

impl<T: Store + ?Sized> Store for Arc<T> {
    fn get(&self, keys: &[&str]) -> Result<StoreMap, StoreError> {
        (**self).get(keys)
    }

    fn set(&self, items: StoreMap) -> Result<(), StoreError> {
        (**self).set(items)
    }
}

impl<T: Store + ?Sized> Store for Box<T> {
    fn get(&self, keys: &[&str]) -> Result<StoreMap, StoreError> {
        (**self).get(keys)
    }

    fn set(&self, items: StoreMap) -> Result<(), StoreError> {
        (**self).set(items)
    }
}

fn pick(record: &StoreMap, keys: &[&str]) -> StoreMap {
    keys.iter()
        .filter_map(|key| record.get(*key).map(|v| ((*key).to_string(), v.clone())))
        .collect()
}

/// In-process store, shared between surfaces through `Arc`
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<StoreMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing record
    pub fn with_record(record: StoreMap) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }

    /// Copy of the whole record
    pub fn snapshot(&self) -> Result<StoreMap, StoreError> {
        self.record
            .lock()
            .map(|record| record.clone())
            .map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn get(&self, keys: &[&str]) -> Result<StoreMap, StoreError> {
        let record = self.record.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(pick(&record, keys))
    }

    fn set(&self, items: StoreMap) -> Result<(), StoreError> {
        let mut record = self.record.lock().map_err(|_| StoreError::Poisoned)?;
        record.extend(items);
        Ok(())
    }
}

/// Store backed by a single JSON document on disk.
///
/// Writes go to a sibling temp file which is then renamed over the
/// document, so readers never observe a half-written record.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(&self) -> Result<StoreMap, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Store file {:?} does not exist yet", self.path);
                return Ok(StoreMap::new());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(StoreMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_record(&self, record: &StoreMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(record)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}

impl Store for JsonFileStore {
    fn get(&self, keys: &[&str]) -> Result<StoreMap, StoreError> {
        let record = self.read_record()?;
        Ok(pick(&record, keys))
    }

    fn set(&self, items: StoreMap) -> Result<(), StoreError> {
        let mut record = self.read_record()?;
        record.extend(items);
        self.write_record(&record)?;
        debug!("Wrote store file {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> StoreMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_memory_store_get_only_requested_keys() {
        let store = MemoryStore::with_record(map(json!({"a": 1, "b": 2})));
        let got = store.get(&["a", "missing"]).expect("get");
        assert_eq!(got.len(), 1);
        assert_eq!(got.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_memory_store_set_merges() {
        let store = MemoryStore::with_record(map(json!({"a": 1, "b": 2})));
        store.set(map(json!({"b": 3, "c": 4}))).expect("set");
        assert_eq!(store.snapshot().expect("snapshot"), map(json!({"a": 1, "b": 3, "c": 4})));
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("store.json"));
        assert!(store.get(&[KEY_FOLDERS]).expect("get").is_empty());
    }

    #[test]
    fn test_file_store_set_then_get() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("store.json");
        let store = JsonFileStore::new(&path);
        store.set(map(json!({"activeFolderId": 7}))).expect("set");
        store.set(map(json!({"folders": []}))).expect("set");

        let got = store.get(&[KEY_FOLDERS, KEY_ACTIVE_FOLDER]).expect("get");
        assert_eq!(got.get(KEY_ACTIVE_FOLDER), Some(&json!(7)));
        assert_eq!(got.get(KEY_FOLDERS), Some(&json!([])));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").expect("write");
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.get(&[KEY_FOLDERS]), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_shared_arc_store() {
        let store = Arc::new(MemoryStore::new());
        let alias = Arc::clone(&store);
        alias.set(map(json!({"x": true}))).expect("set");
        assert_eq!(store.get(&["x"]).expect("get").get("x"), Some(&json!(true)));
    }
}
