//! Folder repository
//!
//! `RepositoryState` owns the folder list and active folder selection and
//! implements every mutation. `Repository` binds one state copy to a
//! [`Store`]: it loads at surface start and writes the whole state back after
//! each mutation.
//!
//! Each surface holds its own `Repository`. Nothing propagates between them
//! except through the store, and a plain [`Repository::flush`] overwrites
//! whatever another surface wrote in the meantime. [`Repository::flush_checked`]
//! and [`Repository::is_stale`] use the `revision` stamp to detect that case.

use crate::error::StoreError;
use crate::store::{KEY_ACTIVE_FOLDER, KEY_FOLDERS, KEY_REVISION, Store, StoreMap};
use crate::types::{DEFAULT_FOLDER_BASE, Engine, EngineId, Folder, FolderId};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// In-memory snapshot of everything the store persists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryState {
    pub folders: Vec<Folder>,
    /// May reference a folder that no longer exists
    pub active_folder_id: Option<FolderId>,
}

impl RepositoryState {
    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn folder_mut(&mut self, id: FolderId) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| f.id == id)
    }

    /// The active folder, if it is set and still exists
    pub fn active_folder(&self) -> Option<&Folder> {
        self.active_folder_id.and_then(|id| self.folder(id))
    }

    /// Locate an engine by its stable handle
    pub fn find_engine(&self, engine: EngineId) -> Option<(FolderId, usize)> {
        self.folders
            .iter()
            .find_map(|f| f.position_of(engine).map(|idx| (f.id, idx)))
    }

    /// `"New Folder {n}"` for the smallest positive `n` not already in use
    pub fn next_default_name(&self) -> String {
        (1u64..)
            .map(|n| format!("{DEFAULT_FOLDER_BASE} {n}"))
            .find(|name| !self.folders.iter().any(|f| &f.name == name))
            .unwrap_or_else(|| DEFAULT_FOLDER_BASE.to_string())
    }

    /// Append an empty folder with a default name and a fresh id
    pub fn create_folder(&mut self) -> &Folder {
        let name = self.next_default_name();
        let mut id = FolderId::generate();
        while self.folder(id).is_some() {
            id = FolderId::generate();
        }
        debug!("Creating folder {} ({})", name, id);
        self.folders.push(Folder::new(id, name));
        &self.folders[self.folders.len() - 1]
    }

    /// Rename a folder. Returns false when no folder has that id.
    pub fn rename_folder(&mut self, id: FolderId, name: impl Into<String>) -> bool {
        match self.folder_mut(id) {
            Some(folder) => {
                folder.name = name.into();
                true
            }
            None => {
                debug!("Rename ignored: folder {} not found", id);
                false
            }
        }
    }

    /// Remove a folder. The active folder id is deliberately left as is.
    pub fn delete_folder(&mut self, id: FolderId) -> bool {
        let before = self.folders.len();
        self.folders.retain(|f| f.id != id);
        let removed = self.folders.len() != before;
        if removed && self.active_folder_id == Some(id) {
            warn!("Deleted folder {} is still the active folder", id);
        }
        removed
    }

    /// Append a copy of `engine` to every folder listed in `folder_ids`.
    ///
    /// Each copy gets its own engine id. Unknown ids are skipped. Returns the
    /// number of folders that received a copy.
    pub fn add_engine(&mut self, folder_ids: &[FolderId], engine: &Engine) -> usize {
        let mut added = 0;
        for folder in self.folders.iter_mut().filter(|f| folder_ids.contains(&f.id)) {
            folder.engines.push(engine.duplicate());
            added += 1;
        }
        debug!("Added engine {:?} to {} folder(s)", engine.name, added);
        added
    }

    /// Remove the engine at `index` in the given folder
    pub fn delete_engine(&mut self, folder_id: FolderId, index: usize) -> Option<Engine> {
        let folder = self.folder_mut(folder_id)?;
        if index >= folder.engines.len() {
            debug!("Delete ignored: index {} out of range in folder {}", index, folder_id);
            return None;
        }
        Some(folder.engines.remove(index))
    }

    /// Move the engine at `index` in `source` to the end of `target`.
    ///
    /// Also applies when `source == target`, in which case the engine ends up
    /// last. Returns false (and changes nothing) if either folder is missing
    /// or the index is out of range.
    pub fn move_engine(&mut self, source: FolderId, index: usize, target: FolderId) -> bool {
        let valid = self
            .folder(source)
            .is_some_and(|f| index < f.engines.len())
            && self.folder(target).is_some();
        if !valid {
            debug!("Move ignored: {}[{}] -> {}", source, index, target);
            return false;
        }
        let Some(engine) = self.delete_engine(source, index) else {
            return false;
        };
        match self.folder_mut(target) {
            Some(folder) => {
                folder.engines.push(engine);
                true
            }
            None => false,
        }
    }

    /// Select the active folder. No existence check.
    pub fn set_active_folder(&mut self, id: FolderId) {
        self.active_folder_id = Some(id);
    }
}

static LAST_REVISION: AtomicU64 = AtomicU64::new(0);

/// Fresh revision stamp, strictly greater than `after`
fn next_revision(after: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
        .unwrap_or_default();
    let floor = now.max(after.saturating_add(1));
    let prev = LAST_REVISION
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
            Some(floor.max(last.saturating_add(1)))
        })
        .unwrap_or_else(|last| last);
    floor.max(prev.saturating_add(1))
}

/// Folder record as stored. Engines are kept raw so one bad engine only
/// costs that engine.
#[derive(Deserialize)]
struct StoredFolder {
    id: FolderId,
    name: String,
    #[serde(default)]
    engines: Value,
}

/// Parse the folder list entry by entry, skipping records that do not
/// deserialize. `None` means the value is not a list at all.
fn parse_folders(value: Option<Value>) -> Option<Vec<Folder>> {
    let entries = match value {
        None | Some(Value::Null) => return Some(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            warn!("Ignoring malformed '{}' value: {}", KEY_FOLDERS, other);
            return None;
        }
    };

    let folders = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<StoredFolder>(entry) {
            Ok(stored) => Some(Folder {
                engines: parse_engines(stored.id, stored.engines),
                id: stored.id,
                name: stored.name,
            }),
            Err(e) => {
                warn!("Skipping malformed folder at index {}: {}", index, e);
                None
            }
        })
        .collect();
    Some(folders)
}

fn parse_engines(folder: FolderId, value: Value) -> Vec<Engine> {
    let entries = match value {
        Value::Null => return Vec::new(),
        Value::Array(entries) => entries,
        other => {
            warn!("Ignoring malformed engine list in folder {}: {}", folder, other);
            return Vec::new();
        }
    };
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            serde_json::from_value(entry)
                .map_err(|e| {
                    warn!("Skipping malformed engine {} in folder {}: {}", index, folder, e)
                })
                .ok()
        })
        .collect()
}

fn parse_active(value: Option<Value>) -> Option<FolderId> {
    match value {
        None | Some(Value::Null) => None,
        Some(value) => serde_json::from_value(value)
            .map_err(|e| warn!("Ignoring malformed '{}' value: {}", KEY_ACTIVE_FOLDER, e))
            .ok(),
    }
}

fn parse_revision(value: Option<Value>) -> u64 {
    value.as_ref().and_then(Value::as_u64).unwrap_or(0)
}

/// Read the persisted state without keeping a repository around.
///
/// Missing keys are empty/absent, never an error. A `folders` value that is
/// not a list reads as empty.
pub fn load_state(store: &impl Store) -> Result<RepositoryState, StoreError> {
    let mut map = store.get(&[KEY_FOLDERS, KEY_ACTIVE_FOLDER])?;
    Ok(RepositoryState {
        folders: parse_folders(map.remove(KEY_FOLDERS)).unwrap_or_default(),
        active_folder_id: parse_active(map.remove(KEY_ACTIVE_FOLDER)),
    })
}

/// One surface's copy of the repository, bound to a store
#[derive(Debug)]
pub struct Repository<S> {
    store: S,
    state: RepositoryState,
    /// Active folder as last read from / written to the store
    persisted_active: Option<FolderId>,
    /// Set by an explicit selection, cleared once it is written
    active_dirty: bool,
    /// The stored `folders` value could not be read as a list
    folders_unreadable: bool,
    revision: u64,
}

impl<S: Store> Repository<S> {
    /// Load state from the store
    pub fn load(store: S) -> Result<Self, StoreError> {
        let mut repo = Self {
            store,
            state: RepositoryState::default(),
            persisted_active: None,
            active_dirty: false,
            folders_unreadable: false,
            revision: 0,
        };
        repo.reload()?;
        Ok(repo)
    }

    /// Discard the in-memory copy and read it again from the store
    pub fn reload(&mut self) -> Result<(), StoreError> {
        let mut map = self
            .store
            .get(&[KEY_FOLDERS, KEY_ACTIVE_FOLDER, KEY_REVISION])?;
        let folders = parse_folders(map.remove(KEY_FOLDERS));
        self.folders_unreadable = folders.is_none();
        self.state = RepositoryState {
            folders: folders.unwrap_or_default(),
            active_folder_id: parse_active(map.remove(KEY_ACTIVE_FOLDER)),
        };
        self.persisted_active = self.state.active_folder_id;
        self.active_dirty = false;
        self.revision = parse_revision(map.remove(KEY_REVISION));
        debug!(
            "Loaded {} folder(s), active={:?}, revision={}",
            self.state.folders.len(),
            self.state.active_folder_id,
            self.revision
        );
        Ok(())
    }

    pub fn state(&self) -> &RepositoryState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RepositoryState {
        &mut self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Select the active folder. The next flush writes it even if the store
    /// already holds the same id.
    pub fn set_active_folder(&mut self, id: FolderId) {
        self.state.set_active_folder(id);
        self.active_dirty = true;
    }

    /// Revision stamp this copy was loaded from or last wrote
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Write the full state back to the store. Last writer wins.
    ///
    /// `activeFolderId` is only written after [`set_active_folder`] or when
    /// it changed since load, so a surface that never touches the selection
    /// does not clobber another surface's choice.
    ///
    /// Fails without writing when the stored `folders` value was not a list.
    ///
    /// [`set_active_folder`]: Self::set_active_folder
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.folders_unreadable {
            return Err(StoreError::Malformed { key: KEY_FOLDERS });
        }
        let revision = next_revision(self.revision);
        let mut items = StoreMap::new();
        items.insert(KEY_FOLDERS.to_string(), serde_json::to_value(&self.state.folders)?);
        if self.active_dirty || self.state.active_folder_id != self.persisted_active {
            if let Some(id) = self.state.active_folder_id {
                items.insert(KEY_ACTIVE_FOLDER.to_string(), serde_json::to_value(id)?);
            }
        }
        items.insert(KEY_REVISION.to_string(), Value::from(revision));
        self.store.set(items)?;

        self.persisted_active = self.state.active_folder_id;
        self.active_dirty = false;
        self.revision = revision;
        info!(
            "Flushed {} folder(s) at revision {}",
            self.state.folders.len(),
            revision
        );
        Ok(())
    }

    /// Like [`flush`](Self::flush), but refuse to write if another surface
    /// flushed since this copy was loaded.
    ///
    /// The check and the write are two separate store calls, so this narrows
    /// the lost-update window rather than closing it.
    pub fn flush_checked(&mut self) -> Result<(), StoreError> {
        let actual = self.stored_revision()?;
        if actual != self.revision {
            return Err(StoreError::RevisionMismatch {
                expected: self.revision,
                actual,
            });
        }
        self.flush()
    }

    /// Whether the store holds a newer state than this copy
    pub fn is_stale(&self) -> Result<bool, StoreError> {
        Ok(self.stored_revision()? != self.revision)
    }

    fn stored_revision(&self) -> Result<u64, StoreError> {
        let mut map = self.store.get(&[KEY_REVISION])?;
        Ok(parse_revision(map.remove(KEY_REVISION)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn engine(name: &str) -> Engine {
        Engine::new(name, format!("https://{name}.example/?q=searchcenter"), "")
    }

    #[test]
    fn test_default_name_fills_gaps() {
        let mut state = RepositoryState::default();
        state.create_folder();
        let second = state.create_folder().id;
        state.create_folder();
        state.delete_folder(second);
        assert_eq!(state.next_default_name(), "New Folder 2");
    }

    #[test]
    fn test_default_name_skips_user_names() {
        let mut state = RepositoryState::default();
        let id = state.create_folder().id;
        state.rename_folder(id, "New Folder 2");
        assert_eq!(state.create_folder().name, "New Folder 1");
        assert_eq!(state.create_folder().name, "New Folder 3");
    }

    #[test]
    fn test_rename_missing_is_noop() {
        let mut state = RepositoryState::default();
        state.create_folder();
        let before = state.clone();
        assert!(!state.rename_folder(FolderId::new(-1), "x"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_rename_accepts_empty() {
        let mut state = RepositoryState::default();
        let id = state.create_folder().id;
        assert!(state.rename_folder(id, ""));
        assert_eq!(state.folder(id).map(|f| f.name.as_str()), Some(""));
    }

    #[test]
    fn test_delete_engine_out_of_range() {
        let mut state = RepositoryState::default();
        let id = state.create_folder().id;
        state.add_engine(&[id], &engine("a"));
        assert!(state.delete_engine(id, 5).is_none());
        assert_eq!(state.folder(id).map(|f| f.engines.len()), Some(1));
    }

    #[test]
    fn test_move_to_missing_target_keeps_engine() {
        let mut state = RepositoryState::default();
        let id = state.create_folder().id;
        state.add_engine(&[id], &engine("a"));
        assert!(!state.move_engine(id, 0, FolderId::new(42)));
        assert_eq!(state.folder(id).map(|f| f.engines.len()), Some(1));
    }

    #[test]
    fn test_find_engine_by_handle() {
        let mut state = RepositoryState::default();
        let a = state.create_folder().id;
        let b = state.create_folder().id;
        state.add_engine(&[a], &engine("x"));
        state.add_engine(&[b], &engine("y"));
        let handle = state.folder(b).map(|f| f.engines[0].id).expect("engine");
        assert_eq!(state.find_engine(handle), Some((b, 0)));
    }

    #[test]
    fn test_load_skips_only_bad_records() {
        let folders = json!([
            {"id": 1, "name": "Work", "engines": [
                {"name": "DDG", "url": "https://duckduckgo.com/?q=searchcenter"},
                {"name": "Broken", "url": null}
            ]},
            {"name": "No id"},
            {"id": 3, "name": "Odd engines", "engines": "nope"}
        ]);
        let state = RepositoryState {
            folders: parse_folders(Some(folders)).expect("a list"),
            active_folder_id: parse_active(Some(json!({"not": "an id"}))),
        };

        assert_eq!(state.folders.len(), 2);
        let names: Vec<&str> = state.folders[0].engines.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["DDG"]);
        assert!(state.folders[1].engines.is_empty());
        assert!(state.active_folder_id.is_none());
    }

    #[test]
    fn test_non_list_folders_value_is_unreadable() {
        assert!(parse_folders(Some(json!("oops"))).is_none());
        assert_eq!(parse_folders(None), Some(Vec::new()));
        assert_eq!(parse_folders(Some(Value::Null)), Some(Vec::new()));
    }

    #[test]
    fn test_flush_skips_unchanged_active_folder() {
        let store = MemoryStore::new();
        let mut repo = Repository::load(&store).expect("load");
        repo.state_mut().create_folder();
        repo.flush().expect("flush");
        assert!(!store.snapshot().expect("snapshot").contains_key(KEY_ACTIVE_FOLDER));

        let id = repo.state().folders[0].id;
        repo.set_active_folder(id);
        assert!(repo.active_dirty);
        repo.flush().expect("flush");
        assert!(!repo.active_dirty);
        assert_eq!(
            store.snapshot().expect("snapshot").get(KEY_ACTIVE_FOLDER),
            Some(&json!(id.as_i64()))
        );
    }

    #[test]
    fn test_revision_advances_on_flush() {
        let store = MemoryStore::new();
        let mut repo = Repository::load(&store).expect("load");
        assert_eq!(repo.revision(), 0);
        repo.flush().expect("flush");
        let first = repo.revision();
        repo.flush().expect("flush");
        assert!(repo.revision() > first);
        assert!(!repo.is_stale().expect("stale"));
    }
}
