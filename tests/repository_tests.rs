//! Tests for the folder repository and its persistence rules
//!
//! These tests verify:
//! - Loading from empty records, skipping malformed ones
//! - Folder naming, deletion and the dangling active folder
//! - Engine copies, deletion and moves
//! - Last-write-wins flushing between two surfaces
//! - Explicit folder selection always reaching the store
//! - Revision checks and staleness

use searchcenter::repository::{Repository, RepositoryState, load_state};
use searchcenter::store::{KEY_ACTIVE_FOLDER, KEY_FOLDERS, MemoryStore, Store, StoreMap};
use searchcenter::types::{Engine, Folder, FolderId};
use searchcenter::error::StoreError;
use serde_json::{Value, json};
use std::sync::Arc;

fn record(value: Value) -> StoreMap {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

fn state_with_folders(names: &[&str]) -> RepositoryState {
    RepositoryState {
        folders: names
            .iter()
            .enumerate()
            .map(|(i, name)| Folder::new(FolderId::new(i as i64 + 1), *name))
            .collect(),
        active_folder_id: None,
    }
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_load_from_empty_store() {
    let repo = Repository::load(MemoryStore::new()).expect("load");
    assert!(repo.state().folders.is_empty());
    assert_eq!(repo.state().active_folder_id, None);
    assert_eq!(repo.revision(), 0);
}

#[test]
fn test_load_reads_persisted_record() {
    let store = MemoryStore::with_record(record(json!({
        "folders": [
            {"id": 10, "name": "Dev", "engines": [
                {"name": "Rust docs", "url": "https://docs.rs/releases/search?query=searchcenter", "icon": ""}
            ]},
            {"id": 20, "name": "Empty"}
        ],
        "activeFolderId": 10
    })));
    let state = load_state(&store).expect("load");
    assert_eq!(state.folders.len(), 2);
    assert_eq!(state.folders[0].engines[0].name, "Rust docs");
    assert!(state.folders[1].engines.is_empty());
    assert_eq!(state.active_folder().map(|f| f.name.as_str()), Some("Dev"));
}

#[test]
fn test_good_folders_survive_a_bad_engine() {
    let store = Arc::new(MemoryStore::with_record(record(json!({
        "folders": [
            {"id": 1, "name": "Work", "engines": [
                {"name": "DDG", "url": "https://duckduckgo.com/?q=searchcenter"}
            ]},
            {"id": 2, "name": "Media", "engines": [
                {"name": "Broken", "url": null},
                {"name": "Video", "url": "https://video.example/?q=searchcenter"}
            ]}
        ],
        "activeFolderId": "also wrong"
    }))));
    let mut repo = Repository::load(Arc::clone(&store)).expect("bad records are not fatal");
    assert_eq!(repo.state().active_folder_id, None);
    repo.state_mut().create_folder();
    repo.flush().expect("flush");

    let state = load_state(&store).expect("reload");
    let names: Vec<&str> = state.folders.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Work", "Media", "New Folder 1"]);
    assert_eq!(state.folders[0].engines[0].name, "DDG");
    let media: Vec<&str> = state.folders[1].engines.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(media, ["Video"]);
}

#[test]
fn test_folder_without_id_is_skipped() {
    let store = MemoryStore::with_record(record(json!({
        "folders": [
            {"name": "Lost"},
            {"id": 5, "name": "Kept"},
            42
        ]
    })));
    let state = load_state(&store).expect("load");
    assert_eq!(state.folders.len(), 1);
    assert_eq!(state.folders[0].id, FolderId::new(5));
}

#[test]
fn test_unreadable_folders_are_never_overwritten() {
    let store = Arc::new(MemoryStore::with_record(record(json!({
        "folders": "not a list"
    }))));
    assert!(load_state(&store).expect("load").folders.is_empty());

    let mut repo = Repository::load(Arc::clone(&store)).expect("load");
    repo.state_mut().create_folder();
    match repo.flush() {
        Err(StoreError::Malformed { key }) => assert_eq!(key, KEY_FOLDERS),
        other => panic!("expected a malformed-value error, got {:?}", other),
    }
    let snapshot = store.snapshot().expect("snapshot");
    assert_eq!(snapshot.get(KEY_FOLDERS), Some(&json!("not a list")));

    // Once the record is repaired a reload makes the copy writable again
    store
        .set(record(json!({"folders": [{"id": 1, "name": "A"}]})))
        .expect("set");
    repo.reload().expect("reload");
    repo.flush().expect("flush");
}

#[test]
fn test_engines_without_ids_get_distinct_ids() {
    let store = MemoryStore::with_record(record(json!({
        "folders": [{"id": 1, "name": "A", "engines": [
            {"name": "x", "url": "https://x/?q=searchcenter"},
            {"name": "x", "url": "https://x/?q=searchcenter"}
        ]}]
    })));
    let state = load_state(&store).expect("load");
    let engines = &state.folders[0].engines;
    assert_eq!(engines[0].icon, "");
    assert_ne!(engines[0].id, engines[1].id);
}

// =============================================================================
// Folders
// =============================================================================

#[test]
fn test_default_names_fill_smallest_gap() {
    let mut state = RepositoryState::default();
    let first = state.create_folder().id;
    state.create_folder();
    state.create_folder();
    assert_eq!(state.folders[2].name, "New Folder 3");

    assert!(state.delete_folder(first));
    assert_eq!(state.create_folder().name, "New Folder 1");
}

#[test]
fn test_default_name_skips_renamed_collisions() {
    let mut state = state_with_folders(&["New Folder 1", "New Folder 3"]);
    assert_eq!(state.next_default_name(), "New Folder 2");
    state.create_folder();
    assert_eq!(state.next_default_name(), "New Folder 4");
}

#[test]
fn test_created_folder_ids_are_unique() {
    let mut state = RepositoryState::default();
    for _ in 0..50 {
        state.create_folder();
    }
    let mut ids: Vec<FolderId> = state.folders.iter().map(|f| f.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 50);
}

#[test]
fn test_rename_unknown_folder_is_noop() {
    let mut state = state_with_folders(&["A"]);
    assert!(!state.rename_folder(FolderId::new(99), "B"));
    assert_eq!(state.folders[0].name, "A");
}

#[test]
fn test_deleting_active_folder_leaves_dangling_id() {
    let store = Arc::new(MemoryStore::new());
    let mut repo = Repository::load(Arc::clone(&store)).expect("load");
    let id = repo.state_mut().create_folder().id;
    repo.state_mut().set_active_folder(id);
    repo.flush().expect("flush");

    assert!(repo.state_mut().delete_folder(id));
    repo.flush().expect("flush");

    let reloaded = load_state(&store).expect("reload");
    assert_eq!(reloaded.active_folder_id, Some(id));
    assert!(reloaded.active_folder().is_none());
}

// =============================================================================
// Engines
// =============================================================================

#[test]
fn test_add_engine_copies_are_independent() {
    let mut state = state_with_folders(&["A", "B", "C"]);
    let engine = Engine::new("Search", "https://s/?q=searchcenter", "");
    let added = state.add_engine(&[FolderId::new(1), FolderId::new(3), FolderId::new(42)], &engine);
    assert_eq!(added, 2);

    let a = &state.folders[0].engines[0];
    let c = &state.folders[2].engines[0];
    assert!(a.same_fields(&engine) && c.same_fields(&engine));
    assert_ne!(a.id, c.id);
    assert!(state.folders[1].engines.is_empty());

    state.folders[0].engines[0].name = "Changed".to_string();
    assert_eq!(state.folders[2].engines[0].name, "Search");
}

#[test]
fn test_delete_engine_out_of_range() {
    let mut state = state_with_folders(&["A"]);
    state.add_engine(&[FolderId::new(1)], &Engine::new("e", "u", ""));
    assert!(state.delete_engine(FolderId::new(1), 5).is_none());
    assert!(state.delete_engine(FolderId::new(9), 0).is_none());
    assert_eq!(state.folders[0].engines.len(), 1);
    assert!(state.delete_engine(FolderId::new(1), 0).is_some());
    assert!(state.folders[0].is_empty());
}

#[test]
fn test_move_engine_appends_and_keeps_id() {
    let mut state = state_with_folders(&["A", "B"]);
    let (a, b) = (FolderId::new(1), FolderId::new(2));
    state.add_engine(&[a], &Engine::new("one", "u1", ""));
    state.add_engine(&[a], &Engine::new("two", "u2", ""));
    state.add_engine(&[b], &Engine::new("three", "u3", ""));
    let moved_id = state.folders[0].engines[0].id;

    assert!(state.move_engine(a, 0, b));
    let names: Vec<&str> = state.folders[1].engines.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["three", "one"]);
    assert_eq!(state.folders[1].engines[1].id, moved_id);
    assert_eq!(state.folders[0].engines.len(), 1);
}

#[test]
fn test_move_within_same_folder_goes_last() {
    let mut state = state_with_folders(&["A"]);
    let a = FolderId::new(1);
    for name in ["one", "two", "three"] {
        state.add_engine(&[a], &Engine::new(name, "u", ""));
    }
    assert!(state.move_engine(a, 0, a));
    let names: Vec<&str> = state.folders[0].engines.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["two", "three", "one"]);
}

#[test]
fn test_move_to_missing_folder_changes_nothing() {
    let mut state = state_with_folders(&["A"]);
    let a = FolderId::new(1);
    state.add_engine(&[a], &Engine::new("one", "u", ""));
    let before = state.clone();
    assert!(!state.move_engine(a, 0, FolderId::new(7)));
    assert!(!state.move_engine(a, 3, a));
    assert_eq!(state, before);
}

// =============================================================================
// Flushing
// =============================================================================

#[test]
fn test_flush_round_trips_through_store() {
    let store = Arc::new(MemoryStore::new());
    let mut repo = Repository::load(Arc::clone(&store)).expect("load");
    let id = repo.state_mut().create_folder().id;
    repo.state_mut()
        .add_engine(&[id], &Engine::new("Wiki", "https://w/?s=searchcenter", "https://w/i.png"));
    repo.state_mut().set_active_folder(id);
    repo.flush().expect("flush");

    let reloaded = Repository::load(Arc::clone(&store)).expect("reload");
    assert_eq!(reloaded.state(), repo.state());
    assert_eq!(reloaded.revision(), repo.revision());
}

#[test]
fn test_last_write_wins_between_surfaces() {
    let store = Arc::new(MemoryStore::new());
    let mut popup = Repository::load(Arc::clone(&store)).expect("load");
    let mut manager = Repository::load(Arc::clone(&store)).expect("load");

    popup.state_mut().create_folder();
    popup.flush().expect("flush");

    manager.state_mut().create_folder();
    manager.state_mut().create_folder();
    manager.flush().expect("flush");

    let state = load_state(&store).expect("load");
    assert_eq!(state.folders, manager.state().folders);
}

#[test]
fn test_untouched_selection_is_not_clobbered() {
    let store = Arc::new(MemoryStore::with_record(record(json!({
        "folders": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
        "activeFolderId": 1
    }))));
    let mut popup = Repository::load(Arc::clone(&store)).expect("load");
    let mut manager = Repository::load(Arc::clone(&store)).expect("load");

    popup.state_mut().set_active_folder(FolderId::new(2));
    popup.flush().expect("flush");

    manager.state_mut().rename_folder(FolderId::new(1), "Renamed");
    manager.flush().expect("flush");

    let snapshot = store.snapshot().expect("snapshot");
    assert_eq!(snapshot.get(KEY_ACTIVE_FOLDER), Some(&json!(2)));
    assert_eq!(snapshot[KEY_FOLDERS][0]["name"], json!("Renamed"));
}

#[test]
fn test_reselect_after_external_change() {
    let store = Arc::new(MemoryStore::with_record(record(json!({
        "folders": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
        "activeFolderId": 1
    }))));
    let mut popup = Repository::load(Arc::clone(&store)).expect("load");
    let mut manager = Repository::load(Arc::clone(&store)).expect("load");

    popup.set_active_folder(FolderId::new(2));
    popup.flush().expect("flush");

    // The manager still holds 1 from its load, but the choice is explicit
    manager.set_active_folder(FolderId::new(1));
    manager.flush().expect("flush");
    assert_eq!(load_state(&store).expect("load").active_folder_id, Some(FolderId::new(1)));

    // A later unrelated write leaves the popup's next choice alone
    popup.set_active_folder(FolderId::new(2));
    popup.flush().expect("flush");
    manager.state_mut().rename_folder(FolderId::new(2), "Bee");
    manager.flush().expect("flush");
    assert_eq!(load_state(&store).expect("load").active_folder_id, Some(FolderId::new(2)));
}

#[test]
fn test_flush_checked_detects_concurrent_writer() {
    let store = Arc::new(MemoryStore::new());
    let mut first = Repository::load(Arc::clone(&store)).expect("load");
    let mut second = Repository::load(Arc::clone(&store)).expect("load");

    second.state_mut().create_folder();
    second.flush_checked().expect("nobody wrote in between");

    assert!(first.is_stale().expect("stale check"));
    first.state_mut().create_folder();
    match first.flush_checked() {
        Err(StoreError::RevisionMismatch { expected, actual }) => {
            assert_eq!(expected, 0);
            assert_eq!(actual, second.revision());
        }
        other => panic!("expected a revision mismatch, got {:?}", other),
    }

    first.reload().expect("reload");
    assert!(!first.is_stale().expect("stale check"));
    assert_eq!(first.state().folders.len(), 1);
}

#[test]
fn test_revisions_strictly_increase() {
    let mut repo = Repository::load(MemoryStore::new()).expect("load");
    let mut last = repo.revision();
    for _ in 0..20 {
        repo.flush().expect("flush");
        assert!(repo.revision() > last);
        last = repo.revision();
    }
}

#[test]
fn test_load_state_does_not_write() {
    let store = MemoryStore::new();
    load_state(&store).expect("load");
    assert!(store.get(&[KEY_FOLDERS]).expect("get").is_empty());
}
