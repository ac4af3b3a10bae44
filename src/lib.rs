//! SearchCenter Library
//!
//! Organizes search engine URL templates into folders and opens a query in
//! every engine of a folder at once. The popup, the manager and the
//! context-menu trigger all work on one persisted store.

pub mod app;
pub mod cli;
pub mod components;
pub mod config_file;
pub mod dispatcher;
pub mod error;
pub mod repository;
pub mod store;
pub mod theme;
pub mod trigger;
pub mod types;
pub mod ui;
pub mod views;

// Re-export main types for convenience
pub use config_file::Settings;
pub use dispatcher::{DispatchReport, PrintOpener, RecordingOpener, SystemOpener, TabOpener, dispatch};
pub use error::{SearchCenterError, StoreError, UserError, UserErrorKind};
pub use repository::{Repository, RepositoryState, load_state};
pub use store::{JsonFileStore, MemoryStore, Store, StoreMap};
pub use trigger::{ContextMenuTrigger, GuardFailure, TriggerOutcome, TriggerState};
pub use types::{Engine, EngineId, Folder, FolderId, PLACEHOLDER};
pub use views::{ManagerView, PopupView};
