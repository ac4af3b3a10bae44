//! Popup surface: pick a folder, type a query, open every engine.

use crate::dispatcher::{DispatchReport, TabOpener, dispatch};
use crate::error::{StoreError, UserError};
use crate::repository::{Repository, RepositoryState};
use crate::store::Store;
use crate::types::FolderId;
use tracing::{debug, info};

/// Placeholder shown when there is nothing to pick
pub const NO_FOLDERS_PLACEHOLDER: &str = "No folders found";

/// One entry of the folder picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderOption {
    pub id: FolderId,
    /// `"{name} ({engine count})"`
    pub label: String,
}

/// Everything the popup renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupModel {
    pub options: Vec<FolderOption>,
    pub selected: Option<FolderId>,
    pub search_enabled: bool,
    pub placeholder: Option<&'static str>,
}

/// Popup view state
#[derive(Debug)]
pub struct PopupView<S> {
    repo: Repository<S>,
}

impl<S: Store> PopupView<S> {
    /// Load state. If folders exist but none is active, the first one is
    /// selected and persisted.
    pub fn open(store: S) -> Result<Self, StoreError> {
        let mut repo = Repository::load(store)?;
        let first = repo.state().folders.first().map(|f| f.id);
        if let (None, Some(first)) = (repo.state().active_folder_id, first) {
            info!("No active folder saved, defaulting to {}", first);
            repo.set_active_folder(first);
            repo.flush()?;
        }
        Ok(Self { repo })
    }

    pub fn state(&self) -> &RepositoryState {
        self.repo.state()
    }

    pub fn model(&self) -> PopupModel {
        let state = self.repo.state();
        let options: Vec<FolderOption> = state
            .folders
            .iter()
            .map(|f| FolderOption {
                id: f.id,
                label: f.label(),
            })
            .collect();
        let search_enabled = !options.is_empty();
        PopupModel {
            options,
            selected: state.active_folder_id,
            search_enabled,
            placeholder: (!search_enabled).then_some(NO_FOLDERS_PLACEHOLDER),
        }
    }

    /// Change the selected folder and persist it
    pub fn select_folder(&mut self, id: FolderId) -> Result<(), StoreError> {
        debug!("Popup selected folder {}", id);
        self.repo.set_active_folder(id);
        self.repo.flush()
    }

    /// Run the query against the selected folder
    pub fn search(&self, query: &str, opener: &dyn TabOpener) -> Result<DispatchReport, UserError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(UserError::MissingQuery);
        }
        dispatch(self.repo.state().active_folder(), query, opener)
    }
}
