//! Manager surface: folder and engine editing.
//!
//! Every gesture mutates the owned repository and flushes before returning,
//! so gestures are applied strictly in order. The ephemeral drag state lives
//! here rather than in the repository.

use crate::error::{Result, StoreError, UserError};
use crate::repository::{Repository, RepositoryState};
use crate::store::Store;
use crate::types::{Engine, EngineId, FolderId};
use tracing::{debug, info};

/// Default favicon service, `{domain}` is replaced by the engine host
pub const DEFAULT_FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons?domain={domain}&sz=64";

/// Engine being dragged between folders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    pub source: FolderId,
    pub engine: EngineId,
}

/// Add-engine form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineForm {
    pub name: String,
    pub url: String,
    pub icon: String,
    selected: Vec<FolderId>,
}

impl EngineForm {
    /// Toggle a folder in the target set. Returns whether it is now selected.
    pub fn toggle(&mut self, folder: FolderId) -> bool {
        if let Some(pos) = self.selected.iter().position(|id| *id == folder) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(folder);
            true
        }
    }

    pub fn is_selected(&self, folder: FolderId) -> bool {
        self.selected.contains(&folder)
    }

    pub fn selected(&self) -> &[FolderId] {
        &self.selected
    }

    /// Trimmed engine, or the input error that blocks saving
    pub fn validate(&self) -> std::result::Result<Engine, UserError> {
        let name = self.name.trim();
        let url = self.url.trim();
        if name.is_empty() || url.is_empty() {
            return Err(UserError::MissingEngineFields);
        }
        if self.selected.is_empty() {
            return Err(UserError::NoFolderSelected);
        }
        Ok(Engine::new(name, url, self.icon.trim()))
    }
}

/// Render model of one engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCard {
    pub id: EngineId,
    pub index: usize,
    pub name: String,
    pub url: String,
    pub icon_src: String,
}

/// Render model of one folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderCard {
    pub id: FolderId,
    pub name: String,
    pub active: bool,
    pub engines: Vec<EngineCard>,
}

/// Manager view state
#[derive(Debug)]
pub struct ManagerView<S> {
    repo: Repository<S>,
    drag: Option<DragState>,
    favicon_service: String,
}

impl<S: Store> ManagerView<S> {
    pub fn open(store: S, favicon_service: impl Into<String>) -> std::result::Result<Self, StoreError> {
        Ok(Self {
            repo: Repository::load(store)?,
            drag: None,
            favicon_service: favicon_service.into(),
        })
    }

    pub fn state(&self) -> &RepositoryState {
        self.repo.state()
    }

    pub fn drag(&self) -> Option<DragState> {
        self.drag
    }

    pub fn cards(&self) -> Vec<FolderCard> {
        let state = self.repo.state();
        state
            .folders
            .iter()
            .map(|folder| FolderCard {
                id: folder.id,
                name: folder.name.clone(),
                active: state.active_folder_id == Some(folder.id),
                engines: folder
                    .engines
                    .iter()
                    .enumerate()
                    .map(|(index, engine)| EngineCard {
                        id: engine.id,
                        index,
                        name: engine.name.clone(),
                        url: engine.url.clone(),
                        icon_src: engine.icon_src(&self.favicon_service),
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn create_folder(&mut self) -> Result<FolderId> {
        let id = self.repo.state_mut().create_folder().id;
        self.repo.flush()?;
        Ok(id)
    }

    pub fn rename_folder(&mut self, id: FolderId, name: &str) -> Result<bool> {
        let renamed = self.repo.state_mut().rename_folder(id, name);
        if renamed {
            self.repo.flush()?;
        }
        Ok(renamed)
    }

    /// Delete a folder; the caller is responsible for asking for confirmation
    pub fn delete_folder(&mut self, id: FolderId) -> Result<bool> {
        let removed = self.repo.state_mut().delete_folder(id);
        if removed {
            if self.drag.is_some_and(|d| d.source == id) {
                self.drag = None;
            }
            self.repo.flush()?;
        }
        Ok(removed)
    }

    pub fn set_active_folder(&mut self, id: FolderId) -> Result<()> {
        self.repo.set_active_folder(id);
        self.repo.flush()?;
        Ok(())
    }

    /// Fresh add-engine form. Needs at least one folder to target.
    pub fn engine_form(&self) -> std::result::Result<EngineForm, UserError> {
        if self.repo.state().folders.is_empty() {
            return Err(UserError::NoFolders);
        }
        Ok(EngineForm::default())
    }

    /// Validate the form and append the engine to every selected folder
    pub fn save_engine(&mut self, form: &EngineForm) -> Result<usize> {
        let engine = form.validate()?;
        let added = self.repo.state_mut().add_engine(form.selected(), &engine);
        self.repo.flush()?;
        info!("Saved engine {:?} into {} folder(s)", engine.name, added);
        Ok(added)
    }

    pub fn delete_engine(&mut self, folder: FolderId, index: usize) -> Result<Option<Engine>> {
        let removed = self.repo.state_mut().delete_engine(folder, index);
        if removed.is_some() {
            self.repo.flush()?;
        }
        Ok(removed)
    }

    /// Delete by stable handle, wherever the engine currently is
    pub fn delete_engine_by_id(&mut self, engine: EngineId) -> Result<Option<Engine>> {
        match self.repo.state().find_engine(engine) {
            Some((folder, index)) => self.delete_engine(folder, index),
            None => Ok(None),
        }
    }

    /// Start dragging the engine at `index` of `folder`
    pub fn begin_drag(&mut self, folder: FolderId, index: usize) -> bool {
        let engine = self
            .repo
            .state()
            .folder(folder)
            .and_then(|f| f.engines.get(index))
            .map(|e| e.id);
        self.drag = engine.map(|engine| DragState {
            source: folder,
            engine,
        });
        self.drag.is_some()
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    /// Drop the dragged engine on `target`; it lands at the end of the list.
    ///
    /// The engine is looked up by handle at drop time, so a drag that went
    /// stale (engine deleted meanwhile) is dropped without effect.
    pub fn drop_on(&mut self, target: FolderId) -> Result<bool> {
        let Some(drag) = self.drag.take() else {
            return Ok(false);
        };
        let index = self
            .repo
            .state()
            .folder(drag.source)
            .and_then(|f| f.position_of(drag.engine));
        let Some(index) = index else {
            debug!("Dragged engine {} no longer in folder {}", drag.engine, drag.source);
            return Ok(false);
        };
        let moved = self.repo.state_mut().move_engine(drag.source, index, target);
        if moved {
            self.repo.flush()?;
        }
        Ok(moved)
    }

    /// Whether another surface flushed since this view loaded
    pub fn is_stale(&self) -> std::result::Result<bool, StoreError> {
        self.repo.is_stale()
    }

    /// Re-read the store, dropping any drag in progress
    pub fn reload(&mut self) -> std::result::Result<(), StoreError> {
        self.drag = None;
        self.repo.reload()
    }
}
