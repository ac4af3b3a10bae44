//! Context menu trigger
//!
//! The always-resident surface: one static menu entry shown on text
//! selections. A click reads the persisted state (never writes it) and
//! dispatches the selection to the active folder.
//!
//! # States
//!
//! ```text
//! Idle --click--> Dispatching --done/skipped--> Idle
//! ```
//!
//! Guard failures are logged and swallowed; this surface has no UI to
//! report them on.

use crate::dispatcher::{DispatchReport, TabOpener, dispatch};
use crate::error::StoreError;
use crate::repository::load_state;
use crate::store::Store;
use crate::types::FolderId;
use std::fmt;
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Menu item id registered by the trigger
pub const MENU_ITEM_ID: &str = "search-center-context";

/// Menu title; `%s` is replaced by the selected text
pub const MENU_TITLE: &str = "Search '%s' in Active Folder";

/// Where a context menu entry is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MenuContext {
    Selection,
}

/// A static context menu entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: String,
    pub title: String,
    pub contexts: Vec<MenuContext>,
}

impl MenuEntry {
    /// Title with the selection substituted for `%s`
    pub fn title_for(&self, selection: &str) -> String {
        self.title.replace("%s", selection)
    }

    pub fn visible_in(&self, context: MenuContext) -> bool {
        self.contexts.contains(&context)
    }
}

/// Context-menu service provided by the host
pub trait ContextMenuService {
    fn register(&mut self, entry: MenuEntry);
}

/// Collects registered entries; used by tests and the CLI
#[derive(Debug, Default)]
pub struct MenuRegistry {
    pub entries: Vec<MenuEntry>,
}

impl ContextMenuService for MenuRegistry {
    fn register(&mut self, entry: MenuEntry) {
        // Re-registering an id replaces it, as on extension update
        self.entries.retain(|e| e.id != entry.id);
        self.entries.push(entry);
    }
}

/// Trigger state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerState {
    #[default]
    Idle,
    Dispatching,
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Dispatching => write!(f, "dispatching"),
        }
    }
}

/// Why a click did not dispatch. Checked in declaration order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardFailure {
    #[error("selection is empty")]
    EmptySelection,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("no active folder selected")]
    NoActiveFolder,

    #[error("active folder {0} not found")]
    FolderNotFound(FolderId),

    #[error("active folder {0} has no engines")]
    FolderEmpty(FolderId),
}

impl From<StoreError> for GuardFailure {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

/// Result of one menu click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Click was for another menu item or carried no selection
    Ignored,
    /// A guard failed; nothing was opened
    Skipped(GuardFailure),
    Dispatched(DispatchReport),
}

/// Background trigger bound to a store
#[derive(Debug)]
pub struct ContextMenuTrigger<S> {
    store: S,
    state: TriggerState,
}

impl<S: Store> ContextMenuTrigger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: TriggerState::Idle,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// The entry this trigger registers
    pub fn menu_entry() -> MenuEntry {
        MenuEntry {
            id: MENU_ITEM_ID.to_string(),
            title: MENU_TITLE.to_string(),
            contexts: vec![MenuContext::Selection],
        }
    }

    /// Register the menu entry (install/update time)
    pub fn install(&self, menus: &mut dyn ContextMenuService) {
        debug!("Registering context menu entry {}", MENU_ITEM_ID);
        menus.register(Self::menu_entry());
    }

    /// Handle a menu click
    pub fn on_click(
        &mut self,
        menu_item_id: &str,
        selection: Option<&str>,
        opener: &dyn TabOpener,
    ) -> TriggerOutcome {
        let Some(selection) = selection.filter(|_| menu_item_id == MENU_ITEM_ID) else {
            return TriggerOutcome::Ignored;
        };

        self.state = TriggerState::Dispatching;
        debug!("Trigger {}", self.state);
        let outcome = match self.run(selection, opener) {
            Ok(report) => TriggerOutcome::Dispatched(report),
            Err(failure) => {
                warn!("Context menu search skipped: {}", failure);
                TriggerOutcome::Skipped(failure)
            }
        };
        self.state = TriggerState::Idle;
        debug!("Trigger {}", self.state);
        outcome
    }

    fn run(&self, selection: &str, opener: &dyn TabOpener) -> Result<DispatchReport, GuardFailure> {
        let query = selection.trim();
        if query.is_empty() {
            return Err(GuardFailure::EmptySelection);
        }
        let state = load_state(&self.store)?;
        let id = state.active_folder_id.ok_or(GuardFailure::NoActiveFolder)?;
        let folder = state.folder(id).ok_or(GuardFailure::FolderNotFound(id))?;
        if folder.is_empty() {
            return Err(GuardFailure::FolderEmpty(id));
        }
        let report = dispatch(Some(folder), query, opener)
            .map_err(|_| GuardFailure::FolderEmpty(id))?;
        info!("Context menu search for {:?} opened {} tab(s)", query, report.urls.len());
        Ok(report)
    }
}
