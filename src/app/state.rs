//! Application state definitions
//!
//! Contains the mode machine and cursor state of the terminal manager.

use crate::error::{UserError, UserErrorKind};
use crate::types::FolderId;
use crate::views::{EngineForm, FolderCard};

/// Application operating modes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AppMode {
    /// Folder/engine list
    Browse,
    /// Editing a folder name
    Rename,
    /// Waiting for y/n before deleting a folder
    ConfirmDelete,
    /// Add-engine form
    EngineForm,
    /// Query prompt for the selected folder
    Search,
    /// Key reference overlay
    Help,
}

/// Fields of the add-engine form, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Name,
    Url,
    Icon,
    Folders,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            Self::Name => Self::Url,
            Self::Url => Self::Icon,
            Self::Icon => Self::Folders,
            Self::Folders => Self::Name,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Url => "URL",
            Self::Icon => "Icon",
            Self::Folders => "Folders",
        }
    }
}

/// One line of the browse list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Folder(FolderId),
    Engine(FolderId, usize),
}

impl Row {
    pub fn folder(self) -> FolderId {
        match self {
            Self::Folder(id) | Self::Engine(id, _) => id,
        }
    }
}

/// Flatten folder cards into browse rows
pub fn rows(cards: &[FolderCard]) -> Vec<Row> {
    cards
        .iter()
        .flat_map(|card| {
            std::iter::once(Row::Folder(card.id))
                .chain(card.engines.iter().map(move |e| Row::Engine(card.id, e.index)))
        })
        .collect()
}

/// State of the add-engine form dialog
#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub form: EngineForm,
    pub field: FormField,
    /// Highlighted folder in the folder toggle list
    pub folder_cursor: usize,
}

impl FormState {
    /// Text buffer of the focused field, if it is a text field
    pub fn buffer_mut(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Name => Some(&mut self.form.name),
            FormField::Url => Some(&mut self.form.url),
            FormField::Icon => Some(&mut self.form.icon),
            FormField::Folders => None,
        }
    }
}

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: AppMode,
    /// Index into the browse rows
    pub cursor: usize,
    /// Status message for user feedback
    pub status_message: String,
    /// Whether the status message reports an error
    pub status_is_error: bool,
    /// The error only asks for missing input
    pub status_is_warning: bool,
    /// Text input for rename and search prompts
    pub input: String,
    /// Folder targeted by the current prompt or confirmation
    pub target: Option<FolderId>,
    pub form: Option<FormState>,
    /// Mode to return to when the help overlay closes
    pub pre_help_mode: Option<AppMode>,
    /// Another surface changed the store since load
    pub stale: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Browse,
            cursor: 0,
            status_message: "Press ? for help".to_string(),
            status_is_error: false,
            status_is_warning: false,
            input: String::new(),
            target: None,
            form: None,
            pre_help_mode: None,
            stale: false,
        }
    }
}

impl AppState {
    pub fn info(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
        self.status_is_error = false;
        self.status_is_warning = false;
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
        self.status_is_error = true;
        self.status_is_warning = false;
    }

    /// Report a user error. Input problems show as warnings.
    pub fn user_error(&mut self, err: &UserError) {
        self.error(err.to_string());
        self.status_is_warning = err.kind() == UserErrorKind::Input;
    }

    /// Back to browsing, clearing prompt state
    pub fn reset_to_browse(&mut self) {
        self.mode = AppMode::Browse;
        self.input.clear();
        self.target = None;
        self.form = None;
    }
}
