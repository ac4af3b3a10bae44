//! View-state components
//!
//! - `popup` - folder picker and search
//! - `manager` - folder/engine editing with drag and drop
//!
//! Each view owns one repository copy for its lifetime; rendering is left to
//! the terminal UI and the CLI.

pub mod manager;
pub mod popup;

pub use manager::{
    DEFAULT_FAVICON_SERVICE, DragState, EngineCard, EngineForm, FolderCard, ManagerView,
};
pub use popup::{FolderOption, NO_FOLDERS_PLACEHOLDER, PopupModel, PopupView};
