//! Error handling module for SearchCenter
//!
//! Provides centralized error types using thiserror. Storage failures,
//! user-facing input errors and the top-level error live here so every
//! surface reports them the same way.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`crate::store::Store`] backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("store I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing document is not valid JSON
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Another surface flushed since this one last loaded
    #[error("store revision mismatch (expected {expected}, found {actual})")]
    RevisionMismatch { expected: u64, actual: u64 },

    /// A stored value could not be read, so writing would destroy it
    #[error("refusing to overwrite malformed '{key}' value in the store")]
    Malformed { key: &'static str },

    /// In-memory store lock was poisoned
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Broad class of a [`UserError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserErrorKind {
    /// Missing or invalid input on a form or prompt
    Input,
    /// Search attempted on a folder without engines
    EmptyFolder,
}

/// Errors shown to the user. None of them changes any state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("Please enter a search term")]
    MissingQuery,

    #[error("Name and URL are required.")]
    MissingEngineFields,

    #[error("Please select at least one folder to add this engine to.")]
    NoFolderSelected,

    #[error("Please create a folder first!")]
    NoFolders,

    #[error("This folder has no search engines or does not exist!")]
    EmptyFolder,
}

impl UserError {
    pub fn kind(&self) -> UserErrorKind {
        match self {
            Self::EmptyFolder => UserErrorKind::EmptyFolder,
            Self::MissingQuery
            | Self::MissingEngineFields
            | Self::NoFolderSelected
            | Self::NoFolders => UserErrorKind::Input,
        }
    }
}

/// Main error type for SearchCenter
#[derive(Error, Debug)]
pub enum SearchCenterError {
    /// Persistent store failures
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// User-facing validation failures
    #[error("{0}")]
    User(#[from] UserError),

    /// IO errors (terminal, files outside the store)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal/UI errors
    #[error("Terminal error: {0}")]
    Terminal(String),
}

/// Result type alias for SearchCenter operations
pub type Result<T> = std::result::Result<T, SearchCenterError>;

impl SearchCenterError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a terminal error
    pub fn terminal(msg: impl Into<String>) -> Self {
        Self::Terminal(msg.into())
    }

    /// The user-facing error, if this is one
    pub fn as_user(&self) -> Option<&UserError> {
        match self {
            Self::User(err) => Some(err),
            _ => None,
        }
    }
}
