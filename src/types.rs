//! Core data types for SearchCenter
//!
//! Folders and engines are plain serde structs whose JSON shape is the
//! persisted record layout, so the store never needs a separate DTO layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Literal token in an engine URL template that marks where the query goes.
pub const PLACEHOLDER: &str = "searchcenter";

/// Prefix used when synthesizing default folder names.
pub const DEFAULT_FOLDER_BASE: &str = "New Folder";

static LAST_FOLDER_ID: AtomicI64 = AtomicI64::new(0);
static LAST_ENGINE_ID: AtomicU64 = AtomicU64::new(0);

fn since_epoch() -> std::time::Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Folder identifier: creation time in milliseconds, strictly increasing
/// within this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(i64);

impl FolderId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Generate a fresh id from the wall clock.
    ///
    /// Two calls within the same millisecond still get distinct ids because
    /// the value never goes below `last + 1`.
    pub fn generate() -> Self {
        let now = i64::try_from(since_epoch().as_millis()).unwrap_or(i64::MAX);
        let prev = LAST_FOLDER_ID
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        Self(now.max(prev.saturating_add(1)))
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FolderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

/// Stable handle for one engine record.
///
/// Positions inside a folder shift whenever another engine is removed or
/// moved, so views hold an `EngineId` and resolve it to the current index
/// right before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineId(u64);

impl EngineId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Generate a fresh id (microsecond clock, strictly increasing).
    pub fn generate() -> Self {
        let now = u64::try_from(since_epoch().as_micros()).unwrap_or(u64::MAX);
        let prev = LAST_ENGINE_ID
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        Self(now.max(prev.saturating_add(1)))
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A search destination: display name, URL template and optional icon URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engine {
    pub name: String,
    pub url: String,
    /// Icon URL, empty when unset
    #[serde(default)]
    pub icon: String,
    /// Records written before engines had ids get one on load
    #[serde(default = "EngineId::generate")]
    pub id: EngineId,
}

impl Engine {
    /// Create an engine with a fresh id
    pub fn new(name: impl Into<String>, url: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            icon: icon.into(),
            id: EngineId::generate(),
        }
    }

    /// Independent copy of this engine under a new id
    pub fn duplicate(&self) -> Self {
        Self {
            id: EngineId::generate(),
            ..self.clone()
        }
    }

    /// Compare the user-visible fields, ignoring the id
    pub fn same_fields(&self, other: &Engine) -> bool {
        self.name == other.name && self.url == other.url && self.icon == other.icon
    }

    /// Whether the URL template contains the placeholder token
    pub fn has_placeholder(&self) -> bool {
        self.url.contains(PLACEHOLDER)
    }

    /// Icon to show for this engine.
    ///
    /// Falls back to a favicon service when no icon was given. `service` is a
    /// template with a `{domain}` token.
    pub fn icon_src(&self, service: &str) -> String {
        if !self.icon.is_empty() {
            return self.icon.clone();
        }
        service.replace("{domain}", url_host(&self.url))
    }
}

/// Host part of a URL, or the whole string when it has no scheme.
fn url_host(url: &str) -> &str {
    let Some((_, rest)) = url.split_once("://") else {
        return url;
    };
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

/// A named, ordered collection of engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    #[serde(default)]
    pub engines: Vec<Engine>,
}

impl Folder {
    pub fn new(id: FolderId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            engines: Vec::new(),
        }
    }

    /// Current index of the engine with the given handle
    pub fn position_of(&self, engine: EngineId) -> Option<usize> {
        self.engines.iter().position(|e| e.id == engine)
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Label used in folder pickers: `"{name} ({count})"`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.engines.len())
    }
}
