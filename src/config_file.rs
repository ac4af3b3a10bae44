//! Settings file handling
//!
//! Settings are a small JSON document. A missing file means defaults, so a
//! fresh install works without running `config init`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::views::DEFAULT_FAVICON_SERVICE;

/// Environment variable naming an explicit settings file
pub const CONFIG_ENV: &str = "SEARCHCENTER_CONFIG";

const APP_DIR: &str = "searchcenter";

/// User settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// JSON store document holding folders and the active folder
    pub store_path: PathBuf,
    /// Command used to open URLs; the URL is appended. `None` means the
    /// platform default (`xdg-open`, `open`, `start`).
    pub opener: Option<Vec<String>>,
    /// Favicon URL template with a `{domain}` token
    pub favicon_service: String,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_data_dir().join("store.json"),
            opener: None,
            favicon_service: DEFAULT_FAVICON_SERVICE.to_string(),
            log_level: "warn".to_string(),
        }
    }
}

fn env_dir(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn home_subdir(rest: &[&str]) -> PathBuf {
    let mut dir = env_dir("HOME").unwrap_or_else(|| PathBuf::from("."));
    for part in rest {
        dir.push(part);
    }
    dir
}

/// `$XDG_DATA_HOME/searchcenter`, falling back to `~/.local/share/searchcenter`
pub fn default_data_dir() -> PathBuf {
    env_dir("XDG_DATA_HOME")
        .unwrap_or_else(|| home_subdir(&[".local", "share"]))
        .join(APP_DIR)
}

/// Settings file location: `$SEARCHCENTER_CONFIG`, else
/// `$XDG_CONFIG_HOME/searchcenter/config.json` (or `~/.config/...`)
pub fn default_config_path() -> PathBuf {
    if let Some(path) = env_dir(CONFIG_ENV) {
        return path;
    }
    env_dir("XDG_CONFIG_HOME")
        .unwrap_or_else(|| home_subdir(&[".config"]))
        .join(APP_DIR)
        .join("config.json")
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {:?}", path.as_ref()))?;

        let settings: Self =
            serde_json::from_str(&content).context("Failed to parse settings JSON")?;

        Ok(settings)
    }

    /// Load settings, or defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to a JSON file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize settings to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write settings to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.store_path.as_os_str().is_empty() {
            anyhow::bail!("Store path must be specified");
        }

        if !self.favicon_service.contains("{domain}") {
            anyhow::bail!("Favicon service must contain a {{domain}} token");
        }

        if let Some(argv) = &self.opener {
            if argv.first().is_none_or(|program| program.trim().is_empty()) {
                anyhow::bail!("Opener command must name a program");
            }
        }

        EnvFilter::try_new(&self.log_level)
            .with_context(|| format!("Invalid log level {:?}", self.log_level))?;

        Ok(())
    }

    /// Opener argv, or empty for the platform default
    pub fn opener_argv(&self) -> Vec<String> {
        self.opener.clone().unwrap_or_default()
    }

    /// Directory next to the store, used for the UI log file
    pub fn data_dir(&self) -> PathBuf {
        self.store_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
