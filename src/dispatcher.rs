//! Query dispatcher
//!
//! Expands engine URL templates with a query and asks a [`TabOpener`] to open
//! each result. Opening is fire-and-forget: the dispatcher never waits for a
//! tab and one failed open does not stop the rest.

use crate::error::UserError;
use crate::types::{Engine, Folder, FolderId, PLACEHOLDER};
use std::process::{Command, Stdio};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Tab-open service
pub trait TabOpener {
    /// Request a new tab for `url`. `focused` asks for it to take focus.
    fn open(&self, url: &str, focused: bool);
}

impl<T: TabOpener + ?Sized> TabOpener for &T {
    fn open(&self, url: &str, focused: bool) {
        (**self).open(url, focused)
    }
}

impl<T: TabOpener + ?Sized> TabOpener for std::sync::Arc<T> {
    fn open(&self, url: &str, focused: bool) {
        (**self).open(url, focused)
    }
}

/// Percent-encode a query the way `encodeURIComponent` does.
///
/// `urlencoding` escapes the sub-delimiters `! * ' ( )` too; they are put
/// back so the output matches what a browser would produce. A literal `%`
/// in the input is itself encoded as `%25`, so the restore step cannot touch
/// user text.
pub fn encode_query(query: &str) -> String {
    urlencoding::encode(query)
        .replace("%21", "!")
        .replace("%2A", "*")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
}

/// Substitute the encoded query for every placeholder in the engine URL
pub fn expand(engine: &Engine, query: &str) -> String {
    if !engine.has_placeholder() {
        debug!("Engine {:?} has no placeholder, opening URL unchanged", engine.name);
        return engine.url.clone();
    }
    engine.url.replace(PLACEHOLDER, &encode_query(query))
}

/// What a dispatch asked the opener to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub folder: FolderId,
    /// Expanded URLs in engine order
    pub urls: Vec<String>,
}

/// Open every engine of `folder` for `query` in unfocused tabs
pub fn dispatch(
    folder: Option<&Folder>,
    query: &str,
    opener: &dyn TabOpener,
) -> Result<DispatchReport, UserError> {
    let folder = match folder {
        Some(folder) if !folder.is_empty() => folder,
        _ => return Err(UserError::EmptyFolder),
    };

    let urls: Vec<String> = folder.engines.iter().map(|e| expand(e, query)).collect();
    for url in &urls {
        opener.open(url, false);
    }
    info!(
        "Dispatched query to {} engine(s) in folder {:?}",
        urls.len(),
        folder.name
    );
    Ok(DispatchReport {
        folder: folder.id,
        urls,
    })
}

/// Opens URLs with the desktop's URL handler
#[derive(Debug, Clone)]
pub struct SystemOpener {
    argv: Vec<String>,
}

impl SystemOpener {
    /// Use an explicit command; the URL is appended as the last argument.
    /// An empty argv falls back to the platform default.
    pub fn with_command(argv: Vec<String>) -> Self {
        if argv.is_empty() {
            return Self::platform_default();
        }
        Self { argv }
    }

    pub fn platform_default() -> Self {
        Self {
            argv: default_argv(std::env::consts::OS)
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

/// URL handler for an OS name as in `std::env::consts::OS`. The URL is
/// passed as a plain argument and never through a shell.
fn default_argv(os: &str) -> &'static [&'static str] {
    match os {
        "macos" => &["open", "-g"],
        "windows" => &["rundll32", "url.dll,FileProtocolHandler"],
        _ => &["xdg-open"],
    }
}

impl TabOpener for SystemOpener {
    fn open(&self, url: &str, focused: bool) {
        let Some((program, args)) = self.argv.split_first() else {
            warn!("No opener command configured, skipping {}", url);
            return;
        };
        debug!("Opening {} (focused={}) with {}", url, focused, program);
        let spawned = Command::new(program)
            .args(args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(mut child) => {
                // Reap in the background so the caller never waits on the handler
                std::thread::spawn(move || {
                    if let Err(e) = child.wait() {
                        warn!("URL handler did not exit cleanly: {}", e);
                    }
                });
            }
            Err(e) => warn!("Failed to open {}: {}", url, e),
        }
    }
}

/// Prints URLs instead of opening them (dry run)
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintOpener;

impl TabOpener for PrintOpener {
    fn open(&self, url: &str, _focused: bool) {
        println!("{url}");
    }
}

/// Records open requests; used by tests and previews
#[derive(Debug, Default)]
pub struct RecordingOpener {
    requests: Mutex<Vec<(String, bool)>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs requested so far, in request order
    pub fn urls(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|(url, _)| url)
            .collect()
    }

    /// `(url, focused)` pairs requested so far
    pub fn requests(&self) -> Vec<(String, bool)> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl TabOpener for RecordingOpener {
    fn open(&self, url: &str, focused: bool) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((url.to_string(), focused));
        }
    }
}
