use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::FolderId;

/// SearchCenter - open one query in a whole folder of search engines
#[derive(Parser, Debug)]
#[command(name = "searchcenter")]
#[command(about = "Organize search engines into folders and search them all at once")]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to $SEARCHCENTER_CONFIG or the XDG config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store document to use instead of the configured one
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Dry-run mode: print the URLs that would be opened instead of opening them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage folders
    Folders {
        #[command(subcommand)]
        action: FolderCommands,
    },
    /// Manage search engines
    Engines {
        #[command(subcommand)]
        action: EngineCommands,
    },
    /// Search a folder (the active one unless --folder is given)
    Search {
        /// Search terms
        #[arg(required = true)]
        query: Vec<String>,
        /// Folder to search; also becomes the active folder
        #[arg(short, long)]
        folder: Option<FolderId>,
    },
    /// Simulate the context menu: search the selected text in the active folder
    ContextMenu {
        /// Selected text
        selection: String,
    },
    /// Open the interactive folder manager
    Manage,
    /// Settings file tools
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum FolderCommands {
    /// List folders with their engine counts
    List,
    /// Create a folder with the next free default name
    Create,
    /// Rename a folder
    Rename {
        id: FolderId,
        name: String,
    },
    /// Delete a folder and its engines
    Delete {
        id: FolderId,
        /// Confirm deletion
        #[arg(short, long)]
        yes: bool,
    },
    /// Make a folder the active one
    Activate {
        id: FolderId,
    },
}

#[derive(Subcommand, Debug)]
pub enum EngineCommands {
    /// List engines, optionally of a single folder
    List {
        folder: Option<FolderId>,
    },
    /// Add an engine to one or more folders
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// URL template, `searchcenter` marks the query
        #[arg(short, long)]
        url: String,
        /// Icon URL (optional)
        #[arg(short, long, default_value = "")]
        icon: String,
        /// Target folder ids (repeatable)
        #[arg(short, long = "folder")]
        folders: Vec<FolderId>,
    },
    /// Delete the engine at INDEX in FOLDER
    Delete {
        folder: FolderId,
        index: usize,
    },
    /// Move the engine at INDEX in FOLDER to the end of TARGET
    Move {
        folder: FolderId,
        index: usize,
        target: FolderId,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective settings
    Show,
    /// Write a settings file with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Validate the settings file
    Validate,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
