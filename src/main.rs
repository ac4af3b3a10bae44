//! SearchCenter - Main entry point
//!
//! Parses the command line, loads settings and hands off to the popup,
//! manager or trigger flow.

use anyhow::{Context, Result, bail};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::{self, OpenOptions};
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use searchcenter::app::App;
use searchcenter::cli::{Cli, Commands, ConfigCommands, EngineCommands, FolderCommands};
use searchcenter::config_file::{Settings, default_config_path};
use searchcenter::dispatcher::{PrintOpener, RecordingOpener, SystemOpener, TabOpener};
use searchcenter::error::{SearchCenterError, UserError};
use searchcenter::store::JsonFileStore;
use searchcenter::trigger::{ContextMenuTrigger, MENU_ITEM_ID, MenuRegistry, TriggerOutcome};
use searchcenter::types::FolderId;
use searchcenter::views::{ManagerView, NO_FOLDERS_PLACEHOLDER, PopupView};

/// Log file written beside the store while the terminal UI owns the screen
const LOG_FILE: &str = "searchcenter.log";

/// Initialize tracing. `RUST_LOG` overrides the configured level.
fn init_logging(level: &str, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file.and_then(open_log_file) {
        Some(file) => builder.with_writer(Mutex::new(file)).with_ansi(false).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
}

fn open_log_file(path: &Path) -> Option<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

fn main() {
    let cli = Cli::parse_args();
    if let Err(e) = run(cli) {
        let user = e
            .downcast_ref::<SearchCenterError>()
            .and_then(SearchCenterError::as_user)
            .or_else(|| e.downcast_ref::<UserError>());
        match user {
            Some(user) => eprintln!("{user}"),
            None => eprintln!("✗ {e:#}"),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut settings = Settings::load_or_default(&config_path)?;
    if let Some(store) = &cli.store {
        settings.store_path = store.clone();
    }

    let interactive = matches!(cli.command, None | Some(Commands::Manage));
    let log_file = interactive.then(|| settings.data_dir().join(LOG_FILE));
    init_logging(&settings.log_level, log_file.as_deref());
    info!("SearchCenter starting up");
    debug!("Settings from {:?}, store at {:?}", config_path, settings.store_path);

    let store = JsonFileStore::new(settings.store_path.clone());

    match cli.command {
        None | Some(Commands::Manage) => {
            // Dry-run URLs are only recorded here; printing would draw over the UI
            let opener: Box<dyn TabOpener> = if cli.dry_run {
                Box::new(RecordingOpener::new())
            } else {
                Box::new(SystemOpener::with_command(settings.opener_argv()))
            };
            run_manager(store, &settings, opener)
        }
        Some(Commands::Folders { action }) => run_folders(store, &settings, action),
        Some(Commands::Engines { action }) => run_engines(store, &settings, action),
        Some(Commands::Search { query, folder }) => {
            let opener = cli_opener(cli.dry_run, &settings);
            run_search(store, &query.join(" "), folder, opener.as_ref())
        }
        Some(Commands::ContextMenu { selection }) => {
            let opener = cli_opener(cli.dry_run, &settings);
            run_context_menu(store, &selection, opener.as_ref())
        }
        Some(Commands::Config { action }) => {
            run_config(&config_path, &settings, cli.store.as_deref(), action)
        }
    }
}

fn cli_opener(dry_run: bool, settings: &Settings) -> Box<dyn TabOpener> {
    if dry_run {
        Box::new(PrintOpener)
    } else {
        Box::new(SystemOpener::with_command(settings.opener_argv()))
    }
}

/// Run the terminal manager
fn run_manager(store: JsonFileStore, settings: &Settings, opener: Box<dyn TabOpener>) -> Result<()> {
    let view = ManagerView::open(store, settings.favicon_service.clone())?;
    let mut app = App::new(view, opener);

    debug!("Initializing terminal for manager");
    enable_raw_mode().context("Failed to enable raw mode")?;
    if let Err(e) = crossterm::execute!(stdout(), EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e).context("Failed to enter alternate screen");
    }

    let result = Terminal::new(CrosstermBackend::new(stdout()))
        .map_err(SearchCenterError::from)
        .and_then(|mut terminal| app.run(&mut terminal));

    // Always restore the terminal, even if the app failed
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(stdout(), LeaveAlternateScreen);

    result.map_err(Into::into)
}

fn open_manager(store: JsonFileStore, settings: &Settings) -> Result<ManagerView<JsonFileStore>> {
    ManagerView::open(store, settings.favicon_service.clone()).context("Failed to load store")
}

fn require_folder(view: &ManagerView<JsonFileStore>, id: FolderId) -> Result<String> {
    match view.state().folder(id) {
        Some(folder) => Ok(folder.name.clone()),
        None => bail!("Folder {id} not found"),
    }
}

fn run_folders(store: JsonFileStore, settings: &Settings, action: FolderCommands) -> Result<()> {
    let mut view = open_manager(store, settings)?;

    match action {
        FolderCommands::List => {
            let cards = view.cards();
            if cards.is_empty() {
                println!("{NO_FOLDERS_PLACEHOLDER}");
            }
            for card in cards {
                let marker = if card.active { '*' } else { ' ' };
                println!("{marker} {:<16} {} ({})", card.id, card.name, card.engines.len());
            }
        }
        FolderCommands::Create => {
            let id = view.create_folder()?;
            println!("Created {} ({id})", require_folder(&view, id)?);
        }
        FolderCommands::Rename { id, name } => {
            if !view.rename_folder(id, &name)? {
                bail!("Folder {id} not found");
            }
            println!("Renamed {id} to {}", require_folder(&view, id)?);
        }
        FolderCommands::Delete { id, yes } => {
            let name = require_folder(&view, id)?;
            if !yes {
                bail!("Deleting {name:?} removes its engines too; pass --yes to confirm");
            }
            view.delete_folder(id)?;
            println!("Deleted {name}");
        }
        FolderCommands::Activate { id } => {
            let name = require_folder(&view, id)?;
            view.set_active_folder(id)?;
            println!("Active folder: {name}");
        }
    }
    Ok(())
}

fn run_engines(store: JsonFileStore, settings: &Settings, action: EngineCommands) -> Result<()> {
    let mut view = open_manager(store, settings)?;

    match action {
        EngineCommands::List { folder } => {
            if let Some(id) = folder {
                require_folder(&view, id)?;
            }
            for card in view.cards().into_iter().filter(|c| folder.is_none_or(|id| id == c.id)) {
                println!("{} ({})", card.name, card.id);
                for engine in &card.engines {
                    println!("  {:>3}  {:<20} {}", engine.index, engine.name, engine.url);
                    println!("       icon: {}", engine.icon_src);
                }
            }
        }
        EngineCommands::Add {
            name,
            url,
            icon,
            folders,
        } => {
            let mut form = view.engine_form()?;
            form.name = name;
            form.url = url;
            form.icon = icon;
            for id in folders {
                if view.state().folder(id).is_none() {
                    warn!("Skipping unknown folder {}", id);
                    continue;
                }
                if !form.is_selected(id) {
                    form.toggle(id);
                }
            }
            let added = view.save_engine(&form)?;
            println!("Added {} to {added} folder(s)", form.name.trim());
        }
        EngineCommands::Delete { folder, index } => {
            require_folder(&view, folder)?;
            match view.delete_engine(folder, index)? {
                Some(engine) => println!("Deleted {}", engine.name),
                None => bail!("No engine at index {index} in folder {folder}"),
            }
        }
        EngineCommands::Move {
            folder,
            index,
            target,
        } => {
            require_folder(&view, folder)?;
            let target_name = require_folder(&view, target)?;
            if !view.begin_drag(folder, index) {
                bail!("No engine at index {index} in folder {folder}");
            }
            if !view.drop_on(target)? {
                bail!("Engine could not be moved to {target_name}");
            }
            println!("Moved to {target_name}");
        }
    }
    Ok(())
}

/// Popup flow: optional folder pick, then search the active folder
fn run_search(
    store: JsonFileStore,
    query: &str,
    folder: Option<FolderId>,
    opener: &dyn TabOpener,
) -> Result<()> {
    let mut popup = PopupView::open(store).context("Failed to load store")?;
    if !popup.model().search_enabled {
        bail!(NO_FOLDERS_PLACEHOLDER);
    }
    if let Some(id) = folder {
        popup.select_folder(id)?;
    }
    let report = popup.search(query, opener)?;
    eprintln!("Opened {} tab(s)", report.urls.len());
    Ok(())
}

/// Trigger flow: register the menu entry and simulate one click
fn run_context_menu(store: JsonFileStore, selection: &str, opener: &dyn TabOpener) -> Result<()> {
    let mut menus = MenuRegistry::default();
    let mut trigger = ContextMenuTrigger::new(store);
    trigger.install(&mut menus);
    for entry in &menus.entries {
        debug!("Menu entry {}: {}", entry.id, entry.title_for(selection));
    }

    match trigger.on_click(MENU_ITEM_ID, Some(selection), opener) {
        TriggerOutcome::Dispatched(report) => eprintln!("Opened {} tab(s)", report.urls.len()),
        TriggerOutcome::Skipped(reason) => eprintln!("Nothing opened: {reason}"),
        TriggerOutcome::Ignored => {}
    }
    Ok(())
}

fn run_config(
    config_path: &Path,
    settings: &Settings,
    store_override: Option<&Path>,
    action: ConfigCommands,
) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("# {}", config_path.display());
            println!("{}", serde_json::to_string_pretty(settings)?);
        }
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                bail!("{} already exists; pass --force to overwrite", config_path.display());
            }
            let mut fresh = Settings::default();
            if let Some(store) = store_override {
                fresh.store_path = PathBuf::from(store);
            }
            fresh.save_to_file(config_path)?;
            println!("✓ Wrote {}", config_path.display());
        }
        ConfigCommands::Validate => {
            if !config_path.exists() {
                println!("No settings file at {}, using defaults", config_path.display());
            }
            settings.validate()?;
            println!("✓ Settings are valid");
        }
    }
    Ok(())
}
