//! Terminal manager application
//!
//! Owns a [`ManagerView`] for its whole session and maps key presses onto
//! its gestures. Key handling is independent of the terminal so it can be
//! driven directly in tests.

mod state;

pub use state::{AppMode, AppState, FormField, FormState, Row, rows};

use crate::components::keybindings::{KeyAction, KeybindingContext};
use crate::dispatcher::{TabOpener, dispatch};
use crate::error::{Result, SearchCenterError, UserError};
use crate::store::Store;
use crate::types::FolderId;
use crate::ui;
use crate::views::ManagerView;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::Backend};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// How often the store is checked for changes made by other surfaces
const STALE_CHECK_INTERVAL: Duration = Duration::from_secs(2);

/// Terminal manager
pub struct App<S> {
    view: ManagerView<S>,
    state: AppState,
    keys: KeybindingContext,
    opener: Box<dyn TabOpener>,
}

impl<S: Store> App<S> {
    pub fn new(view: ManagerView<S>, opener: Box<dyn TabOpener>) -> Self {
        Self {
            view,
            state: AppState::default(),
            keys: KeybindingContext::new(),
            opener,
        }
    }

    pub fn view(&self) -> &ManagerView<S> {
        &self.view
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn keys(&self) -> &KeybindingContext {
        &self.keys
    }

    /// Run the main loop until the user quits
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        info!("Starting manager loop");
        let mut last_check = Instant::now();

        loop {
            terminal
                .draw(|f| ui::render(f, self))
                .map_err(|e| SearchCenterError::terminal(format!("Failed to draw: {}", e)))?;

            if crossterm::event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = crossterm::event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key_event(key)? {
                        break;
                    }
                }
            }

            if last_check.elapsed() >= STALE_CHECK_INTERVAL {
                last_check = Instant::now();
                self.check_stale();
            }
        }

        info!("Manager loop finished");
        Ok(())
    }

    fn check_stale(&mut self) {
        match self.view.is_stale() {
            Ok(true) if !self.state.stale => {
                self.state.stale = true;
                self.state
                    .error("Folders changed elsewhere - press Shift+R to reload");
            }
            Ok(_) => {}
            Err(e) => debug!("Staleness check failed: {}", e),
        }
    }

    /// Handle one key press. Returns true when the app should exit.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<bool> {
        let mode = self.state.mode.clone();
        let action = self.keys.action_for(&mode, key.code, key.modifiers);
        debug!("Key {:?} in {:?} -> {:?}", key.code, mode, action);

        match mode {
            AppMode::Browse => return Ok(self.handle_browse(action)),
            AppMode::Help => {
                if matches!(action, Some(KeyAction::Dismiss | KeyAction::Help)) {
                    self.state.mode = self.state.pre_help_mode.take().unwrap_or(AppMode::Browse);
                } else if action == Some(KeyAction::Quit) {
                    return Ok(true);
                }
            }
            AppMode::Rename | AppMode::Search => match action {
                Some(KeyAction::Confirm) => self.confirm_prompt(&mode),
                Some(KeyAction::Cancel) => self.state.reset_to_browse(),
                _ => edit_text(&mut self.state.input, key),
            },
            AppMode::ConfirmDelete => match action {
                Some(KeyAction::Confirm) => self.confirm_delete(),
                Some(KeyAction::Cancel) => {
                    self.state.reset_to_browse();
                    self.state.info("Folder kept");
                }
                _ => {}
            },
            AppMode::EngineForm => self.handle_form(action, key),
        }
        Ok(false)
    }

    fn handle_browse(&mut self, action: Option<KeyAction>) -> bool {
        let Some(action) = action else {
            return false;
        };
        let row = self.current_row();
        match action {
            KeyAction::Quit => return true,
            KeyAction::NavigateUp => self.state.cursor = self.state.cursor.saturating_sub(1),
            KeyAction::NavigateDown => {
                let last = self.row_count().saturating_sub(1);
                self.state.cursor = (self.state.cursor + 1).min(last);
            }
            KeyAction::Select => self.select(row),
            KeyAction::NewFolder => {
                let created = self.view.create_folder();
                if let Some(id) = self.report(created) {
                    let name = self.folder_name(id);
                    self.state.info(format!("Created {name}"));
                    self.focus_folder(id);
                }
            }
            KeyAction::Rename => {
                if let Some(row) = row {
                    self.state.input = self.folder_name(row.folder());
                    self.state.target = Some(row.folder());
                    self.state.mode = AppMode::Rename;
                }
            }
            KeyAction::DeleteFolder => {
                if let Some(row) = row {
                    self.state.target = Some(row.folder());
                    self.state.mode = AppMode::ConfirmDelete;
                }
            }
            KeyAction::AddEngine => match self.view.engine_form() {
                Ok(form) => {
                    self.state.form = Some(FormState {
                        form,
                        ..FormState::default()
                    });
                    self.state.mode = AppMode::EngineForm;
                }
                Err(e) => self.state.user_error(&e),
            },
            KeyAction::DeleteEngine => match row {
                Some(Row::Engine(folder, index)) => {
                    let removed = self.view.delete_engine(folder, index);
                    if let Some(Some(engine)) = self.report(removed) {
                        self.state.info(format!("Deleted {}", engine.name));
                    }
                    self.clamp_cursor();
                }
                _ => self.state.error("Select an engine first"),
            },
            KeyAction::PickUp => {
                let picked = match row {
                    Some(Row::Engine(folder, index)) => self.view.begin_drag(folder, index),
                    _ => false,
                };
                if picked {
                    self.state
                        .info("Moving engine - select a folder and press Enter (Esc cancels)");
                } else {
                    self.state.error("Select an engine first");
                }
            }
            KeyAction::Search => {
                if let Some(row) = row {
                    self.state.target = Some(row.folder());
                    self.state.input.clear();
                    self.state.mode = AppMode::Search;
                }
            }
            KeyAction::Reload => {
                let reloaded = self.view.reload();
                if self.report(reloaded.map_err(Into::into)).is_some() {
                    self.state.stale = false;
                    self.state.info("Reloaded from store");
                    self.clamp_cursor();
                }
            }
            KeyAction::Cancel => {
                if self.view.drag().is_some() {
                    self.view.cancel_drag();
                    self.state.info("Move cancelled");
                }
            }
            KeyAction::Help => {
                self.state.pre_help_mode = Some(AppMode::Browse);
                self.state.mode = AppMode::Help;
            }
            _ => {}
        }
        false
    }

    /// Enter on a row: drop a dragged engine there, or make the folder active
    fn select(&mut self, row: Option<Row>) {
        let Some(row) = row else {
            return;
        };
        let folder = row.folder();
        if self.view.drag().is_some() {
            let dropped = self.view.drop_on(folder);
            let name = self.folder_name(folder);
            match self.report(dropped) {
                Some(true) => self.state.info(format!("Moved to {name}")),
                Some(false) => self.state.error("Engine no longer exists"),
                None => {}
            }
            self.clamp_cursor();
        } else {
            let activated = self.view.set_active_folder(folder);
            if self.report(activated).is_some() {
                let name = self.folder_name(folder);
                self.state.info(format!("Active folder: {name}"));
            }
        }
    }

    fn confirm_prompt(&mut self, mode: &AppMode) {
        let Some(target) = self.state.target else {
            self.state.reset_to_browse();
            return;
        };
        let input = std::mem::take(&mut self.state.input);
        match mode {
            AppMode::Rename => {
                let renamed = self.view.rename_folder(target, &input);
                if self.report(renamed).is_some() {
                    self.state.info(format!("Renamed to {input}"));
                }
                self.state.reset_to_browse();
            }
            AppMode::Search => {
                let query = input.trim();
                if query.is_empty() {
                    self.state.user_error(&UserError::MissingQuery);
                    return;
                }
                let activated = self.view.set_active_folder(target);
                if self.report(activated).is_none() {
                    return;
                }
                match dispatch(self.view.state().folder(target), query, self.opener.as_ref()) {
                    Ok(report) => self
                        .state
                        .info(format!("Opened {} tab(s) for {query}", report.urls.len())),
                    Err(e) => self.state.user_error(&e),
                }
                self.state.reset_to_browse();
            }
            _ => self.state.reset_to_browse(),
        }
    }

    fn confirm_delete(&mut self) {
        if let Some(target) = self.state.target {
            let name = self.folder_name(target);
            let deleted = self.view.delete_folder(target);
            if let Some(true) = self.report(deleted) {
                self.state.info(format!("Deleted {name}"));
            }
        }
        self.state.reset_to_browse();
        self.clamp_cursor();
    }

    fn handle_form(&mut self, action: Option<KeyAction>, key: KeyEvent) {
        let folder_ids: Vec<FolderId> = self.view.state().folders.iter().map(|f| f.id).collect();
        let Some(form) = self.state.form.as_mut() else {
            self.state.reset_to_browse();
            return;
        };
        let on_folders = form.field == FormField::Folders;

        match action {
            Some(KeyAction::NextField) => form.field = form.field.next(),
            Some(KeyAction::Cancel) => {
                self.state.reset_to_browse();
                return;
            }
            Some(KeyAction::Confirm) => {
                let form = form.form.clone();
                let saved = self.view.save_engine(&form);
                match saved {
                    Ok(added) => {
                        self.state.reset_to_browse();
                        self.state
                            .info(format!("Added {} to {} folder(s)", form.name.trim(), added));
                    }
                    Err(e) => self.fail(&e),
                }
                return;
            }
            Some(KeyAction::NavigateUp) if on_folders => {
                form.folder_cursor = form.folder_cursor.saturating_sub(1);
            }
            Some(KeyAction::NavigateDown) if on_folders => {
                let last = folder_ids.len().saturating_sub(1);
                form.folder_cursor = (form.folder_cursor + 1).min(last);
            }
            Some(KeyAction::Toggle) if on_folders => {
                if let Some(id) = folder_ids.get(form.folder_cursor) {
                    form.form.toggle(*id);
                }
            }
            _ => {
                if let Some(buffer) = form.buffer_mut() {
                    edit_text(buffer, key);
                }
            }
        }
    }

    /// Show a failed gesture in the status line instead of exiting
    fn report<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    fn fail(&mut self, e: &SearchCenterError) {
        match e.as_user() {
            Some(user) => self.state.user_error(user),
            None => self.state.error(e.to_string()),
        }
    }

    pub fn current_row(&self) -> Option<Row> {
        rows(&self.view.cards()).get(self.state.cursor).copied()
    }

    fn row_count(&self) -> usize {
        rows(&self.view.cards()).len()
    }

    fn clamp_cursor(&mut self) {
        let last = self.row_count().saturating_sub(1);
        self.state.cursor = self.state.cursor.min(last);
    }

    fn focus_folder(&mut self, id: FolderId) {
        if let Some(pos) = rows(&self.view.cards())
            .iter()
            .position(|r| *r == Row::Folder(id))
        {
            self.state.cursor = pos;
        }
    }

    fn folder_name(&self, id: FolderId) -> String {
        self.view
            .state()
            .folder(id)
            .map(|f| f.name.clone())
            .unwrap_or_default()
    }
}

/// Apply a key press to a text buffer
fn edit_text(buffer: &mut String, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => buffer.push(c),
        _ => {}
    }
}
