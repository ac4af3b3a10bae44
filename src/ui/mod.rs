//! User interface rendering module
//!
//! - `dialogs` - rename/search prompts, delete confirmation, engine form
//!
//! The main screen is a single list of folders with their engines, a status
//! line and a navigation bar.

mod dialogs;

use crate::app::{App, AppMode, Row, rows};
use crate::components::help_overlay::HelpOverlay;
use crate::store::Store;
use crate::theme::Styles;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

/// Render the whole screen
pub fn render<S: Store>(f: &mut Frame, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_title(f, chunks[0], app);
    render_folders(f, chunks[1], app);
    render_status(f, chunks[2], app);
    render_nav_bar(f, chunks[3], app);

    match app.state().mode {
        AppMode::Rename => dialogs::render_prompt(f, "Rename folder", &app.state().input),
        AppMode::Search => {
            let title = app
                .state()
                .target
                .and_then(|id| app.view().state().folder(id))
                .map(|folder| format!("Search {}", folder.label()))
                .unwrap_or_else(|| "Search".to_string());
            dialogs::render_prompt(f, &title, &app.state().input);
        }
        AppMode::ConfirmDelete => {
            let name = app
                .state()
                .target
                .and_then(|id| app.view().state().folder(id))
                .map(|folder| folder.name.clone())
                .unwrap_or_default();
            dialogs::render_confirm_delete(f, &name);
        }
        AppMode::EngineForm => {
            if let Some(form) = &app.state().form {
                dialogs::render_engine_form(f, form, &app.view().state().folders);
            }
        }
        AppMode::Help => {
            let mode = app.state().pre_help_mode.clone().unwrap_or(AppMode::Browse);
            let area = f.area();
            HelpOverlay::new(&mode, app.keys()).render(f, area);
        }
        AppMode::Browse => {}
    }
}

fn render_title<S: Store>(f: &mut Frame, area: Rect, app: &App<S>) {
    let active = app
        .view()
        .state()
        .active_folder()
        .map(|folder| folder.name.clone())
        .unwrap_or_else(|| "none".to_string());
    let title = Paragraph::new(Line::from(vec![
        Span::styled("SearchCenter", Styles::title()),
        Span::styled("   active folder: ", Styles::text_muted()),
        Span::styled(active, Styles::warning()),
    ]))
    .block(Block::default().borders(Borders::ALL).border_style(Styles::border_active()));
    f.render_widget(title, area);
}

fn render_folders<S: Store>(f: &mut Frame, area: Rect, app: &App<S>) {
    let cards = app.view().cards();
    let drag = app.view().drag();

    let items: Vec<ListItem> = rows(&cards)
        .into_iter()
        .filter_map(|row| match row {
            Row::Folder(id) => cards.iter().find(|c| c.id == id).map(|card| {
                let marker = if card.active { "* " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Styles::warning()),
                    Span::styled(card.name.clone(), Styles::folder()),
                    Span::styled(format!(" ({})", card.engines.len()), Styles::text_muted()),
                ]))
            }),
            Row::Engine(id, index) => cards
                .iter()
                .find(|c| c.id == id)
                .and_then(|card| card.engines.get(index))
                .map(|engine| {
                    let dragging = drag.is_some_and(|d| d.engine == engine.id);
                    let name_style = if dragging { Styles::dragging() } else { Styles::text() };
                    ListItem::new(Line::from(vec![
                        Span::raw("      "),
                        Span::styled(engine.name.clone(), name_style),
                        Span::styled(format!("  {}", engine.url), Styles::text_muted()),
                    ]))
                }),
        })
        .collect();

    let empty = items.is_empty();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Folders"))
        .highlight_style(Styles::selected());

    if empty {
        let hint = Paragraph::new("No folders yet - press n to create one")
            .style(Styles::text_secondary())
            .block(Block::default().borders(Borders::ALL).title("Folders"));
        f.render_widget(hint, area);
        return;
    }

    let mut list_state = ListState::default();
    list_state.select(Some(app.state().cursor));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_status<S: Store>(f: &mut Frame, area: Rect, app: &App<S>) {
    let state = app.state();
    let style = match (state.status_is_error, state.status_is_warning) {
        (true, true) => Styles::warning(),
        (true, false) => Styles::error(),
        (false, _) => Styles::success(),
    };
    f.render_widget(Paragraph::new(state.status_message.as_str()).style(style), area);
}

fn render_nav_bar<S: Store>(f: &mut Frame, area: Rect, app: &App<S>) {
    let mut spans = Vec::new();
    for item in app.keys().get_nav_items(&app.state().mode) {
        spans.push(Span::styled(format!(" {} ", item.key_display), Styles::key_hint()));
        spans.push(Span::styled(format!("{} ", item.action_label), Styles::text_muted()));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Centered rectangle of the given size, clipped to `area`
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
