//! Dialog rendering: text prompts, delete confirmation and the engine form

use super::centered_rect;
use crate::app::{FormField, FormState};
use crate::theme::Styles;
use crate::types::Folder;
use ratatui::{
    Frame,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Single-line text prompt
pub fn render_prompt(f: &mut Frame, title: &str, input: &str) {
    let area = centered_rect(60, 3, f.area());
    f.render_widget(Clear, area);
    let prompt = Paragraph::new(Line::from(vec![
        Span::styled(input.to_string(), Styles::text()),
        Span::styled("_", Styles::warning()),
    ]))
    .style(Styles::panel_bg())
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(Styles::border_active()),
    );
    f.render_widget(prompt, area);
}

/// y/n confirmation before deleting a folder
pub fn render_confirm_delete(f: &mut Frame, folder_name: &str) {
    let area = centered_rect(50, 5, f.area());
    f.render_widget(Clear, area);
    let text = vec![
        Line::from(Span::styled(
            format!("Delete folder \"{folder_name}\" and its engines?"),
            Styles::text(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" y ", Styles::key_hint()),
            Span::styled("delete   ", Styles::text_muted()),
            Span::styled(" n ", Styles::key_hint()),
            Span::styled("keep", Styles::text_muted()),
        ]),
    ];
    let dialog = Paragraph::new(text)
        .style(Styles::panel_bg_danger())
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Delete this folder?")
                .border_style(Styles::error()),
        );
    f.render_widget(dialog, area);
}

/// Add-engine form with text fields and folder toggles
pub fn render_engine_form(f: &mut Frame, state: &FormState, folders: &[Folder]) {
    let height = (folders.len() as u16).saturating_add(9);
    let area = centered_rect(70, height, f.area());
    f.render_widget(Clear, area);

    let field_line = |field: FormField, value: &str| {
        let focused = state.field == field;
        let label_style = if focused { Styles::key_hint() } else { Styles::text_muted() };
        let mut spans = vec![
            Span::styled(format!("{:<6} ", field.label()), label_style),
            Span::styled(value.to_string(), Styles::text()),
        ];
        if focused {
            spans.push(Span::styled("_", Styles::warning()));
        }
        Line::from(spans)
    };

    let mut lines = vec![
        field_line(FormField::Name, &state.form.name),
        field_line(FormField::Url, &state.form.url),
        field_line(FormField::Icon, &state.form.icon),
        Line::from(Span::styled(
            "Use 'searchcenter' in the URL where the query goes",
            Styles::text_muted(),
        )),
        Line::from(""),
        field_line(FormField::Folders, ""),
    ];

    let on_folders = state.field == FormField::Folders;
    for (idx, folder) in folders.iter().enumerate() {
        let checked = if state.form.is_selected(folder.id) { "[x]" } else { "[ ]" };
        let style = if on_folders && idx == state.folder_cursor {
            Styles::selected()
        } else {
            Styles::text()
        };
        lines.push(Line::from(Span::styled(
            format!("  {checked} {}", folder.name),
            style,
        )));
    }

    let form = Paragraph::new(lines).style(Styles::panel_bg()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Add search engine")
            .border_style(Styles::border_active()),
    );
    f.render_widget(form, area);
}
