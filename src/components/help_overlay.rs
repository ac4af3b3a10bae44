//! Help overlay component
//!
//! Displays the key reference for a mode in a centered window.

use super::keybindings::{HelpSection, KeybindingContext};
use crate::app::AppMode;
use crate::theme::Styles;
use crate::ui::centered_rect;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Help overlay component
pub struct HelpOverlay {
    content: Vec<Line<'static>>,
}

impl HelpOverlay {
    /// Create a new help overlay for the given mode
    pub fn new(mode: &AppMode, keybinding_ctx: &KeybindingContext) -> Self {
        let sections = keybinding_ctx.get_help_content(mode);
        Self {
            content: Self::build_content(&sections),
        }
    }

    /// Build the help content from sections
    fn build_content(sections: &[HelpSection]) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = Vec::new();

        for section in sections {
            lines.push(Line::from(Span::styled(
                format!("  {}  ", section.title),
                Styles::success(),
            )));
            for (key, description) in &section.items {
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(format!("{:<10}", key), Styles::key_hint()),
                    Span::styled(description.clone(), Styles::text()),
                ]));
            }
            lines.push(Line::from(""));
        }

        lines.push(Line::from(Span::styled(
            "Press ? or Esc to close",
            Styles::text_muted(),
        )));
        lines
    }

    /// Number of lines the overlay needs
    pub fn height(&self) -> u16 {
        u16::try_from(self.content.len()).unwrap_or(u16::MAX).saturating_add(2)
    }

    /// Render the help overlay
    pub fn render(&self, f: &mut Frame, parent: Rect) {
        let area = centered_rect(50, self.height(), parent);
        f.render_widget(Clear, area);
        let help = Paragraph::new(self.content.clone())
            .style(Styles::panel_bg())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help")
                    .border_style(Styles::border_active()),
            );
        f.render_widget(help, area);
    }
}
