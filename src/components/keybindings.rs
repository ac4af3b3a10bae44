//! Keybinding system for context-aware keyboard shortcuts
//!
//! Provides a registry of keybindings that change based on the current application mode.

use crate::app::AppMode;
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

/// Actions that can be triggered by keybindings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyAction {
    NavigateUp,
    NavigateDown,
    /// Activate folder, or drop the dragged engine on it
    Select,
    NewFolder,
    Rename,
    DeleteFolder,
    AddEngine,
    DeleteEngine,
    PickUp,
    Search,
    Reload,
    NextField,
    Toggle,
    Confirm,
    Cancel,
    Quit,
    Help,
    Dismiss,
}

/// A keybinding definition
#[derive(Debug, Clone)]
pub struct Keybinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub action: KeyAction,
    pub display: String,
    pub description: String,
}

impl Keybinding {
    /// Create a new keybinding with no modifiers
    pub fn new(key: KeyCode, action: KeyAction, display: &str, description: &str) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::NONE,
            action,
            display: display.to_string(),
            description: description.to_string(),
        }
    }

    /// Create a keybinding with modifiers
    pub fn with_modifiers(
        key: KeyCode,
        modifiers: KeyModifiers,
        action: KeyAction,
        display: &str,
        description: &str,
    ) -> Self {
        Self {
            key,
            modifiers,
            action,
            display: display.to_string(),
            description: description.to_string(),
        }
    }

    fn matches(&self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        // SHIFT is implied by upper-case characters, so only compare the rest
        let relevant = modifiers.difference(KeyModifiers::SHIFT);
        self.key == key && self.modifiers == relevant
    }
}

/// Context-aware keybinding registry
pub struct KeybindingContext {
    /// Mode-specific keybindings
    mode_bindings: HashMap<AppMode, Vec<Keybinding>>,
    /// Bindings available while browsing and in the help overlay
    global_bindings: Vec<Keybinding>,
}

impl Default for KeybindingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl KeybindingContext {
    /// Create a new keybinding context with default bindings
    pub fn new() -> Self {
        let mut ctx = Self {
            mode_bindings: HashMap::new(),
            global_bindings: Vec::new(),
        };
        ctx.register_defaults();
        ctx
    }

    /// Register default keybindings for all modes
    fn register_defaults(&mut self) {
        self.global_bindings = vec![
            Keybinding::new(KeyCode::Char('?'), KeyAction::Help, "?", "Help"),
            Keybinding::new(KeyCode::Char('q'), KeyAction::Quit, "Q", "Quit"),
            Keybinding::with_modifiers(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL,
                KeyAction::Quit,
                "Ctrl+C",
                "Quit",
            ),
        ];

        self.mode_bindings.insert(
            AppMode::Browse,
            vec![
                Keybinding::new(KeyCode::Up, KeyAction::NavigateUp, "Up", "Navigate up"),
                Keybinding::new(KeyCode::Down, KeyAction::NavigateDown, "Down", "Navigate down"),
                Keybinding::new(KeyCode::Enter, KeyAction::Select, "Enter", "Activate / drop"),
                Keybinding::new(KeyCode::Char('n'), KeyAction::NewFolder, "N", "New folder"),
                Keybinding::new(KeyCode::Char('r'), KeyAction::Rename, "R", "Rename folder"),
                Keybinding::new(KeyCode::Char('d'), KeyAction::DeleteFolder, "D", "Delete folder"),
                Keybinding::new(KeyCode::Char('a'), KeyAction::AddEngine, "A", "Add engine"),
                Keybinding::new(KeyCode::Char('x'), KeyAction::DeleteEngine, "X", "Delete engine"),
                Keybinding::new(KeyCode::Char('m'), KeyAction::PickUp, "M", "Move engine"),
                Keybinding::new(KeyCode::Char('s'), KeyAction::Search, "S", "Search folder"),
                Keybinding::new(KeyCode::Char('R'), KeyAction::Reload, "Shift+R", "Reload"),
                Keybinding::new(KeyCode::Esc, KeyAction::Cancel, "Esc", "Cancel move"),
            ],
        );

        let prompt_bindings = vec![
            Keybinding::new(KeyCode::Enter, KeyAction::Confirm, "Enter", "Confirm"),
            Keybinding::new(KeyCode::Esc, KeyAction::Cancel, "Esc", "Cancel"),
        ];
        self.mode_bindings
            .insert(AppMode::Rename, prompt_bindings.clone());
        self.mode_bindings
            .insert(AppMode::Search, prompt_bindings);

        self.mode_bindings.insert(
            AppMode::ConfirmDelete,
            vec![
                Keybinding::new(KeyCode::Char('y'), KeyAction::Confirm, "Y", "Delete"),
                Keybinding::new(KeyCode::Char('n'), KeyAction::Cancel, "N", "Keep"),
                Keybinding::new(KeyCode::Esc, KeyAction::Cancel, "Esc", "Keep"),
            ],
        );

        self.mode_bindings.insert(
            AppMode::EngineForm,
            vec![
                Keybinding::new(KeyCode::Tab, KeyAction::NextField, "Tab", "Next field"),
                Keybinding::new(KeyCode::Up, KeyAction::NavigateUp, "Up", "Previous folder"),
                Keybinding::new(KeyCode::Down, KeyAction::NavigateDown, "Down", "Next folder"),
                Keybinding::new(KeyCode::Char(' '), KeyAction::Toggle, "Space", "Toggle folder"),
                Keybinding::new(KeyCode::Enter, KeyAction::Confirm, "Enter", "Save engine"),
                Keybinding::new(KeyCode::Esc, KeyAction::Cancel, "Esc", "Cancel"),
            ],
        );

        self.mode_bindings.insert(
            AppMode::Help,
            vec![
                Keybinding::new(KeyCode::Esc, KeyAction::Dismiss, "Esc", "Close"),
                Keybinding::new(KeyCode::Enter, KeyAction::Dismiss, "Enter", "Close"),
            ],
        );
    }

    /// Whether typed characters go to a text buffer in this mode
    pub fn is_text_mode(mode: &AppMode) -> bool {
        matches!(mode, AppMode::Rename | AppMode::Search | AppMode::EngineForm)
    }

    /// Get keybindings for a specific mode (includes global bindings)
    pub fn get_bindings(&self, mode: &AppMode) -> Vec<&Keybinding> {
        let mut bindings: Vec<&Keybinding> = Vec::new();

        if let Some(mode_bindings) = self.mode_bindings.get(mode) {
            bindings.extend(mode_bindings.iter());
        }

        if matches!(mode, AppMode::Browse | AppMode::Help) {
            bindings.extend(self.global_bindings.iter());
        }

        bindings
    }

    /// Resolve a key press to an action in the given mode
    pub fn action_for(
        &self,
        mode: &AppMode,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Option<KeyAction> {
        self.get_bindings(mode)
            .into_iter()
            .find(|b| b.matches(key, modifiers))
            .map(|b| b.action.clone())
    }

    /// Get navigation bar items for display
    pub fn get_nav_items(&self, mode: &AppMode) -> Vec<NavBarItem> {
        let bindings = self.get_bindings(mode);

        let priority_actions = match mode {
            AppMode::Browse => vec![
                KeyAction::NavigateUp,
                KeyAction::NewFolder,
                KeyAction::AddEngine,
                KeyAction::PickUp,
                KeyAction::Search,
                KeyAction::Help,
                KeyAction::Quit,
            ],
            AppMode::Rename | AppMode::Search => vec![KeyAction::Confirm, KeyAction::Cancel],
            AppMode::ConfirmDelete => vec![KeyAction::Confirm, KeyAction::Cancel],
            AppMode::EngineForm => vec![
                KeyAction::NextField,
                KeyAction::Toggle,
                KeyAction::Confirm,
                KeyAction::Cancel,
            ],
            AppMode::Help => vec![KeyAction::Dismiss],
        };

        let mut items: Vec<NavBarItem> = Vec::new();
        for action in priority_actions {
            if action == KeyAction::NavigateUp {
                items.push(NavBarItem {
                    key_display: "Up/Dn".to_string(),
                    action_label: "Navigate".to_string(),
                });
                continue;
            }
            if let Some(binding) = bindings.iter().find(|b| b.action == action) {
                items.push(NavBarItem {
                    key_display: binding.display.clone(),
                    action_label: binding.description.clone(),
                });
            }
        }

        items
    }

    /// Get full help content for a mode (for help overlay)
    pub fn get_help_content(&self, mode: &AppMode) -> Vec<HelpSection> {
        let mut sections = Vec::new();

        let folder_actions = [
            KeyAction::NavigateUp,
            KeyAction::NavigateDown,
            KeyAction::Select,
            KeyAction::NewFolder,
            KeyAction::Rename,
            KeyAction::DeleteFolder,
            KeyAction::Search,
        ];
        let engine_actions = [
            KeyAction::AddEngine,
            KeyAction::DeleteEngine,
            KeyAction::PickUp,
            KeyAction::Cancel,
        ];

        for (title, actions) in [
            ("Folders", &folder_actions[..]),
            ("Engines", &engine_actions[..]),
            ("General", &[KeyAction::Reload, KeyAction::Help, KeyAction::Quit][..]),
        ] {
            let items: Vec<(String, String)> = self
                .get_bindings(mode)
                .into_iter()
                .filter(|b| actions.contains(&b.action))
                .map(|b| (b.display.clone(), b.description.clone()))
                .collect();
            if !items.is_empty() {
                sections.push(HelpSection {
                    title: title.to_string(),
                    items,
                });
            }
        }

        sections
    }
}

/// Navigation bar item for display
#[derive(Debug, Clone)]
pub struct NavBarItem {
    pub key_display: String,
    pub action_label: String,
}

/// Help section for the help overlay
#[derive(Debug, Clone)]
pub struct HelpSection {
    pub title: String,
    pub items: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_keys_resolve() {
        let ctx = KeybindingContext::new();
        assert_eq!(
            ctx.action_for(&AppMode::Browse, KeyCode::Char('n'), KeyModifiers::NONE),
            Some(KeyAction::NewFolder)
        );
        assert_eq!(
            ctx.action_for(&AppMode::Browse, KeyCode::Char('R'), KeyModifiers::SHIFT),
            Some(KeyAction::Reload)
        );
        assert_eq!(
            ctx.action_for(&AppMode::Browse, KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(KeyAction::Quit)
        );
    }

    #[test]
    fn test_prompt_modes_have_no_quit() {
        let ctx = KeybindingContext::new();
        assert_eq!(
            ctx.action_for(&AppMode::Rename, KeyCode::Char('q'), KeyModifiers::NONE),
            None
        );
        assert!(KeybindingContext::is_text_mode(&AppMode::Search));
    }

    #[test]
    fn test_help_content_has_sections() {
        let ctx = KeybindingContext::new();
        let sections = ctx.get_help_content(&AppMode::Browse);
        assert_eq!(sections.len(), 3);
        assert!(sections[1].items.iter().any(|(_, d)| d == "Move engine"));
    }

    #[test]
    fn test_nav_items_for_form() {
        let ctx = KeybindingContext::new();
        let items = ctx.get_nav_items(&AppMode::EngineForm);
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].key_display, "Tab");
    }
}
