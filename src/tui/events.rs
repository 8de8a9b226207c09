//! Key handling for the TUI application
//!
//! Maps raw terminal key events onto form navigation and application
//! actions. Text entry into the path fields is handled by the app itself
//! for any key that maps to no action here.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Helper functions for key event processing
pub mod key_handler {
    use super::*;

    /// Check if a key event matches a specific key combination
    pub fn matches_key(event: &KeyEvent, code: KeyCode, modifiers: KeyModifiers) -> bool {
        event.code == code && event.modifiers == modifiers
    }

    /// Check if a key event is a simple key press (no modifiers)
    pub fn matches_simple_key(event: &KeyEvent, code: KeyCode) -> bool {
        matches_key(event, code, KeyModifiers::NONE)
    }

    /// Check if a key event is Ctrl+key combination
    pub fn matches_ctrl_key(event: &KeyEvent, code: KeyCode) -> bool {
        matches_key(event, code, KeyModifiers::CONTROL)
    }

    /// Check if a key event produces a printable character for text input
    pub fn text_input(event: &KeyEvent) -> Option<char> {
        match event.code {
            KeyCode::Char(c)
                if event.modifiers.is_empty() || event.modifiers == KeyModifiers::SHIFT =>
            {
                Some(c)
            }
            _ => None,
        }
    }

    /// Convert key event to navigation action between form fields
    pub fn key_to_navigation(event: &KeyEvent) -> Option<NavigationAction> {
        match (event.code, event.modifiers) {
            (KeyCode::Tab, KeyModifiers::NONE) | (KeyCode::Down, KeyModifiers::NONE) => {
                Some(NavigationAction::NextField)
            }
            (KeyCode::BackTab, _) | (KeyCode::Up, KeyModifiers::NONE) => {
                Some(NavigationAction::PreviousField)
            }
            (KeyCode::Enter, KeyModifiers::NONE) => Some(NavigationAction::Select),
            (KeyCode::Esc, _) => Some(NavigationAction::Back),
            _ => None,
        }
    }

    /// Convert key event to application action
    pub fn key_to_app_action(event: &KeyEvent) -> Option<AppAction> {
        match (event.code, event.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppAction::Quit),
            (KeyCode::Char('q'), KeyModifiers::CONTROL) => Some(AppAction::Quit),
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => Some(AppAction::StartRun),
            (KeyCode::Char('x'), KeyModifiers::CONTROL) => Some(AppAction::CancelRun),
            (KeyCode::Char('e'), KeyModifiers::CONTROL) => Some(AppAction::ToggleExclusion),
            (KeyCode::F(1), KeyModifiers::NONE) => Some(AppAction::ShowHelp),
            (KeyCode::F(5), KeyModifiers::NONE) => Some(AppAction::StartRun),
            _ => None,
        }
    }
}

/// Navigation actions within the form
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationAction {
    NextField,
    PreviousField,
    Select,
    Back,
}

/// High-level application actions
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Quit,
    StartRun,
    CancelRun,
    ToggleExclusion,
    ShowHelp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn test_key_matching() {
        let event = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(key_handler::matches_simple_key(&event, KeyCode::Char('q')));
        assert!(!key_handler::matches_simple_key(&event, KeyCode::Char('r')));

        let ctrl_event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(key_handler::matches_ctrl_key(&ctrl_event, KeyCode::Char('c')));
        assert!(!key_handler::matches_simple_key(&ctrl_event, KeyCode::Char('c')));
    }

    #[test]
    fn test_navigation_actions() {
        let tab_event = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(
            key_handler::key_to_navigation(&tab_event),
            Some(NavigationAction::NextField)
        );

        let back_tab_event = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(
            key_handler::key_to_navigation(&back_tab_event),
            Some(NavigationAction::PreviousField)
        );

        // Letters are text input, never navigation
        let k_event = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE);
        assert_eq!(key_handler::key_to_navigation(&k_event), None);
    }

    #[test]
    fn test_app_actions() {
        let quit_event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(
            key_handler::key_to_app_action(&quit_event),
            Some(AppAction::Quit)
        );

        let run_event = KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE);
        assert_eq!(
            key_handler::key_to_app_action(&run_event),
            Some(AppAction::StartRun)
        );

        // Plain 'q' must stay typeable inside a path field
        let q_event = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(key_handler::key_to_app_action(&q_event), None);
    }

    #[test]
    fn test_text_input() {
        let upper = KeyEvent::new(KeyCode::Char('Q'), KeyModifiers::SHIFT);
        assert_eq!(key_handler::text_input(&upper), Some('Q'));

        let ctrl = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(key_handler::text_input(&ctrl), None);
    }
}
