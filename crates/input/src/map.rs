//! Key mapping from terminal events to view actions.

use crate::types::ViewAction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Map keyboard input to view actions.
pub fn handle_key_event(key: KeyEvent) -> Option<ViewAction> {
    match key.code {
        // Cursor
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('a') => Some(ViewAction::CursorLeft),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('d') => Some(ViewAction::CursorRight),
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('w') => Some(ViewAction::CursorUp),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('s') => Some(ViewAction::CursorDown),

        // Column height at the cursor
        KeyCode::Char('+') | KeyCode::Char('=') => Some(ViewAction::Raise),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(ViewAction::Lower),

        // View
        KeyCode::Char('e') | KeyCode::Char('E') => Some(ViewAction::RotateCw),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(ViewAction::RotateCcw),

        // Overlays
        KeyCode::Char('1') => Some(ViewAction::ToggleZTint),
        KeyCode::Char('2') => Some(ViewAction::ToggleXray),

        KeyCode::Char('0') => Some(ViewAction::Reload),

        _ => None,
    }
}

/// Check if key should quit the viewer.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn test_cursor_keys() {
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Left)),
            Some(ViewAction::CursorLeft)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('j'))),
            Some(ViewAction::CursorDown)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('w'))),
            Some(ViewAction::CursorUp)
        );
    }

    #[test]
    fn test_view_keys() {
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('E'))),
            Some(ViewAction::RotateCw)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('r'))),
            Some(ViewAction::RotateCcw)
        );
        assert_eq!(
            handle_key_event(KeyEvent::from(KeyCode::Char('2'))),
            Some(ViewAction::ToggleXray)
        );
        assert_eq!(handle_key_event(KeyEvent::from(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_quit_keys() {
        assert!(should_quit(KeyEvent::from(KeyCode::Char('q'))));
        assert!(should_quit(KeyEvent::from(KeyCode::Esc)));
        assert!(should_quit(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!should_quit(KeyEvent::from(KeyCode::Char('c'))));
    }
}
