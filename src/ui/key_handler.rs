//! Maps key presses to dashboard actions.
//!
//! Deciding is separated from executing so the mapping can be tested without
//! a terminal or a running refresh loop.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Action for the app loop to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// No action needed
    None,
    /// Request a manual refresh
    Refresh,
    /// Exit the dashboard
    Quit,
    /// Show or hide the help popup
    ToggleHelp,
    /// Dismiss the help popup
    CloseHelp,
}

/// Resolve a key event given whether the help popup is visible
pub fn resolve_key(key: KeyEvent, show_help: bool) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::None;
    }

    // Ctrl+C always quits, even with the popup open
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
    {
        return KeyAction::Quit;
    }

    if show_help {
        return KeyAction::CloseHelp;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Refresh,
        KeyCode::Char('?') => KeyAction::ToggleHelp,
        _ => KeyAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_refresh_keys() {
        assert_eq!(resolve_key(key(KeyCode::Char('r')), false), KeyAction::Refresh);
        assert_eq!(
            resolve_key(
                KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT),
                false
            ),
            KeyAction::Refresh
        );
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(resolve_key(key(KeyCode::Char('q')), false), KeyAction::Quit);
        assert_eq!(resolve_key(key(KeyCode::Esc), false), KeyAction::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(resolve_key(ctrl_c, false), KeyAction::Quit);
        assert_eq!(resolve_key(ctrl_c, true), KeyAction::Quit);
    }

    #[test]
    fn test_help_popup() {
        assert_eq!(resolve_key(key(KeyCode::Char('?')), false), KeyAction::ToggleHelp);
        // Any key closes the popup, including ones that would otherwise act
        assert_eq!(resolve_key(key(KeyCode::Char('q')), true), KeyAction::CloseHelp);
        assert_eq!(resolve_key(key(KeyCode::Char('r')), true), KeyAction::CloseHelp);
    }

    #[test]
    fn test_unbound_and_release() {
        assert_eq!(resolve_key(key(KeyCode::Char('x')), false), KeyAction::None);
        let mut release = key(KeyCode::Char('r'));
        release.kind = KeyEventKind::Release;
        assert_eq!(resolve_key(release, false), KeyAction::None);
    }
}
