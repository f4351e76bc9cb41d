//! Key bindings: arrows or vim keys for the cursor, Space/Enter to pick cells.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    /// Pick the cell under the cursor (first or second cell of a swap).
    Select,
    Cancel,
    Hint,
    Restart,
    Pause,
    Quit,
    None,
}

/// Map key event to an action. Shift is tolerated so `?` works on every layout.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        KeyCode::Esc => Action::Cancel,
        KeyCode::Char('?') => Action::Hint,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('q' | 'Q') => Action::Quit,
        _ => Action::None,
    }
}
