//! Keyboard and focus input handling for the TUI.
//!
//! # Keybindings
//!
//! | Key | Action |
//! |-----|--------|
//! | `j` / Down | Move selection down |
//! | `k` / Up | Move selection up |
//! | Tab | Cycle focus between panels |
//! | Shift+Tab | Cycle focus backwards |
//! | Enter | Open the selected interface (sidebar) |
//! | `h` / `l`, Left / Right | Switch detail tab |
//! | `m` | Manage interfaces |
//! | `?` | Help |
//! | `q` / Esc | Close popup, or exit |
//!
//! In the manage popup:
//!
//! | Key | Action |
//! |-----|--------|
//! | Space | Subscribe / clear |
//! | Enter | Pause / resume capture |
//! | `r` | Reload server interface list |
//!
//! Terminal focus events drive the visibility signal: polling pauses while
//! the terminal is unfocused.

use crate::tui::{FocusPanel, Popup, TuiApp};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Result of handling an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    /// Event was handled, continue running.
    Handled,
    /// Event was not handled (unknown key).
    NotHandled,
    /// User requested quit.
    Quit,
}

/// Handle a crossterm event.
pub fn handle_event(app: &mut TuiApp, event: Event) -> InputResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::FocusGained => {
            app.set_visible(true);
            InputResult::Handled
        }
        Event::FocusLost => {
            app.set_visible(false);
            InputResult::Handled
        }
        Event::Resize(_, _) => InputResult::Handled,
        _ => InputResult::NotHandled,
    }
}

fn handle_key(app: &mut TuiApp, key: KeyEvent) -> InputResult {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return InputResult::Quit;
    }

    match app.popup() {
        Popup::Manage => return handle_manage_keys(app, key),
        Popup::Help => {
            app.close_popup();
            return InputResult::Handled;
        }
        Popup::None => {}
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.quit();
            return InputResult::Quit;
        }
        KeyCode::Char('m') => {
            app.open_manage();
            return InputResult::Handled;
        }
        KeyCode::Char('?') => {
            app.open_help();
            return InputResult::Handled;
        }
        KeyCode::Tab => {
            app.focus_next();
            return InputResult::Handled;
        }
        KeyCode::BackTab => {
            app.focus_prev();
            return InputResult::Handled;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_down();
            return InputResult::Handled;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_up();
            return InputResult::Handled;
        }
        _ => {}
    }

    match app.focus() {
        FocusPanel::Sidebar => handle_sidebar_keys(app, key),
        FocusPanel::Detail => handle_detail_keys(app, key),
        FocusPanel::Logs => InputResult::NotHandled,
    }
}

fn handle_sidebar_keys(app: &mut TuiApp, key: KeyEvent) -> InputResult {
    match key.code {
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
            app.focus_panel(FocusPanel::Detail);
            InputResult::Handled
        }
        _ => InputResult::NotHandled,
    }
}

fn handle_detail_keys(app: &mut TuiApp, key: KeyEvent) -> InputResult {
    match key.code {
        KeyCode::Char('l') | KeyCode::Right => {
            app.next_tab();
            InputResult::Handled
        }
        KeyCode::Char('h') | KeyCode::Left => {
            app.prev_tab();
            InputResult::Handled
        }
        _ => InputResult::NotHandled,
    }
}

fn handle_manage_keys(app: &mut TuiApp, key: KeyEvent) -> InputResult {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc | KeyCode::Char('m') => app.close_popup(),
        KeyCode::Char('j') | KeyCode::Down => app.manage_down(),
        KeyCode::Char('k') | KeyCode::Up => app.manage_up(),
        KeyCode::Char(' ') => app.toggle_subscription(),
        KeyCode::Enter => app.toggle_active(),
        KeyCode::Char('r') => app.refresh_interfaces(),
        _ => return InputResult::NotHandled,
    }
    InputResult::Handled
}
