//! TUI layout definitions.
//!
//! ```text
//! ┌────────────┬────────────────────────────┐
//! │ Interfaces │                            │
//! │  Overview  │   Overview sparklines      │
//! │  eth0      │   or interface detail tabs │
//! │  wlan0     │                            │
//! ├────────────┴────────────────────────────┤
//! │                 Logs                    │
//! ├─────────────────────────────────────────┤
//! │ Status Bar: connection, keybindings     │
//! └─────────────────────────────────────────┘
//! ```

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Sidebar width in columns.
pub const SIDEBAR_WIDTH: u16 = 28;

/// Layout constraints for the TUI.
#[derive(Debug, Clone)]
pub struct TuiLayout {
    /// Interface list.
    pub sidebar: Rect,
    /// Overview or detail pane.
    pub main: Rect,
    /// Area for logs panel.
    pub logs: Rect,
    /// Area for status bar.
    pub status: Rect,
}

impl TuiLayout {
    /// Compute the layout for a given terminal area.
    pub fn compute(area: Rect) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),        // Sidebar + main
                Constraint::Percentage(25), // Logs
                Constraint::Length(1),     // Status bar
            ])
            .split(area);

        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
            .split(vertical[0]);

        Self {
            sidebar: horizontal[0],
            main: horizontal[1],
            logs: vertical[1],
            status: vertical[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_computation() {
        let area = Rect::new(0, 0, 80, 24);
        let layout = TuiLayout::compute(area);

        // Sidebar and main pane share a row
        assert_eq!(layout.sidebar.y, layout.main.y);
        assert!(layout.main.x > layout.sidebar.x);

        assert!(layout.logs.y > layout.main.y);
        assert!(layout.status.y > layout.logs.y);
        assert_eq!(layout.status.height, 1);
    }

    #[test]
    fn test_layout_widths() {
        let area = Rect::new(0, 0, 100, 30);
        let layout = TuiLayout::compute(area);

        assert_eq!(layout.sidebar.width, SIDEBAR_WIDTH);
        assert_eq!(layout.main.width, 100 - SIDEBAR_WIDTH);
        assert_eq!(layout.logs.width, 100);
        assert_eq!(layout.status.width, 100);
    }
}
