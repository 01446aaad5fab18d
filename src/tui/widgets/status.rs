//! Status bar widget.

use crate::control::ConnectionState;
use crate::tui::FocusPanel;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Widget for displaying connection state and keybindings.
pub struct StatusWidget {
    /// Connection to the capture server.
    connection: ConnectionState,
    /// Current focus panel.
    focus: FocusPanel,
    /// Whether polling is paused for visibility.
    paused: bool,
    /// Optional status message.
    message: Option<String>,
}

impl StatusWidget {
    /// Create a new status widget.
    pub fn new(connection: ConnectionState, focus: FocusPanel) -> Self {
        Self {
            connection,
            focus,
            paused: false,
            message: None,
        }
    }

    /// Mark polling as paused.
    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    /// Set a status message.
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    fn connection_style(connection: ConnectionState) -> Style {
        let bg = match connection {
            ConnectionState::Open => Color::Green,
            ConnectionState::Connecting => Color::Yellow,
            ConnectionState::Closed => Color::Red,
        };
        Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD)
    }
}

/// Hints shown regardless of focus.
const GLOBAL_KEYS: &[(&str, &str)] = &[
    ("j/k", "Navigate"),
    ("Tab", "Switch Panel"),
    ("m", "Manage"),
    ("?", "Help"),
    ("q", "Quit"),
];

fn focus_keys(focus: FocusPanel) -> &'static [(&'static str, &'static str)] {
    match focus {
        FocusPanel::Sidebar => &[("Enter", "Open")],
        FocusPanel::Detail => &[("h/l", "Tab")],
        FocusPanel::Logs => &[],
    }
}

fn key_hint(key: &str, action: &str) -> [Span<'static>; 2] {
    [
        Span::styled(
            format!(" {} ", key),
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{} ", action), Style::default().fg(Color::White)),
    ]
}

impl Widget for StatusWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let separator = Span::styled("|", Style::default().fg(Color::DarkGray));

        let mut spans = vec![
            Span::styled(format!(" {} ", self.connection), Self::connection_style(self.connection)),
            Span::raw(" "),
        ];
        if self.paused {
            spans.push(Span::styled("paused ", Style::default().fg(Color::Yellow)));
            spans.push(separator.clone());
        }

        for (key, action) in focus_keys(self.focus).iter().chain(GLOBAL_KEYS) {
            spans.extend(key_hint(key, action));
        }

        if let Some(message) = self.message {
            spans.push(separator);
            spans.push(Span::styled(format!(" {} ", message), Style::default().fg(Color::Green)));
        }

        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(Color::DarkGray))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_widget_creation() {
        let widget = StatusWidget::new(ConnectionState::Open, FocusPanel::Sidebar).with_paused(true);
        assert_eq!(widget.connection, ConnectionState::Open);
        assert!(widget.paused);
    }

    #[test]
    fn test_connection_colors() {
        assert_eq!(StatusWidget::connection_style(ConnectionState::Open).bg, Some(Color::Green));
        assert_eq!(StatusWidget::connection_style(ConnectionState::Closed).bg, Some(Color::Red));
    }

    #[test]
    fn test_renders_connection_state() {
        let area = Rect::new(0, 0, 120, 1);
        let mut buf = Buffer::empty(area);
        StatusWidget::new(ConnectionState::Connecting, FocusPanel::Logs)
            .with_message(Some("listen eth0...".to_string()))
            .render(area, &mut buf);

        let text: String = buf.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.starts_with(" connecting "));
        assert!(text.contains("listen eth0..."));
        assert!(!text.contains("Enter"));
    }

    #[test]
    fn test_focus_specific_hints() {
        assert_eq!(focus_keys(FocusPanel::Sidebar), &[("Enter", "Open")]);
        assert!(focus_keys(FocusPanel::Logs).is_empty());
    }
}
