//! Client event log widget.

use crate::tui::{EventCategory, FocusPanel, LogEntry, LogLevel};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};
use std::collections::VecDeque;

/// Log panel, newest entry first.
pub struct LogsWidget<'a> {
    logs: &'a VecDeque<LogEntry>,
    focused: bool,
    selected: usize,
}

impl<'a> LogsWidget<'a> {
    /// Create a new logs widget.
    pub fn new(logs: &'a VecDeque<LogEntry>, focus: FocusPanel, selected: usize) -> Self {
        Self {
            logs,
            focused: focus == FocusPanel::Logs,
            selected,
        }
    }
}

fn level_style(level: LogLevel) -> Style {
    let color = match level {
        LogLevel::Debug => Color::DarkGray,
        LogLevel::Info => Color::Green,
        LogLevel::Warn => Color::Yellow,
        LogLevel::Error => Color::Red,
    };
    Style::default().fg(color)
}

fn category_style(category: EventCategory) -> Style {
    let color = match category {
        EventCategory::Connection => Color::Cyan,
        EventCategory::Interface => Color::Magenta,
        EventCategory::System => Color::Gray,
    };
    Style::default().fg(color)
}

/// `HH:MM:SS LEVEL [CAT] message`
fn entry_line(entry: &LogEntry) -> Line<'_> {
    let mut message_style = Style::default();
    if entry.level == LogLevel::Error {
        message_style = message_style.fg(Color::Red);
    }

    Line::from(vec![
        Span::styled(
            entry.timestamp.format("%H:%M:%S").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(format!("{:5}", entry.level), level_style(entry.level)),
        Span::raw(" "),
        Span::styled(format!("[{}]", entry.category), category_style(entry.category)),
        Span::raw(" "),
        Span::styled(entry.message.as_str(), message_style),
    ])
}

impl Widget for LogsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused { Color::Yellow } else { Color::DarkGray };
        let block = Block::default()
            .title(format!(" Logs ({}) ", self.logs.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        let list = List::new(self.logs.iter().map(|entry| ListItem::new(entry_line(entry))))
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let selection = (self.focused && !self.logs.is_empty()).then_some(self.selected);
        let mut state = ListState::default().with_selected(selection);
        StatefulWidget::render(list, area, buf, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(level: LogLevel, category: EventCategory, message: &str) -> LogEntry {
        LogEntry {
            level,
            category,
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }

    fn render(logs: &VecDeque<LogEntry>, focus: FocusPanel) -> String {
        let area = Rect::new(0, 0, 60, 4);
        let mut buf = Buffer::empty(area);
        LogsWidget::new(logs, focus, 0).render(area, &mut buf);
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_focus_follows_panel() {
        let logs = VecDeque::new();
        assert!(LogsWidget::new(&logs, FocusPanel::Logs, 0).focused);
        assert!(!LogsWidget::new(&logs, FocusPanel::Sidebar, 0).focused);
    }

    #[test]
    fn test_renders_level_and_category() {
        let logs = VecDeque::from([
            entry(LogLevel::Warn, EventCategory::Interface, "clear eth0 failed"),
            entry(LogLevel::Info, EventCategory::Connection, "Connection open"),
        ]);

        let text = render(&logs, FocusPanel::Sidebar);
        assert!(text.contains("Logs (2)"));
        assert!(text.contains("WARN  [IFACE] clear eth0 failed"));
        assert!(text.contains("INFO  [CONN] Connection open"));
    }

    #[test]
    fn test_error_message_is_red() {
        let error = entry(LogLevel::Error, EventCategory::System, "boom");
        let line = entry_line(&error);
        assert_eq!(line.spans[6].style.fg, Some(Color::Red));
        assert_eq!(line.spans[4].style.fg, Some(Color::Gray));
    }
}
