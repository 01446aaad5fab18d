//! Subscription management popup.

use crate::sync::DataSet;
use crate::tui::ManageState;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

/// Popup listing server interfaces with subscribe and active toggles,
/// followed by cached interfaces the server no longer reports.
pub struct ManageWidget<'a> {
    state: &'a ManageState,
    data: &'a DataSet,
    unavailable: Vec<&'a str>,
}

impl<'a> ManageWidget<'a> {
    /// Create a new manage widget.
    pub fn new(state: &'a ManageState, data: &'a DataSet, unavailable: Vec<&'a str>) -> Self {
        Self {
            state,
            data,
            unavailable,
        }
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();

        if self.state.loading {
            lines.push(Line::styled("Loading interfaces...", Style::default().fg(Color::Yellow)));
        }

        for (index, name) in self.state.interfaces.iter().enumerate() {
            let is_cursor = index == self.state.cursor;
            let snapshot = self.data.get(name);
            let subscribed = snapshot.is_some();
            let active = snapshot.is_some_and(|s| !s.closed);

            let cursor_marker = if is_cursor { "> " } else { "  " };
            let checkbox = if subscribed { "[x] " } else { "[ ] " };
            let (switch, switch_style) = if active {
                ("● capturing", Style::default().fg(Color::Green))
            } else if subscribed {
                ("○ paused", Style::default().fg(Color::Yellow))
            } else {
                ("○", Style::default().fg(Color::DarkGray))
            };

            let name_style = if is_cursor {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            let checkbox_style = if subscribed {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            let mut line = Line::from(vec![
                Span::styled(cursor_marker, Style::default().fg(Color::Yellow)),
                Span::styled(checkbox, checkbox_style),
                Span::styled(format!("{:<20}", name), name_style),
                Span::styled(switch, switch_style),
            ]);
            if is_cursor {
                line = line.style(Style::default().bg(Color::DarkGray));
            }
            lines.push(line);
        }

        if !self.state.loading && self.state.interfaces.is_empty() {
            lines.push(Line::styled(
                "Server reported no interfaces",
                Style::default().fg(Color::DarkGray),
            ));
        }

        if !self.unavailable.is_empty() {
            lines.push(Line::default());
            lines.push(Line::styled(
                "Not Available",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
            for name in &self.unavailable {
                lines.push(Line::styled(format!("      {}", name), Style::default().fg(Color::DarkGray)));
            }
        }

        lines
    }

    fn render_footer(area: Rect, buf: &mut Buffer) {
        let key_style = Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let action_style = Style::default().fg(Color::White);

        let line = Line::from(vec![
            Span::styled(" Space ", key_style),
            Span::styled("Subscribe ", action_style),
            Span::styled(" Enter ", key_style),
            Span::styled("Pause/Resume ", action_style),
            Span::styled(" r ", key_style),
            Span::styled("Reload ", action_style),
            Span::styled(" Esc ", key_style),
            Span::styled("Close ", action_style),
        ]);
        Paragraph::new(line).alignment(Alignment::Center).render(area, buf);
    }
}

impl Widget for ManageWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title(" Manage Interfaces ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 3 {
            return;
        }

        let [rows, footer] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

        // Keep the cursor row on screen
        let visible = rows.height as usize;
        let offset = (self.state.cursor + 1).saturating_sub(visible);
        Paragraph::new(self.lines())
            .scroll((offset as u16, 0))
            .render(rows, buf);

        Self::render_footer(footer, buf);
    }
}

/// Centre a box of `percent_x` by `percent_y` of `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    popup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::protocol::InterfaceSnapshot;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let centered = centered_rect(60, 70, area);

        assert_eq!((centered.width, centered.height), (60, 35));
        assert_eq!(centered.x, 20);
        assert!((7..=8).contains(&centered.y));
    }

    #[test]
    fn test_rows_reflect_subscription_state() {
        let mut data = BTreeMap::new();
        data.insert("eth0".to_string(), InterfaceSnapshot::default());
        data.insert(
            "wlan0".to_string(),
            InterfaceSnapshot {
                closed: true,
                ..Default::default()
            },
        );
        data.insert("tun0".to_string(), InterfaceSnapshot::default());
        let data = Arc::new(data);

        let mut state = ManageState::default();
        state.set_interfaces(vec!["eth0".into(), "lo".into(), "wlan0".into()]);

        let widget = ManageWidget::new(&state, &data, vec!["tun0"]);
        let lines: Vec<String> = widget.lines().iter().map(text_of).collect();

        assert!(lines[0].starts_with("> [x] eth0"));
        assert!(lines[0].ends_with("● capturing"));
        assert!(lines[1].starts_with("  [ ] lo"));
        assert!(lines[2].ends_with("○ paused"));
        assert_eq!(lines[4], "Not Available");
        assert_eq!(lines[5].trim(), "tun0");
    }

    #[test]
    fn test_loading_indicator() {
        let data = DataSet::default();
        let state = ManageState {
            loading: true,
            ..Default::default()
        };
        let lines = ManageWidget::new(&state, &data, Vec::new()).lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(text_of(&lines[0]), "Loading interfaces...");
    }
}
