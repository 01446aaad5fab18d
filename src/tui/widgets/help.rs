//! Keybinding reference popup.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

const BINDINGS: &[(&str, &str)] = &[
    ("j / k", "Move selection"),
    ("Tab", "Switch panel"),
    ("Enter", "Open interface"),
    ("h / l", "Switch detail tab"),
    ("m", "Manage interfaces"),
    ("Space", "Subscribe / clear (manage)"),
    ("Enter", "Pause / resume (manage)"),
    ("r", "Reload interface list (manage)"),
    ("?", "This help"),
    ("q / Esc", "Quit"),
];

/// Popup listing keybindings.
pub struct HelpWidget;

impl Widget for HelpWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let mut lines: Vec<Line> = BINDINGS
            .iter()
            .map(|(key, action)| {
                Line::from(vec![
                    Span::styled(format!("{:>10}  ", key), key_style),
                    Span::raw(*action),
                ])
            })
            .collect();
        lines.push(Line::default());
        lines.push(Line::styled(
            "Polling pauses while the terminal is unfocused.",
            Style::default().fg(Color::DarkGray),
        ));
        lines.push(Line::styled("Press any key to close.", Style::default().fg(Color::DarkGray)));

        Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Help ")
                    .title_alignment(Alignment::Center)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .render(area, buf);
    }
}
