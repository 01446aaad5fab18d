//! Overview pane: upload and download sparklines for every interface.

use super::sparkline::{render_sparkline, series_values};
use crate::stats::{direction_series, format_optional_rate};
use crate::sync::DataSet;
use crate::tui::FocusPanel;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Width reserved for the direction arrow and the rate label.
const LABEL_WIDTH: usize = 16;

/// Overview of all interfaces.
pub struct OverviewWidget<'a> {
    data: &'a DataSet,
    focused: bool,
    scroll: usize,
}

impl<'a> OverviewWidget<'a> {
    /// Create a new overview widget. `scroll` skips whole interfaces.
    pub fn new(data: &'a DataSet, focus: FocusPanel, scroll: usize) -> Self {
        Self {
            data,
            focused: focus == FocusPanel::Detail,
            scroll,
        }
    }

    fn lines(&self, width: usize) -> Vec<Line<'a>> {
        let spark_width = width.saturating_sub(LABEL_WIDTH).max(1);
        let mut lines = Vec::new();

        for (name, snapshot) in self.data.iter().skip(self.scroll) {
            let series = direction_series(snapshot);
            let title_style = if snapshot.closed {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            let mut title = vec![Span::styled(name.clone(), title_style)];
            if snapshot.closed {
                title.push(Span::styled(" (offline)", Style::default().fg(Color::DarkGray)));
            }
            lines.push(Line::from(title));

            for (arrow, rate, values, color) in [
                ("↑", series.upload_rate(), series_values(&series.upload), Color::Magenta),
                ("↓", series.download_rate(), series_values(&series.download), Color::Cyan),
            ] {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!(" {} {:<width$}", arrow, format_optional_rate(rate), width = LABEL_WIDTH - 3),
                        Style::default().fg(color),
                    ),
                    Span::styled(render_sparkline(&values, spark_width), Style::default().fg(color)),
                ]));
            }
            lines.push(Line::default());
        }
        lines
    }
}

impl Widget for OverviewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .title(" Overview ")
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner_width = block.inner(area).width as usize;

        if self.data.is_empty() {
            Paragraph::new("No interfaces. Press [m] to manage subscriptions.")
                .style(Style::default().fg(Color::DarkGray))
                .block(block)
                .render(area, buf);
            return;
        }

        Paragraph::new(self.lines(inner_width)).block(block).render(area, buf);
    }
}
