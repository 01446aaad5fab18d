//! Interface sidebar widget.

use crate::stats::{format_optional_rate, format_rate, interface_rate, total_rate, InterfaceRate};
use crate::sync::DataSet;
use crate::tui::FocusPanel;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget},
};

/// Sidebar listing "Overview" followed by every known interface and its rate.
pub struct InterfacesWidget<'a> {
    data: &'a DataSet,
    focused: bool,
    selected: usize,
}

impl<'a> InterfacesWidget<'a> {
    /// Create a new sidebar widget. `selected` 0 is the overview row.
    pub fn new(data: &'a DataSet, focus: FocusPanel, selected: usize) -> Self {
        Self {
            data,
            focused: focus == FocusPanel::Sidebar,
            selected,
        }
    }

    /// Rate label shown next to an interface.
    fn rate_label(rate: InterfaceRate) -> (String, Color) {
        match rate {
            InterfaceRate::Offline => ("offline".to_string(), Color::DarkGray),
            InterfaceRate::Active(rate) => (format_optional_rate(rate), Color::Green),
        }
    }
}

impl StatefulWidget for InterfacesWidget<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut ListState) {
        let total = format_rate(total_rate(self.data.values()));
        let mut items = vec![ListItem::new(Line::from(vec![
            Span::styled("Overview ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(total, Style::default().fg(Color::Cyan)),
        ]))];

        for (name, snapshot) in self.data.iter() {
            let (label, color) = Self::rate_label(interface_rate(snapshot));
            items.push(ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", name)),
                Span::styled(label, Style::default().fg(color)),
            ])));
        }

        let border_style = if self.focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .title(format!(" Interfaces ({}) ", self.data.len()))
            .borders(Borders::ALL)
            .border_style(border_style);

        state.select(Some(self.selected));

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

        StatefulWidget::render(list, area, buf, state);
    }
}
