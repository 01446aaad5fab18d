//! Interface detail pane: Protocols / IP Address / MAC Address tabs.

use super::sparkline::{render_sparkline, series_values};
use crate::control::protocol::InterfaceSnapshot;
use crate::stats::{format_bytes, format_optional_rate, ip_table, mac_table, protocol_series, AddressTraffic};
use crate::tui::{DetailTab, FocusPanel};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, Tabs, Widget},
};

/// Width of the trend column.
const TREND_WIDTH: usize = 20;

/// Detail view of one interface.
pub struct DetailWidget<'a> {
    name: &'a str,
    snapshot: &'a InterfaceSnapshot,
    tab: DetailTab,
    scroll: usize,
    focused: bool,
}

impl<'a> DetailWidget<'a> {
    /// Create a new detail widget.
    pub fn new(
        name: &'a str,
        snapshot: &'a InterfaceSnapshot,
        tab: DetailTab,
        scroll: usize,
        focus: FocusPanel,
    ) -> Self {
        Self {
            name,
            snapshot,
            tab,
            scroll,
            focused: focus == FocusPanel::Detail,
        }
    }

    fn header(first: &'static str) -> Row<'static> {
        Row::new([first, "Upload", "Download", "Trend"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }

    fn protocol_rows(&self) -> Vec<Row<'static>> {
        protocol_series(self.snapshot)
            .into_iter()
            .map(|(protocol, series)| {
                let combined: Vec<u64> = series_values(&series.upload)
                    .into_iter()
                    .zip(series_values(&series.download))
                    .map(|(up, down)| up + down)
                    .collect();
                Row::new([
                    Cell::from(protocol.to_string()),
                    Cell::from(format_optional_rate(series.upload_rate())),
                    Cell::from(format_optional_rate(series.download_rate())),
                    Cell::from(render_sparkline(&combined, TREND_WIDTH)).style(Style::default().fg(Color::Cyan)),
                ])
            })
            .collect()
    }

    fn address_rows(&self, table: Vec<AddressTraffic>) -> Vec<Row<'static>> {
        let history = &self.snapshot.history;
        let self_mac = self.snapshot.mac.as_deref();

        table
            .into_iter()
            .skip(self.scroll)
            .map(|entry| {
                let (upload, download) = entry.rates(history);
                let series = entry.series(history);
                let combined: Vec<u64> = series
                    .upload
                    .iter()
                    .zip(&series.download)
                    .map(|((_, up), (_, down))| up + down)
                    .collect();

                let mut address = entry.address.clone();
                if self_mac == Some(entry.address.as_str()) {
                    address.push_str(" (self)");
                }

                Row::new([
                    Cell::from(address),
                    Cell::from(format_optional_rate(upload)),
                    Cell::from(format_optional_rate(download)),
                    Cell::from(format!(
                        "{} {}",
                        render_sparkline(&combined, TREND_WIDTH - 11),
                        format_bytes(entry.total() as f64)
                    ))
                    .style(Style::default().fg(Color::Cyan)),
                ])
            })
            .collect()
    }

    /// Table rows for the active tab.
    fn rows(&self) -> (Row<'static>, Vec<Row<'static>>) {
        match self.tab {
            DetailTab::Protocols => (Self::header("Protocol"), self.protocol_rows()),
            DetailTab::IpAddress => (Self::header("Address"), self.address_rows(ip_table(self.snapshot))),
            DetailTab::MacAddress => (Self::header("Address"), self.address_rows(mac_table(self.snapshot))),
        }
    }
}

impl Widget for DetailWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let mut title = vec![Span::styled(
            format!(" {} ", self.name),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if let Some(mac) = &self.snapshot.mac {
            title.push(Span::styled(format!("{} ", mac), Style::default().fg(Color::DarkGray)));
        }
        if self.snapshot.closed {
            title.push(Span::styled("offline ", Style::default().fg(Color::Red)));
        }

        let block = Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 3 {
            return;
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(1)])
            .split(inner);

        let titles: Vec<&str> = DetailTab::ALL.iter().map(|tab| tab.title()).collect();
        Tabs::new(titles)
            .select(self.tab.index())
            .style(Style::default().fg(Color::DarkGray))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .render(layout[0], buf);

        let (header, rows) = self.rows();
        let widths = [
            Constraint::Min(18),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(TREND_WIDTH as u16),
        ];
        Table::new(rows, widths).header(header).render(layout[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::protocol::{Bucket, IpHeader, PacketHeader};
    use std::collections::BTreeMap;

    fn snapshot() -> InterfaceSnapshot {
        let header = PacketHeader {
            protocol: 0x0800,
            source: "aa:aa".to_string(),
            destination: "bb:bb".to_string(),
            ip_header: Some(IpHeader {
                protocol: 6,
                source: "10.0.0.1".to_string(),
                destination: "10.0.0.2".to_string(),
            }),
        };
        let key = header.to_key().unwrap();
        InterfaceSnapshot {
            history: vec![
                Bucket::new(1000, BTreeMap::from([(key.clone(), 100)])),
                Bucket::new(2000, BTreeMap::from([(key, 300)])),
            ],
            mac: Some("aa:aa".to_string()),
            ..Default::default()
        }
    }

    fn render_to_text(widget: DetailWidget) -> String {
        let area = Rect::new(0, 0, 80, 14);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_protocol_rows_cover_every_bucket() {
        let snapshot = snapshot();
        let widget = DetailWidget::new("eth0", &snapshot, DetailTab::Protocols, 0, FocusPanel::Detail);
        assert_eq!(widget.protocol_rows().len(), 6);
    }

    #[test]
    fn test_ip_tab_lists_both_ends() {
        let snapshot = snapshot();
        let widget = DetailWidget::new("eth0", &snapshot, DetailTab::IpAddress, 0, FocusPanel::Detail);
        let text = render_to_text(widget);

        assert!(text.contains("10.0.0.1"));
        assert!(text.contains("10.0.0.2"));
        assert!(text.contains("300.00 B/s"));
    }

    #[test]
    fn test_mac_tab_marks_own_address() {
        let snapshot = snapshot();
        let widget = DetailWidget::new("eth0", &snapshot, DetailTab::MacAddress, 0, FocusPanel::Detail);
        let text = render_to_text(widget);

        assert!(text.contains("aa:aa (self)"));
        assert!(text.contains("bb:bb"));
    }

    #[test]
    fn test_scroll_skips_rows() {
        let snapshot = snapshot();
        let widget = DetailWidget::new("eth0", &snapshot, DetailTab::IpAddress, 1, FocusPanel::Detail);
        let (_, rows) = widget.rows();
        assert_eq!(rows.len(), 1);
    }
}
