//! TUI event loop runner.
//!
//! This module provides the main event loop that:
//! - Processes terminal events (keyboard, focus, resize)
//! - Pulls published data sets and connection changes into the app
//! - Renders the UI

use super::app::TuiApp;
use super::input::{handle_event, InputResult};
use super::layout::TuiLayout;
use super::state::Popup;
use super::widgets::{
    centered_rect, DetailWidget, HelpWidget, InterfacesWidget, LogsWidget, ManageWidget, OverviewWidget,
    StatusWidget,
};
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, widgets::ListState, Frame, Terminal};
use std::io::{self, Stdout};
use std::panic;
use std::time::Duration;
use tracing::{debug, error, info};

/// Redraw interval when no input arrives.
const TICK_RATE: Duration = Duration::from_millis(100);

/// TUI runner that manages the terminal and event loop.
pub struct TuiRunner {
    /// The terminal backend.
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Scroll state of the sidebar list.
    sidebar_state: ListState,
}

impl TuiRunner {
    /// Initialize the terminal for TUI mode.
    ///
    /// Enables raw mode, enters the alternate screen and turns on focus
    /// reporting.
    pub fn new() -> io::Result<Self> {
        // Restore the terminal before the default hook prints the panic
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableFocusChange);
            original_hook(panic_info);
        }));

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        info!("TUI initialized");

        Ok(Self {
            terminal,
            sidebar_state: ListState::default(),
        })
    }

    /// Restore the terminal to normal mode.
    pub fn restore(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableFocusChange)?;
        self.terminal.show_cursor()?;

        info!("TUI restored");

        Ok(())
    }

    /// Run the TUI event loop until the user quits or shutdown is signalled.
    pub async fn run(&mut self, app: &mut TuiApp) -> io::Result<()> {
        loop {
            if app.check_shutdown() {
                debug!("TUI received shutdown signal");
                break;
            }

            app.tick();

            let sidebar_state = &mut self.sidebar_state;
            self.terminal.draw(|frame| render_ui(frame, app, sidebar_state))?;

            if app.should_quit() {
                break;
            }

            if event::poll(TICK_RATE)? {
                let event = event::read()?;
                if handle_event(app, event) == InputResult::Quit {
                    break;
                }
            } else {
                // Let spawned requests and the supervisors make progress
                tokio::task::yield_now().await;
            }
        }

        Ok(())
    }
}

impl Drop for TuiRunner {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            error!("Failed to restore terminal: {}", e);
        }
    }
}

/// Render the complete UI.
fn render_ui(frame: &mut Frame, app: &TuiApp, sidebar_state: &mut ListState) {
    let layout = TuiLayout::compute(frame.area());

    let sidebar = InterfacesWidget::new(app.data(), app.focus(), app.sidebar_selection());
    frame.render_stateful_widget(sidebar, layout.sidebar, sidebar_state);

    match app.selected_interface() {
        Some((name, snapshot)) => {
            let detail = DetailWidget::new(name, snapshot, app.detail_tab(), app.detail_scroll(), app.focus());
            frame.render_widget(detail, layout.main);
        }
        None => {
            let overview = OverviewWidget::new(app.data(), app.focus(), app.detail_scroll());
            frame.render_widget(overview, layout.main);
        }
    }

    let logs_widget = LogsWidget::new(app.logs(), app.focus(), app.log_selection());
    frame.render_widget(logs_widget, layout.logs);

    let status_widget = StatusWidget::new(app.connection(), app.focus())
        .with_paused(!app.is_visible())
        .with_message(app.status_message().map(String::from));
    frame.render_widget(status_widget, layout.status);

    match app.popup() {
        Popup::Manage => {
            let area = centered_rect(60, 70, frame.area());
            let manage = ManageWidget::new(app.manage(), app.data(), app.unavailable_interfaces());
            frame.render_widget(manage, area);
        }
        Popup::Help => frame.render_widget(HelpWidget, centered_rect(50, 60, frame.area())),
        Popup::None => {}
    }
}
