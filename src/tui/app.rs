//! TUI application state machine.
//!
//! The `TuiApp` holds everything the dashboard renders:
//! - The latest published data set (read-only)
//! - Connection state from the reconnect supervisor
//! - Manage popup state and in-flight subscription requests
//! - Log messages
//! - UI focus and selection state
//!
//! Requests to the server never block the event loop. They run on spawned
//! tasks and report back through an [`AppEvent`] queue drained on every tick.

use crate::control::protocol::InterfaceSnapshot;
use crate::control::ConnectionState;
use crate::sync::{DataSet, SyncSupervisor};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::state::{
    AppEvent, DetailTab, EventCategory, FocusPanel, InterfaceAction, LogEntry, LogLevel, ManageState, Popup,
    MAX_LOG_ENTRIES,
};

/// The TUI application state.
pub struct TuiApp {
    /// Owner of the data set; target of subscription requests.
    sync: Arc<SyncSupervisor>,
    /// Published data sets.
    data_rx: watch::Receiver<DataSet>,
    /// Last data set seen.
    data: DataSet,
    /// Connection state changes.
    connection_rx: watch::Receiver<ConnectionState>,
    /// Last connection state seen.
    connection: ConnectionState,
    /// Visibility signal for the sync loop.
    visibility_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
    /// Completion queue for spawned requests.
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    /// Log entries (newest first).
    logs: VecDeque<LogEntry>,
    /// Which panel currently has focus.
    focus: FocusPanel,
    /// 0 is the overview, `n` is the n-th interface.
    sidebar_selection: usize,
    /// Active tab of the detail pane.
    detail_tab: DetailTab,
    /// First visible row of the detail tables.
    detail_scroll: usize,
    /// Selected index in logs list.
    log_selection: usize,
    /// Open modal, if any.
    popup: Popup,
    /// Manage popup state.
    manage: ManageState,
    /// Whether the app should quit.
    should_quit: bool,
    /// Status message to display.
    status_message: Option<String>,
}

impl TuiApp {
    /// Create the app on top of a running sync supervisor.
    pub fn new(
        sync: Arc<SyncSupervisor>,
        connection_rx: watch::Receiver<ConnectionState>,
        visibility_tx: watch::Sender<bool>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let mut data_rx = sync.subscribe();
        let data = data_rx.borrow_and_update().clone();
        let connection = *connection_rx.borrow();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut app = Self {
            sync,
            data_rx,
            data,
            connection_rx,
            connection,
            visibility_tx,
            shutdown_rx,
            events_tx,
            events_rx,
            logs: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            focus: FocusPanel::Sidebar,
            sidebar_selection: 0,
            detail_tab: DetailTab::Protocols,
            detail_scroll: 0,
            log_selection: 0,
            popup: Popup::None,
            manage: ManageState::default(),
            should_quit: false,
            status_message: None,
        };

        app.add_log(LogLevel::Info, EventCategory::System, "Dashboard started".to_string());
        app
    }

    /// Latest data set.
    #[must_use]
    pub fn data(&self) -> &DataSet {
        &self.data
    }

    /// Latest connection state.
    #[must_use]
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Get the current focus panel.
    #[must_use]
    pub fn focus(&self) -> FocusPanel {
        self.focus
    }

    /// Sidebar row: 0 for the overview, otherwise an interface.
    #[must_use]
    pub fn sidebar_selection(&self) -> usize {
        self.sidebar_selection
    }

    /// Interface selected in the sidebar, or `None` on the overview.
    #[must_use]
    pub fn selected_interface(&self) -> Option<(&str, &InterfaceSnapshot)> {
        let index = self.sidebar_selection.checked_sub(1)?;
        self.data
            .iter()
            .nth(index)
            .map(|(name, snapshot)| (name.as_str(), snapshot))
    }

    /// Active detail tab.
    #[must_use]
    pub fn detail_tab(&self) -> DetailTab {
        self.detail_tab
    }

    /// Rows scrolled off the top of the detail tables.
    #[must_use]
    pub fn detail_scroll(&self) -> usize {
        self.detail_scroll
    }

    /// Get log entries.
    #[must_use]
    pub fn logs(&self) -> &VecDeque<LogEntry> {
        &self.logs
    }

    /// Get current log selection index.
    #[must_use]
    pub fn log_selection(&self) -> usize {
        self.log_selection
    }

    /// Open popup.
    #[must_use]
    pub fn popup(&self) -> Popup {
        self.popup
    }

    /// Manage popup state.
    #[must_use]
    pub fn manage(&self) -> &ManageState {
        &self.manage
    }

    /// Known interfaces the server no longer reports.
    #[must_use]
    pub fn unavailable_interfaces(&self) -> Vec<&str> {
        self.data
            .keys()
            .filter(|name| !self.manage.interfaces.contains(name))
            .map(String::as_str)
            .collect()
    }

    /// Check if app should quit.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Get the current status message.
    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Whether the sync loop is told the dashboard is visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        *self.visibility_tx.borrow()
    }

    /// Set the quit flag.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Cycle focus to the next panel.
    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    /// Cycle focus to the previous panel.
    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Give focus to a specific panel.
    pub fn focus_panel(&mut self, panel: FocusPanel) {
        self.focus = panel;
    }

    /// Move selection up in the focused panel.
    pub fn select_up(&mut self) {
        match self.focus {
            FocusPanel::Sidebar => {
                if self.sidebar_selection > 0 {
                    self.sidebar_selection -= 1;
                    self.detail_scroll = 0;
                }
            }
            FocusPanel::Detail => self.detail_scroll = self.detail_scroll.saturating_sub(1),
            FocusPanel::Logs => self.log_selection = self.log_selection.saturating_sub(1),
        }
    }

    /// Move selection down in the focused panel.
    pub fn select_down(&mut self) {
        match self.focus {
            FocusPanel::Sidebar => {
                if self.sidebar_selection < self.data.len() {
                    self.sidebar_selection += 1;
                    self.detail_scroll = 0;
                }
            }
            FocusPanel::Detail => self.detail_scroll += 1,
            FocusPanel::Logs => {
                if !self.logs.is_empty() && self.log_selection < self.logs.len() - 1 {
                    self.log_selection += 1;
                }
            }
        }
    }

    /// Switch the detail pane to the next tab.
    pub fn next_tab(&mut self) {
        self.detail_tab = self.detail_tab.next();
        self.detail_scroll = 0;
    }

    /// Switch the detail pane to the previous tab.
    pub fn prev_tab(&mut self) {
        self.detail_tab = self.detail_tab.prev();
        self.detail_scroll = 0;
    }

    /// Open the manage popup and fetch the server's interface list.
    pub fn open_manage(&mut self) {
        self.popup = Popup::Manage;
        self.refresh_interfaces();
    }

    /// Open the help popup.
    pub fn open_help(&mut self) {
        self.popup = Popup::Help;
    }

    /// Close whichever popup is open.
    pub fn close_popup(&mut self) {
        self.popup = Popup::None;
    }

    /// Move the manage highlight up.
    pub fn manage_up(&mut self) {
        self.manage.cursor_up();
    }

    /// Move the manage highlight down.
    pub fn manage_down(&mut self) {
        self.manage.cursor_down();
    }

    /// Ask the server for its interface list.
    pub fn refresh_interfaces(&mut self) {
        self.manage.loading = true;
        let sync = self.sync.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = sync.get_interfaces().await.map_err(|e| e.to_string());
            let _ = events.send(AppEvent::InterfacesLoaded(result));
        });
    }

    /// Subscribe to the highlighted interface, or clear it if already known.
    pub fn toggle_subscription(&mut self) {
        let Some(name) = self.manage.selected().map(str::to_string) else {
            return;
        };
        let action = if self.data.contains_key(&name) {
            InterfaceAction::Clear
        } else {
            InterfaceAction::Listen
        };
        self.spawn_action(action, name);
    }

    /// Pause capturing on the highlighted interface, or resume it.
    pub fn toggle_active(&mut self) {
        let Some(name) = self.manage.selected().map(str::to_string) else {
            return;
        };
        let active = self.data.get(&name).is_some_and(|snapshot| !snapshot.closed);
        let action = if active {
            InterfaceAction::NotListen
        } else {
            InterfaceAction::Listen
        };
        self.spawn_action(action, name);
    }

    fn spawn_action(&mut self, action: InterfaceAction, name: String) {
        debug!("Requesting {} {}", action, name);
        self.status_message = Some(format!("{} {}...", action, name));

        let sync = self.sync.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = match action {
                InterfaceAction::Listen => sync.listen_interface(&name).await,
                InterfaceAction::NotListen => sync.not_listen_interface(&name).await,
                InterfaceAction::Clear => sync.clear_interface(&name).await,
            };
            let _ = events.send(AppEvent::ActionFinished {
                action,
                name,
                result: result.map_err(|e| e.to_string()),
            });
        });
    }

    /// Tell the sync loop whether the dashboard can be seen.
    pub fn set_visible(&mut self, visible: bool) {
        let changed = self.visibility_tx.send_if_modified(|current| {
            let changed = *current != visible;
            *current = visible;
            changed
        });
        if changed {
            let message = if visible { "Polling resumed" } else { "Polling paused (terminal unfocused)" };
            self.add_log(LogLevel::Debug, EventCategory::System, message.to_string());
        }
    }

    /// Pull in everything that changed since the last tick.
    pub fn tick(&mut self) {
        if self.data_rx.has_changed().unwrap_or(false) {
            self.data = self.data_rx.borrow_and_update().clone();
            self.sidebar_selection = self.sidebar_selection.min(self.data.len());
        }

        if self.connection_rx.has_changed().unwrap_or(false) {
            let state = *self.connection_rx.borrow_and_update();
            if state != self.connection {
                self.connection = state;
                self.log_connection(state);
            }
        }

        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_app_event(event);
        }
    }

    fn log_connection(&mut self, state: ConnectionState) {
        let (level, message) = match state {
            ConnectionState::Connecting => (LogLevel::Debug, "Connecting to capture server"),
            ConnectionState::Open => (LogLevel::Info, "Connected to capture server"),
            ConnectionState::Closed => (LogLevel::Warn, "Disconnected from capture server"),
        };
        self.add_log(level, EventCategory::Connection, message.to_string());
    }

    /// Apply the completion of a spawned request.
    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::InterfacesLoaded(Ok(interfaces)) => {
                debug!("Server reports {} interfaces", interfaces.len());
                self.manage.set_interfaces(interfaces);
            }
            AppEvent::InterfacesLoaded(Err(e)) => {
                self.manage.loading = false;
                self.add_log(
                    LogLevel::Error,
                    EventCategory::Interface,
                    format!("Failed to list interfaces: {}", e),
                );
            }
            AppEvent::ActionFinished { action, name, result } => {
                self.status_message = None;
                match result {
                    Ok(()) => self.add_log(LogLevel::Info, EventCategory::Interface, format!("{} {}", action, name)),
                    Err(e) => self.add_log(
                        LogLevel::Error,
                        EventCategory::Interface,
                        format!("{} {} failed: {}", action, name, e),
                    ),
                }
            }
        }
    }

    /// Add a log entry.
    pub fn add_log(&mut self, level: LogLevel, category: EventCategory, message: String) {
        self.logs.push_front(LogEntry {
            level,
            category,
            message,
            timestamp: Utc::now(),
        });

        while self.logs.len() > MAX_LOG_ENTRIES {
            self.logs.pop_back();
        }
    }

    /// Check for shutdown signal.
    pub fn check_shutdown(&mut self) -> bool {
        if self.shutdown_rx.has_changed().unwrap_or(false) && *self.shutdown_rx.borrow() {
            self.should_quit = true;
            return true;
        }
        false
    }
}
