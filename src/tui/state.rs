//! TUI application state definitions.

use chrono::{DateTime, Utc};

/// Maximum number of log entries to keep in memory.
pub const MAX_LOG_ENTRIES: usize = 500;

/// Severity of a dashboard log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug-level message.
    Debug,
    /// Informational message.
    Info,
    /// Warning message.
    Warn,
    /// Error message.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => f.pad("DEBUG"),
            LogLevel::Info => f.pad("INFO"),
            LogLevel::Warn => f.pad("WARN"),
            LogLevel::Error => f.pad("ERROR"),
        }
    }
}

/// What a log entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    /// Connection state changes.
    Connection,
    /// Subscription requests.
    Interface,
    /// Dashboard itself.
    System,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Connection => write!(f, "CONN"),
            EventCategory::Interface => write!(f, "IFACE"),
            EventCategory::System => write!(f, "SYSTEM"),
        }
    }
}

/// Which panel has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusPanel {
    /// Interface list.
    #[default]
    Sidebar,
    /// Overview or interface detail.
    Detail,
    /// Log messages panel.
    Logs,
}

impl FocusPanel {
    /// Cycle to the next panel.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            FocusPanel::Sidebar => FocusPanel::Detail,
            FocusPanel::Detail => FocusPanel::Logs,
            FocusPanel::Logs => FocusPanel::Sidebar,
        }
    }

    /// Cycle to the previous panel.
    #[must_use]
    pub fn prev(self) -> Self {
        match self {
            FocusPanel::Sidebar => FocusPanel::Logs,
            FocusPanel::Detail => FocusPanel::Sidebar,
            FocusPanel::Logs => FocusPanel::Detail,
        }
    }
}

/// Tabs of the interface detail pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    /// Per-protocol rates.
    #[default]
    Protocols,
    /// Per-IP-address table.
    IpAddress,
    /// Per-MAC-address table.
    MacAddress,
}

impl DetailTab {
    /// All tabs in display order.
    pub const ALL: [DetailTab; 3] = [DetailTab::Protocols, DetailTab::IpAddress, DetailTab::MacAddress];

    /// Tab title.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            DetailTab::Protocols => "Protocols",
            DetailTab::IpAddress => "IP Address",
            DetailTab::MacAddress => "MAC Address",
        }
    }

    /// Position in [`DetailTab::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            DetailTab::Protocols => 0,
            DetailTab::IpAddress => 1,
            DetailTab::MacAddress => 2,
        }
    }

    /// Tab to the right, wrapping.
    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Tab to the left, wrapping.
    #[must_use]
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Modal dialog on top of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Popup {
    /// No popup open.
    #[default]
    None,
    /// Subscription management.
    Manage,
    /// Keybinding reference.
    Help,
}

/// Subscription request issued from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceAction {
    /// Start capturing.
    Listen,
    /// Stop capturing, keep history.
    NotListen,
    /// Stop capturing, drop history.
    Clear,
}

impl std::fmt::Display for InterfaceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceAction::Listen => write!(f, "listen"),
            InterfaceAction::NotListen => write!(f, "unlisten"),
            InterfaceAction::Clear => write!(f, "clear"),
        }
    }
}

/// Completion of a background request, delivered back to the app.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// `get_interfaces` finished.
    InterfacesLoaded(Result<Vec<String>, String>),
    /// A subscription request finished.
    ActionFinished {
        /// Request kind.
        action: InterfaceAction,
        /// Interface the request was for.
        name: String,
        /// Error message on failure.
        result: Result<(), String>,
    },
}

/// State of the manage popup.
#[derive(Debug, Clone, Default)]
pub struct ManageState {
    /// Interfaces reported by the server.
    pub interfaces: Vec<String>,
    /// A `get_interfaces` request is in flight.
    pub loading: bool,
    /// Highlighted row in `interfaces`.
    pub cursor: usize,
}

impl ManageState {
    /// Name under the cursor.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.interfaces.get(self.cursor).map(String::as_str)
    }

    /// Move the highlight up.
    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move the highlight down.
    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.interfaces.len() {
            self.cursor += 1;
        }
    }

    /// Replace the server list, keeping the cursor in range.
    pub fn set_interfaces(&mut self, interfaces: Vec<String>) {
        self.interfaces = interfaces;
        self.cursor = self.cursor.min(self.interfaces.len().saturating_sub(1));
        self.loading = false;
    }
}

/// A log entry for display.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Log level.
    pub level: LogLevel,
    /// Event category.
    pub category: EventCategory,
    /// The log message.
    pub message: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
}
