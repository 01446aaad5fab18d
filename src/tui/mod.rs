//! Terminal dashboard.
//!
//! A ratatui front end over the sync engine:
//! - Interface sidebar with live rates
//! - Overview sparklines and per-interface detail tabs
//! - Subscription management popup
//! - Client event log
//! - Status bar with connection state
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┬────────────────────────────┐
//! │ Interfaces │ Overview / eth0            │
//! │  Overview  │ [Protocols|IP|MAC]         │
//! │  eth0  2KB │   TCP   1.2 KB/s  ▂▃▅▇     │
//! │  wlan0 off │   UDP   0.3 KB/s  ▁▁▂▁     │
//! ├────────────┴────────────────────────────┤
//! │                 Logs                    │
//! ├─────────────────────────────────────────┤
//! │ open | [Tab] switch | [m] manage | [q]  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The dashboard only reads published data sets. Subscription changes go
//! through [`SyncSupervisor`](crate::sync::SyncSupervisor) on spawned tasks.

pub mod app;
pub mod input;
pub mod layout;
pub mod runner;
pub mod state;
pub mod widgets;

pub use app::TuiApp;
pub use input::{handle_event, InputResult};
pub use layout::TuiLayout;
pub use runner::TuiRunner;
pub use state::{
    AppEvent, DetailTab, EventCategory, FocusPanel, InterfaceAction, LogEntry, LogLevel, ManageState, Popup,
    MAX_LOG_ENTRIES,
};
