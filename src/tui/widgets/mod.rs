//! TUI widgets for rendering panels.
//!
//! - `InterfacesWidget` - Sidebar with the overview entry and interface rates
//! - `OverviewWidget` - Upload/download sparklines for every interface
//! - `DetailWidget` - Protocol, IP and MAC breakdown of one interface
//! - `ManageWidget` - Subscription management popup
//! - `HelpWidget` - Keybinding popup
//! - `LogsWidget` - Client event log
//! - `StatusWidget` - Connection state and keybindings

pub mod detail;
pub mod help;
pub mod interfaces;
pub mod logs;
pub mod manage;
pub mod overview;
pub mod sparkline;
pub mod status;

pub use detail::DetailWidget;
pub use help::HelpWidget;
pub use interfaces::InterfacesWidget;
pub use logs::LogsWidget;
pub use manage::{centered_rect, ManageWidget};
pub use overview::OverviewWidget;
pub use status::StatusWidget;
