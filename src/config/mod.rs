//! Configuration system for netview.
//!
//! This module provides TOML configuration loading with hierarchy merging.
//!
//! # Configuration Hierarchy
//!
//! 1. Built-in defaults
//! 2. System config: `/etc/netview/config.toml`
//! 3. User config: `~/.config/netview/config.toml`
//! 4. Additional config file (via `--config` flag)
//! 5. CLI flags (highest priority)
//!
//! No file is required; the defaults point at a capture server on
//! `wss://127.0.0.1:7200/rest`.
//!
//! # Merge Behavior
//!
//! - **Lists** (`interfaces.listen`) are **merged** (appended, deduplicated)
//! - **Scalars** (`server.url`, `sync.poll_interval_ms`, ...) are **overridden**

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::{ConfigLoader, SYSTEM_CONFIG_PATH};
pub use schema::{
    Config, GeneralConfig, InterfacesConfig, ServerConfig, SyncConfig, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_RECONNECT_DELAY_MS, DEFAULT_SERVER_URL,
};
