//! Configuration schema definitions.
//!
//! Configuration is loaded from multiple sources and merged in order:
//!
//! 1. Built-in defaults
//! 2. System config: `/etc/netview/config.toml`
//! 3. User config: `~/.config/netview/config.toml`
//! 4. Additional config file (via `--config` flag)
//! 5. CLI flags (highest priority)
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [server]
//! url = "wss://capture.example.com:7200/rest"
//! ca_cert = "/etc/netview/capture-ca.pem"
//!
//! [sync]
//! poll_interval_ms = 1000
//! reconnect_delay_ms = 1000
//!
//! [interfaces]
//! listen = ["eth0"]
//! ```

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Capture server URL used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "wss://127.0.0.1:7200/rest";

/// Default poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default reconnect delay in milliseconds.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Capture server connection.
    #[serde(default)]
    pub server: ServerConfig,

    /// Polling and reconnect timing.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Interfaces to subscribe automatically.
    #[serde(default)]
    pub interfaces: InterfacesConfig,
}

impl Config {
    /// Built-in defaults.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig {
                url: DEFAULT_SERVER_URL.to_string(),
                ca_cert: None,
            },
            sync: SyncConfig {
                poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
                reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            },
            interfaces: InterfacesConfig::default(),
        }
    }

    /// Merge another config into this one.
    ///
    /// Lists are appended (without duplicates).
    /// Scalars are overridden when set in `other`.
    pub fn merge(&mut self, other: Config) {
        self.general.merge(other.general);
        self.server.merge(other.server);
        self.sync.merge(other.sync);
        self.interfaces.merge(other.interfaces);
    }

    /// Check values that cannot be expressed in the schema.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.parsed_url()?;
        if self.sync.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sync.poll_interval_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.sync.reconnect_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sync.reconnect_delay_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub log_level: String,
}

impl GeneralConfig {
    fn merge(&mut self, other: GeneralConfig) {
        if !other.log_level.is_empty() {
            self.log_level = other.log_level;
        }
    }
}

/// Capture server connection settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ServerConfig {
    /// WebSocket URL (`ws://` or `wss://`).
    #[serde(default)]
    pub url: String,

    /// Extra PEM CA bundle trusted for `wss://`.
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
}

impl ServerConfig {
    fn merge(&mut self, other: ServerConfig) {
        if !other.url.is_empty() {
            self.url = other.url;
        }
        if other.ca_cert.is_some() {
            self.ca_cert = other.ca_cert;
        }
    }

    /// Parse and check the server URL.
    pub fn parsed_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.url).map_err(|e| ConfigError::InvalidValue {
            field: "server.url".to_string(),
            message: format!("'{}': {}", self.url, e),
        })?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(ConfigError::InvalidValue {
                field: "server.url".to_string(),
                message: format!("unsupported scheme '{}' (expected ws or wss)", other),
            }),
        }
    }
}

/// Polling and reconnect timing.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SyncConfig {
    /// Target interval between sync cycles.
    #[serde(default)]
    pub poll_interval_ms: u64,

    /// Delay before reconnecting after a failure.
    #[serde(default)]
    pub reconnect_delay_ms: u64,
}

impl SyncConfig {
    fn merge(&mut self, other: SyncConfig) {
        if other.poll_interval_ms != 0 {
            self.poll_interval_ms = other.poll_interval_ms;
        }
        if other.reconnect_delay_ms != 0 {
            self.reconnect_delay_ms = other.reconnect_delay_ms;
        }
    }

    /// Poll interval as a duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reconnect delay as a duration.
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Interface subscriptions.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct InterfacesConfig {
    /// Subscribed on every new connection.
    #[serde(default)]
    pub listen: Vec<String>,
}

impl InterfacesConfig {
    fn merge(&mut self, other: InterfacesConfig) {
        for name in other.listen {
            if !self.listen.contains(&name) {
                self.listen.push(name);
            }
        }
    }
}
