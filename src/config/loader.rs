//! Configuration loading with hierarchy merging.
//!
//! Sources are merged in order, later ones winning for scalars:
//!
//! 1. Built-in defaults
//! 2. System config: `/etc/netview/config.toml`
//! 3. User config: `~/.config/netview/config.toml`
//! 4. Additional config file (via `--config` flag)
//! 5. CLI flags (highest priority)
//!
//! The merged result is validated before it is returned.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::ConfigError;
use super::schema::{Config, InterfacesConfig, ServerConfig};
use crate::cli::Cli;

/// System-wide configuration path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/netview/config.toml";

/// User configuration directory name.
pub const USER_CONFIG_DIR: &str = "netview";

/// User configuration filename.
pub const USER_CONFIG_FILE: &str = "config.toml";

/// Configuration loader with support for hierarchy merging.
pub struct ConfigLoader {
    /// Path to system-wide configuration.
    system_path: PathBuf,
    /// Path to user configuration.
    user_path: PathBuf,
}

impl ConfigLoader {
    /// Create a new ConfigLoader with default paths.
    #[must_use]
    pub fn new() -> Self {
        let user_config_dir = dirs::config_dir()
            .map(|p| p.join(USER_CONFIG_DIR))
            .unwrap_or_else(|| PathBuf::from(".config").join(USER_CONFIG_DIR));

        Self {
            system_path: PathBuf::from(SYSTEM_CONFIG_PATH),
            user_path: user_config_dir.join(USER_CONFIG_FILE),
        }
    }

    /// Create a ConfigLoader with custom paths (for testing).
    #[must_use]
    pub fn with_paths(system_path: PathBuf, user_path: PathBuf) -> Self {
        Self {
            system_path,
            user_path,
        }
    }

    /// Path of the user config file.
    pub fn user_path(&self) -> &Path {
        &self.user_path
    }

    /// Load, merge and validate configuration from all sources.
    ///
    /// Missing system/user files are skipped; a missing `--config` file,
    /// invalid TOML, or a failed validation is an error.
    pub fn load(&self, cli: &Cli) -> Result<Config, ConfigError> {
        let mut config = Config::defaults();
        debug!("Loaded built-in default configuration");

        for path in [&self.system_path, &self.user_path] {
            match Self::load_file(path)? {
                Some(file_config) => {
                    config.merge(file_config);
                    debug!("Loaded config from {:?}", path);
                }
                None => debug!("No config found at {:?}", path),
            }
        }

        if let Some(ref cli_config_path) = cli.config {
            let cli_config = Self::load_file(cli_config_path)?.ok_or_else(|| ConfigError::NotFound {
                path: cli_config_path.clone(),
            })?;
            config.merge(cli_config);
            debug!("Loaded additional config from {:?}", cli_config_path);
        }

        config.merge(Self::cli_overrides(cli));

        config.validate()?;
        Ok(config)
    }

    /// Config fragment carrying the CLI flags.
    fn cli_overrides(cli: &Cli) -> Config {
        Config {
            server: ServerConfig {
                url: cli.url.clone().unwrap_or_default(),
                ca_cert: cli.ca_cert.clone(),
            },
            interfaces: InterfacesConfig {
                listen: cli.listen.clone(),
            },
            ..Default::default()
        }
    }

    /// Load a config file, returning None if it doesn't exist.
    fn load_file(path: &Path) -> Result<Option<Config>, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config: Config =
                    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                        path: path.to_path_buf(),
                        source: e,
                    })?;
                Ok(Some(config))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    fn create_test_cli(args: &[&str]) -> Cli {
        let mut argv = vec!["netview"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    fn loader_in(dir: &Path) -> ConfigLoader {
        ConfigLoader::with_paths(dir.join("system.toml"), dir.join("user.toml"))
    }

    #[test]
    fn test_missing_files_use_defaults() {
        let dir = tempdir().unwrap();
        let config = loader_in(dir.path()).load(&create_test_cli(&[])).unwrap();

        assert_eq!(config.server.url, crate::config::DEFAULT_SERVER_URL);
        assert_eq!(config.sync.poll_interval_ms, 1000);
        assert!(config.interfaces.listen.is_empty());
    }

    #[test]
    fn test_user_config_overrides_system() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("system.toml"),
            "[sync]\npoll_interval_ms = 2000\nreconnect_delay_ms = 5000\n",
        )
        .unwrap();
        fs::write(dir.path().join("user.toml"), "[sync]\npoll_interval_ms = 500\n").unwrap();

        let config = loader_in(dir.path()).load(&create_test_cli(&[])).unwrap();

        assert_eq!(config.sync.poll_interval_ms, 500);
        assert_eq!(config.sync.reconnect_delay_ms, 5000);
    }

    #[test]
    fn test_listen_lists_are_merged() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("system.toml"), "[interfaces]\nlisten = [\"eth0\"]\n").unwrap();
        fs::write(dir.path().join("user.toml"), "[interfaces]\nlisten = [\"wlan0\", \"eth0\"]\n").unwrap();

        let cli = create_test_cli(&["--listen", "lo"]);
        let config = loader_in(dir.path()).load(&cli).unwrap();

        assert_eq!(config.interfaces.listen, vec!["eth0", "wlan0", "lo"]);
    }

    #[test]
    fn test_cli_url_wins() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("user.toml"), "[server]\nurl = \"ws://10.0.0.1:7200/rest\"\n").unwrap();

        let cli = create_test_cli(&["--url", "ws://127.0.0.1:9000/rest"]);
        let config = loader_in(dir.path()).load(&cli).unwrap();

        assert_eq!(config.server.url, "ws://127.0.0.1:9000/rest");
    }

    #[test]
    fn test_additional_config_file() {
        let dir = tempdir().unwrap();
        let extra = dir.path().join("extra.toml");
        fs::write(&extra, "[general]\nlog_level = \"debug\"\n").unwrap();

        let cli = create_test_cli(&["-c", extra.to_str().unwrap()]);
        let config = loader_in(dir.path()).load(&cli).unwrap();

        assert_eq!(config.general.log_level, "debug");
    }

    #[test]
    fn test_missing_additional_config_is_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");

        let cli = create_test_cli(&["-c", missing.to_str().unwrap()]);
        let result = loader_in(dir.path()).load(&cli);

        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("system.toml"), "this is not valid TOML [[[").unwrap();

        let result = loader_in(dir.path()).load(&create_test_cli(&[]));

        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_invalid_merged_value_returns_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("user.toml"), "[server]\nurl = \"http://example.com\"\n").unwrap();

        let result = loader_in(dir.path()).load(&create_test_cli(&[]));

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
