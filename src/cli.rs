//! Command-line interface definitions for netview.
//!
//! Uses clap's derive API for type-safe argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Live per-interface traffic dashboard for a remote capture server.
///
/// netview keeps a persistent WebSocket connection to the capture server,
/// polls it for new traffic buckets, and renders per-interface upload and
/// download rates broken down by protocol, IP address and MAC address.
#[derive(Parser, Debug)]
#[command(name = "netview")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// One-shot command to run (omit for the dashboard).
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Capture server URL (ws:// or wss://).
    ///
    /// Overrides `server.url` from the configuration files.
    #[arg(long = "url", value_name = "URL")]
    pub url: Option<String>,

    /// Extra CA certificate (PEM) trusted for wss:// connections.
    #[arg(long = "ca-cert", value_name = "PATH")]
    pub ca_cert: Option<PathBuf>,

    /// Path to additional config file.
    ///
    /// This config file is merged on top of system and user configs,
    /// giving it the highest priority (except for CLI flags).
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subscribe to an interface on every connection (repeatable).
    #[arg(short = 'l', long = "listen", value_name = "NAME")]
    pub listen: Vec<String>,

    /// Run without the dashboard, logging rates instead.
    #[arg(long = "headless")]
    pub headless: bool,

    /// Write logs to this file.
    ///
    /// Without it the dashboard discards log output so it cannot corrupt
    /// the screen; other modes log to stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity.
    ///
    /// Can be specified multiple times:
    /// -v    = info level
    /// -vv   = debug level
    /// -vvv  = trace level
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// One-shot commands: connect, issue one request, exit.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List interfaces available on the capture host.
    Interfaces,

    /// Start capturing on an interface.
    Listen {
        /// Interface name.
        name: String,
    },

    /// Stop capturing on an interface, keeping its history.
    Unlisten {
        /// Interface name.
        name: String,
    },

    /// Stop capturing on an interface and drop its history.
    Clear {
        /// Interface name.
        name: String,
    },
}

impl Cli {
    /// Whether the terminal dashboard will run.
    #[must_use]
    pub fn is_dashboard(&self) -> bool {
        self.command.is_none() && !self.headless
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_basic() {
        let cli = Cli::parse_from(["netview"]);
        assert!(cli.command.is_none());
        assert!(cli.url.is_none());
        assert!(cli.listen.is_empty());
        assert!(!cli.headless);
        assert_eq!(cli.verbose, 0);
        assert!(cli.is_dashboard());
    }

    #[test]
    fn test_cli_parse_with_options() {
        let cli = Cli::parse_from([
            "netview",
            "--url",
            "ws://10.0.0.2:7200/rest",
            "-l",
            "eth0",
            "--listen",
            "wlan0",
            "--headless",
            "--log-file",
            "/tmp/netview.log",
            "-vv",
        ]);

        assert_eq!(cli.url.as_deref(), Some("ws://10.0.0.2:7200/rest"));
        assert_eq!(cli.listen, vec!["eth0", "wlan0"]);
        assert!(cli.headless);
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/netview.log")));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.is_dashboard());
    }

    #[test]
    fn test_subcommands() {
        let tests = [
            (vec!["netview", "interfaces"], Commands::Interfaces),
            (
                vec!["netview", "listen", "eth0"],
                Commands::Listen { name: "eth0".to_string() },
            ),
            (
                vec!["netview", "unlisten", "eth0"],
                Commands::Unlisten { name: "eth0".to_string() },
            ),
            (
                vec!["netview", "clear", "eth0"],
                Commands::Clear { name: "eth0".to_string() },
            ),
        ];

        for (args, expected) in tests {
            let cli = Cli::parse_from(args);
            assert_eq!(cli.command, Some(expected));
            assert!(!cli.is_dashboard());
        }
    }

    #[test]
    fn test_subcommand_requires_name() {
        assert!(Cli::try_parse_from(["netview", "listen"]).is_err());
    }
}
