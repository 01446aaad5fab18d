//! netview: live per-interface traffic dashboard for a remote capture server
//!
//! The capture server records traffic per network interface and answers a
//! small tagged JSON protocol over a WebSocket. This crate keeps a local
//! mirror of that history in sync and renders it.
//!
//! # Architecture
//!
//! - **Control**: WebSocket transport, tagged request channel, reconnect supervisor
//! - **Sync**: Polling cadence, history merge, subscription management
//! - **Stats**: Per-protocol/IP/MAC aggregation and rate formatting
//! - **Config**: Hierarchical TOML configuration
//! - **TUI**: Terminal dashboard over the published data sets

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod cli;
pub mod cli_handler;
pub mod config;
pub mod control;
pub mod orchestrator;
pub mod stats;
pub mod sync;
pub mod tui;
