//! Client orchestration and lifecycle management.
//!
//! Wires the reconnect supervisor (which owns the transport) to the sync
//! supervisor (which owns the data set), then runs them under the terminal
//! dashboard or the headless logger until the user quits.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::config::Config;
use crate::control::protocol::InterfaceSnapshot;
use crate::control::{Connect, ConnectionState, ReconnectSupervisor, WsConnector};
use crate::stats::{direction_series, format_optional_rate, interface_rate, InterfaceRate};
use crate::sync::{DataSet, SyncSupervisor};
use crate::tui::{TuiApp, TuiRunner};

/// Timing and subscriptions for a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Target interval between sync cycles.
    pub poll_interval: Duration,
    /// Delay before reconnecting.
    pub reconnect_delay: Duration,
    /// Interfaces subscribed on every connection.
    pub auto_listen: Vec<String>,
}

impl SessionSettings {
    /// Settings from merged configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.sync.poll_interval(),
            reconnect_delay: config.sync.reconnect_delay(),
            auto_listen: config.interfaces.listen.clone(),
        }
    }
}

/// Running reconnect and sync supervisors.
pub struct Session {
    sync: Arc<SyncSupervisor>,
    state: watch::Receiver<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
    reconnect_handle: JoinHandle<()>,
    sync_handle: JoinHandle<()>,
}

impl Session {
    /// Spawn both supervisors on the current runtime.
    ///
    /// Polling runs while `visibility` is `true`; dropping its sender stops
    /// the sync loop.
    pub fn start<C: Connect>(connector: C, settings: SessionSettings, visibility: watch::Receiver<bool>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let reconnect = Arc::new(ReconnectSupervisor::new(connector, settings.reconnect_delay));
        let sync = Arc::new(
            SyncSupervisor::new(reconnect.channel(), settings.poll_interval).with_auto_listen(settings.auto_listen),
        );
        let state = reconnect.state();

        let reconnect_shutdown = shutdown_rx.clone();
        let reconnect_handle = tokio::spawn(async move {
            reconnect.run(reconnect_shutdown).await;
        });

        let sync_task = sync.clone();
        let sync_handle = tokio::spawn(async move {
            sync_task.run(visibility, shutdown_rx).await;
        });

        debug!("Session started");

        Self {
            sync,
            state,
            shutdown_tx,
            reconnect_handle,
            sync_handle,
        }
    }

    /// The sync supervisor, for subscriptions and data.
    pub fn sync(&self) -> Arc<SyncSupervisor> {
        self.sync.clone()
    }

    /// Connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// A receiver that turns `true` when the session shuts down.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown and wait briefly for both supervisors.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        if tokio::time::timeout(Duration::from_secs(2), self.sync_handle).await.is_err() {
            warn!("Sync supervisor did not stop in time");
        }
        if tokio::time::timeout(Duration::from_secs(2), self.reconnect_handle).await.is_err() {
            warn!("Reconnect supervisor did not stop in time");
        }
        debug!("Session stopped");
    }
}

/// Build the WebSocket connector for the configured server.
pub fn connector_from_config(config: &Config) -> Result<WsConnector> {
    let url = config.server.parsed_url()?;
    WsConnector::new(url, config.server.ca_cert.as_deref()).context("Failed to set up connection to capture server")
}

/// Run the dashboard, or the headless logger with `--headless`.
pub fn run(cli: &Cli, config: &Config) -> Result<()> {
    let connector = connector_from_config(config)?;
    let settings = SessionSettings::from_config(config);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    info!("Capture server: {}", connector.url());

    if cli.headless {
        rt.block_on(run_headless(connector, settings))
    } else {
        rt.block_on(run_dashboard(connector, settings))
    }
}

async fn run_dashboard<C: Connect>(connector: C, settings: SessionSettings) -> Result<()> {
    let (visibility_tx, visibility_rx) = watch::channel(true);
    let session = Session::start(connector, settings, visibility_rx);

    let mut app = TuiApp::new(session.sync(), session.state(), visibility_tx, session.shutdown_signal());

    let result = match TuiRunner::new() {
        Ok(mut runner) => runner.run(&mut app).await.context("TUI error"),
        Err(e) => Err(e).context("Failed to initialize TUI"),
    };

    session.shutdown().await;
    result
}

/// Log every published data set until Ctrl-C.
pub async fn run_headless<C: Connect>(connector: C, settings: SessionSettings) -> Result<()> {
    let (visibility_tx, visibility_rx) = watch::channel(true);
    let session = Session::start(connector, settings, visibility_rx);

    let mut data = session.sync().subscribe();
    let mut state = session.state();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!("Running headless; press Ctrl-C to stop");

    loop {
        tokio::select! {
            changed = data.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = data.borrow_and_update().clone();
                log_rates(&snapshot);
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                info!("Connection {}", current);
            }
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    session.shutdown().await;
    drop(visibility_tx);
    Ok(())
}

fn log_rates(data: &DataSet) {
    for (name, snapshot) in data.iter() {
        info!("{}", rate_line(name, snapshot));
    }
}

/// One headless report line for an interface.
fn rate_line(name: &str, snapshot: &InterfaceSnapshot) -> String {
    match interface_rate(snapshot) {
        InterfaceRate::Offline => format!("{}: offline", name),
        InterfaceRate::Active(total) => {
            let series = direction_series(snapshot);
            format!(
                "{}: up {} down {} total {}",
                name,
                format_optional_rate(series.upload_rate()),
                format_optional_rate(series.download_rate()),
                format_optional_rate(total),
            )
        }
    }
}
