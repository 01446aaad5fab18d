//! Transport lifecycle: connect, detect failure, retry.
//!
//! ```text
//!            handshake ok
//! Connecting ────────────► Open
//!     │                     │ error / remote close
//!     │ error               ▼
//!     └─────────────────► Closed ──(retry delay)──► Connecting
//! ```
//!
//! Each successful handshake yields a fresh [`Channel`], published through a
//! watch channel. When the connection drops the channel is unpublished and
//! disposed before the retry timer starts, so nothing ever observes a
//! channel whose transport is gone.

use super::channel::Channel;
use super::socket::{SocketResult, Transport};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default delay between a failure and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Establishes transports to the capture server.
pub trait Connect: Send + Sync + 'static {
    /// Perform one connection attempt.
    fn connect(&self) -> impl Future<Output = SocketResult<Transport>> + Send;
}

/// Connection state as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress.
    Connecting,
    /// Channel published.
    Open,
    /// Waiting to retry, or shut down.
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// Keeps one live channel to the server, reconnecting after failures.
pub struct ReconnectSupervisor<C> {
    connector: C,
    retry_delay: Duration,
    state: watch::Sender<ConnectionState>,
    channel: watch::Sender<Option<Arc<Channel>>>,
    attempts: watch::Sender<u64>,
}

impl<C: Connect> ReconnectSupervisor<C> {
    /// Create a supervisor. Nothing connects until [`run`](Self::run), but
    /// the state already reads `Connecting`.
    pub fn new(connector: C, retry_delay: Duration) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let (channel, _) = watch::channel(None);
        let (attempts, _) = watch::channel(0);
        Self {
            connector,
            retry_delay,
            state,
            channel,
            attempts,
        }
    }

    /// Subscribe to connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Subscribe to the currently published channel.
    pub fn channel(&self) -> watch::Receiver<Option<Arc<Channel>>> {
        self.channel.subscribe()
    }

    /// Subscribe to the retry counter (0 for the first attempt).
    pub fn attempts(&self) -> watch::Receiver<u64> {
        self.attempts.subscribe()
    }

    /// Run until `shutdown_rx` turns `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            self.state.send_replace(ConnectionState::Connecting);
            debug!(attempt = *self.attempts.borrow(), "Connecting");

            // Dropping the handshake future closes a half-open socket.
            let connected = tokio::select! {
                result = self.connector.connect() => result,
                _ = wait_for_shutdown(&mut shutdown_rx) => {
                    debug!("Shutdown during handshake, abandoning connection attempt");
                    break;
                }
            };

            match connected {
                Ok(transport) => {
                    let channel = Arc::new(Channel::new(transport));
                    self.state.send_replace(ConnectionState::Open);
                    self.channel.send_replace(Some(channel.clone()));
                    info!("Connection open");

                    let shutdown = tokio::select! {
                        _ = channel.closed() => false,
                        _ = wait_for_shutdown(&mut shutdown_rx) => true,
                    };

                    self.channel.send_replace(None);
                    channel.dispose();

                    if shutdown {
                        break;
                    }
                    warn!("Connection lost, retrying in {:?}", self.retry_delay);
                }
                Err(e) => warn!("Connection failed: {}, retrying in {:?}", e, self.retry_delay),
            }

            self.state.send_replace(ConnectionState::Closed);

            tokio::select! {
                _ = tokio::time::sleep(self.retry_delay) => {}
                _ = wait_for_shutdown(&mut shutdown_rx) => break,
            }
            self.attempts.send_modify(|attempts| *attempts += 1);
        }

        self.state.send_replace(ConnectionState::Closed);
        debug!("Reconnect supervisor stopped");
    }
}

/// Resolves once shutdown is signalled or the signal source is dropped.
pub(crate) async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|shutdown| *shutdown).await;
}
