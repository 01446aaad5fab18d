//! Tagged request/response multiplexing over one transport.
//!
//! Many requests may be in flight at once. Each gets a fresh tag and a
//! pending completion handle; the dispatcher task matches inbound responses
//! to handles by tag, in whatever order the server answers.
//!
//! # Architecture
//!
//! ```text
//!  request(get_all) ─► tag 0 ─┐                      ┌─► {"tag":0,"request":"get_all"}
//!  request(get)     ─► tag 1 ─┤   pending: tag → tx  ├─► {"tag":1,"request":{"get":..}}
//!                             │                      │
//!         resolved  ◄─ tag 1 ◄┴── dispatcher task ◄──┴── {"tag":1,"response":..}
//! ```
//!
//! Disposal resolves every pending request with the `null` sentinel. The
//! typed helpers tell that apart from a real `null` response, so a request
//! cut off by a dropped connection never reads as an acknowledgement.

use super::protocol::{LatestTimestamps, Request, RequestEnvelope, ResponseEnvelope, SegmentMap};
use super::socket::Transport;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Errors from channel requests.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel was disposed before the request was issued.
    #[error("Channel disposed")]
    Disposed,
    /// The transport closed before the request was sent or answered.
    #[error("Transport closed")]
    Closed,
    /// The server answered a data request with `null`.
    #[error("No data")]
    NoData,
    /// Request could not be encoded or response had an unexpected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for channel requests.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// `None` marks a request released without a response.
type PendingTable = HashMap<u64, oneshot::Sender<Option<Value>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Multiplexed RPC channel over one [`Transport`].
pub struct Channel {
    next_tag: AtomicU64,
    pending: Arc<Mutex<PendingTable>>,
    outbound: Mutex<Option<mpsc::Sender<String>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    closed: Arc<watch::Sender<bool>>,
    disposed: AtomicBool,
}

impl Channel {
    /// Wrap a transport and start the inbound dispatcher.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(transport: Transport) -> Self {
        let Transport { outbound, inbound } = transport;
        let pending = Arc::new(Mutex::new(PendingTable::new()));
        let (closed, _) = watch::channel(false);
        let closed = Arc::new(closed);

        let dispatcher = tokio::spawn(dispatch(inbound, pending.clone(), closed.clone()));

        Self {
            next_tag: AtomicU64::new(0),
            pending,
            outbound: Mutex::new(Some(outbound)),
            dispatcher: Mutex::new(Some(dispatcher)),
            closed,
            disposed: AtomicBool::new(false),
        }
    }

    /// Send a request and wait for the matching response.
    ///
    /// Resolves with `Value::Null` if the channel is disposed or the inbound
    /// stream ends while the request is pending.
    pub async fn request(&self, request: &Request) -> ChannelResult<Value> {
        Ok(self.exchange(request).await?.unwrap_or(Value::Null))
    }

    /// Like [`request`](Self::request), but `None` when released unanswered.
    async fn exchange(&self, request: &Request) -> ChannelResult<Option<Value>> {
        let tag = self.next_tag.fetch_add(1, Ordering::Relaxed);
        let frame = serde_json::to_string(&RequestEnvelope { tag, request })?;
        let (tx, rx) = oneshot::channel();

        {
            let mut table = lock(&self.pending);
            if self.disposed.load(Ordering::Acquire) {
                return Err(ChannelError::Disposed);
            }
            if *self.closed.borrow() {
                return Err(ChannelError::Closed);
            }
            table.insert(tag, tx);
        }

        let Some(outbound) = lock(&self.outbound).clone() else {
            self.forget(tag);
            return Err(ChannelError::Disposed);
        };

        trace!(tag, "Sending {}", request);
        if outbound.send(frame).await.is_err() {
            self.forget(tag);
            return Err(ChannelError::Closed);
        }

        // A dropped handle means the table was cleared.
        Ok(rx.await.ok().flatten())
    }

    fn forget(&self, tag: u64) {
        lock(&self.pending).remove(&tag);
    }

    async fn fetch<T: DeserializeOwned>(&self, request: &Request) -> ChannelResult<T> {
        match self.exchange(request).await? {
            None => Err(ChannelError::Closed),
            Some(Value::Null) => Err(ChannelError::NoData),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    async fn acknowledge(&self, request: &Request) -> ChannelResult<()> {
        match self.exchange(request).await? {
            Some(_) => Ok(()),
            None => Err(ChannelError::Closed),
        }
    }

    /// Full snapshot of every tracked interface.
    pub async fn get_all(&self) -> ChannelResult<SegmentMap> {
        self.fetch(&Request::GetAll).await
    }

    /// Windows newer than the given per-interface timestamps.
    pub async fn get(&self, latest: LatestTimestamps) -> ChannelResult<SegmentMap> {
        self.fetch(&Request::Get(latest)).await
    }

    /// Interfaces available on the capture host.
    pub async fn get_interfaces(&self) -> ChannelResult<Vec<String>> {
        self.fetch(&Request::GetInterfaces).await
    }

    /// Start capturing on `name`.
    pub async fn listen_interface(&self, name: &str) -> ChannelResult<()> {
        self.acknowledge(&Request::ListenInterfaces(name.to_string())).await
    }

    /// Stop capturing on `name`, keeping its history on the server.
    pub async fn not_listen_interface(&self, name: &str) -> ChannelResult<()> {
        self.acknowledge(&Request::NotListenInterfaces(name.to_string())).await
    }

    /// Stop capturing on `name` and drop its history.
    pub async fn clear_interface(&self, name: &str) -> ChannelResult<()> {
        self.acknowledge(&Request::ClearInterfaces(name.to_string())).await
    }

    /// Number of requests awaiting a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Completes once the inbound stream ends or the channel is disposed.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives as long as `self`, so this only returns on `true`.
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Detach from the transport and resolve pending requests with `null`.
    ///
    /// Idempotent. Also runs on drop.
    pub fn dispose(&self) {
        let drained: Vec<_> = {
            let mut table = lock(&self.pending);
            if self.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            table.drain().map(|(_, tx)| tx).collect()
        };

        if let Some(handle) = lock(&self.dispatcher).take() {
            handle.abort();
        }
        lock(&self.outbound).take();
        self.closed.send_replace(true);

        debug!("Channel disposed ({} pending requests released)", drained.len());
        for tx in drained {
            let _ = tx.send(None);
        }
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Route inbound frames to pending requests until the transport ends.
async fn dispatch(
    mut inbound: mpsc::Receiver<String>,
    pending: Arc<Mutex<PendingTable>>,
    closed: Arc<watch::Sender<bool>>,
) {
    while let Some(frame) = inbound.recv().await {
        let Some(envelope) = ResponseEnvelope::parse(&frame) else {
            trace!("Dropping malformed frame: {}", frame);
            continue;
        };

        let waiter = lock(&pending).remove(&envelope.tag);
        match waiter {
            Some(tx) => {
                let _ = tx.send(Some(envelope.response));
            }
            None => trace!(tag = envelope.tag, "Dropping response for unknown tag"),
        }
    }

    debug!("Channel inbound stream ended");
    let drained: Vec<_> = {
        let mut table = lock(&pending);
        closed.send_replace(true);
        table.drain().map(|(_, tx)| tx).collect()
    };
    for tx in drained {
        let _ = tx.send(None);
    }
}
