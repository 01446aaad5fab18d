//! Polling loop and subscription lifecycle.
//!
//! The supervisor owns the authoritative data set. Every mutation replaces
//! the top-level map inside `send_modify`, so merges and optimistic updates
//! are serialized and subscribers can compare snapshots by pointer.
//!
//! # Loop
//!
//! ```text
//!          ┌──────────── channel or visibility changed ◄───────────┐
//!          ▼                                                      │
//!   new channel? ── yes ─► reset data set, auto-listen            │
//!          │                                                      │
//!   connected and visible? ── no ─► wait for a change ────────────┤
//!          │ yes                                                  │
//!          ▼                                                      │
//!   cycle ─► sleep until max(now, deadline + interval) ─► cycle ──┘
//! ```

use super::cadence::Cadence;
use super::error::{SyncError, SyncResult};
use super::merge::{latest_timestamps, merge_response};
use super::DataSet;
use crate::control::protocol::InterfaceSnapshot;
use crate::control::reconnect::wait_for_shutdown;
use crate::control::Channel;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Why a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    /// Channel or visibility changed; re-evaluate gating.
    Changed,
    /// Shutdown requested or a signal source went away.
    Stop,
}

/// Keeps the data set fresh through the currently published channel.
pub struct SyncSupervisor {
    data: watch::Sender<DataSet>,
    channel: watch::Receiver<Option<Arc<Channel>>>,
    poll_interval: Duration,
    auto_listen: Vec<String>,
}

impl SyncSupervisor {
    /// Create a supervisor reading channels from `channel`.
    pub fn new(channel: watch::Receiver<Option<Arc<Channel>>>, poll_interval: Duration) -> Self {
        let (data, _) = watch::channel(DataSet::default());
        Self {
            data,
            channel,
            poll_interval,
            auto_listen: Vec::new(),
        }
    }

    /// Interfaces to subscribe every time a new channel is published.
    #[must_use]
    pub fn with_auto_listen(mut self, names: Vec<String>) -> Self {
        self.auto_listen = names;
        self
    }

    /// Target interval between cycle starts.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Receiver of published data sets.
    pub fn subscribe(&self) -> watch::Receiver<DataSet> {
        self.data.subscribe()
    }

    /// Current data set.
    #[must_use]
    pub fn snapshot(&self) -> DataSet {
        self.data.borrow().clone()
    }

    fn current_channel(&self) -> SyncResult<Arc<Channel>> {
        self.channel.borrow().clone().ok_or(SyncError::NotConnected)
    }

    fn is_current(&self, channel: &Arc<Channel>) -> bool {
        self.channel
            .borrow()
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, channel))
    }

    /// Copy-on-write update of the top-level map.
    fn update(&self, mutate: impl FnOnce(&mut BTreeMap<String, InterfaceSnapshot>)) {
        self.data.send_modify(|data| {
            let mut next = (**data).clone();
            mutate(&mut next);
            *data = Arc::new(next);
        });
    }

    fn reset(&self) {
        self.data.send_replace(DataSet::default());
    }

    /// Run one sync cycle.
    ///
    /// Bootstraps with `get_all` while no interface has history, otherwise
    /// asks for everything newer than the retained timestamps.
    pub async fn sync_once(&self) -> SyncResult<()> {
        let channel = self.current_channel()?;
        let latest = latest_timestamps(&self.snapshot());

        let response = if latest.is_empty() {
            trace!("No retained history, requesting full snapshot");
            channel.get_all().await?
        } else {
            trace!("Requesting updates for {} interfaces", latest.len());
            channel.get(latest).await?
        };

        if !self.is_current(&channel) {
            debug!("Discarding response from a replaced channel");
            return Ok(());
        }

        self.data.send_modify(|data| {
            let merged = merge_response(data, response);
            *data = Arc::new(merged);
        });
        Ok(())
    }

    /// Subscribe to `name`. The empty snapshot appears before the RPC is sent.
    pub async fn listen_interface(&self, name: &str) -> SyncResult<()> {
        self.update(|data| {
            data.insert(name.to_string(), InterfaceSnapshot::default());
        });
        self.current_channel()?.listen_interface(name).await?;
        info!("Listening on {}", name);
        Ok(())
    }

    /// Unsubscribe from `name`, keeping its history locally.
    pub async fn not_listen_interface(&self, name: &str) -> SyncResult<()> {
        self.update(|data| {
            if let Some(snapshot) = data.get_mut(name) {
                snapshot.closed = true;
                snapshot.close_pending = true;
            }
        });
        self.current_channel()?.not_listen_interface(name).await?;
        info!("Stopped listening on {}", name);
        Ok(())
    }

    /// Unsubscribe from `name` and drop its history.
    pub async fn clear_interface(&self, name: &str) -> SyncResult<()> {
        self.update(|data| {
            data.remove(name);
        });
        self.current_channel()?.clear_interface(name).await?;
        info!("Cleared {}", name);
        Ok(())
    }

    /// Interfaces available on the capture host.
    pub async fn get_interfaces(&self) -> SyncResult<Vec<String>> {
        Ok(self.current_channel()?.get_interfaces().await?)
    }

    async fn listen_configured(&self) {
        for name in &self.auto_listen {
            if let Err(e) = self.listen_interface(name).await {
                warn!("Failed to listen on {}: {}", name, e);
            }
        }
    }

    /// Poll until shutdown.
    ///
    /// Cycles run only while a channel is published and `visibility` is
    /// `true`. Returns when `shutdown_rx` turns `true` or any signal source
    /// is dropped.
    pub async fn run(&self, mut visibility: watch::Receiver<bool>, mut shutdown_rx: watch::Receiver<bool>) {
        let mut channel_rx = self.channel.clone();
        let mut active: Option<Arc<Channel>> = None;

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let channel = channel_rx.borrow_and_update().clone();
            let visible = *visibility.borrow_and_update();

            if let Some(current) = &channel
                && !active.as_ref().is_some_and(|prev| Arc::ptr_eq(prev, current))
            {
                info!("New channel published, resetting data set");
                active = Some(current.clone());
                self.reset();
                self.listen_configured().await;
            }

            let wake = if channel.is_some() && visible {
                self.poll(&mut channel_rx, &mut visibility, &mut shutdown_rx).await
            } else {
                debug!(visible, connected = channel.is_some(), "Polling suspended");
                wait_for_change(&mut channel_rx, &mut visibility, &mut shutdown_rx).await
            };

            if wake == Wake::Stop {
                break;
            }
        }
        debug!("Sync supervisor stopped");
    }

    /// Run cycles on the cadence until gating changes.
    async fn poll(
        &self,
        channel_rx: &mut watch::Receiver<Option<Arc<Channel>>>,
        visibility: &mut watch::Receiver<bool>,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Wake {
        let mut cadence = Cadence::start(self.poll_interval, Instant::now());

        loop {
            tokio::select! {
                result = self.sync_once() => {
                    if let Err(e) = result {
                        warn!("Sync cycle failed: {}", e);
                    }
                }
                _ = wait_for_shutdown(shutdown_rx) => return Wake::Stop,
            }

            let deadline = cadence.advance(Instant::now());
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                wake = wait_for_change(channel_rx, visibility, shutdown_rx) => return wake,
            }
        }
    }
}

async fn wait_for_change(
    channel_rx: &mut watch::Receiver<Option<Arc<Channel>>>,
    visibility: &mut watch::Receiver<bool>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> Wake {
    tokio::select! {
        changed = channel_rx.changed() => if changed.is_ok() { Wake::Changed } else { Wake::Stop },
        changed = visibility.changed() => if changed.is_ok() { Wake::Changed } else { Wake::Stop },
        _ = wait_for_shutdown(shutdown_rx) => Wake::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::socket::{create_transport_pair, Transport};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    /// In-process capture server double.
    ///
    /// Records every request with its arrival time and answers via `reply`,
    /// optionally after a delay.
    fn spawn_server<F>(
        mut server: Transport,
        reply: F,
    ) -> mpsc::UnboundedReceiver<(Instant, Value)>
    where
        F: Fn(&Value) -> (Duration, Value) + Send + 'static,
    {
        let (log_tx, log_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(frame) = server.inbound.recv().await {
                let value: Value = serde_json::from_str(&frame).unwrap();
                let request = value["request"].clone();
                let _ = log_tx.send((Instant::now(), request.clone()));
                let (delay, response) = reply(&request);
                tokio::time::sleep(delay).await;
                let frame = json!({"tag": value["tag"], "response": response}).to_string();
                if server.outbound.send(frame).await.is_err() {
                    break;
                }
            }
        });
        log_rx
    }

    fn connected() -> (
        watch::Sender<Option<Arc<Channel>>>,
        Arc<Channel>,
        Transport,
    ) {
        let (client, server) = create_transport_pair();
        let channel = Arc::new(Channel::new(client));
        let (tx, _) = watch::channel(Some(channel.clone()));
        (tx, channel, server)
    }

    #[tokio::test]
    async fn test_listen_is_optimistic_then_get_all() {
        let (channel_tx, _channel, mut server) = connected();
        let supervisor = Arc::new(SyncSupervisor::new(
            channel_tx.subscribe(),
            Duration::from_millis(1000),
        ));

        let sup = supervisor.clone();
        let listen = tokio::spawn(async move { sup.listen_interface("eth0").await });

        // The RPC is on the wire, unanswered, and the empty snapshot is already there.
        let frame: Value = serde_json::from_str(&server.inbound.recv().await.unwrap()).unwrap();
        assert_eq!(frame["request"], json!({"listen_interfaces": "eth0"}));
        let snapshot = supervisor.snapshot();
        assert!(snapshot["eth0"].history.is_empty());
        assert!(!snapshot["eth0"].closed);
        assert!(snapshot["eth0"].mac.is_none());

        let ack = json!({"tag": frame["tag"], "response": true}).to_string();
        server.outbound.send(ack).await.unwrap();
        listen.await.unwrap().unwrap();

        let mut requests = spawn_server(server, |_| {
            (
                Duration::ZERO,
                json!({"eth0": {"history": [null, [1000, {"k": 1}], [2000, {"k": 2}]], "closed": false, "mac": "AA"}}),
            )
        });

        supervisor.sync_once().await.unwrap();
        assert_eq!(requests.recv().await.unwrap().1, json!("get_all"));

        let eth0 = supervisor.snapshot()["eth0"].clone();
        let timestamps: Vec<u64> = eth0.history.iter().map(|b| b.timestamp).collect();
        assert_eq!(timestamps, vec![1000, 2000]);
        assert_eq!(eth0.mac.as_deref(), Some("AA"));
    }

    #[tokio::test]
    async fn test_incremental_get_after_bootstrap() {
        let (channel_tx, _channel, server) = connected();
        let supervisor = SyncSupervisor::new(channel_tx.subscribe(), Duration::from_millis(1000));

        let mut requests = spawn_server(server, |request| {
            if request == &json!("get_all") {
                (Duration::ZERO, json!({"eth0": {"history": [[1000, {"k": 1}], [2000, {"k": 2}]]}}))
            } else {
                (Duration::ZERO, json!({"eth0": {"history": [null, [3000, {"k": 3}]]}}))
            }
        });

        supervisor.sync_once().await.unwrap();
        assert_eq!(requests.recv().await.unwrap().1, json!("get_all"));

        supervisor.sync_once().await.unwrap();
        assert_eq!(requests.recv().await.unwrap().1, json!({"get": {"eth0": 2000}}));

        let timestamps: Vec<u64> = supervisor.snapshot()["eth0"]
            .history
            .iter()
            .map(|b| b.timestamp)
            .collect();
        assert_eq!(timestamps, vec![2000, 3000]);
    }

    #[tokio::test]
    async fn test_not_listen_and_clear_are_optimistic() {
        let (channel_tx, _channel, server) = connected();
        let supervisor = SyncSupervisor::new(channel_tx.subscribe(), Duration::from_millis(1000));
        let _requests = spawn_server(server, |_| (Duration::ZERO, json!(true)));

        supervisor.listen_interface("eth0").await.unwrap();
        let before = supervisor.snapshot();

        supervisor.not_listen_interface("eth0").await.unwrap();
        let after = supervisor.snapshot();
        assert!(after["eth0"].closed);
        assert!(after["eth0"].close_pending);
        assert!(!before["eth0"].closed);
        assert!(!Arc::ptr_eq(&before, &after));

        supervisor.clear_interface("eth0").await.unwrap();
        assert!(!supervisor.snapshot().contains_key("eth0"));
    }

    #[tokio::test]
    async fn test_not_connected() {
        let (channel_tx, _) = watch::channel(None);
        let supervisor = SyncSupervisor::new(channel_tx.subscribe(), Duration::from_millis(1000));

        assert!(matches!(supervisor.sync_once().await, Err(SyncError::NotConnected)));
        assert!(matches!(supervisor.get_interfaces().await, Err(SyncError::NotConnected)));

        // Optimistic update still lands.
        assert!(supervisor.listen_interface("eth0").await.is_err());
        assert!(supervisor.snapshot().contains_key("eth0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cycle_drift_correction() {
        let (channel_tx, _channel, server) = connected();
        let supervisor = Arc::new(SyncSupervisor::new(
            channel_tx.subscribe(),
            Duration::from_millis(1000),
        ));

        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let c = count.clone();
        let mut requests = spawn_server(server, move |_| {
            // First cycle takes 1500 ms; empty responses keep every cycle a get_all.
            let n = c.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let delay = if n == 0 { Duration::from_millis(1500) } else { Duration::ZERO };
            (delay, json!({}))
        });

        let (_visible_tx, visible_rx) = watch::channel(true);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let start = Instant::now();
        let sup = supervisor.clone();
        let task = tokio::spawn(async move { sup.run(visible_rx, shutdown_rx).await });

        let (t0, _) = requests.recv().await.unwrap();
        let (t1, _) = requests.recv().await.unwrap();
        let (t2, _) = requests.recv().await.unwrap();

        let ms = |t: Instant| t.duration_since(start).as_millis();
        assert!(ms(t0) < 10);
        assert!((1500..1510).contains(&ms(t1)), "second cycle at {}", ms(t1));
        assert!((2500..2510).contains(&ms(t2)), "third cycle at {}", ms(t2));

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_view_suspends_polling() {
        let (channel_tx, _channel, server) = connected();
        let supervisor = Arc::new(SyncSupervisor::new(
            channel_tx.subscribe(),
            Duration::from_millis(1000),
        ));
        let mut requests = spawn_server(server, |_| (Duration::ZERO, json!({})));

        let (visible_tx, visible_rx) = watch::channel(false);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sup = supervisor.clone();
        let task = tokio::spawn(async move { sup.run(visible_rx, shutdown_rx).await });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(requests.try_recv().is_err());

        // Becoming visible triggers an immediate cycle.
        let shown = Instant::now();
        visible_tx.send(true).unwrap();
        let (t, _) = requests.recv().await.unwrap();
        assert!(t.duration_since(shown) < Duration::from_millis(10));

        visible_tx.send(false).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        while requests.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(requests.try_recv().is_err());

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_reschedules() {
        let (channel_tx, _channel, server) = connected();
        let supervisor = Arc::new(SyncSupervisor::new(
            channel_tx.subscribe(),
            Duration::from_millis(1000),
        ));
        // Null data on every request.
        let mut requests = spawn_server(server, |_| (Duration::ZERO, Value::Null));

        let (_visible_tx, visible_rx) = watch::channel(true);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sup = supervisor.clone();
        let task = tokio::spawn(async move { sup.run(visible_rx, shutdown_rx).await });

        for _ in 0..3 {
            assert_eq!(requests.recv().await.unwrap().1, json!("get_all"));
        }

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_channel_resets_and_auto_listens() {
        let (first_client, first_server) = create_transport_pair();
        let first = Arc::new(Channel::new(first_client));
        let (channel_tx, channel_rx) = watch::channel(Some(first.clone()));

        let supervisor = Arc::new(
            SyncSupervisor::new(channel_rx, Duration::from_millis(1000))
                .with_auto_listen(vec!["eth0".to_string()]),
        );
        let mut data = supervisor.subscribe();

        let mut first_requests = spawn_server(first_server, |request| {
            if request == &json!("get_all") {
                (Duration::ZERO, json!({"eth0": {"history": [[1000, {"k": 1}]]}}))
            } else {
                (Duration::ZERO, json!(true))
            }
        });

        let (_visible_tx, visible_rx) = watch::channel(true);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sup = supervisor.clone();
        let task = tokio::spawn(async move { sup.run(visible_rx, shutdown_rx).await });

        assert_eq!(
            first_requests.recv().await.unwrap().1,
            json!({"listen_interfaces": "eth0"})
        );
        data.wait_for(|d| d.get("eth0").is_some_and(|s| !s.history.is_empty()))
            .await
            .unwrap();

        // Reconnect: a fresh channel replaces the first one.
        let (second_client, second_server) = create_transport_pair();
        let second = Arc::new(Channel::new(second_client));
        let mut second_requests = spawn_server(second_server, |request| {
            if request == &json!("get_all") {
                (Duration::ZERO, json!({}))
            } else {
                (Duration::ZERO, json!(true))
            }
        });
        channel_tx.send_replace(Some(second));
        first.dispose();

        assert_eq!(
            second_requests.recv().await.unwrap().1,
            json!({"listen_interfaces": "eth0"})
        );
        assert_eq!(second_requests.recv().await.unwrap().1, json!("get_all"));
        let snapshot = supervisor.snapshot();
        assert!(snapshot["eth0"].history.is_empty());

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
