//! Reductions of interface history for display.
//!
//! All functions are pure and work on one [`InterfaceSnapshot`]. Counter keys
//! that do not decode as a [`PacketHeader`] are skipped.

use super::classify::{classify, direction, Direction, ProtocolBucket};
use crate::control::protocol::{Bucket, InterfaceSnapshot, PacketHeader};
use std::collections::BTreeMap;
use tracing::trace;

/// Upload and download byte counts, one point per bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionSeries {
    /// `(timestamp, bytes)` sent by the interface.
    pub upload: Vec<(u64, u64)>,
    /// `(timestamp, bytes)` received by the interface.
    pub download: Vec<(u64, u64)>,
}

impl DirectionSeries {
    fn push(&mut self, timestamp: u64, upload: u64, download: u64) {
        self.upload.push((timestamp, upload));
        self.download.push((timestamp, download));
    }

    /// Current upload rate in bytes per second.
    #[must_use]
    pub fn upload_rate(&self) -> Option<f64> {
        series_rate(&self.upload)
    }

    /// Current download rate in bytes per second.
    #[must_use]
    pub fn download_rate(&self) -> Option<f64> {
        series_rate(&self.download)
    }
}

/// Bytes per second given a byte count and elapsed milliseconds.
///
/// `None` when no time elapsed.
pub fn rate(bytes: u64, elapsed_ms: u64) -> Option<f64> {
    (elapsed_ms > 0).then(|| bytes as f64 * 1000.0 / elapsed_ms as f64)
}

/// Rate of the last point of a series, over the gap to the one before it.
pub fn series_rate(series: &[(u64, u64)]) -> Option<f64> {
    let [.., (previous, _), (last, bytes)] = series else {
        return None;
    };
    rate(*bytes, last.checked_sub(*previous)?)
}

/// Milliseconds between the last two buckets.
pub fn last_elapsed(history: &[Bucket]) -> Option<u64> {
    let [.., previous, last] = history else {
        return None;
    };
    last.timestamp.checked_sub(previous.timestamp)
}

fn decoded(bucket: &Bucket) -> impl Iterator<Item = (PacketHeader, u64)> + '_ {
    bucket.counters.iter().filter_map(|(key, bytes)| match PacketHeader::from_key(key) {
        Some(header) => Some((header, *bytes)),
        None => {
            trace!("Skipping unparsable header key {}", key);
            None
        }
    })
}

/// Per-bucket upload/download totals.
pub fn direction_series(snapshot: &InterfaceSnapshot) -> DirectionSeries {
    let self_mac = snapshot.mac.as_deref();
    let mut series = DirectionSeries::default();

    for bucket in &snapshot.history {
        let (mut upload, mut download) = (0u64, 0u64);
        for (header, bytes) in decoded(bucket) {
            match direction(&header, self_mac) {
                Direction::Outbound => upload = upload.saturating_add(bytes),
                Direction::Inbound => download = download.saturating_add(bytes),
            }
        }
        series.push(bucket.timestamp, upload, download);
    }
    series
}

/// Per-protocol upload/download series; every bucket of
/// [`ProtocolBucket::ALL`] is present.
pub fn protocol_series(snapshot: &InterfaceSnapshot) -> BTreeMap<ProtocolBucket, DirectionSeries> {
    let self_mac = snapshot.mac.as_deref();
    let mut result: BTreeMap<ProtocolBucket, DirectionSeries> = ProtocolBucket::ALL
        .into_iter()
        .map(|bucket| (bucket, DirectionSeries::default()))
        .collect();

    for bucket in &snapshot.history {
        let mut totals: BTreeMap<ProtocolBucket, (u64, u64)> = BTreeMap::new();
        for (header, bytes) in decoded(bucket) {
            let class = classify(&header, self_mac);
            let entry = totals.entry(class.bucket).or_default();
            match class.direction {
                Direction::Outbound => entry.0 = entry.0.saturating_add(bytes),
                Direction::Inbound => entry.1 = entry.1.saturating_add(bytes),
            }
        }
        for (protocol, series) in result.iter_mut() {
            let (upload, download) = totals.get(protocol).copied().unwrap_or_default();
            series.push(bucket.timestamp, upload, download);
        }
    }
    result
}

/// Rate shown next to an interface in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterfaceRate {
    /// The interface is closed.
    Offline,
    /// Bytes per second over the last bucket; `None` with under two buckets.
    Active(Option<f64>),
}

/// Combined upload+download rate of an interface.
pub fn interface_rate(snapshot: &InterfaceSnapshot) -> InterfaceRate {
    if snapshot.closed {
        return InterfaceRate::Offline;
    }
    let rate = match (snapshot.history.last(), last_elapsed(&snapshot.history)) {
        (Some(last), Some(elapsed)) => rate(last.total_bytes(), elapsed),
        _ => None,
    };
    InterfaceRate::Active(rate)
}

/// Sum of the rates of every active interface.
pub fn total_rate<'a>(snapshots: impl IntoIterator<Item = &'a InterfaceSnapshot>) -> f64 {
    snapshots
        .into_iter()
        .filter_map(|snapshot| match interface_rate(snapshot) {
            InterfaceRate::Active(rate) => rate,
            InterfaceRate::Offline => None,
        })
        .sum()
}

/// Traffic attributed to one address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressTraffic {
    /// IP or MAC address.
    pub address: String,
    /// Bytes sent by the interface, per timestamp.
    pub upload: BTreeMap<u64, u64>,
    /// Bytes received by the interface, per timestamp.
    pub download: BTreeMap<u64, u64>,
}

impl AddressTraffic {
    fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            ..Self::default()
        }
    }

    fn add(&mut self, timestamp: u64, bytes: u64, direction: Direction) {
        let side = match direction {
            Direction::Outbound => &mut self.upload,
            Direction::Inbound => &mut self.download,
        };
        let total = side.entry(timestamp).or_default();
        *total = total.saturating_add(bytes);
    }

    /// Total bytes in both directions across the window.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.upload
            .values()
            .chain(self.download.values())
            .fold(0u64, |total, bytes| total.saturating_add(*bytes))
    }

    /// Zero-filled series over the timestamps of `history`.
    pub fn series(&self, history: &[Bucket]) -> DirectionSeries {
        let mut series = DirectionSeries::default();
        for bucket in history {
            let t = bucket.timestamp;
            series.push(
                t,
                self.upload.get(&t).copied().unwrap_or(0),
                self.download.get(&t).copied().unwrap_or(0),
            );
        }
        series
    }

    /// `(upload, download)` rates over the last bucket of `history`.
    pub fn rates(&self, history: &[Bucket]) -> (Option<f64>, Option<f64>) {
        let (Some(last), Some(elapsed)) = (history.last(), last_elapsed(history)) else {
            return (None, None);
        };
        let at = |side: &BTreeMap<u64, u64>| rate(side.get(&last.timestamp).copied().unwrap_or(0), elapsed);
        (at(&self.upload), at(&self.download))
    }
}

fn sorted(table: BTreeMap<String, AddressTraffic>) -> Vec<AddressTraffic> {
    let mut entries: Vec<AddressTraffic> = table.into_values().collect();
    entries.sort_by(|a, b| b.total().cmp(&a.total()).then_with(|| a.address.cmp(&b.address)));
    entries
}

/// Traffic per IP address, from both ends of each IP header.
///
/// Sorted by total bytes descending, then address.
pub fn ip_table(snapshot: &InterfaceSnapshot) -> Vec<AddressTraffic> {
    let self_mac = snapshot.mac.as_deref();
    let mut table: BTreeMap<String, AddressTraffic> = BTreeMap::new();

    for bucket in &snapshot.history {
        for (header, bytes) in decoded(bucket) {
            let Some(ip) = &header.ip_header else {
                continue;
            };
            let dir = direction(&header, self_mac);
            for address in [&ip.source, &ip.destination] {
                table
                    .entry(address.clone())
                    .or_insert_with(|| AddressTraffic::new(address))
                    .add(bucket.timestamp, bytes, dir);
            }
        }
    }
    sorted(table)
}

/// Traffic per MAC address, from both ends of each frame.
///
/// The interface's own MAC is always present. Sorted like [`ip_table`].
pub fn mac_table(snapshot: &InterfaceSnapshot) -> Vec<AddressTraffic> {
    let self_mac = snapshot.mac.as_deref();
    let mut table: BTreeMap<String, AddressTraffic> = BTreeMap::new();
    if let Some(mac) = self_mac {
        table.insert(mac.to_string(), AddressTraffic::new(mac));
    }

    for bucket in &snapshot.history {
        for (header, bytes) in decoded(bucket) {
            let dir = direction(&header, self_mac);
            for address in [&header.source, &header.destination] {
                table
                    .entry(address.clone())
                    .or_insert_with(|| AddressTraffic::new(address))
                    .add(bucket.timestamp, bytes, dir);
            }
        }
    }
    sorted(table)
}
