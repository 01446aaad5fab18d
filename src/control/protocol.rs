//! Wire message types for the capture server channel.
//!
//! Every exchange is a single JSON text frame. Requests carry a tag chosen by
//! the client and the server echoes it back alongside the response:
//!
//! ```text
//! ┌──────────┐  {"tag":3,"request":{"get":{"eth0":41000}}}   ┌──────────┐
//! │          │──────────────────────────────────────────────>│          │
//! │  Client  │                                               │  Server  │
//! │          │<──────────────────────────────────────────────│          │
//! └──────────┘  {"tag":3,"response":{"eth0":{...}}}          └──────────┘
//! ```
//!
//! Responses are decoded in two steps: the envelope is checked by hand so that
//! an absent `response` field is distinguishable from an explicit `null`, and
//! the payload is then decoded into the typed shape the caller expects.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Byte counts for one bucket, keyed by serialized [`PacketHeader`].
pub type Counters = BTreeMap<String, u64>;

/// Latest retained timestamp per interface, sent with [`Request::Get`].
pub type LatestTimestamps = BTreeMap<String, u64>;

/// Response payload of `get_all` and `get`: one segment per interface.
pub type SegmentMap = BTreeMap<String, InterfaceSegment>;

/// RPC requests understood by the capture server.
///
/// Unit variants serialize as bare strings (`"get_all"`), the rest as
/// single-key objects (`{"listen_interfaces":"eth0"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Request {
    /// Full snapshot of every interface the server tracks.
    GetAll,
    /// Names of the interfaces available for capture.
    GetInterfaces,
    /// Window of buckets newer than the given timestamps.
    Get(LatestTimestamps),
    /// Start capturing on an interface.
    ListenInterfaces(String),
    /// Stop capturing, keep history.
    NotListenInterfaces(String),
    /// Stop capturing and drop history.
    ClearInterfaces(String),
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::GetAll => write!(f, "get_all"),
            Request::GetInterfaces => write!(f, "get_interfaces"),
            Request::Get(latest) => write!(f, "get ({} interfaces)", latest.len()),
            Request::ListenInterfaces(name) => write!(f, "listen_interfaces {}", name),
            Request::NotListenInterfaces(name) => write!(f, "not_listen_interfaces {}", name),
            Request::ClearInterfaces(name) => write!(f, "clear_interfaces {}", name),
        }
    }
}

/// Outbound frame: `{"tag": n, "request": ...}`.
#[derive(Debug, Serialize)]
pub struct RequestEnvelope<'a> {
    /// Correlation tag.
    pub tag: u64,
    /// Request payload.
    pub request: &'a Request,
}

/// Inbound frame: `{"tag": n, "response": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    /// Correlation tag echoed by the server.
    pub tag: u64,
    /// Raw response payload, possibly `null`.
    pub response: Value,
}

impl ResponseEnvelope {
    /// Parse an inbound text frame.
    ///
    /// Returns `None` unless the frame is a JSON object with an unsigned
    /// integer `tag` and a `response` field (which may be `null`).
    pub fn parse(frame: &str) -> Option<Self> {
        let Value::Object(mut fields) = serde_json::from_str::<Value>(frame).ok()? else {
            return None;
        };
        let tag = fields.get("tag")?.as_u64()?;
        let response = fields.remove("response")?;
        Some(Self { tag, response })
    }
}

/// One timestamped aggregation point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u64, Counters)", into = "(u64, Counters)")]
pub struct Bucket {
    /// Milliseconds since the capture process started.
    pub timestamp: u64,
    /// Byte counts per header key.
    pub counters: Counters,
}

impl Bucket {
    /// Create a bucket.
    pub fn new(timestamp: u64, counters: Counters) -> Self {
        Self { timestamp, counters }
    }

    /// Sum of every counter in the bucket, saturating at `u64::MAX`.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.counters.values().fold(0u64, |total, bytes| total.saturating_add(*bytes))
    }
}

impl From<(u64, Counters)> for Bucket {
    fn from((timestamp, counters): (u64, Counters)) -> Self {
        Self { timestamp, counters }
    }
}

impl From<Bucket> for (u64, Counters) {
    fn from(bucket: Bucket) -> Self {
        (bucket.timestamp, bucket.counters)
    }
}

/// Server-returned window for one interface.
///
/// Leading entries may be placeholders (`None`) meaning "no data yet for this
/// bucket". On the wire a placeholder is either `null` or `[timestamp, null]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct InterfaceSegment {
    /// Window entries, oldest first.
    #[serde(default, deserialize_with = "deserialize_window")]
    pub history: Vec<Option<Bucket>>,
    /// Server stopped capturing on this interface.
    #[serde(default)]
    pub closed: bool,
    /// Hardware address, once the server has seen one.
    #[serde(default)]
    pub mac: Option<String>,
}

fn deserialize_window<'de, D>(deserializer: D) -> Result<Vec<Option<Bucket>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<(u64, Option<Counters>)>> = Vec::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|entry| match entry {
            Some((timestamp, Some(counters))) => Some(Bucket { timestamp, counters }),
            _ => None,
        })
        .collect())
}

/// Client-side retained state for one interface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceSnapshot {
    /// Buckets in strictly increasing timestamp order, no placeholders.
    pub history: Vec<Bucket>,
    /// Capture stopped, either locally or as reported by the server.
    pub closed: bool,
    /// Hardware address of the interface.
    pub mac: Option<String>,
    /// Closed locally and not yet confirmed by the server. No updates are
    /// merged while set.
    pub close_pending: bool,
}

impl InterfaceSnapshot {
    /// Timestamp of the newest retained bucket.
    #[must_use]
    pub fn latest_timestamp(&self) -> Option<u64> {
        self.history.last().map(|bucket| bucket.timestamp)
    }
}

/// Network-layer part of a packet header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpHeader {
    /// Source address.
    pub source: String,
    /// Destination address.
    pub destination: String,
    /// IP protocol number (6 = TCP, 17 = UDP, ...).
    pub protocol: u8,
}

/// Link-layer packet header as used for counter keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketHeader {
    /// EtherType.
    pub protocol: u16,
    /// Source MAC address.
    pub source: String,
    /// Destination MAC address.
    pub destination: String,
    /// Present for IPv4/IPv6 packets.
    #[serde(default)]
    pub ip_header: Option<IpHeader>,
}

impl PacketHeader {
    /// Decode a counter key. Returns `None` for keys that are not headers.
    pub fn from_key(key: &str) -> Option<Self> {
        serde_json::from_str(key).ok()
    }

    /// Encode as a counter key.
    pub fn to_key(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
