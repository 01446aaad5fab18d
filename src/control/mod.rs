//! Connection to the capture server.
//!
//! - [`protocol`]: wire message types
//! - [`socket`]: WebSocket transport and in-process transport pairs
//! - [`tls`]: TLS client configuration for `wss://`
//! - [`channel`]: tagged request/response multiplexing
//! - [`reconnect`]: connection lifecycle and retry

pub mod channel;
pub mod protocol;
pub mod reconnect;
pub mod socket;
pub mod tls;

pub use channel::{Channel, ChannelError, ChannelResult};
pub use protocol::{Bucket, InterfaceSegment, InterfaceSnapshot, PacketHeader, Request};
pub use reconnect::{Connect, ConnectionState, ReconnectSupervisor, DEFAULT_RECONNECT_DELAY};
pub use socket::{SocketError, SocketResult, Transport, WsConnector};
