//! Traffic classification and display reductions.

pub mod aggregate;
pub mod classify;
pub mod format;

pub use aggregate::{
    direction_series, interface_rate, ip_table, mac_table, protocol_series, total_rate, AddressTraffic,
    DirectionSeries, InterfaceRate,
};
pub use classify::{classify, Classification, Direction, ProtocolBucket};
pub use format::{format_bytes, format_optional_rate, format_rate};
