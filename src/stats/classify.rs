//! Protocol and direction classification of counter keys.

use crate::control::protocol::PacketHeader;

/// EtherType for ARP.
pub const ETHERTYPE_ARP: u16 = 0x0806;
/// IP protocol number for ICMP.
pub const IPPROTO_ICMP: u8 = 1;
/// IP protocol number for TCP.
pub const IPPROTO_TCP: u8 = 6;
/// IP protocol number for UDP.
pub const IPPROTO_UDP: u8 = 17;
/// IP protocol number for ICMPv6.
pub const IPPROTO_ICMPV6: u8 = 58;

/// Display bucket for a packet's protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolBucket {
    /// TCP over IPv4/IPv6.
    Tcp,
    /// UDP over IPv4/IPv6.
    Udp,
    /// ICMP.
    Icmp,
    /// ICMPv6.
    IcmpV6,
    /// ARP (no IP header).
    Arp,
    /// Anything else.
    Other,
}

impl ProtocolBucket {
    /// Every bucket in display order.
    pub const ALL: [ProtocolBucket; 6] = [
        ProtocolBucket::Tcp,
        ProtocolBucket::Udp,
        ProtocolBucket::Icmp,
        ProtocolBucket::IcmpV6,
        ProtocolBucket::Arp,
        ProtocolBucket::Other,
    ];
}

impl std::fmt::Display for ProtocolBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolBucket::Tcp => write!(f, "TCP"),
            ProtocolBucket::Udp => write!(f, "UDP"),
            ProtocolBucket::Icmp => write!(f, "ICMP"),
            ProtocolBucket::IcmpV6 => write!(f, "ICMPv6"),
            ProtocolBucket::Arp => write!(f, "ARP"),
            ProtocolBucket::Other => write!(f, "Other"),
        }
    }
}

/// Traffic direction relative to the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Sent by the interface (upload).
    Outbound,
    /// Received by the interface (download).
    Inbound,
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Protocol bucket.
    pub bucket: ProtocolBucket,
    /// Direction.
    pub direction: Direction,
}

/// Protocol bucket of a header.
pub fn protocol_bucket(header: &PacketHeader) -> ProtocolBucket {
    match &header.ip_header {
        Some(ip) => match ip.protocol {
            IPPROTO_TCP => ProtocolBucket::Tcp,
            IPPROTO_UDP => ProtocolBucket::Udp,
            IPPROTO_ICMP => ProtocolBucket::Icmp,
            IPPROTO_ICMPV6 => ProtocolBucket::IcmpV6,
            _ => ProtocolBucket::Other,
        },
        None if header.protocol == ETHERTYPE_ARP => ProtocolBucket::Arp,
        None => ProtocolBucket::Other,
    }
}

/// Outbound iff the frame's source MAC is the interface's own MAC.
///
/// With no known MAC everything counts as inbound.
pub fn direction(header: &PacketHeader, self_mac: Option<&str>) -> Direction {
    if self_mac == Some(header.source.as_str()) {
        Direction::Outbound
    } else {
        Direction::Inbound
    }
}

/// Classify one header for an interface with MAC `self_mac`.
pub fn classify(header: &PacketHeader, self_mac: Option<&str>) -> Classification {
    Classification {
        bucket: protocol_bucket(header),
        direction: direction(header, self_mac),
    }
}
