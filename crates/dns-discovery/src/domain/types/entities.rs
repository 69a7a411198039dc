//! Core Domain Entities for DNS Discovery

use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Length of a node identifier in bytes (uncompressed secp256k1 key without prefix).
pub const NODE_ID_LEN: usize = 64;

/// 512-bit node identifier carried by node entries.
///
/// The identifier is the node's uncompressed public key without the `0x04`
/// prefix. It is opaque to discovery: two peers are the same peer iff their
/// ids are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub [u8; NODE_ID_LEN]);

impl NodeId {
    /// Create a NodeId from raw bytes.
    pub fn new(bytes: [u8; NODE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Create a NodeId from a slice, if it has exactly `NODE_ID_LEN` bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; NODE_ID_LEN] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; NODE_ID_LEN] {
        &self.0
    }

    /// Lowercase hex form used on the wire.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "NodeId({}..{})", &hex[..8], &hex[hex.len() - 8..])
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for NodeId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A peer resolved from a node entry, ready for the connection layer.
///
/// Ephemeral: produced by a random descent and handed to the consumer, never
/// persisted by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsNode {
    /// Peer identity.
    pub id: NodeId,
    /// IPv4 host, if published.
    pub host_v4: Option<std::net::Ipv4Addr>,
    /// IPv6 host, if published.
    pub host_v6: Option<std::net::Ipv6Addr>,
    /// TCP port for the wire protocol.
    pub tcp_port: u16,
    /// UDP port for the discovery protocol.
    pub udp_port: u16,
}

impl DnsNode {
    /// Preferred TCP socket address: IPv4 when published, otherwise IPv6.
    ///
    /// `None` means the node is not resolvable and must not be handed out.
    pub fn preferred_socket_addr(&self) -> Option<SocketAddr> {
        let ip = match (self.host_v4, self.host_v6) {
            (Some(v4), _) => IpAddr::V4(v4),
            (None, Some(v6)) => IpAddr::V6(v6),
            (None, None) => return None,
        };
        Some(SocketAddr::new(ip, self.tcp_port))
    }

    /// Preferred UDP socket address, same host selection as TCP.
    pub fn preferred_udp_addr(&self) -> Option<SocketAddr> {
        self.preferred_socket_addr()
            .map(|addr| SocketAddr::new(addr.ip(), self.udp_port))
    }

    /// Whether the node can be handed out to the connection layer.
    pub fn is_resolvable(&self) -> bool {
        self.preferred_socket_addr().is_some()
    }
}

/// Unix timestamp in seconds
///
/// Timestamps are clamped to a reasonable maximum so freshness arithmetic
/// can never overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Maximum reasonable timestamp (year 9999).
    pub const MAX_REASONABLE: u64 = 253_402_300_799;

    /// Create a new timestamp, clamping to MAX_REASONABLE.
    pub fn new(secs: u64) -> Self {
        Self(secs.min(Self::MAX_REASONABLE))
    }

    /// Get the underlying seconds value.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Add seconds to timestamp (saturating at MAX_REASONABLE).
    pub fn add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs).min(Self::MAX_REASONABLE))
    }

    /// Seconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn secs_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}
