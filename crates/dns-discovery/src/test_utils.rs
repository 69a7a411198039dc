//! Test utilities for DNS discovery.
//!
//! Deterministic clocks, fixed keys and signed-tree fixtures.
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use dns_discovery::test_utils::FixedTimeSource;
//! use dns_discovery::TimeSource;
//!
//! let time_source = FixedTimeSource::new(1000);
//! assert_eq!(time_source.now().as_secs(), 1000);
//! ```

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};

use k256::ecdsa::SigningKey;

use crate::adapters::MemoryResolver;
use crate::domain::{LinkEntry, NodeEntry, NodeId, SignedTree, Timestamp, TreeBuilder};
use crate::ports::outbound::TimeSource;

/// A time source that returns a fixed timestamp.
#[derive(Debug, Clone)]
pub struct FixedTimeSource {
    timestamp: u64,
}

impl FixedTimeSource {
    /// Create a new fixed time source with the given timestamp (in seconds).
    pub fn new(timestamp: u64) -> Self {
        Self { timestamp }
    }

    /// Get the configured timestamp value.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.timestamp)
    }
}

/// A time source tests can move forward.
#[derive(Debug, Default)]
pub struct ControllableTimeSource {
    time: AtomicU64,
}

impl ControllableTimeSource {
    /// Start the clock at `initial` seconds.
    pub fn new(initial: u64) -> Self {
        Self {
            time: AtomicU64::new(initial),
        }
    }

    /// Advances the internal clock by the specified seconds.
    pub fn advance(&self, secs: u64) {
        self.time.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ControllableTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.time.load(Ordering::SeqCst))
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

/// Deterministic signing key. Seed 0 maps to 1 (the zero scalar is invalid).
pub fn signing_key(seed: u8) -> SigningKey {
    let mut bytes = [0u8; 32];
    bytes[31] = seed.max(1);
    bytes[0] = 0x11;
    SigningKey::from_slice(&bytes).expect("scalar below curve order")
}

/// Creates a NodeId with every byte set to `val`.
pub fn make_node_id(val: u8) -> NodeId {
    NodeId::new([val; 64])
}

/// IPv4 node entry at `10.0.<val>.1:30303`.
pub fn make_node(val: u8) -> NodeEntry {
    NodeEntry::new_v4(make_node_id(val), Ipv4Addr::new(10, 0, val, 1), 30303)
}

/// Signed tree over `node_ids` and `links`.
pub fn build_tree(key_seed: u8, seq: u64, node_ids: &[u8], links: &[LinkEntry]) -> SignedTree {
    TreeBuilder::new(seq)
        .with_nodes(node_ids.iter().map(|&v| make_node(v)))
        .with_links(links.iter().cloned())
        .build(&signing_key(key_seed))
        .expect("fixture key signs")
}

/// Build a tree, publish it under `domain` and return its bootstrap URL.
pub fn publish_tree(
    resolver: &MemoryResolver,
    domain: &str,
    key_seed: u8,
    seq: u64,
    node_ids: &[u8],
    links: &[LinkEntry],
) -> String {
    let tree = build_tree(key_seed, seq, node_ids, links);
    resolver.publish(domain, &tree);
    tree.link(domain).to_string()
}
