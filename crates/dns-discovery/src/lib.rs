//! # DNS Tree Peer Discovery
//!
//! Bootstraps and refreshes a node's peer set from peer directories
//! published as signed, content-addressed trees of DNS TXT records.
//!
//! A tree is identified by a `tree://<base32-key>@<domain>` URL. Its root is
//! signed by the key in the URL; every other entry is authenticated by its
//! content hash. Trees may link to other trees, and a session follows those
//! links, tracking every tree some other tree (or the caller) references.
//!
//! Peers are produced lazily: each `next` call descends one random path of
//! one random tree, never the whole directory.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** Entry codec, tree model, link cache, per-tree sync
//! - **Ports Layer:** `Resolver`, `TimeSource`, `RandomSource`,
//!   `ConfigProvider` (driven) and `PeerSource` (driving)
//! - **Service Layer:** `Client` and `RandomIterator`
//! - **Adapters Layer:** In-memory resolver, system clock, RNG, config
//!
//! ## Feature Flags
//!
//! - `config` - TOML configuration provider (serde, toml)
//! - `test-utils` - Deterministic clocks and signed tree fixtures
//!
//! ## Example
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use std::sync::Arc;
//! use dns_discovery::adapters::MemoryResolver;
//! use dns_discovery::{Client, DiscoveryConfig, NodeEntry, NodeId, TreeBuilder};
//! use k256::ecdsa::SigningKey;
//!
//! // Publish a one-node tree
//! let key = SigningKey::from_slice(&[7u8; 32]).unwrap();
//! let node = NodeEntry::new_v4(NodeId::new([1u8; 64]), Ipv4Addr::new(10, 0, 0, 1), 30303);
//! let tree = TreeBuilder::new(1).with_node(node).build(&key).unwrap();
//! let resolver = Arc::new(MemoryResolver::new());
//! resolver.publish("nodes.example.org", &tree);
//!
//! // Discover it
//! let client = Arc::new(Client::new(resolver, DiscoveryConfig::default()));
//! let iterator = client.new_iterator();
//! iterator.add_tree(&tree.link("nodes.example.org").to_string()).unwrap();
//! let peer = iterator.next_node().unwrap();
//! assert_eq!(peer.tcp_port, 30303);
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Test utilities (FixedTimeSource, fixtures, etc.)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// RE-EXPORTS
// =============================================================================

// Domain model
pub use domain::{
    BranchEntry, ContentHash, DiscoveryConfig, DnsNode, LinkEntry, NodeEntry, NodeId, PublicKey,
    RootEntry, RootSignature, RootUpdate, SignedTree, SyncState, Timestamp, TreeBuilder,
    TreeEntry,
};

// Sync machinery
pub use domain::{ClientTree, LinkCache, SyncContext};

// Errors
pub use domain::{DnsDiscoveryError, EntryFormatError, ResolutionError, SignatureError};

// Port traits
pub use ports::{ConfigProvider, PeerSource, RandomSource, Resolver, TimeSource};

// Service
pub use service::{Client, RandomIterator, TreeSnapshot};
