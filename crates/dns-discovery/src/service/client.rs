//! # Discovery Client
//!
//! Shared, stateless context for every tree of a session: the resolver
//! handle, the tuning knobs, the clock and the RNG. It holds no sync state,
//! so substituting a fake resolver is enough to test everything above it.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::adapters::{SystemTimeSource, ThreadRandomSource};
use crate::domain::{
    ContentHash, DiscoveryConfig, DnsDiscoveryError, DnsNode, EntryFormatError, LinkEntry,
    NodeEntry, ResolutionError, RootEntry, SyncContext, Timestamp, TreeEntry,
};
use crate::ports::{ConfigProvider, RandomSource, Resolver, TimeSource};
use crate::service::RandomIterator;

/// Every entry of one tree, as materialized by [`Client::sync_tree`].
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    /// Verified root
    pub root: RootEntry,
    /// Node leaves, in walk order
    pub nodes: Vec<NodeEntry>,
    /// Link leaves, in walk order
    pub links: Vec<LinkEntry>,
}

impl TreeSnapshot {
    /// Resolvable peers of the tree.
    pub fn dns_nodes(&self) -> Vec<DnsNode> {
        self.nodes
            .iter()
            .map(NodeEntry::to_dns_node)
            .filter(DnsNode::is_resolvable)
            .collect()
    }
}

/// Resolver access plus tuning knobs, shared by every tree.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use dns_discovery::adapters::MemoryResolver;
/// use dns_discovery::{Client, DiscoveryConfig};
///
/// let resolver = Arc::new(MemoryResolver::new());
/// let client = Arc::new(Client::new(resolver, DiscoveryConfig::default()));
/// let iterator = client.new_iterator();
/// assert!(iterator.next_node().is_none());
/// ```
pub struct Client {
    resolver: Arc<dyn Resolver>,
    config: DiscoveryConfig,
    time_source: Arc<dyn TimeSource>,
    random: Arc<dyn RandomSource>,
}

impl Client {
    /// Create a client using the system clock and the thread RNG.
    pub fn new(resolver: Arc<dyn Resolver>, config: DiscoveryConfig) -> Self {
        Self {
            resolver,
            config,
            time_source: Arc::new(SystemTimeSource::new()),
            random: Arc::new(ThreadRandomSource::new()),
        }
    }

    /// Create a client tuned by the provider's discovery config.
    ///
    /// Bootstrap trees are anchored per session with
    /// [`RandomIterator::add_trees_from`].
    pub fn from_provider(resolver: Arc<dyn Resolver>, provider: &dyn ConfigProvider) -> Self {
        Self::new(resolver, provider.get_discovery_config())
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// Replace the RNG.
    #[must_use]
    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Tuning knobs in effect.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Start a discovery session backed by this client.
    pub fn new_iterator(self: &Arc<Self>) -> RandomIterator {
        RandomIterator::new(Arc::clone(self))
    }

    // =========================================================================
    // RESOLUTION
    // =========================================================================

    /// Fetch the TXT record at `name`, enforcing the timeout and size bound.
    ///
    /// The resolver call itself is synchronous; an answer that took longer
    /// than `lookup_timeout_ms` is discarded.
    pub fn lookup(&self, name: &str) -> Result<String, DnsDiscoveryError> {
        let started = Instant::now();
        let text = self.resolver.lookup_txt(name)?;
        let elapsed = started.elapsed();
        if elapsed > Duration::from_millis(self.config.lookup_timeout_ms) {
            warn!(
                name = %name,
                elapsed_ms = elapsed.as_millis() as u64,
                "Discarding late answer"
            );
            return Err(ResolutionError::Timeout(name.to_string()).into());
        }
        if text.len() > self.config.max_entry_size {
            return Err(EntryFormatError::Oversized {
                size: text.len(),
                limit: self.config.max_entry_size,
            }
            .into());
        }
        Ok(text)
    }

    /// Fetch the root at the link's domain and verify it under the link's key.
    pub fn resolve_root(&self, link: &LinkEntry) -> Result<RootEntry, DnsDiscoveryError> {
        let text = self.lookup(&link.domain)?;
        match TreeEntry::parse(&text)? {
            TreeEntry::Root(root) => {
                root.verify_signature(&link.public_key)?;
                Ok(root)
            }
            other => Err(DnsDiscoveryError::UnexpectedEntry {
                subtree: "root",
                found: other.kind(),
            }),
        }
    }

    /// Fetch `<hash>.<domain>` and check it against its content address.
    pub fn resolve_entry(
        &self,
        domain: &str,
        hash: &ContentHash,
    ) -> Result<TreeEntry, DnsDiscoveryError> {
        let name = hash.subdomain(domain);
        let text = self.lookup(&name)?;
        let actual = ContentHash::of(&text);
        if actual != *hash {
            warn!(name = %name, expected = %hash, actual = %actual, "Content hash mismatch");
            return Err(DnsDiscoveryError::HashMismatch {
                name,
                expected: hash.to_string(),
                actual: actual.to_string(),
            });
        }
        debug!(name = %name, "Entry resolved");
        Ok(TreeEntry::parse(&text)?)
    }

    // =========================================================================
    // FULL SYNC
    // =========================================================================

    /// Fetch every entry of the tree at `url`, breadth first.
    ///
    /// # Errors
    ///
    /// Fails on the first entry that cannot be fetched or verified, and with
    /// `TreeTooLarge` once more than `max_tree_entries` entries were fetched.
    pub fn sync_tree(&self, url: &str) -> Result<TreeSnapshot, DnsDiscoveryError> {
        let link = LinkEntry::parse_url(url)?;
        let root = self.resolve_root(&link)?;
        let limit = self.config.max_tree_entries;

        let mut nodes = Vec::new();
        let mut links = Vec::new();
        let mut seen = HashSet::new();
        for (subtree, start) in [("node", root.node_root), ("link", root.link_root)] {
            let mut queue = VecDeque::from([start]);
            while let Some(hash) = queue.pop_front() {
                if !seen.insert(hash) {
                    continue;
                }
                if seen.len() > limit {
                    return Err(DnsDiscoveryError::TreeTooLarge { limit });
                }
                match self.resolve_entry(&link.domain, &hash)? {
                    TreeEntry::Branch(branch) => queue.extend(branch.children),
                    TreeEntry::Node(node) if subtree == "node" => nodes.push(node),
                    TreeEntry::Link(child) if subtree == "link" => links.push(child),
                    other => {
                        return Err(DnsDiscoveryError::UnexpectedEntry {
                            subtree,
                            found: other.kind(),
                        });
                    }
                }
            }
        }

        info!(
            tree = %url,
            seq = root.seq,
            nodes = nodes.len(),
            links = links.len(),
            "Tree synced"
        );
        Ok(TreeSnapshot { root, nodes, links })
    }
}

impl SyncContext for Client {
    fn resolve_root(&self, link: &LinkEntry) -> Result<RootEntry, DnsDiscoveryError> {
        Client::resolve_root(self, link)
    }

    fn resolve_entry(
        &self,
        domain: &str,
        hash: &ContentHash,
    ) -> Result<TreeEntry, DnsDiscoveryError> {
        Client::resolve_entry(self, domain, hash)
    }

    fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    fn random_usize(&self, max: usize) -> usize {
        self.random.random_usize(max)
    }

    fn root_validity_secs(&self) -> u64 {
        self.config.root_validity_secs
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
