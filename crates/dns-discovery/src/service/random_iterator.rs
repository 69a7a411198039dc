//! # Random Iterator
//!
//! Consumer-facing driver of a discovery session. Holds the active-tree
//! map, keeps it in line with the link cache, and turns one `next` call
//! into a bounded number of random descents.
//!
//! Tree selection is uniform, not weighted by tree size, so small federated
//! trees are not starved.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{
    ClientTree, DnsNode, EntryFormatError, LinkCache, LinkEntry, SyncContext, ROOT_PARENT,
};
use crate::ports::{ConfigProvider, PeerSource};
use crate::service::Client;

/// Lazy, infinite, randomized stream of peers from a set of trees.
///
/// Every method takes `&self`; the iterator can be shared across threads
/// behind an `Arc`. After [`close`](Self::close) it stays exhausted.
pub struct RandomIterator {
    client: Arc<Client>,
    links: Arc<LinkCache>,
    trees: DashMap<String, Arc<ClientTree>>,
    current: Mutex<Option<DnsNode>>,
    closed: AtomicBool,
}

impl RandomIterator {
    /// Create an empty session on `client`.
    pub fn new(client: Arc<Client>) -> Self {
        Self {
            client,
            links: Arc::new(LinkCache::new()),
            trees: DashMap::new(),
            current: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Anchor the tree at `url` as a bootstrap tree.
    ///
    /// The tree is picked up by the next rebuild.
    pub fn add_tree(&self, url: &str) -> Result<LinkEntry, EntryFormatError> {
        let link = LinkEntry::parse_url(url)?;
        if self.links.add_link(ROOT_PARENT, &link.to_string()) {
            info!(tree = %link, "Bootstrap tree added");
        }
        Ok(link)
    }

    /// Anchor every tree URL the provider lists.
    ///
    /// Malformed URLs are logged and skipped. Returns how many were anchored.
    pub fn add_trees_from(&self, provider: &dyn ConfigProvider) -> usize {
        provider
            .get_tree_urls()
            .iter()
            .filter(|url| match self.add_tree(url) {
                Ok(_) => true,
                Err(err) => {
                    warn!(url = %url, error = %err, "Skipping malformed tree URL");
                    false
                }
            })
            .count()
    }

    /// Drop the bootstrap anchor of `url`.
    ///
    /// The tree is evicted by the next rebuild unless another tree still
    /// links to it. Returns whether an anchor was removed.
    pub fn remove_tree(&self, url: &str) -> Result<bool, EntryFormatError> {
        let link = LinkEntry::parse_url(url)?;
        Ok(self.links.remove_link(ROOT_PARENT, &link.to_string()))
    }

    /// Next resolvable peer, or `None` after `random_retry_times` attempts.
    ///
    /// Never blocks beyond the attempts themselves and never surfaces an
    /// error: every failure just consumes one attempt.
    pub fn next_node(&self) -> Option<DnsNode> {
        let attempts = self.client.config().random_retry_times;
        for attempt in 0..attempts {
            if self.is_closed() {
                return None;
            }
            if self.links.take_changed() {
                self.rebuild_trees();
            }
            let Some(tree) = self.pick_tree() else {
                debug!("No active trees");
                return None;
            };
            match tree.sync_random() {
                Ok(node) if node.is_resolvable() => return Some(node),
                Ok(node) => debug!(tree = %tree.url(), node = %node.id, "Node has no address"),
                Err(err) => warn!(
                    tree = %tree.url(),
                    attempt,
                    error = %err,
                    "Random sync attempt failed"
                ),
            }
        }
        None
    }

    /// Pull the next peer into [`current`](Self::current).
    pub fn has_next(&self) -> bool {
        let node = self.next_node();
        let found = node.is_some();
        *self.current.lock() = node;
        found
    }

    /// Peer pulled by the last [`has_next`](Self::has_next).
    pub fn current(&self) -> Option<DnsNode> {
        self.current.lock().clone()
    }

    fn pick_tree(&self) -> Option<Arc<ClientTree>> {
        let trees: Vec<Arc<ClientTree>> = self
            .trees
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        if trees.is_empty() {
            return None;
        }
        let index = SyncContext::random_usize(self.client.as_ref(), trees.len()) % trees.len();
        trees.into_iter().nth(index)
    }

    /// Align the active-tree map with the link cache.
    ///
    /// Trees no longer referenced by anyone are evicted, together with the
    /// links they held, so trees reachable only through them go as well.
    /// Every referenced tree not yet tracked gets a fresh `ClientTree`.
    pub fn rebuild_trees(&self) {
        if self.is_closed() {
            return;
        }
        self.evict_unreferenced();

        let ctx: Arc<dyn SyncContext> = self.client.clone();
        for url in self.links.referenced_trees() {
            if self.is_closed() {
                break;
            }
            if self.trees.contains_key(&url) {
                continue;
            }
            match LinkEntry::parse_url(&url) {
                Ok(link) => {
                    let tree = ClientTree::new(link, Arc::clone(&ctx), Arc::clone(&self.links));
                    self.trees.entry(url.clone()).or_insert_with(|| Arc::new(tree));
                    info!(tree = %url, "Tree tracked");
                }
                Err(err) => warn!(tree = %url, error = %err, "Skipping malformed link"),
            }
        }

        // A concurrent close may have cleared the map mid-rebuild
        if self.is_closed() {
            self.trees.clear();
            return;
        }
        debug!(trees = self.trees.len(), "Trees rebuilt");
    }

    fn evict_unreferenced(&self) {
        loop {
            self.trees.retain(|url, _| {
                let keep = self.links.is_referenced(url);
                if !keep {
                    info!(tree = %url, "Tree evicted");
                }
                keep
            });

            let orphaned: Vec<String> = self
                .links
                .linking_trees()
                .into_iter()
                .filter(|parent| !self.trees.contains_key(parent))
                .collect();
            if orphaned.is_empty() {
                return;
            }
            for parent in &orphaned {
                self.links.reset_links(parent, &[]);
                debug!(tree = %parent, "Dropped links of untracked tree");
            }
        }
    }

    /// Release every tree. The iterator stays exhausted afterwards.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.trees.clear();
            *self.current.lock() = None;
            info!("Discovery iterator closed");
        }
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Trees currently tracked.
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Tracked tree for `url`, if any.
    pub fn tree(&self, url: &str) -> Option<Arc<ClientTree>> {
        self.trees.get(url).map(|entry| Arc::clone(entry.value()))
    }

    /// Session-wide link cache.
    pub fn link_cache(&self) -> &Arc<LinkCache> {
        &self.links
    }

    /// Client backing the session.
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }
}

impl Iterator for RandomIterator {
    type Item = DnsNode;

    fn next(&mut self) -> Option<DnsNode> {
        self.next_node()
    }
}

impl PeerSource for RandomIterator {
    fn add_tree(&self, url: &str) -> Result<(), EntryFormatError> {
        RandomIterator::add_tree(self, url).map(|_| ())
    }

    fn next_node(&self) -> Option<DnsNode> {
        RandomIterator::next_node(self)
    }

    fn has_next(&self) -> bool {
        RandomIterator::has_next(self)
    }

    fn current(&self) -> Option<DnsNode> {
        RandomIterator::current(self)
    }

    fn close(&self) {
        RandomIterator::close(self)
    }
}

impl std::fmt::Debug for RandomIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomIterator")
            .field("trees", &self.trees.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
