//! # Client Tree
//!
//! Synchronization state of one discovery tree.
//!
//! ## State Machine
//!
//! ```text
//! Fresh ──sync_root──> RootSynced ──┬─ link walk done ──> LinkSubtreeSynced ─┐
//!                                    └─ node descent ───> NodeSubtreeSynced ─┴─> SteadyState
//! ```
//!
//! A newly adopted root only resets the subtrees whose hash changed.
//!
//! ## Locking
//!
//! All mutable state sits behind one short-held mutex that is never held
//! across a resolver call. Trees sync independently of each other.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::domain::link_cache::LinkCache;
use crate::domain::{
    ContentHash, DnsDiscoveryError, DnsNode, LinkEntry, RootEntry, RootUpdate, SyncState,
    Timestamp, TreeEntry,
};

/// Everything a tree needs from its owning session.
///
/// Implemented by `service::Client`.
pub trait SyncContext: Send + Sync {
    /// Fetch and verify the root of the tree behind `link`.
    fn resolve_root(&self, link: &LinkEntry) -> Result<RootEntry, DnsDiscoveryError>;

    /// Fetch the entry with content address `hash` under `domain`.
    fn resolve_entry(&self, domain: &str, hash: &ContentHash)
        -> Result<TreeEntry, DnsDiscoveryError>;

    /// Current time.
    fn now(&self) -> Timestamp;

    /// Uniform value in `0..max`.
    fn random_usize(&self, max: usize) -> usize;

    /// Seconds a synced root stays valid.
    fn root_validity_secs(&self) -> u64;
}

/// Incremental breadth-first walk over the link subtree.
#[derive(Debug, Default)]
struct LinkWalk {
    pending: VecDeque<ContentHash>,
    visited: HashSet<ContentHash>,
    found: Vec<String>,
    done: bool,
}

impl LinkWalk {
    fn start(root: ContentHash) -> Self {
        Self {
            pending: VecDeque::from([root]),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct TreeState {
    root: Option<RootEntry>,
    last_root_check: Timestamp,
    node_cache: HashMap<ContentHash, TreeEntry>,
    nodes_synced: bool,
    link_walk: LinkWalk,
    signature_failures: u32,
}

impl TreeState {
    /// Apply the sequence rule to a verified root.
    fn offer_root(&mut self, root: RootEntry, now: Timestamp) -> RootUpdate {
        self.last_root_check = now;
        self.signature_failures = 0;

        let (nodes_changed, links_changed) = match self.root.as_ref() {
            Some(current) if root.seq < current.seq => {
                return RootUpdate::Rollback {
                    kept: current.seq,
                    offered: root.seq,
                };
            }
            Some(current) => match root.diff(current) {
                // Same seq, same subtrees: only freshness is renewed
                (false, false) if root.seq == current.seq => {
                    return RootUpdate::Unchanged { seq: root.seq };
                }
                changed => changed,
            },
            None => (true, true),
        };

        if nodes_changed {
            self.node_cache.clear();
            self.nodes_synced = false;
        }
        if links_changed {
            self.link_walk = LinkWalk::start(root.link_root);
        }
        let seq = root.seq;
        self.root = Some(root);
        RootUpdate::Adopted {
            seq,
            nodes_changed,
            links_changed,
        }
    }

    fn sync_state(&self) -> SyncState {
        match (&self.root, self.link_walk.done, self.nodes_synced) {
            (None, _, _) => SyncState::Fresh,
            (Some(_), true, true) => SyncState::SteadyState,
            (Some(_), true, false) => SyncState::LinkSubtreeSynced,
            (Some(_), false, true) => SyncState::NodeSubtreeSynced,
            (Some(_), false, false) => SyncState::RootSynced,
        }
    }
}

/// One tree of a discovery session, identified by its `tree://` URL.
pub struct ClientTree {
    link: LinkEntry,
    url: String,
    ctx: Arc<dyn SyncContext>,
    links: Arc<LinkCache>,
    state: Mutex<TreeState>,
}

impl ClientTree {
    /// Track the tree behind `link`. Nothing is fetched until the first sync.
    pub fn new(link: LinkEntry, ctx: Arc<dyn SyncContext>, links: Arc<LinkCache>) -> Self {
        Self {
            url: link.to_string(),
            link,
            ctx,
            links,
            state: Mutex::new(TreeState::default()),
        }
    }

    /// Canonical `tree://` URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Link this tree was created from.
    pub fn link(&self) -> &LinkEntry {
        &self.link
    }

    /// Root currently in effect.
    pub fn root(&self) -> Option<RootEntry> {
        self.state.lock().root.clone()
    }

    /// Synchronization phase.
    pub fn state(&self) -> SyncState {
        self.state.lock().sync_state()
    }

    /// Node subtree entries currently cached.
    pub fn cached_entries(&self) -> usize {
        self.state.lock().node_cache.len()
    }

    /// Signature failures since the last accepted root fetch.
    pub fn signature_failures(&self) -> u32 {
        self.state.lock().signature_failures
    }

    // =========================================================================
    // ROOT
    // =========================================================================

    /// Fetch, verify and offer the current root.
    ///
    /// A lower sequence number than the cached root is ignored and reported
    /// as [`RootUpdate::Rollback`]. Resolver and signature failures leave the
    /// state untouched.
    pub fn sync_root(&self) -> Result<RootUpdate, DnsDiscoveryError> {
        let fetched = match self.ctx.resolve_root(&self.link) {
            Ok(root) => root,
            Err(err) => {
                if matches!(err, DnsDiscoveryError::Signature(_)) {
                    let failures = {
                        let mut state = self.state.lock();
                        state.signature_failures = state.signature_failures.saturating_add(1);
                        state.signature_failures
                    };
                    warn!(tree = %self.url, failures, error = %err, "Root rejected");
                } else {
                    debug!(tree = %self.url, error = %err, "Root fetch failed");
                }
                return Err(err);
            }
        };

        let now = self.ctx.now();
        let update = self.state.lock().offer_root(fetched, now);
        match update {
            RootUpdate::Adopted {
                seq,
                nodes_changed,
                links_changed,
            } => info!(
                tree = %self.url,
                seq,
                nodes_changed,
                links_changed,
                "Root adopted"
            ),
            RootUpdate::Unchanged { seq } => debug!(tree = %self.url, seq, "Root unchanged"),
            RootUpdate::Rollback { kept, offered } => warn!(
                tree = %self.url,
                kept,
                offered,
                "Ignoring root with lower sequence number"
            ),
        }
        Ok(update)
    }

    fn root_expired(&self) -> bool {
        let now = self.ctx.now();
        let state = self.state.lock();
        state.root.is_none()
            || now.secs_since(state.last_root_check) >= self.ctx.root_validity_secs()
    }

    // =========================================================================
    // RANDOM DESCENT
    // =========================================================================

    /// One randomized attempt: refresh the root if stale, advance the link
    /// walk by one entry, then descend the node subtree to a leaf.
    pub fn sync_random(&self) -> Result<DnsNode, DnsDiscoveryError> {
        if self.root_expired() {
            self.sync_root()?;
        }
        if let Err(err) = self.sync_next_link() {
            warn!(tree = %self.url, error = %err, "Link subtree step failed");
        }
        self.descend_nodes()
    }

    fn descend_nodes(&self) -> Result<DnsNode, DnsDiscoveryError> {
        let start = self
            .state
            .lock()
            .root
            .as_ref()
            .map(|root| root.node_root)
            .ok_or_else(|| DnsDiscoveryError::NoRoot(self.url.clone()))?;

        let mut hash = start;
        loop {
            match self.fetch_node_entry(&hash)? {
                TreeEntry::Branch(branch) => {
                    let count = branch.children.len();
                    if count == 0 {
                        return Err(DnsDiscoveryError::EmptyBranch(hash.to_string()));
                    }
                    hash = branch.children[self.ctx.random_usize(count) % count];
                }
                TreeEntry::Node(node) => {
                    let mut state = self.state.lock();
                    if state.root.as_ref().map(|r| r.node_root) == Some(start) {
                        state.nodes_synced = true;
                    }
                    return Ok(node.to_dns_node());
                }
                other => {
                    return Err(DnsDiscoveryError::UnexpectedEntry {
                        subtree: "node",
                        found: other.kind(),
                    });
                }
            }
        }
    }

    fn fetch_node_entry(&self, hash: &ContentHash) -> Result<TreeEntry, DnsDiscoveryError> {
        let cached = self.state.lock().node_cache.get(hash).cloned();
        if let Some(entry) = cached {
            debug!(tree = %self.url, %hash, "Cache hit");
            return Ok(entry);
        }
        let entry = self.ctx.resolve_entry(&self.link.domain, hash)?;
        self.state.lock().node_cache.insert(*hash, entry.clone());
        Ok(entry)
    }

    // =========================================================================
    // LINK WALK
    // =========================================================================

    /// Advance the link subtree walk by at most one fetched entry.
    ///
    /// When the walk completes, the links found replace this tree's outgoing
    /// links in the link cache.
    fn sync_next_link(&self) -> Result<(), DnsDiscoveryError> {
        let head = {
            let state = self.state.lock();
            if state.root.is_none() || state.link_walk.done {
                return Ok(());
            }
            state.link_walk.pending.front().copied()
        };

        let fetched = head.map(|hash| (hash, self.ctx.resolve_entry(&self.link.domain, &hash)));

        let mut state = self.state.lock();
        let walk = &mut state.link_walk;
        if let Some((hash, result)) = fetched {
            // The walk may have restarted under a new root while unlocked
            if walk.pending.front() != Some(&hash) {
                return Ok(());
            }
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    if !err.is_retriable() {
                        walk.pending.pop_front();
                    }
                    return Err(err);
                }
            };
            walk.pending.pop_front();
            walk.visited.insert(hash);
            match entry {
                TreeEntry::Branch(branch) => {
                    let fresh: Vec<ContentHash> = branch
                        .children
                        .into_iter()
                        .filter(|child| !walk.visited.contains(child))
                        .collect();
                    walk.pending.extend(fresh);
                }
                TreeEntry::Link(link) => {
                    let url = link.to_string();
                    if url != self.url {
                        walk.found.push(url);
                    }
                }
                other => {
                    return Err(DnsDiscoveryError::UnexpectedEntry {
                        subtree: "link",
                        found: other.kind(),
                    });
                }
            }
        }

        if !walk.pending.is_empty() {
            return Ok(());
        }
        walk.done = true;
        let found = std::mem::take(&mut walk.found);
        drop(state);

        let changed = self.links.reset_links(&self.url, &found);
        info!(tree = %self.url, links = found.len(), changed, "Link subtree synced");
        Ok(())
    }
}

impl std::fmt::Debug for ClientTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientTree")
            .field("url", &self.url)
            .field("state", &self.state())
            .finish()
    }
}
