//! Value Objects for DNS Discovery

/// Tuning knobs shared by every tree of a discovery session.
///
/// None of these values are part of the wire contract; the defaults are
/// policy and can be overridden per deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Attempts per `next()` call before giving up (default: 10).
    pub random_retry_times: usize,
    /// Seconds a synced root stays valid before it must be re-checked
    /// (default: 1800).
    pub root_validity_secs: u64,
    /// Resolver answers slower than this are discarded (default: 5000 ms).
    pub lookup_timeout_ms: u64,
    /// Largest accepted entry text in bytes (default: 2048).
    pub max_entry_size: usize,
    /// Upper bound on entries fetched by a full tree sync (default: 10000).
    pub max_tree_entries: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            random_retry_times: 10,
            root_validity_secs: 30 * 60,
            lookup_timeout_ms: 5_000,
            max_entry_size: 2048,
            max_tree_entries: 10_000,
        }
    }
}

impl DiscoveryConfig {
    /// Create a config suitable for testing (smaller values)
    pub fn for_testing() -> Self {
        Self {
            random_retry_times: 5,
            root_validity_secs: 60,
            lookup_timeout_ms: 1_000,
            max_entry_size: 2048,
            max_tree_entries: 256,
        }
    }

    /// Override the attempt bound.
    #[must_use]
    pub fn with_random_retry_times(mut self, times: usize) -> Self {
        self.random_retry_times = times;
        self
    }

    /// Override the root validity window.
    #[must_use]
    pub fn with_root_validity_secs(mut self, secs: u64) -> Self {
        self.root_validity_secs = secs;
        self
    }
}

/// Outcome of offering a freshly resolved root to a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootUpdate {
    /// First root for this tree, a higher sequence number, or the same
    /// sequence number over different subtrees.
    Adopted {
        /// Sequence number now in effect
        seq: u64,
        /// Node subtree root changed (or first root)
        nodes_changed: bool,
        /// Link subtree root changed (or first root)
        links_changed: bool,
    },
    /// Same sequence and subtrees as the cached root; only freshness was
    /// renewed.
    Unchanged {
        /// Sequence number in effect
        seq: u64,
    },
    /// Lower sequence than the cached root; the offer was ignored.
    Rollback {
        /// Sequence number kept
        kept: u64,
        /// Sequence number offered and rejected
        offered: u64,
    },
}

impl RootUpdate {
    /// Sequence number in effect after the update.
    pub fn effective_seq(&self) -> u64 {
        match *self {
            Self::Adopted { seq, .. } | Self::Unchanged { seq } => seq,
            Self::Rollback { kept, .. } => kept,
        }
    }
}

/// Synchronization phase of a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// No valid root yet.
    Fresh,
    /// Root known, neither subtree synced since it was adopted.
    RootSynced,
    /// Link subtree fully walked; no node descent has completed yet.
    LinkSubtreeSynced,
    /// A node descent completed; link subtree walk still pending.
    NodeSubtreeSynced,
    /// Both subtrees synced for the current root.
    SteadyState,
}
