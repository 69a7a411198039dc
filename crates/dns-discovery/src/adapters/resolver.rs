//! In-memory TXT record store implementing `Resolver`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::domain::{ResolutionError, SignedTree};
use crate::ports::Resolver;

/// Resolver backed by a map of DNS name → TXT text.
///
/// Names are matched case-insensitively. Every lookup is counted, including
/// those that fail, and the whole resolver can be switched offline to
/// simulate an outage.
///
/// # Example
///
/// ```rust
/// use dns_discovery::adapters::MemoryResolver;
/// use dns_discovery::ports::Resolver;
///
/// let resolver = MemoryResolver::new();
/// resolver.insert("Example.org", "tree-branch:");
/// assert_eq!(resolver.lookup_txt("example.org").unwrap(), "tree-branch:");
/// assert_eq!(resolver.lookup_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryResolver {
    records: RwLock<HashMap<String, String>>,
    lookups: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record at `name`, replacing any previous text.
    pub fn insert(&self, name: &str, text: impl Into<String>) {
        self.records
            .write()
            .insert(name.to_ascii_lowercase(), text.into());
    }

    /// Remove the record at `name`.
    pub fn remove(&self, name: &str) -> Option<String> {
        self.records.write().remove(&name.to_ascii_lowercase())
    }

    /// Publish every record of `tree` under `domain`.
    ///
    /// Records of a previously published version stay in place, the way a
    /// real zone keeps old entries until the publisher prunes them.
    pub fn publish(&self, domain: &str, tree: &SignedTree) {
        let mut records = self.records.write();
        for (name, text) in tree.to_txt(domain) {
            records.insert(name.to_ascii_lowercase(), text);
        }
    }

    /// Switch the simulated outage on or off.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Lookups served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Zero the lookup counter.
    pub fn reset_lookup_count(&self) {
        self.lookups.store(0, Ordering::SeqCst);
    }

    /// Records currently stored.
    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }
}

impl Resolver for MemoryResolver {
    fn lookup_txt(&self, name: &str) -> Result<String, ResolutionError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ResolutionError::Transport("resolver offline".to_string()));
        }
        self.records
            .read()
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound(name.to_string()))
    }
}
