//! # Link Cache
//!
//! Cross-tree backreference graph: for every known tree URL, the set of
//! tree URLs whose link subtree references it. Bootstrap trees are anchored
//! under the empty parent key [`ROOT_PARENT`].
//!
//! The map is flat and keyed by child URL. Nothing ever walks it
//! recursively, so cyclic links (A → B → A) are just two map entries.
//!
//! ## Change Signal
//!
//! Every effective mutation raises an edge-triggered `changed` flag. The
//! iterator consumes it with [`LinkCache::take_changed`], an atomic swap:
//! a write that races a rebuild re-arms the flag for the next poll.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tracing::debug;

/// Parent key under which bootstrap trees are anchored.
pub const ROOT_PARENT: &str = "";

/// Tree URL → URLs of the trees referencing it.
#[derive(Debug, Default)]
pub struct LinkCache {
    backrefs: DashMap<String, HashSet<String>>,
    changed: AtomicBool,
}

impl LinkCache {
    /// Create an empty cache with the change flag cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `parent` references `child`.
    ///
    /// Returns `true` if the backref is new; only then is the change flag
    /// raised.
    pub fn add_link(&self, parent: &str, child: &str) -> bool {
        let inserted = self
            .backrefs
            .entry(child.to_string())
            .or_default()
            .insert(parent.to_string());
        if inserted {
            debug!(parent = %parent, child = %child, "Link added");
            self.changed.store(true, Ordering::Release);
        }
        inserted
    }

    /// Drop the backref from `parent` to `child`.
    ///
    /// A child left without parents disappears from the map. Returns `true`
    /// if a backref was removed.
    pub fn remove_link(&self, parent: &str, child: &str) -> bool {
        let removed = match self.backrefs.get_mut(child) {
            Some(mut parents) => parents.remove(parent),
            None => false,
        };
        if removed {
            self.backrefs.remove_if(child, |_, parents| parents.is_empty());
            debug!(parent = %parent, child = %child, "Link removed");
            self.changed.store(true, Ordering::Release);
        }
        removed
    }

    /// Replace every outgoing link of `parent` with `children`.
    ///
    /// Backrefs to children no longer listed are dropped; new ones are
    /// added. Returns `true` if anything changed.
    pub fn reset_links(&self, parent: &str, children: &[String]) -> bool {
        let wanted: HashSet<&str> = children.iter().map(String::as_str).collect();
        let stale: Vec<String> = self
            .backrefs
            .iter()
            .filter(|entry| {
                entry.value().contains(parent) && !wanted.contains(entry.key().as_str())
            })
            .map(|entry| entry.key().clone())
            .collect();

        let mut changed = false;
        for child in &stale {
            changed |= self.remove_link(parent, child);
        }
        for child in wanted {
            changed |= self.add_link(parent, child);
        }
        changed
    }

    /// Whether any tree (or the bootstrap anchor) still references `url`.
    pub fn is_referenced(&self, url: &str) -> bool {
        self.backrefs
            .get(url)
            .map(|parents| !parents.is_empty())
            .unwrap_or(false)
    }

    /// Parents referencing `url`.
    pub fn parents(&self, url: &str) -> Vec<String> {
        self.backrefs
            .get(url)
            .map(|parents| parents.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of every referenced tree URL.
    pub fn referenced_trees(&self) -> Vec<String> {
        self.backrefs
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Trees holding at least one outgoing link. The bootstrap anchor is not
    /// a tree and is left out.
    pub fn linking_trees(&self) -> HashSet<String> {
        self.backrefs
            .iter()
            .flat_map(|entry| entry.value().iter().cloned().collect::<Vec<_>>())
            .filter(|parent| parent != ROOT_PARENT)
            .collect()
    }

    /// Number of referenced trees.
    pub fn len(&self) -> usize {
        self.backrefs.len()
    }

    /// Whether no tree is referenced.
    pub fn is_empty(&self) -> bool {
        self.backrefs.is_empty()
    }

    /// Current value of the change flag.
    pub fn is_changed(&self) -> bool {
        self.changed.load(Ordering::Acquire)
    }

    /// Overwrite the change flag.
    pub fn set_changed(&self, changed: bool) {
        self.changed.store(changed, Ordering::Release);
    }

    /// Read and clear the change flag in one step.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }
}
