//! Tree construction.
//!
//! Lays node and link leaves out into branch layers, signs the root and
//! renders the TXT records a publisher would upload. Uploading them is the
//! publisher's job.

use std::collections::BTreeMap;

use k256::ecdsa::SigningKey;

use super::entry::{BranchEntry, LinkEntry, NodeEntry, RootEntry, TreeEntry};
use super::security::{ContentHash, PublicKey};
use crate::domain::SignatureError;

/// Maximum children per branch, so a branch fits one TXT record.
pub const MAX_BRANCH_CHILDREN: usize = 13;

/// Collects leaves for one tree.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    seq: u64,
    nodes: Vec<NodeEntry>,
    links: Vec<LinkEntry>,
}

impl TreeBuilder {
    /// Start a tree with the given sequence number.
    pub fn new(seq: u64) -> Self {
        Self {
            seq,
            ..Self::default()
        }
    }

    /// Add a node leaf.
    #[must_use]
    pub fn with_node(mut self, node: NodeEntry) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add several node leaves.
    #[must_use]
    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = NodeEntry>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Add a link leaf.
    #[must_use]
    pub fn with_link(mut self, link: LinkEntry) -> Self {
        self.links.push(link);
        self
    }

    /// Add several link leaves.
    #[must_use]
    pub fn with_links(mut self, links: impl IntoIterator<Item = LinkEntry>) -> Self {
        self.links.extend(links);
        self
    }

    /// Lay out both subtrees and sign the root.
    pub fn build(self, key: &SigningKey) -> Result<SignedTree, SignatureError> {
        let mut entries = BTreeMap::new();
        let node_root = build_subtree(
            self.nodes.into_iter().map(TreeEntry::from).collect(),
            &mut entries,
        );
        let link_root = build_subtree(
            self.links.into_iter().map(TreeEntry::from).collect(),
            &mut entries,
        );
        let root = RootEntry::sign(node_root, link_root, self.seq, key)?;
        Ok(SignedTree {
            root,
            public_key: PublicKey::from_signing_key(key),
            entries,
        })
    }
}

/// Builds branch layers bottom-up until one branch covers everything.
///
/// An empty subtree is a single empty branch.
fn build_subtree(
    mut leaves: Vec<TreeEntry>,
    entries: &mut BTreeMap<ContentHash, TreeEntry>,
) -> ContentHash {
    leaves.sort_by_cached_key(|leaf| leaf.to_string());
    let mut layer: Vec<ContentHash> = leaves
        .into_iter()
        .map(|leaf| {
            let hash = leaf.hash();
            entries.insert(hash, leaf);
            hash
        })
        .collect();

    loop {
        if layer.len() <= MAX_BRANCH_CHILDREN {
            let branch = TreeEntry::Branch(BranchEntry::new(layer));
            let hash = branch.hash();
            entries.insert(hash, branch);
            return hash;
        }
        layer = layer
            .chunks(MAX_BRANCH_CHILDREN)
            .map(|chunk| {
                let branch = TreeEntry::Branch(BranchEntry::new(chunk.to_vec()));
                let hash = branch.hash();
                entries.insert(hash, branch);
                hash
            })
            .collect();
    }
}

/// A fully laid-out, signed tree.
#[derive(Debug, Clone)]
pub struct SignedTree {
    /// Signed root
    pub root: RootEntry,
    /// Key that verifies the root
    pub public_key: PublicKey,
    entries: BTreeMap<ContentHash, TreeEntry>,
}

impl SignedTree {
    /// Every non-root entry by content hash.
    pub fn entries(&self) -> &BTreeMap<ContentHash, TreeEntry> {
        &self.entries
    }

    /// Link pointing at this tree when published under `domain`.
    pub fn link(&self, domain: &str) -> LinkEntry {
        LinkEntry::new(self.public_key, domain)
    }

    /// TXT records keyed by DNS name: the root at `domain`, every other
    /// entry at `<hash>.<domain>`.
    pub fn to_txt(&self, domain: &str) -> BTreeMap<String, String> {
        let mut records = BTreeMap::new();
        records.insert(domain.to_string(), self.root.to_string());
        for (hash, entry) in &self.entries {
            records.insert(hash.subdomain(domain), entry.to_string());
        }
        records
    }
}
