//! # Discovery Tree Model
//!
//! A tree is published as TXT records. The signed root points at two
//! content-addressed subtrees: one whose leaves are peer endpoints, one
//! whose leaves link to other trees.
//!
//! ```text
//!                    root (signed, seq)
//!                   /                  \
//!          e: node subtree        l: link subtree
//!           branch ...               branch ...
//!          /   |    \               /       \
//!       node  node  node        link        link
//! ```
//!
//! ## Security Properties
//!
//! - Root authenticated by the key in the bootstrap URL
//! - Every other entry authenticated by its content hash
//! - Sequence number: prevents replay of old roots

// Semantic submodules
mod builder;
mod entry;
mod security;

// Re-export public API
pub use builder::{SignedTree, TreeBuilder, MAX_BRANCH_CHILDREN};
pub use entry::{
    BranchEntry, LinkEntry, NodeEntry, RootEntry, TreeEntry, BRANCH_PREFIX, LINK_PREFIX,
    NODE_PREFIX, ROOT_PREFIX,
};
pub use security::{keccak256, ContentHash, PublicKey, RootSignature, HASH_LEN, PUBLIC_KEY_LEN};
