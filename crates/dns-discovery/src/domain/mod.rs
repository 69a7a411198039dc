//! # Domain Layer - DNS Tree Discovery
//!
//! Pure discovery logic: the tree model, the cross-tree link graph and the
//! per-tree sync state machine.
//!
//! ## Modules
//!
//! - `types` - Peers, timestamps, config value objects and errors
//! - `tree` - Entry codec, hashing, signatures and the tree builder
//! - `link_cache` - Backreferences between trees
//! - `client_tree` - Lazy, randomized sync of one tree

pub mod client_tree;
pub mod link_cache;
pub mod tree;
pub mod types;

pub use client_tree::{ClientTree, SyncContext};
pub use link_cache::{LinkCache, ROOT_PARENT};
pub use tree::*;
pub use types::*;
