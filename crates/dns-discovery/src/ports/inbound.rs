//! # Driving Ports (Inbound API)
//!
//! The API this crate exposes to the peer manager.

use crate::domain::{DnsNode, EntryFormatError};

/// Pull-based stream of candidate peers.
///
/// The stream is infinite and randomized: there is no ordering guarantee
/// across calls and the same peer may be returned again. Each call is
/// bounded and may return `None` even though later calls succeed.
///
/// # Example
///
/// ```rust,ignore
/// use dns_discovery::ports::PeerSource;
///
/// fn fill<S: PeerSource>(source: &S, want: usize) -> Vec<DnsNode> {
///     let mut found = Vec::new();
///     while found.len() < want && source.has_next() {
///         found.extend(source.current());
///     }
///     found
/// }
/// ```
pub trait PeerSource: Send + Sync {
    /// Anchor a tree given by its `tree://<key>@<domain>` URL.
    ///
    /// # Errors
    ///
    /// `EntryFormatError` if the URL is malformed. This is the only error
    /// discovery ever surfaces.
    fn add_tree(&self, url: &str) -> Result<(), EntryFormatError>;

    /// Next resolvable peer, or `None` after the bounded attempts ran out.
    fn next_node(&self) -> Option<DnsNode>;

    /// Pull the next peer into `current()`; `true` if one was found.
    fn has_next(&self) -> bool;

    /// Peer pulled by the last `has_next()` call.
    fn current(&self) -> Option<DnsNode>;

    /// Release every tree. The source stays exhausted afterwards.
    fn close(&self);
}
