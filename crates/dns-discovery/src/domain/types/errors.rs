//! # Domain Errors
//!
//! Error taxonomy for DNS tree discovery.
//!
//! - `EntryFormatError`: malformed input, permanent. Dropped, never retried.
//! - `SignatureError`: a root failed verification. The tree stays unusable
//!   until a later valid root arrives.
//! - `ResolutionError`: transport failure, transient. Retried by the
//!   iterator's bounded loop.
//!
//! Sequence rollbacks are not errors: an older root is ignored silently.

use thiserror::Error;

/// Malformed entry text or bootstrap URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryFormatError {
    /// The text does not start with any known entry discriminator.
    #[error("unknown entry type: {0:?}")]
    UnknownPrefix(String),

    /// A required field is absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A field appears more than once.
    #[error("duplicate field `{0}`")]
    DuplicateField(String),

    /// A field this entry kind does not define.
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// A field is present but cannot be decoded.
    #[error("invalid `{field}`: {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// A content hash is not 16 bytes of base32.
    #[error("invalid content hash: {0:?}")]
    InvalidHash(String),

    /// The public key is not a valid compressed secp256k1 point.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// A `tree://` URL is not `tree://<key>@<domain>`.
    #[error("invalid tree url: {0:?}")]
    InvalidUrl(String),

    /// Entry text exceeds the configured maximum size.
    #[error("entry of {size} bytes exceeds limit of {limit}")]
    Oversized {
        /// Actual size
        size: usize,
        /// Configured limit
        limit: usize,
    },
}

/// Root signature verification failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The signature bytes do not form an ECDSA signature.
    #[error("malformed root signature")]
    Malformed,

    /// The signature does not verify under the tree's public key.
    #[error("root signature does not match tree key")]
    Mismatch,
}

/// Failure of the external TXT resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No TXT record exists at the name.
    #[error("no TXT record at {0}")]
    NotFound(String),

    /// The lookup did not complete in time.
    #[error("lookup of {0} timed out")]
    Timeout(String),

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors raised while synchronizing a tree.
///
/// Every variant is absorbed by the iterator as "this attempt yielded
/// nothing". Only `EntryFormat` from a bootstrap URL reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnsDiscoveryError {
    /// Entry text failed to parse.
    #[error("malformed entry: {0}")]
    EntryFormat(#[from] EntryFormatError),

    /// Root failed signature verification.
    #[error("signature check failed: {0}")]
    Signature(#[from] SignatureError),

    /// Resolver could not deliver the record.
    #[error("resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    /// Fetched entry does not hash to the referenced content address.
    #[error("hash mismatch at {name}: expected {expected}, got {actual}")]
    HashMismatch {
        /// DNS name that was queried
        name: String,
        /// Hash referenced by the parent
        expected: String,
        /// Hash of the text actually received
        actual: String,
    },

    /// An entry of the wrong kind for its position in the tree.
    #[error("unexpected {found} entry in {subtree} subtree")]
    UnexpectedEntry {
        /// Subtree being walked
        subtree: &'static str,
        /// Kind of entry found
        found: &'static str,
    },

    /// A branch with no children was reached during descent.
    #[error("empty branch {0}")]
    EmptyBranch(String),

    /// No root has been synced for the tree yet.
    #[error("tree {0} has no root")]
    NoRoot(String),

    /// Full sync exceeded the configured entry bound.
    #[error("tree exceeds {limit} entries")]
    TreeTooLarge {
        /// Configured bound
        limit: usize,
    },
}

impl DnsDiscoveryError {
    /// Whether repeating the same operation may succeed.
    ///
    /// Transport failures are retriable. A hash mismatch may be transport
    /// corruption, so it is retriable too; everything else reproduces.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Resolution(_) | Self::HashMismatch { .. })
    }
}
