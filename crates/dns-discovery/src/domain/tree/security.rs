//! Cryptographic primitives for tree entries.
//!
//! SECURITY-CRITICAL: This file contains all hashing, signing and
//! verification logic. Isolate for security audits.

use std::fmt;

use data_encoding::BASE32_NOPAD;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

use crate::domain::{EntryFormatError, SignatureError};

/// Length of a compressed secp256k1 public key.
pub const PUBLIC_KEY_LEN: usize = 33;

/// Length of the content hash carried in branch and root entries.
pub const HASH_LEN: usize = 16;

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

// =============================================================================
// CONTENT HASH
// =============================================================================

/// Content address of an entry: the first 16 bytes of Keccak-256 over the
/// entry text, written as unpadded base32 (26 characters).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// Create from raw bytes.
    pub fn new(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Content address of `text`.
    pub fn of(text: &str) -> Self {
        let digest = keccak256(text.as_bytes());
        let mut bytes = [0u8; HASH_LEN];
        bytes.copy_from_slice(&digest[..HASH_LEN]);
        Self(bytes)
    }

    /// Parse the base32 form. DNS names are case-insensitive, so lowercase
    /// input is accepted.
    pub fn parse(text: &str) -> Result<Self, EntryFormatError> {
        let upper = text.to_ascii_uppercase();
        let bytes = BASE32_NOPAD
            .decode(upper.as_bytes())
            .map_err(|_| EntryFormatError::InvalidHash(text.to_string()))?;
        let array: [u8; HASH_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| EntryFormatError::InvalidHash(text.to_string()))?;
        Ok(Self(array))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// DNS name under which the entry with this hash is published.
    pub fn subdomain(&self, domain: &str) -> String {
        format!("{}.{}", self, domain)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&BASE32_NOPAD.encode(&self.0))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self)
    }
}

// =============================================================================
// PUBLIC KEY
// =============================================================================

/// Compressed secp256k1 public key (33 bytes) that authenticates a tree.
///
/// Construction validates that the bytes are a point on the curve, so a
/// `PublicKey` always converts to a verifying key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    /// Create from compressed SEC1 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EntryFormatError> {
        let array: [u8; PUBLIC_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| EntryFormatError::InvalidPublicKey)?;
        VerifyingKey::from_sec1_bytes(&array).map_err(|_| EntryFormatError::InvalidPublicKey)?;
        Ok(Self(array))
    }

    /// Public half of a signing key.
    pub fn from_signing_key(key: &SigningKey) -> Self {
        let point = key.verifying_key().to_encoded_point(true);
        let mut bytes = [0u8; PUBLIC_KEY_LEN];
        bytes.copy_from_slice(point.as_bytes());
        Self(bytes)
    }

    /// Parse the base32 form used in `tree://` URLs.
    pub fn parse_base32(text: &str) -> Result<Self, EntryFormatError> {
        let upper = text.to_ascii_uppercase();
        let bytes = BASE32_NOPAD
            .decode(upper.as_bytes())
            .map_err(|_| EntryFormatError::InvalidPublicKey)?;
        Self::from_bytes(&bytes)
    }

    /// Base32 form used in `tree://` URLs.
    pub fn to_base32(&self) -> String {
        BASE32_NOPAD.encode(&self.0)
    }

    /// Get raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Verify a signature over a 32-byte digest.
    pub fn verify_prehash(
        &self,
        digest: &[u8; 32],
        signature: &RootSignature,
    ) -> Result<(), SignatureError> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| SignatureError::Mismatch)?;
        let sig = Signature::from_slice(signature.rs_bytes()).map_err(|_| SignatureError::Malformed)?;
        verifying_key
            .verify_prehash(digest, &sig)
            .map_err(|_| SignatureError::Mismatch)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.to_base32();
        write!(f, "PublicKey({}..)", &encoded[..10])
    }
}

// =============================================================================
// SIGNATURE
// =============================================================================

/// Root signature: r‖s (64 bytes) optionally followed by the recovery id.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RootSignature(Vec<u8>);

impl RootSignature {
    /// Accepts 64-byte (r‖s) or 65-byte (r‖s‖v) signatures.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, EntryFormatError> {
        match bytes.len() {
            64 | 65 => Ok(Self(bytes)),
            n => Err(EntryFormatError::InvalidField {
                field: "sig",
                reason: format!("expected 64 or 65 bytes, got {n}"),
            }),
        }
    }

    /// Sign a 32-byte digest, producing a 65-byte recoverable signature.
    pub fn sign_prehash(key: &SigningKey, digest: &[u8; 32]) -> Result<Self, SignatureError> {
        let (sig, recovery_id) = key
            .sign_prehash_recoverable(digest)
            .map_err(|_| SignatureError::Malformed)?;
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte());
        Ok(Self(bytes))
    }

    /// The r‖s part used for verification.
    pub fn rs_bytes(&self) -> &[u8] {
        &self.0[..64]
    }

    /// All signature bytes as published.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RootSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootSignature({} bytes)", self.0.len())
    }
}
