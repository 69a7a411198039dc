//! Tree entries and their text encoding.
//!
//! Each entry is a single TXT string that starts with a discriminator:
//!
//! ```text
//! tree-root-v1 e=<hash> l=<hash> seq=<n> sig=<base64url>
//! tree-branch:<hash>,<hash>,...
//! tree://<base32-key>@<domain>
//! tree-node:id=<hex> ip=<v4> ip6=<v6> tcp=<port> udp=<port>
//! ```
//!
//! `Display` produces the canonical form; parsing it back yields an equal
//! entry.

use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use k256::ecdsa::SigningKey;

use super::security::{keccak256, ContentHash, PublicKey, RootSignature};
use crate::domain::{DnsNode, EntryFormatError, NodeId, SignatureError};

/// Discriminator of root entries.
pub const ROOT_PREFIX: &str = "tree-root-v1";
/// Discriminator of branch entries.
pub const BRANCH_PREFIX: &str = "tree-branch:";
/// Discriminator of link entries (and bootstrap URLs).
pub const LINK_PREFIX: &str = "tree://";
/// Discriminator of node entries.
pub const NODE_PREFIX: &str = "tree-node:";

// =============================================================================
// TREE ENTRY
// =============================================================================

/// Any entry of a discovery tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEntry {
    /// Signed tree root
    Root(RootEntry),
    /// Interior node listing child hashes
    Branch(BranchEntry),
    /// Leaf of the link subtree
    Link(LinkEntry),
    /// Leaf of the node subtree
    Node(NodeEntry),
}

impl TreeEntry {
    /// Parse entry text, dispatching on its discriminator.
    pub fn parse(text: &str) -> Result<Self, EntryFormatError> {
        if let Some(rest) = text.strip_prefix(ROOT_PREFIX) {
            if rest.starts_with(' ') {
                return RootEntry::parse_fields(rest).map(Self::Root);
            }
        }
        if let Some(rest) = text.strip_prefix(BRANCH_PREFIX) {
            return BranchEntry::parse_fields(rest).map(Self::Branch);
        }
        if text.starts_with(LINK_PREFIX) {
            return LinkEntry::parse_url(text).map(Self::Link);
        }
        if let Some(rest) = text.strip_prefix(NODE_PREFIX) {
            return NodeEntry::parse_fields(rest).map(Self::Node);
        }
        Err(EntryFormatError::UnknownPrefix(
            text.chars().take(32).collect(),
        ))
    }

    /// Short name of the entry kind, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Root(_) => "root",
            Self::Branch(_) => "branch",
            Self::Link(_) => "link",
            Self::Node(_) => "node",
        }
    }

    /// Content address of the canonical text.
    pub fn hash(&self) -> ContentHash {
        ContentHash::of(&self.to_string())
    }
}

impl fmt::Display for TreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root(e) => fmt::Display::fmt(e, f),
            Self::Branch(e) => fmt::Display::fmt(e, f),
            Self::Link(e) => fmt::Display::fmt(e, f),
            Self::Node(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl From<RootEntry> for TreeEntry {
    fn from(e: RootEntry) -> Self {
        Self::Root(e)
    }
}

impl From<BranchEntry> for TreeEntry {
    fn from(e: BranchEntry) -> Self {
        Self::Branch(e)
    }
}

impl From<LinkEntry> for TreeEntry {
    fn from(e: LinkEntry) -> Self {
        Self::Link(e)
    }
}

impl From<NodeEntry> for TreeEntry {
    fn from(e: NodeEntry) -> Self {
        Self::Node(e)
    }
}

// =============================================================================
// ROOT
// =============================================================================

/// Signed pointer to the node and link subtrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootEntry {
    /// Hash of the node subtree root
    pub node_root: ContentHash,
    /// Hash of the link subtree root
    pub link_root: ContentHash,
    /// Monotonic sequence number, bumped on every republish
    pub seq: u64,
    /// Signature over `signing_payload`
    pub signature: RootSignature,
}

impl RootEntry {
    /// Build and sign a root.
    pub fn sign(
        node_root: ContentHash,
        link_root: ContentHash,
        seq: u64,
        key: &SigningKey,
    ) -> Result<Self, SignatureError> {
        let payload = Self::payload(&node_root, &link_root, seq);
        let signature = RootSignature::sign_prehash(key, &keccak256(payload.as_bytes()))?;
        Ok(Self {
            node_root,
            link_root,
            seq,
            signature,
        })
    }

    fn payload(node_root: &ContentHash, link_root: &ContentHash, seq: u64) -> String {
        format!("{ROOT_PREFIX} e={node_root} l={link_root} seq={seq}")
    }

    /// Text covered by the signature: the canonical root up to ` sig=`.
    pub fn signing_payload(&self) -> String {
        Self::payload(&self.node_root, &self.link_root, self.seq)
    }

    /// Verify the signature under the tree's public key.
    pub fn verify_signature(&self, key: &PublicKey) -> Result<(), SignatureError> {
        let digest = keccak256(self.signing_payload().as_bytes());
        key.verify_prehash(&digest, &self.signature)
    }

    /// Which subtree roots differ from `previous`.
    ///
    /// Returns `(nodes_changed, links_changed)`.
    pub fn diff(&self, previous: &RootEntry) -> (bool, bool) {
        (
            self.node_root != previous.node_root,
            self.link_root != previous.link_root,
        )
    }

    fn parse_fields(rest: &str) -> Result<Self, EntryFormatError> {
        let mut tokens = rest.split_whitespace();
        let node_root = ContentHash::parse(expect_field(tokens.next(), "e")?)?;
        let link_root = ContentHash::parse(expect_field(tokens.next(), "l")?)?;
        let seq = expect_field(tokens.next(), "seq")?
            .parse::<u64>()
            .map_err(|e| EntryFormatError::InvalidField {
                field: "seq",
                reason: e.to_string(),
            })?;
        let sig_text = expect_field(tokens.next(), "sig")?;
        if let Some(extra) = tokens.next() {
            return Err(EntryFormatError::UnknownField(extra.to_string()));
        }
        let sig_bytes =
            URL_SAFE_NO_PAD
                .decode(sig_text)
                .map_err(|e| EntryFormatError::InvalidField {
                    field: "sig",
                    reason: e.to_string(),
                })?;
        Ok(Self {
            node_root,
            link_root,
            seq,
            signature: RootSignature::from_bytes(sig_bytes)?,
        })
    }
}

/// Root fields are positional: the signature covers their exact order.
fn expect_field<'a>(
    token: Option<&'a str>,
    name: &'static str,
) -> Result<&'a str, EntryFormatError> {
    let token = token.ok_or(EntryFormatError::MissingField(name))?;
    match token.split_once('=') {
        Some((key, value)) if key == name => Ok(value),
        Some(_) | None => Err(EntryFormatError::MissingField(name)),
    }
}

impl fmt::Display for RootEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sig={}",
            self.signing_payload(),
            URL_SAFE_NO_PAD.encode(self.signature.as_bytes())
        )
    }
}

// =============================================================================
// BRANCH
// =============================================================================

/// Interior tree node: an ordered list of child content hashes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BranchEntry {
    /// Child hashes, in publication order
    pub children: Vec<ContentHash>,
}

impl BranchEntry {
    /// Create a branch over the given children.
    pub fn new(children: Vec<ContentHash>) -> Self {
        Self { children }
    }

    fn parse_fields(rest: &str) -> Result<Self, EntryFormatError> {
        if rest.is_empty() {
            return Ok(Self::default());
        }
        let children = rest
            .split(',')
            .map(ContentHash::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { children })
    }
}

impl fmt::Display for BranchEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(BRANCH_PREFIX)?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{child}")?;
        }
        Ok(())
    }
}

// =============================================================================
// LINK
// =============================================================================

/// Reference to another tree: its signing key and the domain it lives at.
///
/// The canonical `tree://<key>@<domain>` string identifies a tree throughout
/// a discovery session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkEntry {
    /// Key that signs the referenced tree's root
    pub public_key: PublicKey,
    /// Domain holding the referenced tree's records
    pub domain: String,
}

impl LinkEntry {
    /// Create a link.
    pub fn new(public_key: PublicKey, domain: impl Into<String>) -> Self {
        Self {
            public_key,
            domain: domain.into(),
        }
    }

    /// Parse a `tree://<base32-key>@<domain>` URL.
    pub fn parse_url(url: &str) -> Result<Self, EntryFormatError> {
        let rest = url
            .strip_prefix(LINK_PREFIX)
            .ok_or_else(|| EntryFormatError::InvalidUrl(url.to_string()))?;
        let (key, domain) = rest
            .split_once('@')
            .ok_or_else(|| EntryFormatError::InvalidUrl(url.to_string()))?;
        if !is_valid_domain(domain) {
            return Err(EntryFormatError::InvalidUrl(url.to_string()));
        }
        Ok(Self {
            public_key: PublicKey::parse_base32(key)?,
            domain: domain.to_string(),
        })
    }
}

fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain.len() <= 253
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

impl fmt::Display for LinkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LINK_PREFIX}{}@{}", self.public_key.to_base32(), self.domain)
    }
}

// =============================================================================
// NODE
// =============================================================================

/// Leaf of the node subtree: one peer endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeEntry {
    /// Peer identity
    pub id: NodeId,
    /// IPv4 host
    pub ip: Option<Ipv4Addr>,
    /// IPv6 host
    pub ip6: Option<Ipv6Addr>,
    /// TCP port
    pub tcp: u16,
    /// UDP port
    pub udp: u16,
}

impl NodeEntry {
    /// Create an IPv4 node with equal TCP and UDP ports.
    pub fn new_v4(id: NodeId, ip: Ipv4Addr, port: u16) -> Self {
        Self {
            id,
            ip: Some(ip),
            ip6: None,
            tcp: port,
            udp: port,
        }
    }

    /// Peer handed to consumers.
    pub fn to_dns_node(&self) -> DnsNode {
        DnsNode {
            id: self.id,
            host_v4: self.ip,
            host_v6: self.ip6,
            tcp_port: self.tcp,
            udp_port: self.udp,
        }
    }

    fn parse_fields(rest: &str) -> Result<Self, EntryFormatError> {
        let mut fields: HashMap<&str, &str> = HashMap::new();
        for token in rest.split_whitespace() {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| EntryFormatError::UnknownField(token.to_string()))?;
            if !matches!(key, "id" | "ip" | "ip6" | "tcp" | "udp") {
                return Err(EntryFormatError::UnknownField(key.to_string()));
            }
            if fields.insert(key, value).is_some() {
                return Err(EntryFormatError::DuplicateField(key.to_string()));
            }
        }

        let id_hex = fields.get("id").ok_or(EntryFormatError::MissingField("id"))?;
        let id_bytes = hex::decode(id_hex).map_err(|e| EntryFormatError::InvalidField {
            field: "id",
            reason: e.to_string(),
        })?;
        let id = NodeId::from_slice(&id_bytes).ok_or_else(|| EntryFormatError::InvalidField {
            field: "id",
            reason: format!("expected 64 bytes, got {}", id_bytes.len()),
        })?;

        let ip = fields
            .get("ip")
            .map(|v| v.parse::<Ipv4Addr>())
            .transpose()
            .map_err(|e| EntryFormatError::InvalidField {
                field: "ip",
                reason: e.to_string(),
            })?;
        let ip6 = fields
            .get("ip6")
            .map(|v| v.parse::<Ipv6Addr>())
            .transpose()
            .map_err(|e| EntryFormatError::InvalidField {
                field: "ip6",
                reason: e.to_string(),
            })?;

        let tcp = parse_port(fields.get("tcp").copied(), "tcp")?
            .ok_or(EntryFormatError::MissingField("tcp"))?;
        let udp = parse_port(fields.get("udp").copied(), "udp")?.unwrap_or(tcp);

        Ok(Self {
            id,
            ip,
            ip6,
            tcp,
            udp,
        })
    }
}

fn parse_port(value: Option<&str>, field: &'static str) -> Result<Option<u16>, EntryFormatError> {
    value
        .map(|v| v.parse::<u16>())
        .transpose()
        .map_err(|e| EntryFormatError::InvalidField {
            field,
            reason: e.to_string(),
        })
}

impl fmt::Display for NodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{NODE_PREFIX}id={}", self.id.to_hex())?;
        if let Some(ip) = self.ip {
            write!(f, " ip={ip}")?;
        }
        if let Some(ip6) = self.ip6 {
            write!(f, " ip6={ip6}")?;
        }
        write!(f, " tcp={} udp={}", self.tcp, self.udp)
    }
}
