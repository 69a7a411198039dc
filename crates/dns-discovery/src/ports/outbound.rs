//! # Driven Ports (Outbound SPI)
//!
//! These are the interfaces this crate **requires** the host application to
//! implement.

use crate::domain::{DiscoveryConfig, ResolutionError, Timestamp};

/// Abstract interface for TXT record resolution.
///
/// The host provides the DNS transport. Records split across several TXT
/// strings must be returned joined, in order.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: every tree of a session resolves
/// through the same instance, possibly from several threads at once.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct SystemResolver { inner: hickory_resolver::Resolver }
///
/// impl Resolver for SystemResolver {
///     fn lookup_txt(&self, name: &str) -> Result<String, ResolutionError> {
///         let answer = self.inner.txt_lookup(name)
///             .map_err(|e| ResolutionError::Transport(e.to_string()))?;
///         let record = answer.iter().next()
///             .ok_or_else(|| ResolutionError::NotFound(name.to_string()))?;
///         Ok(record.iter().map(|part| String::from_utf8_lossy(part)).collect())
///     }
/// }
/// ```
pub trait Resolver: Send + Sync {
    /// Fetch the TXT record at `name`.
    fn lookup_txt(&self, name: &str) -> Result<String, ResolutionError>;
}

/// Abstract interface for time-related operations.
///
/// Enables deterministic testing by injecting controllable time sources.
/// Production implementations use system time; tests use fixed timestamps.
pub trait TimeSource: Send + Sync {
    /// Get the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Abstract interface for random selection.
///
/// Drives uniform tree selection and uniform child selection during
/// descent. Tests inject a fixed source to pin the path taken.
pub trait RandomSource: Send + Sync {
    /// Uniform value in `0..max`. Returns 0 when `max` is 0.
    fn random_usize(&self, max: usize) -> usize;
}

/// Abstract interface for configuration loading.
///
/// Allows different configuration sources (file, environment, etc.)
pub trait ConfigProvider: Send + Sync {
    /// Bootstrap `tree://` URLs to anchor the session on.
    fn get_tree_urls(&self) -> Vec<String>;

    /// Sync tuning knobs.
    fn get_discovery_config(&self) -> DiscoveryConfig;
}
