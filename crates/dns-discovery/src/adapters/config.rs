use crate::domain::DiscoveryConfig;
use crate::ports::ConfigProvider;

// ============================================================================
// StaticConfigProvider - Hardcoded config for testing/development
// ============================================================================

/// Static configuration provider with hardcoded values.
///
/// Useful for testing and development. For deployments, use
/// `TomlConfigProvider`.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    tree_urls: Vec<String>,
    config: DiscoveryConfig,
}

impl StaticConfigProvider {
    /// Create with default config and no trees.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given bootstrap tree URLs.
    #[must_use]
    pub fn with_tree_urls(mut self, urls: Vec<String>) -> Self {
        self.tree_urls = urls;
        self
    }

    /// Use the given sync config.
    #[must_use]
    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn get_tree_urls(&self) -> Vec<String> {
        self.tree_urls.clone()
    }

    fn get_discovery_config(&self) -> DiscoveryConfig {
        self.config.clone()
    }
}

// ============================================================================
// TomlConfigProvider - File-based config loading (requires "config" feature)
// ============================================================================

#[cfg(feature = "config")]
mod toml_config {
    use super::*;
    use crate::domain::LinkEntry;
    use serde::Deserialize;
    use std::fs;
    use std::path::Path;
    use thiserror::Error;
    use tracing::warn;

    #[derive(Debug, Deserialize, Default)]
    struct ConfigFile {
        #[serde(default)]
        dns: DnsSection,
    }

    #[derive(Debug, Deserialize, Default)]
    struct DnsSection {
        #[serde(default)]
        tree_urls: Vec<String>,
        #[serde(default)]
        sync: SyncSection,
    }

    #[derive(Debug, Deserialize, Default)]
    struct SyncSection {
        random_retry_times: Option<usize>,
        root_validity_secs: Option<u64>,
        lookup_timeout_ms: Option<u64>,
        max_entry_size: Option<usize>,
        max_tree_entries: Option<usize>,
    }

    /// TOML-based configuration provider.
    ///
    /// # Config File Format
    ///
    /// ```toml
    /// [dns]
    /// tree_urls = ["tree://<base32-key>@nodes.example.org"]
    ///
    /// [dns.sync]
    /// random_retry_times = 10
    /// root_validity_secs = 1800
    /// lookup_timeout_ms = 5000
    /// max_entry_size = 2048
    /// max_tree_entries = 10000
    /// ```
    ///
    /// Missing values fall back to `DiscoveryConfig::default()`. Malformed
    /// tree URLs are logged and skipped.
    #[derive(Debug, Clone)]
    pub struct TomlConfigProvider {
        tree_urls: Vec<String>,
        config: DiscoveryConfig,
    }

    impl TomlConfigProvider {
        /// Load configuration from a TOML file.
        ///
        /// # Errors
        ///
        /// Returns error if file cannot be read or parsed.
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
            let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
                path: path.as_ref().display().to_string(),
                error: e.to_string(),
            })?;

            Self::parse(&content)
        }

        /// Parse configuration from a TOML string.
        pub fn parse(content: &str) -> Result<Self, ConfigError> {
            let file: ConfigFile =
                toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

            let tree_urls = file
                .dns
                .tree_urls
                .into_iter()
                .filter(|url| match LinkEntry::parse_url(url) {
                    Ok(_) => true,
                    Err(err) => {
                        warn!(url = %url, error = %err, "Skipping malformed tree URL");
                        false
                    }
                })
                .collect();

            let defaults = DiscoveryConfig::default();
            let sync = file.dns.sync;
            let config = DiscoveryConfig {
                random_retry_times: sync
                    .random_retry_times
                    .unwrap_or(defaults.random_retry_times),
                root_validity_secs: sync
                    .root_validity_secs
                    .unwrap_or(defaults.root_validity_secs),
                lookup_timeout_ms: sync.lookup_timeout_ms.unwrap_or(defaults.lookup_timeout_ms),
                max_entry_size: sync.max_entry_size.unwrap_or(defaults.max_entry_size),
                max_tree_entries: sync.max_tree_entries.unwrap_or(defaults.max_tree_entries),
            };

            Ok(Self { tree_urls, config })
        }
    }

    impl ConfigProvider for TomlConfigProvider {
        fn get_tree_urls(&self) -> Vec<String> {
            self.tree_urls.clone()
        }

        fn get_discovery_config(&self) -> DiscoveryConfig {
            self.config.clone()
        }
    }

    /// Errors that can occur during config loading.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum ConfigError {
        /// File I/O error.
        #[error("failed to read {path}: {error}")]
        Io {
            /// Path of the file that failed to load.
            path: String,
            /// Error message from the I/O operation.
            error: String,
        },
        /// TOML parsing error.
        #[error("failed to parse config: {0}")]
        Parse(String),
    }
}

#[cfg(feature = "config")]
pub use toml_config::{ConfigError, TomlConfigProvider};
