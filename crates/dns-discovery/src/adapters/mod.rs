//! # Adapters
//!
//! Concrete implementations of the outbound ports.
//!
//! - `MemoryResolver` - In-memory TXT records (tests, fixtures, tooling)
//! - `SystemTimeSource` - Production time source using system clock
//! - `ThreadRandomSource` / `FixedRandomSource` - Random selection
//! - `StaticConfigProvider` / `TomlConfigProvider` - Configuration
//!
//! ## Feature Flags
//!
//! - `config` - Enables TOML config file loading

/// Configuration providers
pub mod config;
/// Random sources
pub mod random;
/// In-memory resolver
pub mod resolver;
/// Time source adapters
pub mod time;

pub use config::StaticConfigProvider;
pub use random::{FixedRandomSource, ThreadRandomSource};
pub use resolver::MemoryResolver;
pub use time::SystemTimeSource;

#[cfg(feature = "config")]
pub use config::{ConfigError, TomlConfigProvider};
