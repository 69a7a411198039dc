//! # DNS Discovery Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Logging and published-tree fixtures
//! └── integration/      # End-to-end discovery scenarios
//!     ├── configuration.rs
//!     ├── federation.rs
//!     ├── resilience.rs
//!     ├── root_rotation.rs
//!     └── concurrency.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dns-discovery-tests
//! RUST_LOG=dns_discovery=debug cargo test -p dns-discovery-tests -- --nocapture
//! cargo bench -p dns-discovery-tests
//! ```

pub mod integration;
