//! # Integration Scenarios
//!
//! Whole-session behavior over an in-memory DNS zone.

pub mod concurrency;
pub mod configuration;
pub mod federation;
pub mod resilience;
