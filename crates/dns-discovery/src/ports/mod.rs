//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! - **Driving Ports (Inbound):** the peer stream consumers pull from
//! - **Driven Ports (Outbound):** DNS resolution, clock, randomness and
//!   configuration the host supplies

pub mod inbound;
pub mod outbound;

pub use inbound::PeerSource;
pub use outbound::{ConfigProvider, RandomSource, Resolver, TimeSource};
