//! # DNS Discovery Service
//!
//! Wires the domain trees to the outbound ports.
//!
//! - [`Client`] - resolver access, clock, RNG and tuning knobs
//! - [`RandomIterator`] - the peer stream handed to consumers

mod client;
mod random_iterator;

pub use client::{Client, TreeSnapshot};
pub use random_iterator::RandomIterator;
