//! # Tactics Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Map fixtures and recorded action scripts
//! - A manual clock and a driver that pumps a session to idle
//! - Local transports and viewports that record what they see
//! - State fingerprints for equivalence checks
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod fingerprint;
pub mod fixtures;
pub mod strategies;
pub mod transport;

/// Re-export proptest for convenience.
pub use proptest;
