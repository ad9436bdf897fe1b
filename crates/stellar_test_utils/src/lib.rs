//! # Stellar Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixture helpers (engines, players, planets)
//! - Scenario harness driven by a manual clock
//! - Determinism and snapshot checks
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod scenario;

/// Re-export proptest for convenience.
pub use proptest;
