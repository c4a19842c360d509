//! # Skirmish Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Fixture levels, states and a recording renderer
//! - Tracing capture for asserting on diagnostics
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod logs;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;
