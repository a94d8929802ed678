//! # nexus-test
//!
//! Integration tests for the NexusDB row store.
//!
//! This crate contains:
//! - Shared fixtures and tracing setup for the tests under `tests/`
//! - A recording listener for asserting notification order
//! - A random workload generator for invariant checks

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test utilities and helpers
pub mod utils;

/// Workload generators
pub mod workload;
