//! Shared utilities for Trellis.
//!
//! Cross-cutting concerns used by the other Trellis crates: the unified
//! error type and Cargo-style terminal status output.

pub mod errors;
pub mod progress;
