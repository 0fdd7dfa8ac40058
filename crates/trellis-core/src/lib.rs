//! Core data files for Trellis.
//!
//! This crate defines the on-disk shapes Trellis reads: the root manifest
//! (`Trellis.toml`), per-package registry index entries, and the global
//! configuration. Everything here is plain `serde` data; interpretation of
//! versions and requirements happens in `trellis-resolver`.
//!
//! This crate is intentionally free of network I/O.

/// File name of the root manifest.
pub const MANIFEST_FILE: &str = "Trellis.toml";

pub mod config;
pub mod manifest;
pub mod registry;
