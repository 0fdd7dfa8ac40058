use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for Trellis operations outside the resolution engine.
#[derive(Debug, Error, Diagnostic)]
pub enum TrellisError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed root manifest (`Trellis.toml`).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your Trellis.toml for syntax errors"))]
    Manifest { message: String },

    /// The package registry could not be read or contains bad entries.
    #[error("Registry error: {message}")]
    #[diagnostic(help("Check the registry directory passed with --registry or set in config"))]
    Registry { message: String },

    /// Global configuration could not be loaded.
    #[error("Config error: {message}")]
    Config { message: String },

    /// Dependency resolution failed (unsatisfiable requirements, fetch failures).
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type TrellisResult<T> = miette::Result<T>;
