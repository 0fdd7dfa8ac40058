use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The parsed representation of a `Trellis.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub package: PackageMetadata,

    /// Top-level requirements: package name to requirement string.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

/// Package identity from the `[package]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Manifest {
    /// Load and parse a manifest from disk.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            trellis_util::errors::TrellisError::Manifest {
                message: format!("Could not read {}: {e}", path.display()),
            }
        })?;
        Self::parse_toml(&content)
    }

    /// Parse a manifest from a TOML string.
    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        let manifest: Self = toml::from_str(content).map_err(|e| {
            trellis_util::errors::TrellisError::Manifest {
                message: e.to_string(),
            }
        })?;
        if manifest.package.name.trim().is_empty() {
            return Err(trellis_util::errors::TrellisError::Manifest {
                message: "package name must not be empty".to_string(),
            }
            .into());
        }
        Ok(manifest)
    }
}
