//! Registry index entries.
//!
//! A registry is a directory with one `<package>.toml` file per package:
//!
//! ```toml
//! [versions."1.0.0"]
//!
//! [versions."2.0.0".dependencies]
//! b = "<2.0.0"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Every published version of one package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Version string to the metadata published with that version.
    #[serde(default)]
    pub versions: BTreeMap<String, VersionEntry>,
}

/// Metadata of a single published version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Package name to requirement string.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl RegistryEntry {
    pub fn parse_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Path of the index file for `name` inside a registry directory.
///
/// Returns `None` for names that could point outside `root`.
pub fn entry_path(root: &Path, name: &str) -> Option<PathBuf> {
    let valid = !name.is_empty()
        && !name.contains("..")
        && !name.contains(['/', '\\', ':']);
    valid.then(|| root.join(format!("{name}.toml")))
}
