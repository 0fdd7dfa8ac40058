use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Global user configuration loaded from `~/.trellis/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub resolve: ResolveConfig,
}

/// Registry settings from `[registry]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directory holding one `<package>.toml` index file per package.
    #[serde(default = "default_registry_path")]
    pub path: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

fn default_registry_path() -> String {
    "~/.trellis/registry".to_string()
}

/// Resolver settings from `[resolve]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveConfig {
    #[serde(default)]
    pub policy: ResolvePolicy,
}

/// How the resolver picks a version for each package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolvePolicy {
    /// Latest version valid against every constraint accumulated so far,
    /// demoting a dependent when a package has no valid version left.
    #[default]
    ConstraintAware,
    /// Latest version of every reachable package, ignoring requirements.
    LatestOnly,
}

impl ResolvePolicy {
    /// Parse the kebab-case name used in config files and on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "constraint-aware" => Some(Self::ConstraintAware),
            "latest-only" => Some(Self::LatestOnly),
            _ => None,
        }
    }
}

impl fmt::Display for ResolvePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstraintAware => f.write_str("constraint-aware"),
            Self::LatestOnly => f.write_str("latest-only"),
        }
    }
}

impl GlobalConfig {
    /// Load the global configuration from `~/.trellis/config.toml`, or return
    /// defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load a configuration file from an explicit path, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| trellis_util::errors::TrellisError::Config {
                message: format!("Failed to read global config: {e}"),
            })?;
        toml::from_str(&content).map_err(|e| {
            trellis_util::errors::TrellisError::Config {
                message: format!("Failed to parse global config: {e}"),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// The registry directory with a leading `~` expanded to the home directory.
    pub fn registry_path(&self) -> PathBuf {
        expand_home(&self.registry.path)
    }
}

/// Returns the path to the Trellis data directory.
///
/// `TRELLIS_HOME` takes precedence over `~/.trellis/`.
pub fn dirs_path() -> PathBuf {
    if let Ok(dir) = std::env::var("TRELLIS_HOME") {
        return PathBuf::from(dir);
    }
    home_dir().join(".trellis")
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None if path == "~" => home_dir(),
        None => Path::new(path).to_path_buf(),
    }
}
