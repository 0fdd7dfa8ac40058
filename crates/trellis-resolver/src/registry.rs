//! Provider backed by an on-disk registry directory.
//!
//! Each package lives in `<root>/<name>.toml` (see
//! [`trellis_core::registry`]). Files are read lazily, the first time the
//! resolver asks for a package.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use semver::Version;
use thiserror::Error;
use trellis_core::registry::{entry_path, RegistryEntry};

use crate::container::{PackageContainer, PackageContainerConstraint, PackageContainerProvider};
use crate::requirement::{parse_requirement, RequirementError};

/// Failure to load a package from the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("package `{name}` not found in registry at {}", path.display())]
    NotFound { name: String, path: PathBuf },

    #[error("`{name}` is not a valid package name")]
    InvalidName { name: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse registry entry for `{name}`: {source}")]
    Parse {
        name: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("package `{name}` lists invalid version `{version}`: {source}")]
    InvalidVersion {
        name: String,
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("package `{name}` {version} has an invalid requirement on `{dependency}`: {source}")]
    InvalidRequirement {
        name: String,
        version: Version,
        dependency: String,
        #[source]
        source: RequirementError,
    },

    #[error("package `{name}` has no published versions")]
    NoVersions { name: String },
}

/// A package loaded from a registry entry, with every requirement parsed up front.
#[derive(Debug, Clone)]
pub struct RegistryContainer {
    name: String,
    versions: Vec<Version>,
    dependencies: HashMap<Version, Vec<PackageContainerConstraint<String>>>,
}

impl RegistryContainer {
    pub fn from_entry(name: &str, entry: &RegistryEntry) -> Result<Self, RegistryError> {
        let mut versions = Vec::with_capacity(entry.versions.len());
        let mut dependencies = HashMap::with_capacity(entry.versions.len());

        for (raw, published) in &entry.versions {
            let version = Version::parse(raw).map_err(|source| RegistryError::InvalidVersion {
                name: name.to_string(),
                version: raw.clone(),
                source,
            })?;
            let mut constraints = Vec::with_capacity(published.dependencies.len());
            for (dependency, requirement) in &published.dependencies {
                let set = parse_requirement(requirement).map_err(|source| {
                    RegistryError::InvalidRequirement {
                        name: name.to_string(),
                        version: version.clone(),
                        dependency: dependency.clone(),
                        source,
                    }
                })?;
                constraints.push(PackageContainerConstraint::new(dependency.clone(), set));
            }
            versions.push(version.clone());
            dependencies.insert(version, constraints);
        }

        if versions.is_empty() {
            return Err(RegistryError::NoVersions {
                name: name.to_string(),
            });
        }
        // Index keys sort as strings, not as versions.
        versions.sort();
        versions.dedup();

        Ok(Self {
            name: name.to_string(),
            versions,
            dependencies,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PackageContainer for RegistryContainer {
    type Identifier = String;

    fn identifier(&self) -> &String {
        &self.name
    }

    fn versions(&self) -> &[Version] {
        &self.versions
    }

    fn dependencies(&self, version: &Version) -> Vec<PackageContainerConstraint<String>> {
        match self.dependencies.get(version) {
            Some(constraints) => constraints.clone(),
            None => panic!("`{}` has no version {version}", self.name),
        }
    }
}

/// Reads packages from a registry directory on demand.
#[derive(Debug, Clone)]
pub struct RegistryProvider {
    root: PathBuf,
}

impl RegistryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PackageContainerProvider for RegistryProvider {
    type Container = RegistryContainer;
    type Error = RegistryError;

    fn get_container(&self, name: &String) -> Result<RegistryContainer, RegistryError> {
        let path = entry_path(&self.root, name)
            .ok_or_else(|| RegistryError::InvalidName { name: name.clone() })?;
        if !path.is_file() {
            return Err(RegistryError::NotFound {
                name: name.clone(),
                path: self.root.clone(),
            });
        }
        tracing::debug!("Reading registry entry {}", path.display());
        let content = std::fs::read_to_string(&path)
            .map_err(|source| RegistryError::Io { path, source })?;
        let entry = RegistryEntry::parse_toml(&content).map_err(|source| RegistryError::Parse {
            name: name.clone(),
            source,
        })?;
        RegistryContainer::from_entry(name, &entry)
    }
}
