//! In-memory containers and provider, for embedding and tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use semver::Version;
use thiserror::Error;

use crate::container::{
    PackageContainer, PackageContainerConstraint, PackageContainerIdentifier,
    PackageContainerProvider,
};
use crate::version_set::VersionSetSpecifier;

/// A container whose versions and requirements are held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryContainer<I> {
    identifier: I,
    versions: Vec<Version>,
    dependencies: HashMap<Version, Vec<PackageContainerConstraint<I>>>,
}

impl<I: PackageContainerIdentifier> InMemoryContainer<I> {
    pub fn new(identifier: I) -> Self {
        Self {
            identifier,
            versions: Vec::new(),
            dependencies: HashMap::new(),
        }
    }

    /// Add a version with its requirements, keeping versions sorted.
    pub fn with_version(
        mut self,
        version: Version,
        dependencies: impl IntoIterator<Item = (I, VersionSetSpecifier)>,
    ) -> Self {
        let constraints = dependencies
            .into_iter()
            .map(|(id, requirement)| PackageContainerConstraint::new(id, requirement))
            .collect();
        if let Err(pos) = self.versions.binary_search(&version) {
            self.versions.insert(pos, version.clone());
        }
        self.dependencies.insert(version, constraints);
        self
    }
}

impl<I: PackageContainerIdentifier> PackageContainer for InMemoryContainer<I> {
    type Identifier = I;

    fn identifier(&self) -> &I {
        &self.identifier
    }

    fn versions(&self) -> &[Version] {
        &self.versions
    }

    fn dependencies(&self, version: &Version) -> Vec<PackageContainerConstraint<I>> {
        match self.dependencies.get(version) {
            Some(constraints) => constraints.clone(),
            None => panic!(
                "version {version} is not available for `{}`",
                self.identifier
            ),
        }
    }
}

/// Failure of an [`InMemoryProvider`] fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InMemoryError {
    #[error("package `{0}` not found")]
    NotFound(String),

    #[error("package `{0}` is unavailable")]
    Unavailable(String),
}

/// Provider over a fixed set of in-memory containers.
///
/// Records every fetch so callers can check how often each container was loaded.
#[derive(Debug)]
pub struct InMemoryProvider<I> {
    containers: HashMap<I, InMemoryContainer<I>>,
    unavailable: HashSet<I>,
    fetches: RefCell<Vec<I>>,
}

impl<I: PackageContainerIdentifier> InMemoryProvider<I> {
    pub fn new(containers: impl IntoIterator<Item = InMemoryContainer<I>>) -> Self {
        Self {
            containers: containers
                .into_iter()
                .map(|c| (c.identifier.clone(), c))
                .collect(),
            unavailable: HashSet::new(),
            fetches: RefCell::new(Vec::new()),
        }
    }

    /// Make fetches of `identifier` fail with [`InMemoryError::Unavailable`].
    pub fn with_unavailable(mut self, identifier: I) -> Self {
        self.unavailable.insert(identifier);
        self
    }

    /// Identifiers fetched so far, in fetch order.
    pub fn fetches(&self) -> Vec<I> {
        self.fetches.borrow().clone()
    }
}

impl<I: PackageContainerIdentifier> PackageContainerProvider for InMemoryProvider<I> {
    type Container = InMemoryContainer<I>;
    type Error = InMemoryError;

    fn get_container(&self, identifier: &I) -> Result<InMemoryContainer<I>, InMemoryError> {
        self.fetches.borrow_mut().push(identifier.clone());
        if self.unavailable.contains(identifier) {
            return Err(InMemoryError::Unavailable(identifier.to_string()));
        }
        self.containers
            .get(identifier)
            .cloned()
            .ok_or_else(|| InMemoryError::NotFound(identifier.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn versions_stay_sorted() {
        let c = InMemoryContainer::new("a")
            .with_version(v("2.0.0"), [])
            .with_version(v("1.0.0"), [])
            .with_version(v("1.5.0"), []);
        assert_eq!(c.versions(), &[v("1.0.0"), v("1.5.0"), v("2.0.0")]);
        assert_eq!(c.latest_version(), Some(&v("2.0.0")));
    }

    #[test]
    fn dependencies_at_version() {
        let c = InMemoryContainer::new("a")
            .with_version(v("1.0.0"), [("b", VersionSetSpecifier::Any)]);
        let deps = c.dependencies(&v("1.0.0"));
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].identifier(), &"b");
    }

    #[test]
    #[should_panic(expected = "not available")]
    fn dependencies_at_unknown_version_panics() {
        let c = InMemoryContainer::new("a").with_version(v("1.0.0"), []);
        c.dependencies(&v("3.0.0"));
    }

    #[test]
    fn provider_records_fetches_and_failures() {
        let provider =
            InMemoryProvider::new([InMemoryContainer::new("a").with_version(v("1.0.0"), [])])
                .with_unavailable("x");
        assert!(provider.get_container(&"a").is_ok());
        assert_eq!(
            provider.get_container(&"x").unwrap_err(),
            InMemoryError::Unavailable("x".to_string())
        );
        assert_eq!(
            provider.get_container(&"missing").unwrap_err(),
            InMemoryError::NotFound("missing".to_string())
        );
        assert_eq!(provider.fetches(), vec!["a", "x", "missing"]);
    }
}
