//! Collaborator interfaces consumed by the resolver.
//!
//! A [`PackageContainer`] is one resolvable package: its identity, its
//! available versions, and the requirements each version declares. A
//! [`PackageContainerProvider`] loads containers by identifier from wherever
//! they live (registry directory, memory, network).

use std::fmt;
use std::hash::Hash;

use semver::Version;

use crate::version_set::VersionSetSpecifier;

/// Token naming a container. Implemented for every type with the required bounds.
pub trait PackageContainerIdentifier: Clone + Eq + Hash + fmt::Debug + fmt::Display {}

impl<T> PackageContainerIdentifier for T where T: Clone + Eq + Hash + fmt::Debug + fmt::Display {}

/// A requirement that the container `identifier` resolves inside `requirement`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageContainerConstraint<I> {
    identifier: I,
    requirement: VersionSetSpecifier,
}

impl<I> PackageContainerConstraint<I> {
    pub fn new(identifier: I, requirement: VersionSetSpecifier) -> Self {
        Self {
            identifier,
            requirement,
        }
    }

    pub fn identifier(&self) -> &I {
        &self.identifier
    }

    pub fn requirement(&self) -> &VersionSetSpecifier {
        &self.requirement
    }
}

impl<I: fmt::Display> fmt::Display for PackageContainerConstraint<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.identifier, self.requirement)
    }
}

/// A resolvable package.
pub trait PackageContainer {
    type Identifier: PackageContainerIdentifier;

    fn identifier(&self) -> &Self::Identifier;

    /// Available versions, strictly ascending and never empty.
    fn versions(&self) -> &[Version];

    /// Requirements declared by `version`.
    ///
    /// # Panics
    ///
    /// Implementations panic when `version` is not one of [`Self::versions`].
    fn dependencies(&self, version: &Version) -> Vec<PackageContainerConstraint<Self::Identifier>>;

    fn latest_version(&self) -> Option<&Version> {
        self.versions().last()
    }
}

/// Loads containers by identifier.
///
/// Fetch failures are the only recoverable errors of a resolution run; the
/// resolver returns them unchanged and never retries.
pub trait PackageContainerProvider {
    type Container: PackageContainer;
    type Error: std::error::Error + Send + Sync + 'static;

    fn get_container(
        &self,
        identifier: &<Self::Container as PackageContainer>::Identifier,
    ) -> Result<Self::Container, Self::Error>;
}

/// Identifier type of the containers a provider returns.
pub type IdentifierOf<P> =
    <<P as PackageContainerProvider>::Container as PackageContainer>::Identifier;

impl<P: PackageContainerProvider + ?Sized> PackageContainerProvider for &P {
    type Container = P::Container;
    type Error = P::Error;

    fn get_container(
        &self,
        identifier: &<Self::Container as PackageContainer>::Identifier,
    ) -> Result<Self::Container, Self::Error> {
        (**self).get_container(identifier)
    }
}

/// Panics unless `container` lists at least one version in strictly ascending order.
pub(crate) fn assert_well_formed<C: PackageContainer>(container: &C) {
    let versions = container.versions();
    assert!(
        !versions.is_empty(),
        "container `{}` exposes no versions",
        container.identifier()
    );
    assert!(
        versions.windows(2).all(|pair| pair[0] < pair[1]),
        "container `{}` lists versions out of ascending order",
        container.identifier()
    );
}
