//! Dependency resolution engine.
//!
//! Given top-level requirements and a [`PackageContainerProvider`] that can
//! load any package's versions and per-version dependencies, the
//! [`Resolver`] picks one version for every package reachable from those
//! requirements. Selection prefers the latest version that stays valid
//! against everything chosen so far; it is a sound heuristic, not a complete
//! solver, and may report a conflict where a full search would succeed.

pub mod assignment;
pub mod container;
pub mod delegate;
pub mod graph;
pub mod memory;
pub mod registry;
pub mod requirement;
pub mod resolver;
pub mod version_set;

pub use assignment::{BoundVersion, VersionAssignment};
pub use container::{
    IdentifierOf, PackageContainer, PackageContainerConstraint, PackageContainerIdentifier,
    PackageContainerProvider,
};
pub use delegate::{NoopDelegate, ResolverDelegate};
pub use resolver::{Resolution, ResolveError, ResolvedPackage, Resolver, ResolverOptions};
pub use trellis_core::config::ResolvePolicy;
pub use version_set::{VersionRange, VersionSetSpecifier};
