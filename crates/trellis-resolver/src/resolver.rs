//! Core resolution algorithm: breadth-first discovery from the top-level
//! requirements, latest-valid version selection, and bounded demotion of
//! dependents or dependencies when a package runs out of valid versions.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use semver::Version;
use thiserror::Error;
use trellis_core::config::ResolvePolicy;

use crate::assignment::{BoundVersion, VersionAssignment};
use crate::container::{
    assert_well_formed, IdentifierOf, PackageContainer, PackageContainerConstraint,
    PackageContainerIdentifier, PackageContainerProvider,
};
use crate::delegate::ResolverDelegate;
use crate::version_set::VersionSetSpecifier;

/// Tuning for a [`Resolver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverOptions {
    pub policy: ResolvePolicy,
}

/// Why a resolution run produced no result.
#[derive(Debug, Error)]
pub enum ResolveError<E: std::error::Error + 'static> {
    /// The provider failed to load a container. The run was aborted.
    #[error(transparent)]
    Provider(E),

    /// No version of a required package fits the accumulated requirements,
    /// and demoting its dependents did not make room.
    #[error("no version of `{identifier}` is compatible with {requirement}")]
    Unsatisfiable {
        identifier: String,
        requirement: VersionSetSpecifier,
    },
}

/// One package of a finished resolution.
pub struct ResolvedPackage<C> {
    pub container: Arc<C>,
    pub version: Version,
}

impl<C: PackageContainer> ResolvedPackage<C> {
    pub fn identifier(&self) -> &C::Identifier {
        self.container.identifier()
    }

    /// Requirements declared by the chosen version.
    pub fn dependencies(&self) -> Vec<PackageContainerConstraint<C::Identifier>> {
        self.container.dependencies(&self.version)
    }
}

/// The output of a resolution run.
pub struct Resolution<C: PackageContainer> {
    /// Chosen packages in first-discovery order.
    pub packages: Vec<ResolvedPackage<C>>,
    /// Packages bound along a path a demotion later abandoned, now excluded.
    pub excluded: Vec<C::Identifier>,
    /// Number of containers loaded from the provider.
    pub fetched: usize,
}

impl<C: PackageContainer> Resolution<C> {
    /// `(identifier, version)` pairs in first-discovery order.
    pub fn pairs(&self) -> Vec<(C::Identifier, Version)> {
        self.packages
            .iter()
            .map(|p| (p.identifier().clone(), p.version.clone()))
            .collect()
    }

    pub fn version_of(&self, identifier: &C::Identifier) -> Option<&Version> {
        self.packages
            .iter()
            .find(|p| p.identifier() == identifier)
            .map(|p| &p.version)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Resolves a set of top-level requirements against a provider.
pub struct Resolver<P: PackageContainerProvider, D> {
    constraints: Vec<PackageContainerConstraint<IdentifierOf<P>>>,
    provider: P,
    delegate: D,
    options: ResolverOptions,
}

impl<P, D> Resolver<P, D>
where
    P: PackageContainerProvider,
    D: ResolverDelegate<IdentifierOf<P>>,
{
    pub fn new(
        constraints: impl IntoIterator<Item = PackageContainerConstraint<IdentifierOf<P>>>,
        provider: P,
        delegate: D,
    ) -> Self {
        Self {
            constraints: constraints.into_iter().collect(),
            provider,
            delegate,
            options: ResolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn constraints(&self) -> &[PackageContainerConstraint<IdentifierOf<P>>] {
        &self.constraints
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// Resolve to one `(identifier, version)` pair per required package.
    ///
    /// Fails with the first provider error, unchanged, or with
    /// [`ResolveError::Unsatisfiable`]. Never returns a partial result.
    pub fn resolve(&self) -> Result<Vec<(IdentifierOf<P>, Version)>, ResolveError<P::Error>> {
        Ok(self.resolve_packages()?.pairs())
    }

    /// Like [`Self::resolve`], keeping the loaded containers alongside each choice.
    pub fn resolve_packages(&self) -> Result<Resolution<P::Container>, ResolveError<P::Error>> {
        let mut session = Session::new(&self.provider, &self.delegate);
        let (packages, excluded) = match self.options.policy {
            ResolvePolicy::ConstraintAware => session.resolve_constrained(&self.constraints)?,
            ResolvePolicy::LatestOnly => (session.resolve_latest(&self.constraints)?, Vec::new()),
        };
        tracing::info!(
            "Resolved {} packages ({} fetched, {} policy)",
            packages.len(),
            session.containers.len(),
            self.options.policy
        );
        Ok(Resolution {
            packages,
            excluded,
            fetched: session.containers.len(),
        })
    }
}

/// State of one resolution run. The container memo never outlives it.
struct Session<'a, P: PackageContainerProvider, D> {
    provider: &'a P,
    delegate: &'a D,
    containers: HashMap<IdentifierOf<P>, Arc<P::Container>>,
}

impl<'a, P, D> Session<'a, P, D>
where
    P: PackageContainerProvider,
    D: ResolverDelegate<IdentifierOf<P>>,
{
    fn new(provider: &'a P, delegate: &'a D) -> Self {
        Self {
            provider,
            delegate,
            containers: HashMap::new(),
        }
    }

    /// Load a container, fetching it from the provider only the first time.
    fn container(
        &mut self,
        identifier: &IdentifierOf<P>,
    ) -> Result<Arc<P::Container>, ResolveError<P::Error>> {
        if let Some(container) = self.containers.get(identifier) {
            return Ok(Arc::clone(container));
        }
        tracing::debug!("Fetching {identifier}");
        let container = self
            .provider
            .get_container(identifier)
            .map_err(ResolveError::Provider)?;
        assert_eq!(
            container.identifier(),
            identifier,
            "provider returned a container for a different identifier"
        );
        assert_well_formed(&container);

        let container = Arc::new(container);
        self.containers
            .insert(identifier.clone(), Arc::clone(&container));
        self.delegate.added(identifier);
        Ok(container)
    }

    /// Latest version of every package reachable through latest versions,
    /// without consulting any requirement.
    fn resolve_latest(
        &mut self,
        constraints: &[PackageContainerConstraint<IdentifierOf<P>>],
    ) -> Result<Vec<ResolvedPackage<P::Container>>, ResolveError<P::Error>> {
        let mut queue: VecDeque<IdentifierOf<P>> = canonical_roots(constraints).into();
        let mut visited = HashSet::new();
        let mut packages = Vec::new();

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id.clone()) {
                continue;
            }
            let container = self.container(&id)?;
            let version = latest(&*container);
            for constraint in container.dependencies(&version) {
                if !visited.contains(constraint.identifier()) {
                    queue.push_back(constraint.identifier().clone());
                }
            }
            packages.push(ResolvedPackage { container, version });
        }
        Ok(packages)
    }

    /// Latest version of every required package that agrees with the
    /// top-level requirements and with every other choice made so far.
    ///
    /// Also returns the packages excluded after a demotion abandoned them.
    #[allow(clippy::type_complexity)]
    fn resolve_constrained(
        &mut self,
        constraints: &[PackageContainerConstraint<IdentifierOf<P>>],
    ) -> Result<(Vec<ResolvedPackage<P::Container>>, Vec<IdentifierOf<P>>), ResolveError<P::Error>>
    {
        let mut roots: HashMap<IdentifierOf<P>, VersionSetSpecifier> = HashMap::new();
        for constraint in constraints {
            roots
                .entry(constraint.identifier().clone())
                .and_modify(|set| *set = set.intersection(constraint.requirement()))
                .or_insert_with(|| constraint.requirement().clone());
        }
        let root_order = canonical_roots(constraints);

        let mut assignment = VersionAssignment::new();
        let mut queue: VecDeque<IdentifierOf<P>> = root_order.iter().cloned().collect();

        while let Some(id) = queue.pop_front() {
            if assignment.get(&id).is_some() {
                continue;
            }
            let container = self.container(&id)?;

            if let Some(version) = bind_latest_valid(&mut assignment, &roots, &container) {
                tracing::debug!("Selected {id} {version}");
                enqueue_dependencies(&assignment, &*container, &version, &mut queue);
                continue;
            }

            if make_room(&mut assignment, &roots, &container, &mut queue)
                || demote_dependencies(&mut assignment, &roots, &container, &mut queue)
            {
                queue.push_front(id);
                continue;
            }

            let requirement = combined(roots.get(&id), assignment.constraint_on(&id, None));
            tracing::debug!("No version of {id} fits {requirement}");
            return Err(ResolveError::Unsatisfiable {
                identifier: id.to_string(),
                requirement,
            });
        }

        let packages = reachable(&assignment, &root_order);
        let required: HashSet<IdentifierOf<P>> =
            packages.iter().map(|p| p.identifier().clone()).collect();
        exclude_unrequired(&mut assignment, &required);
        Ok((packages, assignment.excluded()))
    }
}

/// Distinct top-level identifiers sorted by their display form, so the
/// outcome does not depend on the order requirements were listed in.
fn canonical_roots<I: PackageContainerIdentifier>(
    constraints: &[PackageContainerConstraint<I>],
) -> Vec<I> {
    let mut seen = HashSet::new();
    let mut roots: Vec<I> = constraints
        .iter()
        .map(|c| c.identifier().clone())
        .filter(|id| seen.insert(id.clone()))
        .collect();
    roots.sort_by_cached_key(|id| id.to_string());
    roots
}

fn latest<C: PackageContainer>(container: &C) -> Version {
    match container.latest_version() {
        Some(version) => version.clone(),
        None => panic!("container `{}` exposes no versions", container.identifier()),
    }
}

/// Top-level requirement intersected with the accumulated one.
fn combined(
    root: Option<&VersionSetSpecifier>,
    accumulated: Option<VersionSetSpecifier>,
) -> VersionSetSpecifier {
    let root = root.cloned().unwrap_or(VersionSetSpecifier::Any);
    match accumulated {
        Some(set) => root.intersection(&set),
        None => root,
    }
}

/// Bind the newest version of `container` the assignment accepts.
fn bind_latest_valid<C: PackageContainer>(
    assignment: &mut VersionAssignment<C>,
    roots: &HashMap<C::Identifier, VersionSetSpecifier>,
    container: &Arc<C>,
) -> Option<Version> {
    let id = container.identifier();
    let root = roots.get(id);
    for version in container.versions().iter().rev() {
        if root.is_some_and(|set| !set.contains(version)) {
            tracing::trace!("Skipping {id} {version}: outside top-level requirement");
            continue;
        }
        if assignment.try_bind(Arc::clone(container), BoundVersion::Version(version.clone())) {
            return Some(version.clone());
        }
    }
    None
}

fn enqueue_dependencies<C: PackageContainer>(
    assignment: &VersionAssignment<C>,
    container: &C,
    version: &Version,
    queue: &mut VecDeque<C::Identifier>,
) {
    for constraint in container.dependencies(version) {
        if assignment.get(constraint.identifier()).is_none() {
            queue.push_back(constraint.identifier().clone());
        }
    }
}

/// Demote one dependent of `blocked` to a lower version whose requirement
/// leaves `blocked` at least one usable version.
///
/// Dependents are tried most recently bound first, each from its next-lower
/// version downwards. Returns `false` when no single demotion helps.
fn make_room<C: PackageContainer>(
    assignment: &mut VersionAssignment<C>,
    roots: &HashMap<C::Identifier, VersionSetSpecifier>,
    blocked: &Arc<C>,
    queue: &mut VecDeque<C::Identifier>,
) -> bool {
    let target = blocked.identifier();
    let dependents: Vec<(Arc<C>, Version)> = assignment
        .iter()
        .filter_map(|(id, binding)| match binding {
            BoundVersion::Version(version) => assignment
                .container(id)
                .map(|container| (Arc::clone(container), version.clone())),
            BoundVersion::Excluded => None,
        })
        .filter(|(container, version)| {
            container
                .dependencies(version)
                .iter()
                .any(|c| c.identifier() == target)
        })
        .collect();

    for (dependent, current) in dependents.into_iter().rev() {
        let dependent_id = dependent.identifier().clone();
        let others = combined(
            roots.get(target),
            assignment.constraint_on(target, Some(&dependent_id)),
        );

        for lower in dependent.versions().iter().rev().filter(|v| **v < current) {
            if roots.get(&dependent_id).is_some_and(|set| !set.contains(lower)) {
                continue;
            }
            let requirement = dependent
                .dependencies(lower)
                .iter()
                .filter(|c| c.identifier() == target)
                .fold(others.clone(), |acc, c| acc.intersection(c.requirement()));
            let leaves_room = blocked.versions().iter().any(|v| {
                requirement.contains(v)
                    && assignment.is_compatible(blocked, &BoundVersion::Version(v.clone()))
            });
            if !leaves_room {
                continue;
            }
            if assignment.try_bind(Arc::clone(&dependent), BoundVersion::Version(lower.clone())) {
                tracing::debug!(
                    "Demoted {dependent_id} from {current} to {lower} to make room for {target}"
                );
                enqueue_dependencies(assignment, &*dependent, lower, queue);
                return true;
            }
        }
    }
    false
}

/// Lower the bound dependencies that keep `blocked` from binding.
///
/// Candidates of `blocked` are tried newest first. The first one whose
/// conflicting dependencies can each be lowered into its requirements gets
/// those dependencies demoted. Versions only ever go down, so repeated calls
/// terminate.
fn demote_dependencies<C: PackageContainer>(
    assignment: &mut VersionAssignment<C>,
    roots: &HashMap<C::Identifier, VersionSetSpecifier>,
    blocked: &Arc<C>,
    queue: &mut VecDeque<C::Identifier>,
) -> bool {
    let id = blocked.identifier();
    for candidate in blocked.versions().iter().rev() {
        if roots.get(id).is_some_and(|set| !set.contains(candidate))
            || !assignment.is_valid(&BoundVersion::Version(candidate.clone()), id)
        {
            continue;
        }

        let mut plan: Vec<(Arc<C>, Version)> = Vec::new();
        let mut feasible = true;
        for constraint in blocked.dependencies(candidate) {
            let target = constraint.identifier();
            let (Some(container), Some(BoundVersion::Version(bound))) =
                (assignment.container(target), assignment.get(target))
            else {
                continue;
            };
            if constraint.requirement().contains(bound) {
                continue;
            }
            let lower = container.versions().iter().rev().find(|v| {
                **v < *bound
                    && constraint.requirement().contains(v)
                    && roots.get(target).map_or(true, |set| set.contains(v))
                    && assignment.is_valid(&BoundVersion::Version((*v).clone()), target)
                    && assignment.is_compatible(container, &BoundVersion::Version((*v).clone()))
            });
            match lower {
                Some(lower) => plan.push((Arc::clone(container), lower.clone())),
                None => {
                    feasible = false;
                    break;
                }
            }
        }
        if !feasible || plan.is_empty() {
            continue;
        }

        let mut demoted = false;
        for (container, lower) in plan {
            if assignment.try_bind(Arc::clone(&container), BoundVersion::Version(lower.clone())) {
                tracing::debug!(
                    "Demoted {} to {lower} to make room for {id} {candidate}",
                    container.identifier()
                );
                enqueue_dependencies(assignment, &*container, &lower, queue);
                demoted = true;
            }
        }
        if demoted {
            return true;
        }
    }
    false
}

/// Version-bound packages reachable from the top-level identifiers through
/// chosen versions, in breadth-first order.
fn reachable<C: PackageContainer>(
    assignment: &VersionAssignment<C>,
    roots: &[C::Identifier],
) -> Vec<ResolvedPackage<C>> {
    let mut queue: VecDeque<C::Identifier> = roots.iter().cloned().collect();
    let mut seen = HashSet::new();
    let mut packages = Vec::new();

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id.clone()) {
            continue;
        }
        let (Some(container), Some(BoundVersion::Version(version))) =
            (assignment.container(&id), assignment.get(&id))
        else {
            continue;
        };
        for constraint in container.dependencies(version) {
            queue.push_back(constraint.identifier().clone());
        }
        packages.push(ResolvedPackage {
            container: Arc::clone(container),
            version: version.clone(),
        });
    }
    packages
}

/// Mark packages bound along abandoned paths as excluded.
///
/// Nothing reachable depends on an unreachable package, so the stale group
/// is always excludable as a whole, cycles among its members included.
fn exclude_unrequired<C: PackageContainer>(
    assignment: &mut VersionAssignment<C>,
    required: &HashSet<C::Identifier>,
) {
    let stale: Vec<C::Identifier> = assignment
        .iter()
        .filter(|(id, binding)| {
            !required.contains(*id) && matches!(binding, BoundVersion::Version(_))
        })
        .map(|(id, _)| id.clone())
        .collect();
    if stale.is_empty() {
        return;
    }
    if assignment.try_exclude_all(&stale) {
        for id in &stale {
            tracing::debug!("Excluded {id} (no longer required)");
        }
    } else {
        tracing::warn!("Could not exclude {} abandoned packages", stale.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn combined_without_requirements_is_any() {
        assert_eq!(combined(None, None), VersionSetSpecifier::Any);
    }

    #[test]
    fn combined_intersects_root_and_accumulated() {
        let root = VersionSetSpecifier::at_least(&v("1.0.0"));
        let accumulated = VersionSetSpecifier::below(&v("2.0.0"));
        assert_eq!(
            combined(Some(&root), Some(accumulated)),
            VersionSetSpecifier::range(v("1.0.0"), v("2.0.0"))
        );
    }

    #[test]
    fn unsatisfiable_display() {
        let err: ResolveError<std::io::Error> = ResolveError::Unsatisfiable {
            identifier: "b".to_string(),
            requirement: VersionSetSpecifier::below(&v("1.0.0")),
        };
        assert_eq!(
            err.to_string(),
            "no version of `b` is compatible with <1.0.0"
        );
    }

    #[test]
    fn provider_error_is_transparent() {
        let err: ResolveError<std::io::Error> =
            ResolveError::Provider(std::io::Error::new(std::io::ErrorKind::Other, "offline"));
        assert_eq!(err.to_string(), "offline");
    }
}
