//! Accumulated version decisions of one resolution run.
//!
//! A [`VersionAssignment`] maps containers to a [`BoundVersion`]. A missing
//! entry means "not decided yet", which is different from
//! [`BoundVersion::Excluded`]. Every write is checked so that no two stored
//! bindings ever contradict each other's requirements.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use semver::Version;

use crate::container::PackageContainer;
use crate::version_set::VersionSetSpecifier;

/// The decision recorded for one container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoundVersion {
    /// The container must not be part of the final graph.
    Excluded,
    /// The container resolves to this version.
    Version(Version),
}

impl fmt::Display for BoundVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excluded => f.write_str("excluded"),
            Self::Version(v) => write!(f, "{v}"),
        }
    }
}

/// Mapping from container identifier to its binding.
///
/// The container itself is kept next to its binding so requirements can be
/// re-derived without another fetch.
pub struct VersionAssignment<C: PackageContainer> {
    bindings: HashMap<C::Identifier, (Arc<C>, BoundVersion)>,
    /// Identifiers in first-write order.
    order: Vec<C::Identifier>,
}

impl<C: PackageContainer> VersionAssignment<C> {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn get(&self, identifier: &C::Identifier) -> Option<&BoundVersion> {
        self.bindings.get(identifier).map(|(_, binding)| binding)
    }

    pub fn container(&self, identifier: &C::Identifier) -> Option<&Arc<C>> {
        self.bindings.get(identifier).map(|(container, _)| container)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in the order their identifiers were first written.
    pub fn iter(&self) -> impl Iterator<Item = (&C::Identifier, &BoundVersion)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.bindings.get(id).map(|(_, binding)| (id, binding)))
    }

    /// Every version-bound container, in first-write order.
    pub fn bound_versions(&self) -> Vec<(C::Identifier, Version)> {
        self.iter()
            .filter_map(|(id, binding)| match binding {
                BoundVersion::Version(v) => Some((id.clone(), v.clone())),
                BoundVersion::Excluded => None,
            })
            .collect()
    }

    /// Requirements induced by every version-bound container, intersected per target.
    ///
    /// Recomputed on each call from the current bindings.
    pub fn constraints(&self) -> HashMap<C::Identifier, VersionSetSpecifier> {
        let mut merged: HashMap<C::Identifier, VersionSetSpecifier> = HashMap::new();
        for (container, binding) in self.bindings.values() {
            let BoundVersion::Version(version) = binding else {
                continue;
            };
            for constraint in container.dependencies(version) {
                merged
                    .entry(constraint.identifier().clone())
                    .and_modify(|set| *set = set.intersection(constraint.requirement()))
                    .or_insert_with(|| constraint.requirement().clone());
            }
        }
        merged
    }

    /// Merged requirement on `target` from every version-bound container
    /// except `skip`, or `None` when nothing constrains it.
    pub fn constraint_on(
        &self,
        target: &C::Identifier,
        skip: Option<&C::Identifier>,
    ) -> Option<VersionSetSpecifier> {
        let mut merged: Option<VersionSetSpecifier> = None;
        for (id, (container, binding)) in &self.bindings {
            if Some(id) == skip {
                continue;
            }
            let BoundVersion::Version(version) = binding else {
                continue;
            };
            for constraint in container.dependencies(version) {
                if constraint.identifier() != target {
                    continue;
                }
                merged = Some(match merged {
                    Some(set) => set.intersection(constraint.requirement()),
                    None => constraint.requirement().clone(),
                });
            }
        }
        merged
    }

    /// Whether `binding` for `identifier` agrees with the requirements every
    /// other stored binding places on it.
    ///
    /// `Excluded` is valid only while nothing else constrains the identifier;
    /// a version is valid when unconstrained or inside the merged requirement.
    pub fn is_valid(&self, binding: &BoundVersion, identifier: &C::Identifier) -> bool {
        let constraint = self.constraint_on(identifier, Some(identifier));
        match binding {
            BoundVersion::Excluded => constraint.is_none(),
            BoundVersion::Version(version) => {
                constraint.map_or(true, |set| set.contains(version))
            }
        }
    }

    /// Whether the requirements `binding` would induce admit every other
    /// stored binding.
    pub fn is_compatible(&self, container: &C, binding: &BoundVersion) -> bool {
        let BoundVersion::Version(version) = binding else {
            return true;
        };
        let own = container.identifier();
        container.dependencies(version).iter().all(|constraint| {
            let target = constraint.identifier();
            if target == own {
                return constraint.requirement().contains(version);
            }
            match self.get(target) {
                None => true,
                Some(BoundVersion::Excluded) => false,
                Some(BoundVersion::Version(bound)) => constraint.requirement().contains(bound),
            }
        })
    }

    /// Propose a binding: commit it if it keeps the assignment consistent.
    ///
    /// Returns `false` and leaves the assignment untouched otherwise.
    pub fn try_bind(&mut self, container: Arc<C>, binding: BoundVersion) -> bool {
        let identifier = container.identifier().clone();
        if !self.is_valid(&binding, &identifier) || !self.is_compatible(&container, &binding) {
            tracing::trace!("Rejected {identifier} = {binding}");
            return false;
        }
        self.commit(identifier, container, binding);
        true
    }

    /// Exclude a group of containers at once.
    ///
    /// Succeeds when no version-bound container outside the group constrains
    /// any member, so members that only constrain each other (a cycle) can
    /// be excluded together. Returns `false` and leaves the assignment
    /// untouched otherwise.
    pub fn try_exclude_all(&mut self, identifiers: &[C::Identifier]) -> bool {
        let blocked = self.bindings.iter().any(|(id, (container, binding))| {
            let BoundVersion::Version(version) = binding else {
                return false;
            };
            !identifiers.contains(id)
                && container
                    .dependencies(version)
                    .iter()
                    .any(|c| identifiers.contains(c.identifier()))
        });
        if blocked {
            tracing::trace!("Rejected exclusion of {} containers", identifiers.len());
            return false;
        }
        for id in identifiers {
            if let Some((container, _)) = self.bindings.get(id) {
                let container = Arc::clone(container);
                self.commit(id.clone(), container, BoundVersion::Excluded);
            }
        }
        true
    }

    /// Identifiers bound to [`BoundVersion::Excluded`], in first-write order.
    pub fn excluded(&self) -> Vec<C::Identifier> {
        self.iter()
            .filter(|(_, binding)| **binding == BoundVersion::Excluded)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Write a binding known to be valid.
    ///
    /// # Panics
    ///
    /// Panics when the binding would contradict another stored binding; use
    /// [`Self::try_bind`] for bindings that may be rejected.
    pub fn set(&mut self, container: Arc<C>, binding: BoundVersion) {
        let identifier = container.identifier().clone();
        assert!(
            self.is_valid(&binding, &identifier) && self.is_compatible(&container, &binding),
            "invalid binding {identifier} = {binding}"
        );
        self.commit(identifier, container, binding);
    }

    fn commit(&mut self, identifier: C::Identifier, container: Arc<C>, binding: BoundVersion) {
        tracing::trace!("Bound {identifier} = {binding}");
        if self
            .bindings
            .insert(identifier.clone(), (container, binding))
            .is_none()
        {
            self.order.push(identifier);
        }
    }
}

impl<C: PackageContainer> Default for VersionAssignment<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryContainer;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn below(s: &str) -> VersionSetSpecifier {
        VersionSetSpecifier::below(&v(s))
    }

    /// `a@2.0.0` requires `b <2.0.0`; `a@1.0.0` has no requirements.
    type Container = Arc<InMemoryContainer<&'static str>>;

    fn containers() -> (Container, Container) {
        let a = InMemoryContainer::new("a")
            .with_version(v("1.0.0"), [])
            .with_version(v("2.0.0"), [("b", below("2.0.0"))]);
        let b = InMemoryContainer::new("b")
            .with_version(v("1.0.0"), [])
            .with_version(v("2.0.0"), []);
        (Arc::new(a), Arc::new(b))
    }

    #[test]
    fn empty_assignment_accepts_anything() {
        let (a, _) = containers();
        let assignment = VersionAssignment::<InMemoryContainer<&str>>::new();
        assert!(assignment.is_empty());
        assert!(assignment.is_valid(&BoundVersion::Excluded, &"a"));
        assert!(assignment.is_valid(&BoundVersion::Version(v("2.0.0")), &"a"));
        assert!(assignment.is_compatible(&a, &BoundVersion::Version(v("2.0.0"))));
        assert!(assignment.constraints().is_empty());
    }

    #[test]
    fn bound_version_constrains_dependency() {
        let (a, b) = containers();
        let mut assignment = VersionAssignment::new();
        assignment.set(a, BoundVersion::Version(v("2.0.0")));

        assert_eq!(assignment.constraints().get("b"), Some(&below("2.0.0")));
        assert!(assignment.is_valid(&BoundVersion::Version(v("1.0.0")), &"b"));
        assert!(!assignment.is_valid(&BoundVersion::Version(v("2.0.0")), &"b"));
        assert!(!assignment.is_valid(&BoundVersion::Excluded, &"b"));

        assert!(!assignment.try_bind(b.clone(), BoundVersion::Version(v("2.0.0"))));
        assert_eq!(assignment.get(&"b"), None);
        assert!(assignment.try_bind(b, BoundVersion::Version(v("1.0.0"))));
        assert_eq!(assignment.get(&"b"), Some(&BoundVersion::Version(v("1.0.0"))));
    }

    #[test]
    fn excluded_container_contributes_no_constraints() {
        let (a, _) = containers();
        let mut assignment = VersionAssignment::new();
        assignment.set(a, BoundVersion::Excluded);
        assert!(assignment.constraints().is_empty());
        assert!(assignment.is_valid(&BoundVersion::Excluded, &"b"));
    }

    #[test]
    fn incompatible_with_existing_binding() {
        let (a, b) = containers();
        let mut assignment = VersionAssignment::new();
        assignment.set(b, BoundVersion::Version(v("2.0.0")));

        assert!(!assignment.is_compatible(&a, &BoundVersion::Version(v("2.0.0"))));
        assert!(!assignment.try_bind(a.clone(), BoundVersion::Version(v("2.0.0"))));
        assert!(assignment.try_bind(a, BoundVersion::Version(v("1.0.0"))));
    }

    #[test]
    fn depending_on_excluded_container_is_incompatible() {
        let (a, b) = containers();
        let mut assignment = VersionAssignment::new();
        assignment.set(b, BoundVersion::Excluded);
        assert!(!assignment.try_bind(a.clone(), BoundVersion::Version(v("2.0.0"))));
        assert!(assignment.try_bind(a, BoundVersion::Version(v("1.0.0"))));
    }

    #[test]
    fn rebinding_replaces_and_releases_constraints() {
        let (a, b) = containers();
        let mut assignment = VersionAssignment::new();
        assignment.set(a.clone(), BoundVersion::Version(v("2.0.0")));
        assignment.set(b.clone(), BoundVersion::Version(v("1.0.0")));

        assert!(assignment.try_bind(a, BoundVersion::Version(v("1.0.0"))));
        assert_eq!(assignment.len(), 2);
        assert!(assignment.constraints().is_empty());
        assert!(assignment.try_bind(b, BoundVersion::Excluded));

        let order: Vec<_> = assignment.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(assignment.bound_versions(), vec![("a", v("1.0.0"))]);
    }

    #[test]
    fn constraints_intersect_across_dependents() {
        let a = InMemoryContainer::new("a").with_version(
            v("1.0.0"),
            [("c", VersionSetSpecifier::at_least(&v("1.2.0")))],
        );
        let b = InMemoryContainer::new("b").with_version(v("1.0.0"), [("c", below("1.5.0"))]);
        let mut assignment = VersionAssignment::new();
        assignment.set(Arc::new(a), BoundVersion::Version(v("1.0.0")));
        assignment.set(Arc::new(b), BoundVersion::Version(v("1.0.0")));

        let merged = VersionSetSpecifier::range(v("1.2.0"), v("1.5.0"));
        assert_eq!(assignment.constraints().get("c"), Some(&merged));
        assert_eq!(
            assignment.constraint_on(&"c", Some(&"b")),
            Some(VersionSetSpecifier::at_least(&v("1.2.0")))
        );
    }

    #[test]
    fn mutually_constraining_group_is_excluded_together() {
        let d = InMemoryContainer::new("d")
            .with_version(v("1.0.0"), [("e", VersionSetSpecifier::Any)]);
        let e = InMemoryContainer::new("e")
            .with_version(v("1.0.0"), [("d", VersionSetSpecifier::Any)]);
        let mut assignment = VersionAssignment::new();
        assignment.set(Arc::new(d), BoundVersion::Version(v("1.0.0")));
        let e = Arc::new(e);
        assignment.set(Arc::clone(&e), BoundVersion::Version(v("1.0.0")));

        assert!(!assignment.try_bind(e, BoundVersion::Excluded));
        assert!(assignment.try_exclude_all(&["d", "e"]));
        assert_eq!(assignment.excluded(), vec!["d", "e"]);
        assert!(assignment.bound_versions().is_empty());
    }

    #[test]
    fn group_exclusion_rejected_while_constrained_from_outside() {
        let (a, b) = containers();
        let mut assignment = VersionAssignment::new();
        assignment.set(a, BoundVersion::Version(v("2.0.0")));
        assignment.set(b, BoundVersion::Version(v("1.0.0")));

        assert!(!assignment.try_exclude_all(&["b"]));
        assert_eq!(assignment.get(&"b"), Some(&BoundVersion::Version(v("1.0.0"))));
        assert!(assignment.excluded().is_empty());
        assert!(assignment.try_exclude_all(&["a", "b"]));
    }

    #[test]
    #[should_panic(expected = "invalid binding")]
    fn set_panics_on_invalid_binding() {
        let (a, b) = containers();
        let mut assignment = VersionAssignment::new();
        assignment.set(a, BoundVersion::Version(v("2.0.0")));
        assignment.set(b, BoundVersion::Version(v("2.0.0")));
    }
}
