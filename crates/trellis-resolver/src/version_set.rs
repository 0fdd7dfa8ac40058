//! Version set algebra.
//!
//! A [`VersionSetSpecifier`] describes which versions of a package are
//! acceptable. Sets are closed under intersection, which is how multiple
//! requirements on the same package combine.

use std::cmp;
use std::fmt;

use semver::{BuildMetadata, Prerelease, Version};

/// A possibly infinite set of versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionSetSpecifier {
    /// Every version.
    Any,
    /// No version at all.
    Empty,
    /// A non-empty half-open interval.
    Range(VersionRange),
}

/// Half-open interval `lower..upper`, lower inclusive, upper exclusive.
///
/// Only constructed through [`VersionSetSpecifier::range`], so `lower < upper`
/// always holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    lower: Version,
    upper: Version,
}

impl VersionRange {
    pub fn lower(&self) -> &Version {
        &self.lower
    }

    pub fn upper(&self) -> &Version {
        &self.upper
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.lower <= *version && *version < self.upper
    }
}

impl VersionSetSpecifier {
    /// The interval `lower..upper`, or [`VersionSetSpecifier::Empty`] when
    /// `lower >= upper`.
    pub fn range(lower: Version, upper: Version) -> Self {
        if lower < upper {
            Self::Range(VersionRange { lower, upper })
        } else {
            Self::Empty
        }
    }

    /// Exactly one version.
    pub fn exact(version: &Version) -> Self {
        Self::range(version.clone(), successor(version))
    }

    /// `version` and everything above it.
    pub fn at_least(version: &Version) -> Self {
        Self::range(version.clone(), max_version())
    }

    /// Everything strictly below `version`.
    pub fn below(version: &Version) -> Self {
        Self::range(min_version(), version.clone())
    }

    /// `version` up to, but excluding, the next major release line.
    pub fn up_to_next_major(version: &Version) -> Self {
        Self::range(
            version.clone(),
            prerelease_floor(version.major.saturating_add(1), 0, 0),
        )
    }

    /// `version` up to, but excluding, the next minor release line.
    pub fn up_to_next_minor(version: &Version) -> Self {
        Self::range(
            version.clone(),
            prerelease_floor(version.major, version.minor.saturating_add(1), 0),
        )
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Set intersection.
    pub fn intersection(&self, other: &Self) -> Self {
        use VersionSetSpecifier::{Any, Empty, Range};

        match (self, other) {
            (Any, Any) => Any,
            (Any, Empty) | (Empty, Any) => Empty,
            (Any, Range(r)) | (Range(r), Any) => Range(r.clone()),
            (Empty, Empty) => Empty,
            (Empty, Range(_)) | (Range(_), Empty) => Empty,
            (Range(a), Range(b)) => Self::range(
                cmp::max(&a.lower, &b.lower).clone(),
                cmp::min(&a.upper, &b.upper).clone(),
            ),
        }
    }

    pub fn contains(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Empty => false,
            Self::Range(range) => range.contains(version),
        }
    }
}

impl fmt::Display for VersionSetSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Empty => f.write_str("<no versions>"),
            Self::Range(range) => {
                let open_below = range.lower == min_version();
                let open_above = range.upper == max_version();
                match (open_below, open_above) {
                    (true, true) => f.write_str("*"),
                    (true, false) => write!(f, "<{}", range.upper),
                    (false, true) => write!(f, ">={}", range.lower),
                    (false, false) if range.upper == successor(&range.lower) => {
                        write!(f, "={}", range.lower)
                    }
                    (false, false) => write!(f, ">={}, <{}", range.lower, range.upper),
                }
            }
        }
    }
}

/// The lowest representable version, `0.0.0-0`.
pub fn min_version() -> Version {
    prerelease_floor(0, 0, 0)
}

/// Upper sentinel used for intervals without an upper bound.
pub fn max_version() -> Version {
    Version::new(u64::MAX, u64::MAX, u64::MAX)
}

/// `major.minor.patch-0`: the lowest pre-release of that release, which sorts
/// below every other pre-release and the release itself.
pub fn prerelease_floor(major: u64, minor: u64, patch: u64) -> Version {
    Version {
        major,
        minor,
        patch,
        pre: Prerelease::new("0").unwrap_or_default(),
        build: BuildMetadata::EMPTY,
    }
}

/// The smallest version ordered after `version`, ignoring build metadata.
pub fn successor(version: &Version) -> Version {
    if version.pre.is_empty() {
        return prerelease_floor(
            version.major,
            version.minor,
            version.patch.saturating_add(1),
        );
    }
    // `1.0.0-alpha` < `1.0.0-alpha.0`: an extra identifier sorts later.
    let pre =
        Prerelease::new(&format!("{}.0", version.pre)).unwrap_or_else(|_| version.pre.clone());
    Version {
        pre,
        build: BuildMetadata::EMPTY,
        ..version.clone()
    }
}
