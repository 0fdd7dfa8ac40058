//! Requirement string parsing.
//!
//! Supported forms:
//! - `*` or an empty string: any version
//! - interval notation: `[1.0.0,2.0.0)`, `(1.0,2.0]`, `[1.0,)`, `(,2.0)`, `[1.5.0]` (exact)
//! - comma-separated comparators, all of which must hold:
//!   `>=1.0`, `>1.0`, `<2`, `<=1.4.2`, `=1.2.3`, `~1.2`, `^1.2.3`
//! - a bare version, read as a caret requirement (`1.2` is `^1.2`)
//!
//! Partial versions (`1`, `1.2`) are padded with zeros; comparators that
//! depend on precision (`>`, `<=`, `=`, `~`, `^`) honour how many parts were
//! written.

use semver::Version;
use thiserror::Error;

use crate::version_set::{
    max_version, min_version, prerelease_floor, successor, VersionSetSpecifier,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementError {
    #[error("invalid version `{version}` in requirement `{input}`")]
    InvalidVersion { input: String, version: String },

    #[error("malformed interval `{input}`")]
    MalformedInterval { input: String },

    #[error("empty comparator in requirement `{input}`")]
    EmptyComparator { input: String },
}

/// Parse a requirement string into the set of versions it admits.
pub fn parse_requirement(input: &str) -> Result<VersionSetSpecifier, RequirementError> {
    let s = input.trim();
    if s.is_empty() || s == "*" {
        return Ok(VersionSetSpecifier::Any);
    }
    if s.starts_with('[') || s.starts_with('(') {
        return parse_interval(input, s);
    }

    let mut set = VersionSetSpecifier::Any;
    for comparator in s.split(',') {
        let comparator = comparator.trim();
        if comparator.is_empty() {
            return Err(RequirementError::EmptyComparator {
                input: input.to_string(),
            });
        }
        set = set.intersection(&parse_comparator(input, comparator)?);
    }
    Ok(set)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Exact,
    Tilde,
    Caret,
}

fn parse_comparator(
    input: &str,
    comparator: &str,
) -> Result<VersionSetSpecifier, RequirementError> {
    let (op, rest) = if let Some(rest) = comparator.strip_prefix(">=") {
        (Op::GreaterEq, rest)
    } else if let Some(rest) = comparator.strip_prefix("<=") {
        (Op::LessEq, rest)
    } else if let Some(rest) = comparator.strip_prefix('>') {
        (Op::Greater, rest)
    } else if let Some(rest) = comparator.strip_prefix('<') {
        (Op::Less, rest)
    } else if let Some(rest) = comparator.strip_prefix('=') {
        (Op::Exact, rest)
    } else if let Some(rest) = comparator.strip_prefix('~') {
        (Op::Tilde, rest)
    } else if let Some(rest) = comparator.strip_prefix('^') {
        (Op::Caret, rest)
    } else {
        (Op::Caret, comparator)
    };

    let (version, parts) = parse_partial(input, rest.trim())?;
    let set = match op {
        Op::GreaterEq => VersionSetSpecifier::at_least(&version),
        Op::Greater => VersionSetSpecifier::at_least(&bump(&version, parts)),
        Op::Less => VersionSetSpecifier::below(&version),
        Op::LessEq => VersionSetSpecifier::below(&bump(&version, parts)),
        Op::Exact => VersionSetSpecifier::range(version.clone(), bump(&version, parts)),
        Op::Tilde => {
            let upper = if parts == 1 {
                prerelease_floor(version.major.saturating_add(1), 0, 0)
            } else {
                prerelease_floor(version.major, version.minor.saturating_add(1), 0)
            };
            VersionSetSpecifier::range(version, upper)
        }
        Op::Caret => caret(version, parts),
    };
    Ok(set)
}

/// `^v`: changes that do not modify the left-most non-zero part written.
fn caret(version: Version, parts: usize) -> VersionSetSpecifier {
    let upper = if version.major > 0 || parts == 1 {
        prerelease_floor(version.major.saturating_add(1), 0, 0)
    } else if version.minor > 0 || parts == 2 {
        prerelease_floor(0, version.minor.saturating_add(1), 0)
    } else {
        prerelease_floor(0, 0, version.patch.saturating_add(1))
    };
    VersionSetSpecifier::range(version, upper)
}

/// The first version past everything `version` matches at the written precision.
fn bump(version: &Version, parts: usize) -> Version {
    match parts {
        1 => prerelease_floor(version.major.saturating_add(1), 0, 0),
        2 => prerelease_floor(version.major, version.minor.saturating_add(1), 0),
        _ => successor(version),
    }
}

/// Parse `1`, `1.2` or a full semver version, returning how many parts were given.
fn parse_partial(input: &str, text: &str) -> Result<(Version, usize), RequirementError> {
    let invalid = || RequirementError::InvalidVersion {
        input: input.to_string(),
        version: text.to_string(),
    };

    if let Ok(version) = Version::parse(text) {
        return Ok((version, 3));
    }
    let numbers = text
        .split('.')
        .map(|part| part.parse::<u64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    match numbers.as_slice() {
        [major] => Ok((Version::new(*major, 0, 0), 1)),
        [major, minor] => Ok((Version::new(*major, *minor, 0), 2)),
        _ => Err(invalid()),
    }
}

fn parse_interval(input: &str, s: &str) -> Result<VersionSetSpecifier, RequirementError> {
    let malformed = || RequirementError::MalformedInterval {
        input: input.to_string(),
    };

    let lower_inclusive = s.starts_with('[');
    let upper_inclusive = match s.chars().last() {
        Some(']') => true,
        Some(')') => false,
        _ => return Err(malformed()),
    };
    if s.len() < 2 {
        return Err(malformed());
    }
    let inner = &s[1..s.len() - 1];

    let Some((lower, upper)) = inner.split_once(',') else {
        // `[1.0]` means exactly 1.0
        if !(lower_inclusive && upper_inclusive) {
            return Err(malformed());
        }
        let (version, parts) = parse_partial(input, inner.trim())?;
        return Ok(VersionSetSpecifier::range(
            version.clone(),
            bump(&version, parts),
        ));
    };

    let lower = lower.trim();
    let upper = upper.trim();
    let lower = if lower.is_empty() {
        min_version()
    } else {
        let (version, parts) = parse_partial(input, lower)?;
        if lower_inclusive {
            version
        } else {
            bump(&version, parts)
        }
    };
    let upper = if upper.is_empty() {
        max_version()
    } else {
        let (version, parts) = parse_partial(input, upper)?;
        if upper_inclusive {
            bump(&version, parts)
        } else {
            version
        }
    };
    Ok(VersionSetSpecifier::range(lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn admits(req: &str, version: &str) -> bool {
        parse_requirement(req).unwrap().contains(&v(version))
    }

    #[test]
    fn wildcard() {
        assert_eq!(parse_requirement("*").unwrap(), VersionSetSpecifier::Any);
        assert_eq!(parse_requirement("  ").unwrap(), VersionSetSpecifier::Any);
    }

    #[test]
    fn less_than() {
        assert!(admits("<2.0.0", "1.5.0"));
        assert!(!admits("<2.0.0", "2.0.0"));
        assert!(!admits("<2", "2.0.0"));
    }

    #[test]
    fn comparator_list() {
        let req = ">=1.0.0, <2.0.0";
        assert!(admits(req, "1.0.0"));
        assert!(admits(req, "1.9.3"));
        assert!(!admits(req, "0.9.0"));
        assert!(!admits(req, "2.0.0"));
    }

    #[test]
    fn greater_than_partial() {
        assert!(!admits(">1.2", "1.2.9"));
        assert!(admits(">1.2", "1.3.0"));
        assert!(admits(">1.2.3", "1.2.4"));
        assert!(!admits(">1.2.3", "1.2.3"));
    }

    #[test]
    fn less_or_equal_partial() {
        assert!(admits("<=1.2", "1.2.9"));
        assert!(!admits("<=1.2", "1.3.0"));
        assert!(admits("<=1.2.3", "1.2.3"));
        assert!(!admits("<=1.2.3", "1.2.4"));
    }

    #[test]
    fn exact() {
        assert!(admits("=1.2.3", "1.2.3"));
        assert!(!admits("=1.2.3", "1.2.4"));
        assert!(admits("=1.2", "1.2.7"));
        assert!(!admits("=1.2", "1.3.0"));
    }

    #[test]
    fn tilde() {
        assert!(admits("~1.2.3", "1.2.9"));
        assert!(!admits("~1.2.3", "1.3.0"));
        assert!(admits("~1", "1.9.0"));
        assert!(!admits("~1", "2.0.0"));
    }

    #[test]
    fn caret_and_bare() {
        assert!(admits("^1.2.3", "1.9.0"));
        assert!(!admits("^1.2.3", "2.0.0"));
        assert!(!admits("^1.2.3", "1.2.2"));
        assert!(admits("1.2", "1.4.0"));
        assert!(admits("^0.2.3", "0.2.9"));
        assert!(!admits("^0.2.3", "0.3.0"));
        assert!(admits("^0.0.3", "0.0.3"));
        assert!(!admits("^0.0.3", "0.0.4"));
        assert!(admits("^0", "0.9.0"));
        assert!(!admits("^0", "1.0.0"));
    }

    #[test]
    fn interval_notation() {
        assert!(admits("[1.0,2.0)", "1.0.0"));
        assert!(!admits("[1.0,2.0)", "2.0.0"));
        assert!(admits("[1.0.0,2.0.0]", "2.0.0"));
        assert!(!admits("(1.0.0,2.0.0]", "1.0.0"));
        assert!(admits("(1.0.0,2.0.0]", "1.0.1"));
        assert!(admits("[1.0,)", "99.0.0"));
        assert!(admits("(,2.0)", "0.1.0"));
        assert!(!admits("(,2.0)", "2.0.0"));
    }

    #[test]
    fn interval_exact() {
        assert!(admits("[1.5.0]", "1.5.0"));
        assert!(!admits("[1.5.0]", "1.5.1"));
        assert!(!admits("[1.5.0]", "1.4.0"));
    }

    #[test]
    fn contradictory_comparators_are_empty() {
        assert_eq!(
            parse_requirement(">=2.0.0, <1.0.0").unwrap(),
            VersionSetSpecifier::Empty
        );
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(
            parse_requirement(">=one"),
            Err(RequirementError::InvalidVersion { .. })
        ));
        assert!(matches!(
            parse_requirement("1.2.3.4"),
            Err(RequirementError::InvalidVersion { .. })
        ));
        assert!(matches!(
            parse_requirement("[1.0,2.0"),
            Err(RequirementError::MalformedInterval { .. })
        ));
        assert!(matches!(
            parse_requirement("(1.0)"),
            Err(RequirementError::MalformedInterval { .. })
        ));
        assert!(matches!(
            parse_requirement(">=1.0,"),
            Err(RequirementError::EmptyComparator { .. })
        ));
    }
}
