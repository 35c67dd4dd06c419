//! Version predicates and the legacy total ordering.
//!
//! A predicate pairs a project name with an optional constraint list, e.g.
//! `demo (>=1.0,<3.0)`. Constraint versions must parse as dotted release
//! numbers; candidate versions that do not parse fail [`VersionPredicate::matches`]
//! with a typed error so callers can decide whether to skip or surface them.
//! [`legacy_sort_key`] orders *arbitrary* version strings, parseable or not.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[allow(clippy::expect_used)]
static PREDICATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_.-]*)\s*(?:\((.*)\)\s*)?$")
        .expect("predicate regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static LEGACY_COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+|[a-z]+|\.|-").expect("legacy component regex is valid") // Static pattern, safe to panic
});

/// Errors from predicate parsing and version matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// Predicate text is not `name` or `name (constraints)`.
    #[error("invalid version predicate '{input}': expected 'name' or 'name (constraints)'")]
    InvalidPredicate {
        /// The predicate text that failed to parse.
        input: String,
    },

    /// A constraint is not an operator followed by a version.
    #[error("invalid version constraint '{constraint}': expected an operator followed by a version")]
    InvalidConstraint {
        /// The constraint text that failed to parse.
        constraint: String,
    },

    /// A version string does not parse as a dotted release number.
    #[error("cannot parse version '{version}' as a release number")]
    InvalidVersion {
        /// The version string that failed to parse.
        version: String,
    },
}

impl VersionError {
    fn invalid_predicate(input: &str) -> Self {
        Self::InvalidPredicate {
            input: input.to_string(),
        }
    }

    fn invalid_constraint(constraint: &str) -> Self {
        Self::InvalidConstraint {
            constraint: constraint.to_string(),
        }
    }

    fn invalid_version(version: &str) -> Self {
        Self::InvalidVersion {
            version: version.to_string(),
        }
    }
}

/// Comparison operator in a version constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

/// One `<op><version>` clause of a predicate.
#[derive(Debug, Clone)]
struct Constraint {
    op: Op,
    release: Vec<u64>,
}

impl Constraint {
    fn parse(text: &str) -> Result<Self, VersionError> {
        let trimmed = text.trim();
        let (op, rest) = if let Some(rest) = trimmed.strip_prefix("==") {
            (Op::Eq, rest)
        } else if let Some(rest) = trimmed.strip_prefix("!=") {
            (Op::Ne, rest)
        } else if let Some(rest) = trimmed.strip_prefix("<=") {
            (Op::Le, rest)
        } else if let Some(rest) = trimmed.strip_prefix(">=") {
            (Op::Ge, rest)
        } else if let Some(rest) = trimmed.strip_prefix('<') {
            (Op::Lt, rest)
        } else if let Some(rest) = trimmed.strip_prefix('>') {
            (Op::Gt, rest)
        } else {
            return Err(VersionError::invalid_constraint(text));
        };
        let release =
            parse_release(rest.trim()).map_err(|_| VersionError::invalid_constraint(text))?;
        Ok(Self { op, release })
    }

    fn holds(&self, candidate: &[u64]) -> bool {
        match compare_releases(candidate, &self.release) {
            Ordering::Less => matches!(self.op, Op::Lt | Op::Le | Op::Ne),
            Ordering::Equal => matches!(self.op, Op::Le | Op::Eq | Op::Ge),
            Ordering::Greater => matches!(self.op, Op::Gt | Op::Ge | Op::Ne),
        }
    }
}

/// A project name plus version constraints, e.g. `demo (>=1.0,<3.0)`.
#[derive(Debug, Clone)]
pub struct VersionPredicate {
    project: String,
    constraints: Vec<Constraint>,
}

impl VersionPredicate {
    /// Parses `predicate` into a project name and constraint list.
    ///
    /// A bare name (no parenthesized constraints) matches any version.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::InvalidPredicate`] for malformed input and
    /// [`VersionError::InvalidConstraint`] for an unparseable clause.
    pub fn parse(predicate: &str) -> Result<Self, VersionError> {
        let caps = PREDICATE
            .captures(predicate)
            .ok_or_else(|| VersionError::invalid_predicate(predicate))?;
        let project = caps
            .get(1)
            .ok_or_else(|| VersionError::invalid_predicate(predicate))?
            .as_str()
            .to_string();
        let constraints = match caps.get(2) {
            Some(clauses) => clauses
                .as_str()
                .split(',')
                .map(Constraint::parse)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            project,
            constraints,
        })
    }

    /// The project name this predicate selects.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Tests `version` against every constraint.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::InvalidVersion`] when `version` does not parse
    /// as a dotted release number.
    pub fn matches(&self, version: &str) -> Result<bool, VersionError> {
        let candidate = parse_release(version)?;
        Ok(self.constraints.iter().all(|c| c.holds(&candidate)))
    }
}

fn parse_release(version: &str) -> Result<Vec<u64>, VersionError> {
    if version.is_empty() {
        return Err(VersionError::invalid_version(version));
    }
    version
        .split('.')
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| VersionError::invalid_version(version))
        })
        .collect()
}

/// Compares dotted releases component-wise with implicit zero padding, so
/// `1.0` equals `1.0.0`.
fn compare_releases(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

/// Total ordering key for arbitrary version strings, in the style of legacy
/// setuptools keys.
///
/// Numeric runs are zero-padded, alphabetic runs are `*`-prefixed (sorting
/// before numerics) with pre-release aliases `pre`/`preview`/`rc` mapped to
/// `c` and `dev` to `@`, and the key is terminated by `*final` so
/// `1.0b1 < 1.0rc1 < 1.0 < 1.0-2`.
#[must_use]
pub fn legacy_sort_key(version: &str) -> Vec<String> {
    let lower = version.to_ascii_lowercase();
    let mut key = Vec::new();
    for piece in LEGACY_COMPONENT.find_iter(&lower) {
        let piece = match piece.as_str() {
            "." => continue,
            "-" => "final-",
            "pre" | "preview" | "rc" => "c",
            "dev" => "@",
            other => other,
        };
        if piece.starts_with(|c: char| c.is_ascii_digit()) {
            key.push(format!("{piece:0>8}"));
        } else {
            key.push(format!("*{piece}"));
        }
    }
    key.push("*final".to_string());
    key
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_bare_name_matches_everything() {
        let predicate = VersionPredicate::parse("demo").unwrap();
        assert_eq!(predicate.project(), "demo");
        assert!(predicate.matches("0.1").unwrap());
        assert!(predicate.matches("99.99.99").unwrap());
    }

    #[test]
    fn test_predicate_with_constraints() {
        let predicate = VersionPredicate::parse("demo (>=1.0, <3.0)").unwrap();
        assert_eq!(predicate.project(), "demo");
        assert!(!predicate.matches("0.9").unwrap());
        assert!(predicate.matches("1.0").unwrap());
        assert!(predicate.matches("2.0").unwrap());
        assert!(!predicate.matches("3.0").unwrap());
    }

    #[test]
    fn test_predicate_exact_and_exclusion() {
        let predicate = VersionPredicate::parse("demo (==1.2)").unwrap();
        assert!(predicate.matches("1.2").unwrap());
        assert!(predicate.matches("1.2.0").unwrap());
        assert!(!predicate.matches("1.2.1").unwrap());

        let predicate = VersionPredicate::parse("demo (!=1.2)").unwrap();
        assert!(!predicate.matches("1.2").unwrap());
        assert!(predicate.matches("1.3").unwrap());
    }

    #[test]
    fn test_predicate_rejects_malformed_input() {
        assert!(matches!(
            VersionPredicate::parse("1demo"),
            Err(VersionError::InvalidPredicate { .. })
        ));
        assert!(matches!(
            VersionPredicate::parse("demo (1.0)"),
            Err(VersionError::InvalidConstraint { .. })
        ));
        assert!(matches!(
            VersionPredicate::parse("demo (>=abc)"),
            Err(VersionError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn test_matches_unparseable_candidate_is_an_error() {
        let predicate = VersionPredicate::parse("demo (>=1.0)").unwrap();
        assert_eq!(
            predicate.matches("bogus"),
            Err(VersionError::InvalidVersion {
                version: "bogus".to_string()
            })
        );
    }

    #[test]
    fn test_compare_releases_zero_padding() {
        assert_eq!(compare_releases(&[1, 0], &[1, 0, 0]), Ordering::Equal);
        assert_eq!(compare_releases(&[1, 0, 1], &[1, 0]), Ordering::Greater);
        assert_eq!(compare_releases(&[1, 9], &[2, 0]), Ordering::Less);
    }

    #[test]
    fn test_legacy_sort_key_orders_releases() {
        let mut versions = vec!["2.0", "1.0.1", "1.0", "10.0", "1.9"];
        versions.sort_by_key(|v| legacy_sort_key(v));
        assert_eq!(versions, vec!["1.0", "1.0.1", "1.9", "2.0", "10.0"]);
    }

    #[test]
    fn test_legacy_sort_key_prereleases_sort_before_final() {
        assert!(legacy_sort_key("1.0b1") < legacy_sort_key("1.0"));
        assert!(legacy_sort_key("1.0b1") < legacy_sort_key("1.0rc1"));
        assert!(legacy_sort_key("1.0rc1") < legacy_sort_key("1.0"));
        assert!(legacy_sort_key("1.0") < legacy_sort_key("1.0-2"));
    }

    #[test]
    fn test_legacy_sort_key_total_over_arbitrary_strings() {
        // Unparseable versions still get a stable position.
        let mut versions = vec!["bogus", "1.0", "2.0"];
        versions.sort_by_key(|v| legacy_sort_key(v));
        assert_eq!(versions.len(), 3);
        assert!(legacy_sort_key("bogus") < legacy_sort_key("1.0"));
    }
}
