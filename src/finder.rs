//! Predicate-driven release selection.

use tracing::{debug, instrument};

use crate::locator::{AggregatingLocator, Locator};
use crate::record::DistributionRecord;
use crate::version::{VersionError, VersionPredicate, legacy_sort_key};

/// Selects the best matching release for a version predicate.
///
/// Holds an explicitly constructed [`AggregatingLocator`]; there is no
/// process-wide default instance.
///
/// # Example
///
/// ```no_run
/// use pkgscout::finder::ReleaseFinder;
/// use pkgscout::locator::{AggregatingLocator, ScrapingLocator};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut locator = AggregatingLocator::new();
/// locator.register(Box::new(ScrapingLocator::new(
///     "https://index.example.com/simple/",
/// )?));
///
/// let finder = ReleaseFinder::new(locator);
/// if let Some(record) = finder.locate("demo (>=1.0,<3.0)").await? {
///     println!("best match: {} {}", record.name, record.version);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ReleaseFinder {
    locator: AggregatingLocator,
}

impl ReleaseFinder {
    /// Creates a finder over `locator`.
    #[must_use]
    pub fn new(locator: AggregatingLocator) -> Self {
        Self { locator }
    }

    /// Resolves `predicate` (e.g. `"demo (>=1.0,<3.0)"`) to the highest
    /// matching release, or `None` when the project has no versions or none
    /// satisfy the constraints.
    ///
    /// Candidate versions the predicate cannot interpret are skipped, not
    /// surfaced as errors; an empty result and a failed backend look the
    /// same here and are distinguishable only via logs.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] when the predicate itself is malformed.
    #[instrument(skip(self))]
    pub async fn locate(
        &self,
        predicate: &str,
    ) -> Result<Option<DistributionRecord>, VersionError> {
        let predicate = VersionPredicate::parse(predicate)?;
        let releases = self.locator.get_project(predicate.project()).await;

        let mut candidates: Vec<&str> = releases
            .versions()
            .filter(|version| predicate.matches(version).unwrap_or(false))
            .collect();
        if candidates.len() > 1 {
            candidates.sort_by_cached_key(|version| legacy_sort_key(version));
        }

        let best = candidates.last().copied();
        if let Some(version) = best {
            debug!(
                project = predicate.project(),
                version, "Selected highest matching release"
            );
        }
        Ok(best.and_then(|version| releases.get(version)).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::record::ProjectReleases;

    /// A locator answering every lookup from a fixed version list.
    struct FixedLocator {
        versions: Vec<&'static str>,
    }

    #[async_trait]
    impl Locator for FixedLocator {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn get_project(&self, project: &str) -> ProjectReleases {
            let mut releases = ProjectReleases::new();
            for version in &self.versions {
                let mut record = DistributionRecord::new(project, *version);
                record.set_download_url(format!(
                    "https://files.example.com/{project}-{version}.tar.gz"
                ));
                releases.insert(record);
            }
            releases
        }
    }

    fn finder(versions: Vec<&'static str>) -> ReleaseFinder {
        let mut aggregator = AggregatingLocator::new();
        aggregator.register(Box::new(FixedLocator { versions }));
        ReleaseFinder::new(aggregator)
    }

    #[tokio::test]
    async fn test_locate_picks_highest_matching_version() {
        let finder = finder(vec!["1.0", "1.5", "2.0", "3.5"]);
        let record = finder.locate("demo (>=1.0,<3.0)").await.unwrap().unwrap();
        assert_eq!(record.version, "2.0");
    }

    #[tokio::test]
    async fn test_locate_skips_unparseable_versions_silently() {
        let finder = finder(vec!["1.0", "2.0", "bogus"]);
        let record = finder.locate("demo (>=1.0,<3.0)").await.unwrap().unwrap();
        assert_eq!(record.version, "2.0");
    }

    #[tokio::test]
    async fn test_locate_no_match_is_none_not_error() {
        let finder_a = finder(vec!["0.1", "0.2"]);
        assert!(finder_a.locate("demo (>=1.0)").await.unwrap().is_none());

        let finder_b = finder(vec![]);
        assert!(finder_b.locate("demo").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_locate_bare_name_returns_highest_version() {
        let finder = finder(vec!["2.0", "10.0", "9.9"]);
        let record = finder.locate("demo").await.unwrap().unwrap();
        assert_eq!(record.version, "10.0");
    }

    #[tokio::test]
    async fn test_locate_malformed_predicate_is_an_error() {
        let finder = finder(vec!["1.0"]);
        assert!(finder.locate("demo (1.0)").await.is_err());
    }
}
