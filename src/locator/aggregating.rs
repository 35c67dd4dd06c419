//! Ordered composition of locators.

use async_trait::async_trait;
use tracing::debug;

use super::Locator;
use crate::record::ProjectReleases;

/// Consults a sequence of locators in registration order.
///
/// In first-hit mode (the default) the first non-empty result is returned
/// verbatim and later locators are not consulted. In merge mode every
/// locator runs and results are unioned, later entries overwriting earlier
/// ones at matching version keys.
pub struct AggregatingLocator {
    locators: Vec<Box<dyn Locator>>,
    merge: bool,
}

impl AggregatingLocator {
    /// Creates an empty aggregator in first-hit mode.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locators: Vec::new(),
            merge: false,
        }
    }

    /// Switches the aggregator to merge mode.
    #[must_use]
    pub fn merged(mut self) -> Self {
        self.merge = true;
        self
    }

    /// Appends a locator to the consultation order.
    pub fn register(&mut self, locator: Box<dyn Locator>) {
        debug!(name = locator.name(), "Registering locator");
        self.locators.push(locator);
    }

    /// Number of registered locators.
    #[must_use]
    pub fn locator_count(&self) -> usize {
        self.locators.len()
    }

    /// Returns true if no locators are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

impl Default for AggregatingLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AggregatingLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.locators.iter().map(|l| l.name()).collect();
        f.debug_struct("AggregatingLocator")
            .field("merge", &self.merge)
            .field("locators", &names)
            .finish()
    }
}

#[async_trait]
impl Locator for AggregatingLocator {
    fn name(&self) -> &str {
        "aggregate"
    }

    async fn get_project(&self, project: &str) -> ProjectReleases {
        let mut result = ProjectReleases::new();
        for locator in &self.locators {
            let releases = locator.get_project(project).await;
            if releases.is_empty() {
                continue;
            }
            if self.merge {
                result.merge_from(releases);
            } else {
                debug!(
                    locator = locator.name(),
                    project, "First locator with results wins"
                );
                return releases;
            }
        }
        result
    }
}
