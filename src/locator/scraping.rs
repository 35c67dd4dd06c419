//! Scraping locator: crawls a simple HTML index.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use super::{Locator, LocatorError};
use crate::crawler::{Crawler, DEFAULT_CRAWL_WORKERS};
use crate::fetch::{DEFAULT_FETCH_TIMEOUT, PageFetcher};
use crate::record::ProjectReleases;

/// Discovers distributions by crawling the HTML index rooted at a simple
/// per-project URL (`<base>/<name>/`) and following in-scope links.
pub struct ScrapingLocator {
    crawler: Crawler,
}

impl ScrapingLocator {
    /// Creates a locator crawling the index rooted at `base_url` with the
    /// default timeout and a single worker.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::Client`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, LocatorError> {
        Self::with_options(base_url, DEFAULT_FETCH_TIMEOUT, DEFAULT_CRAWL_WORKERS)
    }

    /// Creates a locator with an explicit per-fetch timeout and worker count.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::Client`] if the HTTP client cannot be built.
    pub fn with_options(
        base_url: &str,
        timeout: Duration,
        num_workers: usize,
    ) -> Result<Self, LocatorError> {
        let fetcher = Arc::new(PageFetcher::with_timeout(timeout).map_err(LocatorError::client)?);
        Ok(Self {
            crawler: Crawler::new(fetcher, base_url).with_workers(num_workers),
        })
    }

    /// The index root this locator crawls.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.crawler.base_url()
    }
}

impl std::fmt::Debug for ScrapingLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapingLocator")
            .field("base_url", &self.crawler.base_url())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Locator for ScrapingLocator {
    fn name(&self) -> &str {
        "scrape"
    }

    #[instrument(skip(self), fields(base_url = %self.crawler.base_url()))]
    async fn get_project(&self, project: &str) -> ProjectReleases {
        let seed = format!(
            "{}{}/",
            self.crawler.base_url(),
            urlencoding::encode(project)
        );
        self.crawler.crawl(&seed, project).await
    }
}
