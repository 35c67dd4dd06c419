//! RPC-backed locator over a structured package-index API.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Locator, LocatorError};
use crate::record::{DistributionRecord, ProjectReleases};

/// One release file entry reported by the RPC backend, most-preferred first
/// in the backend's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseUrl {
    /// Download URL for the file.
    pub url: String,
    /// MD5 hex digest of the file, when the backend reports one.
    pub md5_digest: Option<String>,
}

/// Client for a structured package-index RPC API.
///
/// The wire protocol belongs to the backend; implementations of this trait
/// only promise the response shapes below.
#[async_trait]
pub trait IndexRpc: Send + Sync {
    /// All release versions published for `project`.
    async fn release_versions(&self, project: &str) -> Result<Vec<String>, LocatorError>;

    /// Download files for one release.
    async fn release_urls(
        &self,
        project: &str,
        version: &str,
    ) -> Result<Vec<ReleaseUrl>, LocatorError>;

    /// Release metadata as reported by the index.
    async fn release_metadata(
        &self,
        project: &str,
        version: &str,
    ) -> Result<HashMap<String, String>, LocatorError>;

    /// Every project name the index knows about.
    async fn list_projects(&self) -> Result<Vec<String>, LocatorError>;
}

/// Resolves projects through an [`IndexRpc`] backend, taking the first
/// listed URL per version as the download source.
pub struct RpcLocator {
    client: Arc<dyn IndexRpc>,
}

impl RpcLocator {
    /// Creates a locator over `client`.
    #[must_use]
    pub fn new(client: Arc<dyn IndexRpc>) -> Self {
        Self { client }
    }

    /// Enumerates every project name known to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::Rpc`] when the backend call fails.
    pub async fn project_names(&self) -> Result<Vec<String>, LocatorError> {
        self.client.list_projects().await
    }

    async fn fetch_project(&self, project: &str) -> Result<ProjectReleases, LocatorError> {
        let mut releases = ProjectReleases::new();
        for version in self.client.release_versions(project).await? {
            let urls = self.client.release_urls(project, &version).await?;
            let metadata = self.client.release_metadata(project, &version).await?;
            if let Some(first) = urls.first() {
                let mut record = DistributionRecord::new(project, version.as_str());
                record.metadata.extend(metadata);
                record.set_download_url(first.url.as_str());
                record.md5_digest = first.md5_digest.clone();
                releases.insert(record);
            }
        }
        Ok(releases)
    }
}

impl std::fmt::Debug for RpcLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLocator").finish_non_exhaustive()
    }
}

#[async_trait]
impl Locator for RpcLocator {
    fn name(&self) -> &str {
        "rpc"
    }

    async fn get_project(&self, project: &str) -> ProjectReleases {
        match self.fetch_project(project).await {
            Ok(releases) => {
                debug!(project, releases = releases.len(), "RPC lookup complete");
                releases
            }
            Err(error) => {
                warn!(project, %error, "RPC lookup failed; returning empty result");
                ProjectReleases::new()
            }
        }
    }
}
