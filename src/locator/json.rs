//! JSON-API-backed locator: one JSON document per project.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{Locator, LocatorError};
use crate::record::{DistributionRecord, ProjectReleases};
use crate::util::ensure_trailing_slash;

/// Per-project JSON document served by the index.
#[derive(Debug, Deserialize)]
struct ProjectDocument {
    /// Project metadata; string-valued fields feed the record's metadata map.
    info: Map<String, Value>,
    /// Downloadable files for the current release, most-preferred first.
    #[serde(default)]
    urls: Vec<ReleaseFile>,
}

/// One entry of the document's `urls` array.
#[derive(Debug, Deserialize)]
struct ReleaseFile {
    url: String,
    md5_digest: Option<String>,
}

/// Resolves projects through a per-project JSON document endpoint
/// (`<base>/<name>/json`).
pub struct JsonApiLocator {
    client: Client,
    base_url: String,
}

impl JsonApiLocator {
    /// Creates a locator rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::Client`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, LocatorError> {
        let client = Client::builder().build().map_err(LocatorError::client)?;
        Ok(Self {
            client,
            base_url: ensure_trailing_slash(base_url),
        })
    }

    async fn fetch_project(&self, project: &str) -> Result<ProjectReleases, LocatorError> {
        let url = format!("{}{}/json", self.base_url, urlencoding::encode(project));
        debug!(%url, "Fetching project document");
        let document: ProjectDocument = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| LocatorError::json(&url, error.to_string()))?
            .error_for_status()
            .map_err(|error| LocatorError::json(&url, error.to_string()))?
            .json()
            .await
            .map_err(|error| LocatorError::json(&url, error.to_string()))?;

        let mut releases = ProjectReleases::new();
        let mut metadata = std::collections::HashMap::new();
        for (key, value) in &document.info {
            if let Value::String(text) = value {
                metadata.insert(key.clone(), text.clone());
            }
        }
        let version = metadata
            .get("version")
            .cloned()
            .ok_or_else(|| LocatorError::json(&url, "info.version missing or not a string"))?;
        let name = metadata
            .get("name")
            .cloned()
            .unwrap_or_else(|| project.to_string());

        if let Some(first) = document.urls.first() {
            let mut record = DistributionRecord::new(name, version);
            record.metadata.extend(metadata);
            record.set_download_url(first.url.as_str());
            record.md5_digest = first.md5_digest.clone();
            releases.insert(record);
        }
        Ok(releases)
    }
}

impl std::fmt::Debug for JsonApiLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonApiLocator")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Locator for JsonApiLocator {
    fn name(&self) -> &str {
        "json-api"
    }

    async fn get_project(&self, project: &str) -> ProjectReleases {
        match self.fetch_project(project).await {
            Ok(releases) => {
                debug!(project, releases = releases.len(), "JSON lookup complete");
                releases
            }
            Err(error) => {
                warn!(project, %error, "JSON lookup failed; returning empty result");
                ProjectReleases::new()
            }
        }
    }
}
