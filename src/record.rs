//! Distribution records and the per-project release map.

use std::collections::HashMap;

use crate::filename::ArchiveInfo;

/// Metadata key for the project name.
pub const METADATA_NAME: &str = "Name";

/// Metadata key for the release version.
pub const METADATA_VERSION: &str = "Version";

/// Metadata key for the chosen download URL.
pub const METADATA_DOWNLOAD_URL: &str = "Download-URL";

/// Metadata key for the Python version an artifact targets.
pub const METADATA_REQUIRES_PYTHON: &str = "Requires-Python";

/// One discovered downloadable artifact for a specific project version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionRecord {
    /// Project name, as parsed from the artifact or reported by the backend.
    pub name: String,
    /// Release version string.
    pub version: String,
    /// URL the artifact can be downloaded from.
    pub download_url: Option<String>,
    /// MD5 hex digest advertised for the artifact, when known.
    pub md5_digest: Option<String>,
    /// Backend-reported metadata (`Name`, `Version`, `Download-URL`,
    /// `Requires-Python`, ...).
    pub metadata: HashMap<String, String>,
}

impl DistributionRecord {
    /// Creates a record with the `Name`/`Version` metadata keys pre-filled.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        let version = version.into();
        let mut metadata = HashMap::new();
        metadata.insert(METADATA_NAME.to_string(), name.clone());
        metadata.insert(METADATA_VERSION.to_string(), version.clone());
        Self {
            name,
            version,
            download_url: None,
            md5_digest: None,
            metadata,
        }
    }

    /// Sets the download URL on the record and its metadata map together.
    pub fn set_download_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.metadata
            .insert(METADATA_DOWNLOAD_URL.to_string(), url.clone());
        self.download_url = Some(url);
    }
}

/// Every release discovered for one project, keyed by version string.
///
/// Scoped to a single `get_project` call. Within one locator's result at most
/// one record exists per version; repeat observations of a version update the
/// existing record in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectReleases {
    records: HashMap<String, DistributionRecord>,
}

impl ProjectReleases {
    /// Creates an empty release map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no releases were discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct versions discovered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Looks up the record for `version`.
    #[must_use]
    pub fn get(&self, version: &str) -> Option<&DistributionRecord> {
        self.records.get(version)
    }

    /// All discovered version strings, in no particular order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Iterates `(version, record)` pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DistributionRecord)> {
        self.records.iter()
    }

    /// Inserts `record` under its own version key, replacing any previous
    /// record for that version.
    pub fn insert(&mut self, record: DistributionRecord) {
        self.records.insert(record.version.clone(), record);
    }

    /// Folds a parsed archive into the map, creating the record for its
    /// version on first sight and updating checksum, Python-version tag, and
    /// download URL on later sightings.
    pub fn add_archive(&mut self, info: ArchiveInfo) {
        let record = self
            .records
            .entry(info.version.clone())
            .or_insert_with(|| DistributionRecord::new(info.name, info.version));
        if let Some(digest) = info.md5_digest {
            record.md5_digest = Some(digest);
        }
        if let Some(python_version) = info.python_version {
            record
                .metadata
                .insert(METADATA_REQUIRES_PYTHON.to_string(), python_version);
        }
        if record.download_url.as_deref() != Some(info.url.as_str()) {
            record.set_download_url(info.url);
        }
    }

    /// Unions `other` into `self`, overwriting matching version keys.
    pub fn merge_from(&mut self, other: ProjectReleases) {
        self.records.extend(other.records);
    }
}

impl IntoIterator for ProjectReleases {
    type Item = (String, DistributionRecord);
    type IntoIter = std::collections::hash_map::IntoIter<String, DistributionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn archive(version: &str, url: &str) -> ArchiveInfo {
        ArchiveInfo {
            name: "demo".to_string(),
            version: version.to_string(),
            filename: format!("demo-{version}.tar.gz"),
            url: url.to_string(),
            python_version: None,
            md5_digest: None,
        }
    }

    #[test]
    fn test_record_new_prefills_metadata() {
        let record = DistributionRecord::new("demo", "1.0");
        assert_eq!(record.metadata.get(METADATA_NAME).unwrap(), "demo");
        assert_eq!(record.metadata.get(METADATA_VERSION).unwrap(), "1.0");
        assert_eq!(record.download_url, None);
    }

    #[test]
    fn test_set_download_url_updates_metadata() {
        let mut record = DistributionRecord::new("demo", "1.0");
        record.set_download_url("https://example.com/demo-1.0.tar.gz");
        assert_eq!(
            record.metadata.get(METADATA_DOWNLOAD_URL).unwrap(),
            "https://example.com/demo-1.0.tar.gz"
        );
    }

    #[test]
    fn test_add_archive_creates_record_per_version() {
        let mut releases = ProjectReleases::new();
        releases.add_archive(archive("1.0", "https://example.com/demo-1.0.tar.gz"));
        releases.add_archive(archive("2.0", "https://example.com/demo-2.0.tar.gz"));
        assert_eq!(releases.len(), 2);
        assert_eq!(
            releases.get("1.0").unwrap().download_url.as_deref(),
            Some("https://example.com/demo-1.0.tar.gz")
        );
    }

    #[test]
    fn test_add_archive_updates_existing_record_in_place() {
        let mut releases = ProjectReleases::new();
        releases.add_archive(archive("1.0", "https://example.com/demo-1.0.tar.gz"));

        let mut update = archive("1.0", "https://mirror.example.com/demo-1.0.zip");
        update.md5_digest = Some("deadbeef".to_string());
        update.python_version = Some("2.6".to_string());
        releases.add_archive(update);

        assert_eq!(releases.len(), 1);
        let record = releases.get("1.0").unwrap();
        assert_eq!(record.md5_digest.as_deref(), Some("deadbeef"));
        assert_eq!(
            record.metadata.get(METADATA_REQUIRES_PYTHON).unwrap(),
            "2.6"
        );
        assert_eq!(
            record.download_url.as_deref(),
            Some("https://mirror.example.com/demo-1.0.zip")
        );
    }

    #[test]
    fn test_merge_from_overwrites_matching_versions() {
        let mut first = ProjectReleases::new();
        first.add_archive(archive("1.0", "https://a.example.com/demo-1.0.tar.gz"));
        first.add_archive(archive("1.5", "https://a.example.com/demo-1.5.tar.gz"));

        let mut second = ProjectReleases::new();
        second.add_archive(archive("1.5", "https://b.example.com/demo-1.5.tar.gz"));
        second.add_archive(archive("2.0", "https://b.example.com/demo-2.0.tar.gz"));

        first.merge_from(second);
        assert_eq!(first.len(), 3);
        assert_eq!(
            first.get("1.5").unwrap().download_url.as_deref(),
            Some("https://b.example.com/demo-1.5.tar.gz")
        );
    }
}
