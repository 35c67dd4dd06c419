//! Directory locator: discovers artifacts on the local filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;
use walkdir::WalkDir;

use super::{Locator, LocatorError};
use crate::filename::{has_archive_extension, parse_archive_url};
use crate::record::ProjectReleases;

/// Walks a filesystem subtree, running every archive-named file through the
/// filename parser. Purely local; no concurrency involved.
#[derive(Debug)]
pub struct DirectoryLocator {
    base_dir: PathBuf,
}

impl DirectoryLocator {
    /// Creates a locator over the subtree rooted at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::NotADirectory`] unless `path` names an
    /// existing directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, LocatorError> {
        let path = path.as_ref();
        let base_dir = path
            .canonicalize()
            .map_err(|_| LocatorError::not_a_directory(path))?;
        if !base_dir.is_dir() {
            return Err(LocatorError::not_a_directory(path));
        }
        Ok(Self { base_dir })
    }

    /// The directory this locator scans.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[async_trait]
impl Locator for DirectoryLocator {
    fn name(&self) -> &str {
        "directory"
    }

    async fn get_project(&self, project: &str) -> ProjectReleases {
        let mut releases = ProjectReleases::new();
        for entry in WalkDir::new(&self.base_dir) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!(%error, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if !has_archive_extension(&entry.file_name().to_string_lossy()) {
                continue;
            }
            let Ok(url) = Url::from_file_path(entry.path()) else {
                continue;
            };
            if let Some(info) = parse_archive_url(url.as_str(), Some(project)) {
                releases.add_archive(info);
            }
        }
        debug!(project, releases = releases.len(), "Directory scan complete");
        releases
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::write(path, b"archive bytes").unwrap();
    }

    #[tokio::test]
    async fn test_directory_locator_finds_nested_archives() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("demo-1.0.tar.gz"));
        std::fs::create_dir(dir.path().join("older")).unwrap();
        touch(&dir.path().join("older/demo-0.9.zip"));
        touch(&dir.path().join("other-1.0.tar.gz"));
        touch(&dir.path().join("README.txt"));

        let locator = DirectoryLocator::new(dir.path()).unwrap();
        let releases = locator.get_project("demo").await;
        assert_eq!(releases.len(), 2);
        assert!(releases.get("1.0").is_some());
        assert!(releases.get("0.9").is_some());
        let url = releases.get("1.0").unwrap().download_url.clone().unwrap();
        assert!(url.starts_with("file://"), "expected file URL, got {url}");
    }

    #[tokio::test]
    async fn test_directory_locator_rejects_non_directory_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("demo-1.0.tar.gz");
        touch(&file);

        assert!(matches!(
            DirectoryLocator::new(&file),
            Err(LocatorError::NotADirectory { .. })
        ));
        assert!(matches!(
            DirectoryLocator::new(dir.path().join("missing")),
            Err(LocatorError::NotADirectory { .. })
        ));
    }
}
