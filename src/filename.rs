//! Archive filename parsing for distribution URLs.
//!
//! A candidate download URL is interpreted as `<name>-<version><extension>`,
//! optionally carrying a `-py<major>[.<minor>]` suffix and an `md5=<hex>`
//! checksum fragment. URLs that do not fit the shape are rejected, never
//! treated as errors.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

/// Archive extensions recognized on distribution download paths.
///
/// `.tar.gz` precedes `.tar` so the longest extension wins. `.egg` is
/// recognized by the crawl scope filter but excluded from positive parses.
pub const ARCHIVE_EXTENSIONS: &[&str] = &[".tar.gz", ".tar.bz2", ".tar", ".zip", ".tgz", ".egg"];

#[allow(clippy::expect_used)]
static NAME_AND_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z0-9_.-]+?)-([0-9][0-9_.-]*)$").expect("name/version regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static PYTHON_VERSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-py(\d(?:\.\d)?)$").expect("python-version regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static MD5_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^md5=([a-f0-9]+)$").expect("md5 fragment regex is valid") // Static pattern, safe to panic
});

/// Returns true if `name` ends with a recognized archive extension.
pub(crate) fn has_archive_extension(name: &str) -> bool {
    ARCHIVE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// A download URL interpreted as a distribution artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    /// Project name parsed from the filename.
    pub name: String,
    /// Release version parsed from the filename.
    pub version: String,
    /// Final path segment of the URL.
    pub filename: String,
    /// Canonical download URL with the fragment stripped.
    pub url: String,
    /// `py<major>[.<minor>]` tag from the filename suffix, when present.
    pub python_version: Option<String>,
    /// MD5 hex digest carried in the URL fragment, when present.
    pub md5_digest: Option<String>,
}

/// Interprets `url` as a distribution archive download.
///
/// Returns `None` when the URL does not name a supported archive, when the
/// filename does not parse as `<name>-<version>`, or when `expected_project`
/// is given and differs (case-insensitively) from the parsed name.
#[must_use]
pub fn parse_archive_url(url: &str, expected_project: Option<&str>) -> Option<ArchiveInfo> {
    let mut parsed = Url::parse(url).ok()?;
    let filename = parsed.path_segments()?.next_back()?.to_string();

    let extension = ARCHIVE_EXTENSIONS
        .iter()
        .copied()
        .filter(|ext| *ext != ".egg") // not yet supported
        .find(|ext| filename.ends_with(ext))?;
    let mut stem = &filename[..filename.len() - extension.len()];

    let mut python_version = None;
    if let Some(caps) = PYTHON_VERSION_SUFFIX.captures(stem)
        && let (Some(whole), Some(tag)) = (caps.get(0), caps.get(1))
    {
        python_version = Some(tag.as_str().to_string());
        stem = &stem[..whole.start()];
    }

    let Some(caps) = NAME_AND_VERSION.captures(stem) else {
        debug!(stem, "No project/version match in archive name");
        return None;
    };
    let name = caps.get(1)?.as_str().to_string();
    let version = caps.get(2)?.as_str().to_string();

    if let Some(expected) = expected_project
        && !expected.eq_ignore_ascii_case(&name)
    {
        debug!(
            parsed = %name,
            expected,
            "Archive name does not match requested project"
        );
        return None;
    }

    let md5_digest = parsed
        .fragment()
        .and_then(|fragment| MD5_FRAGMENT.captures(fragment))
        .and_then(|caps| caps.get(1))
        .map(|digest| digest.as_str().to_string());
    parsed.set_fragment(None);

    Some(ArchiveInfo {
        name,
        version,
        filename,
        url: parsed.to_string(),
        python_version,
        md5_digest,
    })
}
