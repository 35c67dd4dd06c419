//! Cached page fetching with content negotiation.
//!
//! [`PageFetcher`] turns a URL into a parsed [`Page`], memoizing every
//! outcome (including failures) per URL for the fetcher's lifetime. Only
//! HTML responses become pages; compressed bodies are decoded before charset
//! decoding; the charset defaults to UTF-8 when the Content-Type names none.
//! Failures never escape [`PageFetcher::get_page`] - callers always receive
//! page-or-none, with the typed taxonomy observable via
//! [`PageFetcher::fetch_page`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::page::Page;

/// Default per-fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a single page fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The URL that failed to parse.
        url: String,
        /// The underlying parse failure.
        #[source]
        source: url::ParseError,
    },

    /// Transport-level failure (connection refused, DNS, timeout).
    #[error("request for '{url}' failed: {source}")]
    Transport {
        /// The URL being fetched.
        url: String,
        /// The underlying client failure.
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status.
    #[error("unexpected HTTP status {status} for '{url}'")]
    Status {
        /// The URL being fetched.
        url: String,
        /// The status the server returned.
        status: StatusCode,
    },

    /// Response declared a Content-Encoding this client does not decode.
    #[error("unsupported content encoding '{encoding}' for '{url}'")]
    UnsupportedEncoding {
        /// The URL being fetched.
        url: String,
        /// The Content-Encoding value left undecoded.
        encoding: String,
    },

    /// A file-scheme URL does not name a readable local path.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// The local path derived from the URL.
        path: PathBuf,
        /// The underlying read failure.
        #[source]
        source: std::io::Error,
    },

    /// A file-scheme URL cannot be converted to a local path.
    #[error("'{url}' does not name a local path")]
    NotAFilePath {
        /// The offending URL.
        url: String,
    },
}

impl FetchError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Fetches and caches HTML index pages.
///
/// The cache is keyed by requested URL, with an extra entry under the final
/// (post-redirect) URL on success so both resolve to the same page. It is
/// shared by every crawl worker and persists for the fetcher's lifetime.
#[derive(Debug)]
pub struct PageFetcher {
    client: Client,
    cache: DashMap<String, Option<Arc<Page>>>,
    timeout: Duration,
}

impl PageFetcher {
    /// Creates a fetcher with the default per-fetch timeout.
    ///
    /// # Errors
    ///
    /// Returns the underlying client error if the HTTP client cannot be
    /// constructed.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Creates a fetcher with an explicit per-fetch timeout.
    ///
    /// # Errors
    ///
    /// Returns the underlying client error if the HTTP client cannot be
    /// constructed.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().gzip(true).deflate(true).build()?;
        Ok(Self {
            client,
            cache: DashMap::new(),
            timeout,
        })
    }

    /// Fetches `url`, returning the cached outcome when one exists.
    ///
    /// Every outcome is cached, so a URL that failed once is not re-fetched.
    /// HTTP 404 is expected on sparse indexes and cached silently; all other
    /// failures are logged at warn level. Nothing propagates past this layer.
    pub async fn get_page(&self, url: &str) -> Option<Arc<Page>> {
        let url = rewrite_directory_url(url);
        if let Some(cached) = self.cache.get(&url) {
            debug!(url, "Returning cached fetch outcome");
            return cached.clone();
        }
        debug!(url, "Fetching");
        let outcome = match self.fetch_page(&url).await {
            Ok(Some(page)) => {
                let page = Arc::new(page);
                self.cache
                    .insert(page.url().as_str().to_string(), Some(page.clone()));
                Some(page)
            }
            Ok(None) => None,
            Err(error) if error.is_not_found() => None,
            Err(error) => {
                warn!(url, %error, "Fetch failed");
                None
            }
        };
        self.cache.insert(url, outcome.clone());
        outcome
    }

    /// Performs one uncached fetch of `url`.
    ///
    /// `Ok(None)` means the response was not an HTML document.
    ///
    /// # Errors
    ///
    /// Returns the typed failure for transport errors, non-success statuses,
    /// undecodable content encodings, and unreadable file-scheme paths.
    pub async fn fetch_page(&self, url: &str) -> Result<Option<Page>, FetchError> {
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        if parsed.scheme() == "file" {
            return fetch_file_page(parsed).await;
        }

        let response = self
            .client
            .get(parsed)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        if !is_html_content_type(content_type) {
            debug!(url, content_type, "Not an HTML response");
            return Ok(None);
        }

        // The client transparently decodes gzip and deflate bodies and drops
        // the header when it does; any encoding still declared here is one we
        // cannot decode.
        if let Some(encoding) = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            && !encoding.eq_ignore_ascii_case("identity")
        {
            return Err(FetchError::UnsupportedEncoding {
                url: url.to_string(),
                encoding: encoding.to_string(),
            });
        }

        let final_url = response.url().clone();
        // Charset comes from the Content-Type parameter, defaulting to UTF-8.
        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(Some(Page::new(body, final_url)))
    }
}

/// Rewrites a file-scheme URL naming a directory to its `index.html`.
fn rewrite_directory_url(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url)
        && parsed.scheme() == "file"
        && let Ok(path) = parsed.to_file_path()
        && path.is_dir()
        && let Ok(rewritten) = Url::from_file_path(path.join("index.html"))
    {
        return rewritten.to_string();
    }
    url.to_string()
}

async fn fetch_file_page(url: Url) -> Result<Option<Page>, FetchError> {
    let path = url.to_file_path().map_err(|()| FetchError::NotAFilePath {
        url: url.to_string(),
    })?;
    let looks_like_html = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
    if !looks_like_html {
        return Ok(None);
    }
    let body = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| FetchError::Io { path, source })?;
    Ok(Some(Page::new(body, url)))
}

/// True for the media types parsed as index pages.
fn is_html_content_type(content_type: &str) -> bool {
    content_type.starts_with("text/html") || content_type.starts_with("application/xhtml")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_html_content_type() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("application/xhtml+xml"));
        assert!(!is_html_content_type("application/octet-stream"));
        assert!(!is_html_content_type("application/json"));
    }

    #[test]
    fn test_rewrite_directory_url_points_at_index_html() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(dir.path()).unwrap();
        let rewritten = rewrite_directory_url(url.as_str());
        assert!(
            rewritten.ends_with("/index.html"),
            "expected index.html rewrite, got {rewritten}"
        );
    }

    #[test]
    fn test_rewrite_leaves_http_urls_alone() {
        let url = "http://index.example.com/simple/demo/";
        assert_eq!(rewrite_directory_url(url), url);
    }

    #[tokio::test]
    async fn test_fetch_file_page_reads_html() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        std::fs::write(&file, "<a href=\"demo-1.0.tar.gz\">d</a>").unwrap();

        let fetcher = PageFetcher::new().unwrap();
        let url = Url::from_file_path(dir.path()).unwrap();
        let page = fetcher.get_page(url.as_str()).await.unwrap();
        assert_eq!(page.links().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_file_page_non_html_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hello").unwrap();

        let fetcher = PageFetcher::new().unwrap();
        let url = Url::from_file_path(&file).unwrap();
        assert!(fetcher.get_page(url.as_str()).await.is_none());
    }
}
