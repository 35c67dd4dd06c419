//! Error types for locator construction and backend calls.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from locator construction and index-backend calls.
#[derive(Debug, Error)]
pub enum LocatorError {
    /// Directory locator was given a root that is not a directory.
    #[error("not a directory: '{path}'")]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// HTTP client could not be constructed.
    #[error("cannot build HTTP client: {source}")]
    Client {
        /// The underlying client failure.
        #[source]
        source: reqwest::Error,
    },

    /// RPC backend call failed or returned a malformed response.
    #[error("index RPC call '{operation}' failed: {reason}")]
    Rpc {
        /// The backend operation that failed.
        operation: String,
        /// Why it failed.
        reason: String,
    },

    /// JSON index request failed or the document did not parse.
    #[error("JSON index request for '{url}' failed: {reason}")]
    Json {
        /// The document URL.
        url: String,
        /// Why it failed.
        reason: String,
    },
}

impl LocatorError {
    /// Creates a `NotADirectory` error.
    #[must_use]
    pub fn not_a_directory(path: &Path) -> Self {
        Self::NotADirectory {
            path: path.to_path_buf(),
        }
    }

    /// Creates a `Client` error.
    #[must_use]
    pub fn client(source: reqwest::Error) -> Self {
        Self::Client { source }
    }

    /// Creates an `Rpc` error.
    #[must_use]
    pub fn rpc(operation: &str, reason: impl Into<String>) -> Self {
        Self::Rpc {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a `Json` error.
    #[must_use]
    pub fn json(url: &str, reason: impl Into<String>) -> Self {
        Self::Json {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_error_messages() {
        let err = LocatorError::not_a_directory(Path::new("/no/such/dir"));
        assert!(err.to_string().contains("/no/such/dir"));

        let err = LocatorError::rpc("release_urls", "connection reset");
        assert!(err.to_string().contains("release_urls"));
        assert!(err.to_string().contains("connection reset"));

        let err = LocatorError::json("http://x/demo/json", "missing field");
        assert!(err.to_string().contains("demo/json"));
    }
}
