//! Package Distribution Discovery Library
//!
//! This library resolves a package name into the set of downloadable
//! distribution artifacts published for it, by querying package-index
//! backends and, for HTML indexes, crawling link graphs concurrently.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`filename`] - Archive filename parsing for distribution URLs
//! - [`page`] - Fetched HTML page model with link extraction
//! - [`fetch`] - Cached page fetching with content negotiation
//! - [`crawler`] - Concurrent link-following crawl engine
//! - [`locator`] - Locator trait, backend variants, and aggregation
//! - [`finder`] - Predicate-driven release selection
//! - [`record`] - Distribution records and the per-project release map
//! - [`version`] - Version predicates and the legacy total ordering

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crawler;
pub mod fetch;
pub mod filename;
pub mod finder;
pub mod locator;
pub mod page;
pub mod record;
pub(crate) mod util;
pub mod version;

// Re-export commonly used types
pub use crawler::{Crawler, DEFAULT_CRAWL_WORKERS};
pub use fetch::{DEFAULT_FETCH_TIMEOUT, FetchError, PageFetcher};
pub use filename::{ARCHIVE_EXTENSIONS, ArchiveInfo, parse_archive_url};
pub use finder::ReleaseFinder;
pub use locator::{
    AggregatingLocator, DirectoryLocator, IndexRpc, JsonApiLocator, Locator, LocatorError,
    ReleaseUrl, RpcLocator, ScrapingLocator,
};
pub use page::Page;
pub use record::{
    DistributionRecord, METADATA_DOWNLOAD_URL, METADATA_NAME, METADATA_REQUIRES_PYTHON,
    METADATA_VERSION, ProjectReleases,
};
pub use version::{VersionError, VersionPredicate, legacy_sort_key};
