//! Project locators: strategies resolving a project name to its releases.
//!
//! # Architecture
//!
//! - [`Locator`] - Async trait every backend implements
//! - [`AggregatingLocator`] - Ordered composition, first-hit or merge
//! - [`RpcLocator`] - Structured RPC index backend (via [`IndexRpc`])
//! - [`JsonApiLocator`] - Per-project JSON document backend
//! - [`ScrapingLocator`] - HTML index crawling backend
//! - [`DirectoryLocator`] - Local filesystem backend
//!
//! # Example
//!
//! ```no_run
//! use pkgscout::locator::{AggregatingLocator, JsonApiLocator, Locator, ScrapingLocator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut locator = AggregatingLocator::new();
//! locator.register(Box::new(JsonApiLocator::new("https://index.example.com/pypi/")?));
//! locator.register(Box::new(ScrapingLocator::new("https://index.example.com/simple/")?));
//!
//! let releases = locator.get_project("demo").await;
//! for (version, record) in releases.iter() {
//!     println!("{version}: {:?}", record.download_url);
//! }
//! # Ok(())
//! # }
//! ```

mod aggregating;
mod directory;
mod error;
mod json;
mod rpc;
mod scraping;

pub use aggregating::AggregatingLocator;
pub use directory::DirectoryLocator;
pub use error::LocatorError;
pub use json::JsonApiLocator;
pub use rpc::{IndexRpc, ReleaseUrl, RpcLocator};
pub use scraping::ScrapingLocator;

use async_trait::async_trait;

use crate::record::ProjectReleases;

/// A strategy for resolving a project name to its known release set.
///
/// Lookup failures inside a backend degrade to an empty result - logged,
/// never propagated. Configuration errors surface at construction time on
/// the concrete types instead.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Box<dyn Locator>`. Rust 2024 native async traits are not object-safe,
/// so `async_trait` is required for the aggregation pattern.
#[async_trait]
pub trait Locator: Send + Sync {
    /// Short name identifying the backend (e.g. "scrape", "json-api").
    fn name(&self) -> &str;

    /// Resolves `project` to every release this backend knows about.
    async fn get_project(&self, project: &str) -> ProjectReleases;
}
