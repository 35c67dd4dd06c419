//! Concurrent link-following crawl over an HTML package index.
//!
//! A fixed pool of worker tasks drains one shared FIFO queue. Every enqueue
//! increments an outstanding-work counter and every dequeue is acknowledged
//! exactly once, success or failure; the crawl completes when the counter
//! returns to zero, after which one shutdown sentinel per worker stops the
//! pool. The search space is bounded by the seen-set and the base-URL scope
//! filter, so termination does not depend on worker scheduling.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_channel::{Receiver, Sender};
use dashmap::DashSet;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::fetch::PageFetcher;
use crate::filename::{ARCHIVE_EXTENSIONS, parse_archive_url};
use crate::record::ProjectReleases;
use crate::util::ensure_trailing_slash;

/// Default number of crawl workers.
pub const DEFAULT_CRAWL_WORKERS: usize = 1;

/// Non-archive path suffixes that are never crawled.
const UNCRAWLED_EXTENSIONS: &[&str] = &[".exe", ".pdf"];

/// Queue entry: a URL to fetch, or a sentinel telling one worker to exit.
enum WorkItem {
    Fetch(String),
    Shutdown,
}

/// State shared by the workers of one crawl invocation.
struct CrawlShared {
    fetcher: Arc<PageFetcher>,
    project: String,
    base_url: String,
    seen: Arc<DashSet<String>>,
    queue: Sender<WorkItem>,
    outstanding: AtomicUsize,
    drained: Notify,
    releases: Mutex<ProjectReleases>,
}

impl CrawlShared {
    /// Accounts for a new unit of work, then queues it.
    async fn enqueue(&self, url: String) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        debug!(url, "Queueing for crawl");
        if self.queue.send(WorkItem::Fetch(url)).await.is_err() {
            self.acknowledge();
        }
    }

    /// Acknowledges one dequeued unit of work; the final acknowledgment
    /// fires the drain notification (a stored permit, so the wakeup cannot
    /// be lost).
    fn acknowledge(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_one();
        }
    }
}

/// Acknowledges one unit of work when dropped, so the drain counter stays
/// accurate even if processing unwinds.
struct AckGuard<'a>(&'a CrawlShared);

impl Drop for AckGuard<'_> {
    fn drop(&mut self) {
        self.0.acknowledge();
    }
}

/// Crawls an HTML index, collecting distribution downloads for one project.
///
/// The seen-set lives on the crawler and is cleared at the start of every
/// crawl; the fetch cache lives on the [`PageFetcher`] and persists across
/// crawls.
pub struct Crawler {
    fetcher: Arc<PageFetcher>,
    base_url: String,
    num_workers: usize,
    seen: Arc<DashSet<String>>,
}

impl Crawler {
    /// Creates a crawler scoped to links under `base_url`.
    #[must_use]
    pub fn new(fetcher: Arc<PageFetcher>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: ensure_trailing_slash(base_url),
            num_workers: DEFAULT_CRAWL_WORKERS,
            seen: Arc::new(DashSet::new()),
        }
    }

    /// Sets the worker pool size (minimum one).
    #[must_use]
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers.max(1);
        self
    }

    /// The base URL prefix links must start with to be crawled.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Crawls from `seed_url`, following in-scope links until no work is
    /// outstanding, and returns every distribution discovered for `project`.
    ///
    /// The result is deterministic for a fixed link graph regardless of the
    /// worker count. A page that fails to fetch contributes no links; it
    /// does not abort the crawl.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn crawl(&self, seed_url: &str, project: &str) -> ProjectReleases {
        self.seen.clear();
        let (sender, receiver) = async_channel::unbounded();
        let shared = Arc::new(CrawlShared {
            fetcher: Arc::clone(&self.fetcher),
            project: project.to_string(),
            base_url: self.base_url.clone(),
            seen: Arc::clone(&self.seen),
            queue: sender.clone(),
            outstanding: AtomicUsize::new(0),
            drained: Notify::new(),
            releases: Mutex::new(ProjectReleases::new()),
        });

        let workers: Vec<JoinHandle<()>> = (0..self.num_workers)
            .map(|worker| {
                tokio::spawn(worker_loop(
                    Arc::clone(&shared),
                    receiver.clone(),
                    worker,
                ))
            })
            .collect();

        shared.enqueue(seed_url.to_string()).await;

        // Drain: block until every queued unit of work is acknowledged.
        while shared.outstanding.load(Ordering::Acquire) > 0 {
            shared.drained.notified().await;
        }

        // Shutdown: one sentinel per worker, then join. Which worker gets
        // which sentinel is irrelevant; each consumes exactly one.
        for _ in &workers {
            if sender.send(WorkItem::Shutdown).await.is_err() {
                break;
            }
        }
        for worker in workers {
            if let Err(error) = worker.await {
                warn!(%error, "Crawl worker failed to join");
            }
        }

        let mut releases = shared
            .releases
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *releases)
    }
}

async fn worker_loop(shared: Arc<CrawlShared>, queue: Receiver<WorkItem>, worker: usize) {
    while let Ok(item) = queue.recv().await {
        match item {
            WorkItem::Shutdown => {
                debug!(worker, "Crawl worker stopping");
                break;
            }
            WorkItem::Fetch(url) => {
                let _ack = AckGuard(&shared);
                process_url(&shared, &url).await;
            }
        }
    }
}

/// Handles one dequeued URL: fetch, then classify every unseen link as a
/// distribution download (record it) or a crawl candidate (queue it).
async fn process_url(shared: &CrawlShared, url: &str) {
    let Some(page) = shared.fetcher.get_page(url).await else {
        return;
    };
    for link in page.links() {
        if !shared.seen.insert(link.clone()) {
            continue;
        }
        if record_download(shared, link) {
            continue;
        }
        if should_crawl(link, url) && link.starts_with(&shared.base_url) {
            shared.enqueue(link.clone()).await;
        }
    }
}

fn record_download(shared: &CrawlShared, link: &str) -> bool {
    let Some(info) = parse_archive_url(link, Some(&shared.project)) else {
        return false;
    };
    debug!(link, version = %info.version, "Recording distribution download");
    let mut releases = shared
        .releases
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    releases.add_archive(info);
    true
}

/// Scope filter for the queue-for-further-crawling decision: `http`/`https`
/// only, never `localhost`, and never paths that name archives, executables,
/// or documents.
fn should_crawl(link: &str, referrer: &str) -> bool {
    let keep = match Url::parse(link) {
        Ok(parsed) => {
            let path = parsed.path();
            let skipped_extension = ARCHIVE_EXTENSIONS
                .iter()
                .chain(UNCRAWLED_EXTENSIONS)
                .any(|ext| path.ends_with(ext));
            let scheme_ok = matches!(parsed.scheme(), "http" | "https");
            let host_ok = parsed
                .host_str()
                .is_some_and(|host| !host.eq_ignore_ascii_case("localhost"));
            !skipped_extension && scheme_ok && host_ok
        }
        Err(_) => false,
    };
    if !keep {
        debug!(link, referrer, "Not queueing link");
    }
    keep
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_should_crawl_accepts_index_pages() {
        assert!(should_crawl(
            "http://index.example.com/simple/demo/more/",
            "http://index.example.com/simple/demo/"
        ));
        assert!(should_crawl(
            "https://index.example.com/simple/demo/",
            "https://index.example.com/simple/"
        ));
    }

    #[test]
    fn test_should_crawl_rejects_localhost() {
        assert!(!should_crawl(
            "http://localhost/pkg/",
            "http://index.example.com/simple/demo/"
        ));
        assert!(!should_crawl(
            "http://LOCALHOST:8000/pkg/",
            "http://index.example.com/simple/demo/"
        ));
    }

    #[test]
    fn test_should_crawl_rejects_non_http_schemes() {
        assert!(!should_crawl("ftp://index.example.com/demo/", "http://x/"));
        assert!(!should_crawl("mailto:owner@example.com", "http://x/"));
    }

    #[test]
    fn test_should_crawl_rejects_archives_and_documents() {
        for path in [
            "demo-1.0.tar.gz",
            "demo-1.0.zip",
            "demo-1.0.egg",
            "setup.exe",
            "manual.pdf",
        ] {
            let link = format!("http://index.example.com/files/{path}");
            assert!(!should_crawl(&link, "http://index.example.com/"), "{path}");
        }
    }
}
