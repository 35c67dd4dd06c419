//! Fetched HTML page model with link extraction.

use std::collections::HashSet;
use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use tracing::debug;
use url::Url;

#[allow(clippy::expect_used)]
static HREF: LazyLock<Regex> = LazyLock::new(|| {
    // Double-quoted, single-quoted, or bare attribute values, in that order.
    Regex::new(r#"(?is)href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^>\s\n]*))"#)
        .expect("href regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static BASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<base\s+href\s*=\s*['"]?([^'">]+)"#)
        .expect("base-tag regex is valid") // Static pattern, safe to panic
});

/// One fetched HTML document.
///
/// Immutable after construction. The link set is a pure function of the body
/// and base URL, computed on first access and cached for the page's lifetime.
#[derive(Debug)]
pub struct Page {
    data: String,
    url: Url,
    base_url: Url,
    links: OnceLock<HashSet<String>>,
}

impl Page {
    /// Wraps a fetched document. The effective base URL comes from the first
    /// `<base href>` tag when one is present, else from `url` itself.
    #[must_use]
    pub fn new(data: String, url: Url) -> Self {
        let base_url = BASE
            .captures(&data)
            .and_then(|caps| caps.get(1))
            .and_then(|href| url.join(href.as_str()).ok())
            .unwrap_or_else(|| url.clone());
        Self {
            data,
            url,
            base_url,
            links: OnceLock::new(),
        }
    }

    /// URL the document was fetched from (after redirects).
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Effective base URL used to resolve relative links.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Raw document body.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// The deduplicated set of absolute, entity-unescaped link targets.
    pub fn links(&self) -> &HashSet<String> {
        self.links.get_or_init(|| {
            let mut links = HashSet::new();
            for caps in HREF.captures_iter(&self.data) {
                let Some(raw) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))
                else {
                    continue;
                };
                match self.base_url.join(raw.as_str()) {
                    Ok(resolved) => {
                        links.insert(
                            html_escape::decode_html_entities(resolved.as_str()).into_owned(),
                        );
                    }
                    Err(error) => {
                        debug!(href = raw.as_str(), %error, "Skipping unresolvable link");
                    }
                }
            }
            links
        })
    }
}
