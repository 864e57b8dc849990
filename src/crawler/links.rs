//! Link extraction for the crawl frontier

use std::collections::BTreeSet;

use scraper::{Html, Selector};
use tracing::trace;
use url::Url;

use super::normalize::{is_in_scope, looks_like_page, normalize_url};

const SKIPPED_PREFIXES: [&str; 4] = ["#", "javascript:", "mailto:", "tel:"];

/// Collect the in-scope document links of a parsed page
///
/// Anchors are resolved against `page_url`, then kept only when they stay on
/// the crawl base's host and path and look like a document page rather than
/// an asset. Fragment-only, `javascript:`, `mailto:` and `tel:` links are
/// skipped outright. The returned URLs are normalized.
pub fn extract_links(document: &Html, page_url: &Url, base: &Url) -> BTreeSet<String> {
    let mut links = BTreeSet::new();
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };

        if href.is_empty() || SKIPPED_PREFIXES.iter().any(|p| href.starts_with(p)) {
            continue;
        }

        let Ok(absolute) = page_url.join(href) else {
            trace!("Skipping unresolvable href {}", href);
            continue;
        };

        if !matches!(absolute.scheme(), "http" | "https") {
            continue;
        }

        if is_in_scope(absolute.as_str(), base) && looks_like_page(absolute.path()) {
            links.insert(normalize_url(absolute.as_str(), base));
        }
    }

    links
}
