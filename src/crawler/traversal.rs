//! Bounded same-scope traversal of a documentation site

use std::collections::{BTreeSet, HashSet};

use scraper::Html;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::crawler::content_extraction::extract_text;
use crate::crawler::links::extract_links;
use crate::crawler::normalize::{crawl_base, normalize_url};
use crate::crawler::{CrawlError, CrawlerConfig, PageFetcher, PageRecord};
use crate::markdown::{markdown_to_html, render_crawl_markdown};

/// Lifecycle of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    /// Seeded but nothing handed out yet
    Idle,
    /// URLs are being handed out
    Running,
    /// The frontier is empty or the page cap was reached
    Done,
}

/// Frontier and visited set of a single crawl
///
/// A URL is handed out by [`CrawlState::next_url`] at most once and is marked
/// visited at that point, whether or not its fetch later succeeds.
#[derive(Debug)]
pub struct CrawlState {
    base_url: Url,
    visited: HashSet<String>,
    to_visit: HashSet<String>,
    phase: CrawlPhase,
}

impl CrawlState {
    /// Create a crawl anchored at `start_url`
    ///
    /// The start URL must be an absolute http(s) URL with a host.
    pub fn new(start_url: &str) -> Result<Self, CrawlError> {
        let start = Url::parse(start_url.trim())?;
        if !matches!(start.scheme(), "http" | "https") || start.host_str().is_none() {
            return Err(CrawlError::InvalidStartUrl(start_url.to_string()));
        }

        let base_url = crawl_base(&start);
        let seed = normalize_url(start.as_str(), &base_url);

        Ok(Self {
            base_url,
            visited: HashSet::new(),
            to_visit: HashSet::from([seed]),
            phase: CrawlPhase::Idle,
        })
    }

    /// The scope boundary of this crawl
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    /// Number of URLs waiting in the frontier
    pub fn pending(&self) -> usize {
        self.to_visit.len()
    }

    /// Take the next unvisited URL and mark it visited
    ///
    /// Selection order is arbitrary. Returns `None` and moves to
    /// [`CrawlPhase::Done`] once the frontier is empty or `max_pages` URLs
    /// have been handed out.
    pub fn next_url(&mut self, max_pages: usize) -> Option<String> {
        if self.phase == CrawlPhase::Done {
            return None;
        }
        self.phase = CrawlPhase::Running;

        while self.visited.len() < max_pages {
            let Some(url) = self.to_visit.iter().next().cloned() else {
                break;
            };
            self.to_visit.remove(&url);
            if self.visited.insert(url.clone()) {
                return Some(url);
            }
        }

        self.phase = CrawlPhase::Done;
        None
    }

    /// Add newly discovered URLs that have not been visited yet
    pub fn enqueue(&mut self, urls: impl IntoIterator<Item = String>) {
        for url in urls {
            if !self.visited.contains(&url) {
                self.to_visit.insert(url);
            }
        }
    }
}

/// Outcome of a crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Scope boundary the crawl was confined to
    pub base_url: String,

    /// One record per fetched page with non-empty text
    pub records: Vec<PageRecord>,

    /// Number of URLs visited, including failed fetches
    pub visited: usize,

    /// URLs whose fetch failed
    pub failed: Vec<String>,
}

impl CrawlReport {
    /// Render the crawl as a markdown document, one section per page
    pub fn to_markdown(&self) -> String {
        render_crawl_markdown(&self.base_url, &self.records)
    }

    /// Render the crawl's markdown document as HTML
    pub fn to_html(&self) -> String {
        markdown_to_html(&self.to_markdown())
    }
}

/// Crawl a documentation site
///
/// Pages are fetched one at a time with `config.rate_limit()` between
/// requests until the frontier is empty or `config.max_pages` URLs have been
/// visited. A failed fetch is logged and skipped; it contributes neither a
/// record nor links.
///
/// # Errors
///
/// Only an unusable start URL fails the crawl.
#[instrument(skip(fetcher, config))]
pub async fn crawl_website<F: PageFetcher>(
    fetcher: &F,
    start_url: &str,
    config: &CrawlerConfig,
) -> Result<CrawlReport, CrawlError> {
    let mut state = CrawlState::new(start_url)?;
    info!(
        "Starting crawl of {} (max {} pages)",
        state.base_url(),
        config.max_pages
    );

    let mut records = Vec::new();
    let mut failed = Vec::new();
    let mut first_request = true;

    while let Some(url) = state.next_url(config.max_pages) {
        if !first_request && !config.rate_limit().is_zero() {
            sleep(config.rate_limit()).await;
        }
        first_request = false;

        info!("Scraping: {}", url);
        match fetcher.fetch(&url).await {
            Ok(html) => {
                let (record, links) = process_page(&html, &url, state.base_url(), config);
                debug!("Found {} in-scope links on {}", links.len(), url);
                if let Some(record) = record {
                    records.push(record);
                }
                state.enqueue(links);
            }
            Err(e) => {
                warn!("Error scraping {}: {}", url, e);
                failed.push(url);
            }
        }
    }

    info!(
        "Crawl finished: {} pages visited, {} records, {} failures",
        state.visited().len(),
        records.len(),
        failed.len()
    );

    Ok(CrawlReport {
        base_url: state.base_url().to_string(),
        records,
        visited: state.visited().len(),
        failed,
    })
}

// Kept synchronous: the parsed document is not Send and must not live across an await.
fn process_page(
    html: &str,
    url: &str,
    base: &Url,
    config: &CrawlerConfig,
) -> (Option<PageRecord>, BTreeSet<String>) {
    let mut document = Html::parse_document(html);

    // Links come from the full page so navigation menus still feed the frontier
    let links = match Url::parse(url) {
        Ok(page_url) => extract_links(&document, &page_url, base),
        Err(_) => BTreeSet::new(),
    };
    let record = extract_text(&mut document, url, config);

    (record, links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves pages from memory and counts fetches per URL
    struct InMemoryFetcher {
        pages: HashMap<String, String>,
        fetches: Mutex<HashMap<String, usize>>,
    }

    impl InMemoryFetcher {
        fn new(pages: HashMap<String, String>) -> Self {
            Self {
                pages,
                fetches: Mutex::new(HashMap::new()),
            }
        }

        fn fetch_counts(&self) -> HashMap<String, usize> {
            self.fetches.lock().unwrap().clone()
        }
    }

    impl PageFetcher for InMemoryFetcher {
        async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
            *self
                .fetches
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default() += 1;
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| CrawlError::NotFound(url.to_string()))
        }
    }

    fn fast_config() -> CrawlerConfig {
        CrawlerConfig::builder().rate_limit_ms(0).build()
    }

    fn page_html(title: &str, body: &str, links: &[String]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!("<a href=\"{}\">next</a> ", href))
            .collect();
        format!(
            "<html><head><title>{}</title></head><body><nav>{}</nav><main><p>{}</p></main></body></html>",
            title, anchors, body
        )
    }

    /// A `/docs/` index linking into a ring of `size` pages, where every page
    /// links forward twice and back to the start of the ring
    fn cyclic_site(size: usize) -> HashMap<String, String> {
        let index = (
            "https://site.com/docs/".to_string(),
            page_html("Docs", "Documentation index", &["page0".to_string()]),
        );
        (0..size)
            .map(|i| {
                let links = vec![
                    format!("/docs/page{}", (i + 1) % size),
                    format!("/docs/page{}#anchor", (i + 2) % size),
                    "/docs/page0".to_string(),
                ];
                (
                    format!("https://site.com/docs/page{}", i),
                    page_html(&format!("Page {}", i), &format!("Body of page {}", i), &links),
                )
            })
            .chain(std::iter::once(index))
            .collect()
    }

    #[test]
    fn test_state_rejects_unusable_start_urls() {
        assert!(matches!(CrawlState::new("not a url"), Err(CrawlError::UrlParse(_))));
        assert!(matches!(
            CrawlState::new("mailto:docs@site.com"),
            Err(CrawlError::InvalidStartUrl(_))
        ));
        assert!(matches!(
            CrawlState::new("ftp://site.com/docs"),
            Err(CrawlError::InvalidStartUrl(_))
        ));
    }

    #[test]
    fn test_state_phases_and_dedup() {
        let mut state = CrawlState::new("https://site.com/docs/#intro").unwrap();
        assert_eq!(state.phase(), CrawlPhase::Idle);
        assert_eq!(state.base_url().as_str(), "https://site.com/docs/");

        let first = state.next_url(10).unwrap();
        assert_eq!(first, "https://site.com/docs/");
        assert_eq!(state.phase(), CrawlPhase::Running);

        state.enqueue(vec![
            "https://site.com/docs/".to_string(),
            "https://site.com/docs/a".to_string(),
        ]);
        assert_eq!(state.pending(), 1);

        assert_eq!(state.next_url(10).unwrap(), "https://site.com/docs/a");
        assert_eq!(state.next_url(10), None);
        assert_eq!(state.phase(), CrawlPhase::Done);
        assert_eq!(state.next_url(10), None);
    }

    #[test]
    fn test_state_respects_page_cap() {
        let mut state = CrawlState::new("https://site.com/docs/").unwrap();
        state.next_url(2).unwrap();
        state.enqueue((0..5).map(|i| format!("https://site.com/docs/{}", i)));

        assert!(state.next_url(2).is_some());
        assert_eq!(state.next_url(2), None);
        assert_eq!(state.visited().len(), 2);
        assert_eq!(state.phase(), CrawlPhase::Done);
    }

    #[tokio::test]
    async fn test_cyclic_site_is_capped_and_never_refetched() {
        let fetcher = InMemoryFetcher::new(cyclic_site(200));

        let report = crawl_website(&fetcher, "https://site.com/docs/", &fast_config())
            .await
            .unwrap();

        let counts = fetcher.fetch_counts();
        assert_eq!(report.visited, 100);
        assert_eq!(report.records.len(), 100);
        assert!(report.failed.is_empty());
        assert_eq!(counts.len(), 100);
        assert!(counts.values().all(|&count| count == 1));
    }

    #[tokio::test]
    async fn test_starting_on_a_leaf_page_scopes_the_crawl_to_it() {
        let fetcher = InMemoryFetcher::new(cyclic_site(5));

        let report = crawl_website(&fetcher, "https://site.com/docs/page0", &fast_config())
            .await
            .unwrap();

        assert_eq!(report.base_url, "https://site.com/docs/page0");
        assert_eq!(report.visited, 1);
        assert_eq!(fetcher.fetch_counts().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetches_do_not_abort_the_crawl() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://site.com/docs/".to_string(),
            page_html(
                "Home",
                "Welcome",
                &["/docs/missing".to_string(), "/docs/guide".to_string()],
            ),
        );
        pages.insert(
            "https://site.com/docs/guide".to_string(),
            page_html("Guide", "Read me", &["/docs/missing".to_string()]),
        );
        let fetcher = InMemoryFetcher::new(pages);

        let report = crawl_website(&fetcher, "https://site.com/docs/", &fast_config())
            .await
            .unwrap();

        assert_eq!(report.visited, 3);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.failed, vec!["https://site.com/docs/missing".to_string()]);
        assert_eq!(fetcher.fetch_counts()["https://site.com/docs/missing"], 1);
    }

    #[tokio::test]
    async fn test_report_markdown_has_one_section_per_record() {
        let fetcher = InMemoryFetcher::new(cyclic_site(3));

        let report = crawl_website(&fetcher, "https://site.com/docs/", &fast_config())
            .await
            .unwrap();
        let markdown = report.to_markdown();

        assert_eq!(report.visited, 4);
        assert!(markdown.starts_with("# Documentation for https://site.com/docs/\n\n"));
        assert_eq!(markdown.lines().filter(|l| l.starts_with("## ")).count(), 4);
        assert_eq!(markdown.lines().filter(|l| l.starts_with("## Page ")).count(), 3);
        assert!(report.to_html().contains("<h2>Page 1</h2>"));
    }
}
