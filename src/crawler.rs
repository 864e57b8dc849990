//! # Documentation Crawler
//!
//! Crawls a single documentation site starting from a URL and turns every
//! reachable page into a [`PageRecord`] holding the page's main text.
//!
//! The crawl stays on the start URL's host and under its path, fetches each
//! normalized URL at most once, waits between requests and stops after a
//! fixed number of pages. Failures on individual pages are logged and
//! skipped.
//!
//! ## Key Components
//!
//! - [`CrawlerConfig`]: page cap, politeness delay, timeout and selectors
//! - [`PageFetcher`] / [`HttpFetcher`]: where page HTML comes from
//! - [`crawl_website`]: the traversal loop, producing a [`CrawlReport`]
//! - [`extract_text`] / [`extract_links`]: per-page extraction

mod config;
mod content_extraction;
mod error;
mod fetcher;
mod links;
pub mod normalize;
mod traversal;

pub use config::{
    CrawlerConfig, CrawlerConfigBuilder, DEFAULT_CONTENT_SELECTORS, DEFAULT_EXCLUDE_SELECTORS,
};
pub use content_extraction::{clean_text, extract_page, extract_text};
pub use error::CrawlError;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use links::extract_links;
pub use traversal::{CrawlPhase, CrawlReport, CrawlState, crawl_website};

use serde::{Deserialize, Serialize};

/// The extracted text of one crawled page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Cleaned main text of the page, never empty
    pub content: String,

    /// Normalized URL the page was fetched from
    pub url: String,

    /// Page title, or the URL when the page has none
    pub title: String,
}
