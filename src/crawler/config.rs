//! # Crawler Configuration Module
//!
//! Configuration for the documentation crawler: the page cap, the politeness
//! delay between requests, the per-request timeout and the CSS selectors used
//! to find the main content of a page and to strip boilerplate from it.
//!
//! Defaults match a polite single-site crawl: at most 100 pages, one second
//! between requests and a ten second timeout per request.

use std::time::Duration;

/// Main-content candidates, tried in order
pub const DEFAULT_CONTENT_SELECTORS: [&str; 6] = [
    "main",
    "article",
    ".content",
    ".documentation",
    ".docs",
    "[role=\"main\"]",
];

/// Elements removed before text is extracted
pub const DEFAULT_EXCLUDE_SELECTORS: [&str; 6] =
    ["script", "style", "nav", "footer", "header", "aside"];

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Maximum number of pages to visit in one crawl
    pub max_pages: usize,

    /// Delay in milliseconds between consecutive requests
    pub rate_limit_ms: u64,

    /// Timeout in seconds for a single page fetch
    pub timeout_secs: u64,

    /// User agent to use for requests
    pub user_agent: String,

    /// CSS selectors for main-content candidates, in priority order
    pub content_selectors: Vec<String>,

    /// CSS selectors for elements to exclude
    pub exclude_selectors: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            rate_limit_ms: 1000,
            timeout_secs: 10,
            user_agent: format!("docrag-crawler/{}", env!("CARGO_PKG_VERSION")),
            content_selectors: DEFAULT_CONTENT_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude_selectors: DEFAULT_EXCLUDE_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the maximum number of pages to crawl
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the delay in milliseconds between requests
    pub fn rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.config.rate_limit_ms = rate_limit_ms;
        self
    }

    /// Set the per-request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the CSS selectors for main-content candidates
    pub fn content_selectors(mut self, content_selectors: Vec<String>) -> Self {
        self.config.content_selectors = content_selectors;
        self
    }

    /// Set the CSS selectors for elements to exclude
    pub fn exclude_selectors(mut self, exclude_selectors: Vec<String>) -> Self {
        self.config.exclude_selectors = exclude_selectors;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the delay between requests as a Duration
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Get the per-request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
