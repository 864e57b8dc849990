//! Error types for the crawler module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for crawler operations
///
/// Per-page failures are logged and skipped by the traversal. Only start URL
/// problems and fetcher construction surface to the caller.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Parseable, but not an http(s) URL with a host
    #[error("Invalid start URL: {0}")]
    InvalidStartUrl(String),

    /// A fetcher has no page for the URL
    #[error("Page not found: {0}")]
    NotFound(String),
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Http(e) => CrateError::Http(e),
            CrawlError::UrlParse(_) | CrawlError::InvalidStartUrl(_) => {
                CrateError::InvalidRequest(err.to_string())
            }
            CrawlError::NotFound(_) => CrateError::Crawl(err.to_string()),
        }
    }
}
