//! Page fetching for the crawler

use std::future::Future;

use reqwest::Client as ReqwestClient;
use tracing::{debug, instrument};

use crate::crawler::{CrawlError, CrawlerConfig};

/// Source of raw page HTML
///
/// The crawler is generic over its fetcher so traversal can run against an
/// in-memory site as well as the network.
pub trait PageFetcher: Send + Sync {
    /// Fetch the HTML body of `url`
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, CrawlError>> + Send;
}

/// Fetches pages over HTTP with reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: ReqwestClient,
}

impl HttpFetcher {
    /// Create a fetcher using the timeout and user agent from `config`
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        debug!("Fetched {} ({})", url, response.status());
        Ok(response.text().await?)
    }
}
