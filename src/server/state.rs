//! Shared state of the HTTP service

use std::sync::Arc;

use rig::completion::CompletionModel;
use rig::embeddings::EmbeddingModel;
use tokio::sync::RwLock;

use crate::crawler::{CrawlerConfig, HttpFetcher};
use crate::index::Database;
use crate::model::Client;
use crate::rag::RagOptions;

/// State shared by all request handlers
///
/// `client` is `None` when no model credentials were configured; the server
/// still runs and only the model-backed endpoints refuse requests.
#[derive(Clone)]
pub struct AppState<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    pub db: Database,
    pub client: Option<Client<C, E>>,
    pub fetcher: HttpFetcher,
    pub crawler_config: Arc<CrawlerConfig>,
    pub rag_options: RagOptions,
    current_collection: Arc<RwLock<Option<String>>>,
}

impl<C, E> AppState<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    pub fn new(
        db: Database,
        client: Option<Client<C, E>>,
        crawler_config: CrawlerConfig,
        rag_options: RagOptions,
    ) -> crate::Result<Self> {
        let fetcher = HttpFetcher::new(&crawler_config)?;

        Ok(Self {
            db,
            client,
            fetcher,
            crawler_config: Arc::new(crawler_config),
            rag_options,
            current_collection: Arc::new(RwLock::new(None)),
        })
    }

    /// The collection written by the most recent successful scrape
    pub async fn current_collection(&self) -> Option<String> {
        self.current_collection.read().await.clone()
    }

    pub async fn set_current_collection(&self, name: impl Into<String>) {
        *self.current_collection.write().await = Some(name.into());
    }
}
