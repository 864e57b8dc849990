use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use tracing::{Instrument, info_span};

use super::acquire_permit;

/// Embedding model that takes a `governor` permit before every batch
///
/// One permit covers a whole `embed_texts` call, so callers should batch up
/// to [`EmbeddingModel::MAX_DOCUMENTS`] texts per call.
#[derive(Clone)]
pub struct RateLimitedEmbeddingModel<M: EmbeddingModel> {
    inner: M,
    permits: Arc<DefaultDirectRateLimiter>,
}

impl<M: EmbeddingModel> RateLimitedEmbeddingModel<M> {
    pub fn new(inner: M, permits: DefaultDirectRateLimiter) -> Self {
        Self {
            inner,
            permits: Arc::new(permits),
        }
    }
}

impl<M: EmbeddingModel> EmbeddingModel for RateLimitedEmbeddingModel<M> {
    const MAX_DOCUMENTS: usize = M::MAX_DOCUMENTS;

    fn ndims(&self) -> usize {
        self.inner.ndims()
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        acquire_permit(&self.permits, "embedding").await;
        self.inner
            .embed_texts(texts)
            .instrument(info_span!("embed_texts"))
            .await
    }
}
