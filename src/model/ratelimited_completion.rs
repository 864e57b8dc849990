use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use rig::completion::{CompletionError, CompletionModel, CompletionRequest, CompletionResponse};
use tracing::{Instrument, info_span};

use super::{RateLimitResponse, acquire_permit};

/// Completion model that takes a `governor` permit before every request
#[derive(Clone)]
pub struct RateLimitedCompletionModel<M: CompletionModel> {
    inner: M,
    permits: Arc<DefaultDirectRateLimiter>,
}

impl<M: CompletionModel> RateLimitedCompletionModel<M> {
    pub fn new(inner: M, permits: DefaultDirectRateLimiter) -> Self {
        Self {
            inner,
            permits: Arc::new(permits),
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: CompletionModel> CompletionModel for RateLimitedCompletionModel<M> {
    type Response = RateLimitResponse<M::Response>;

    async fn completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        acquire_permit(&self.permits, "completion").await;

        let CompletionResponse {
            choice,
            raw_response,
        } = self
            .inner
            .completion(request)
            .instrument(info_span!("completion"))
            .await?;

        Ok(CompletionResponse {
            choice,
            raw_response: RateLimitResponse {
                response: raw_response,
            },
        })
    }
}
