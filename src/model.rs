//! # LLM Client Module
//!
//! A single client wrapping the completion model used to write answers and
//! the embedding model used to index and retrieve chunks. Both models are
//! wrapped in `governor` rate limiters so a large crawl cannot exhaust the
//! provider quota.
//!
//! ## Key Components
//!
//! - `Client`: the pair of models
//! - `GeminiClient`: the production client backed by Gemini
//! - `RateLimitedCompletionModel` / `RateLimitedEmbeddingModel`: quota wrappers
//! - `mock_model`: deterministic models for tests

use std::num::NonZeroU32;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use ratelimited_completion::RateLimitedCompletionModel;
use ratelimited_embedding::RateLimitedEmbeddingModel;
use rig::{completion::CompletionModel, embeddings::EmbeddingModel, providers::gemini};
use tracing::{Instrument, debug, debug_span, info, warn};

pub mod embedding;
pub mod mock_model;
pub mod ratelimited_completion;
pub mod ratelimited_embedding;

pub use embedding::EmbeddingConversion;

/// Environment variable holding the Gemini API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const COMPLETIONS_PER_MINUTE: NonZeroU32 = NonZeroU32::new(2000).unwrap();
const FREE_COMPLETIONS_PER_MINUTE: NonZeroU32 = NonZeroU32::new(30).unwrap();
const EMBEDDINGS_PER_MINUTE: NonZeroU32 = NonZeroU32::new(1000).unwrap();

#[derive(Debug, Clone)]
pub struct Client<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    completion_model: C,
    embedding_model: E,
}

/// Raw provider response passed through a rate-limited model
pub struct RateLimitResponse<T> {
    #[allow(dead_code)]
    response: T,
}

/// Take one request permit, waiting when the quota is used up
async fn acquire_permit(limiter: &DefaultDirectRateLimiter, kind: &'static str) {
    if limiter.check().is_ok() {
        return;
    }
    debug!("{} quota exhausted, waiting for a permit", kind);
    limiter
        .until_ready()
        .instrument(debug_span!("limiter", kind))
        .await;
}

pub type GeminiClient = Client<
    RateLimitedCompletionModel<gemini::completion::CompletionModel>,
    RateLimitedEmbeddingModel<gemini::embedding::EmbeddingModel>,
>;

impl GeminiClient {
    /// Build a client from `GEMINI_API_KEY`
    ///
    /// Returns `None` when the key is unset or blank.
    pub fn gemini_from_env(free_tier: bool) -> Option<Self> {
        let gemini_api_key = match std::env::var(GEMINI_API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                warn!("{} is not set, model-backed operations are disabled", GEMINI_API_KEY_ENV);
                return None;
            }
        };

        let gemini_client = gemini::Client::new(&gemini_api_key);
        if free_tier {
            info!("Using free tier Gemini quotas");
            Some(Self::new_gemini_free(gemini_client))
        } else {
            Some(Self::new_gemini(gemini_client))
        }
    }

    /// Paid tier quotas with the full flash model
    pub fn new_gemini(gemini_client: gemini::Client) -> Self {
        Self::gemini_with_quota(&gemini_client, "gemini-2.0-flash", COMPLETIONS_PER_MINUTE)
    }

    /// Free tier quotas with the lite flash model
    pub fn new_gemini_free(gemini_client: gemini::Client) -> Self {
        Self::gemini_with_quota(
            &gemini_client,
            "gemini-2.0-flash-lite",
            FREE_COMPLETIONS_PER_MINUTE,
        )
    }

    fn gemini_with_quota(
        gemini_client: &gemini::Client,
        completion_model: &str,
        completions_per_minute: NonZeroU32,
    ) -> Self {
        Self::new(
            RateLimitedCompletionModel::new(
                gemini_client.completion_model(completion_model),
                RateLimiter::direct(Quota::per_minute(completions_per_minute)),
            ),
            RateLimitedEmbeddingModel::new(
                gemini_client.embedding_model(gemini::embedding::EMBEDDING_004),
                RateLimiter::direct(Quota::per_minute(EMBEDDINGS_PER_MINUTE)),
            ),
        )
    }
}

impl<C, E> Client<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    pub fn new(completion_model: C, embedding_model: E) -> Self {
        Self {
            completion_model,
            embedding_model,
        }
    }

    pub fn completion(&self) -> &C {
        &self.completion_model
    }

    pub fn embedding(&self) -> &E {
        &self.embedding_model
    }
}
