//! Request handlers for `/scrape`, `/query` and `/collections`

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use chrono::Utc;
use rig::completion::CompletionModel;
use rig::embeddings::EmbeddingModel;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use url::Url;

use crate::crawler::crawl_website;
use crate::index::ChunkMetadata;
use crate::model::Client;
use crate::rag::{RagSystem, collection_name_for};
use crate::server::{ApiError, AppState};

const MISSING_API_KEYS: &str = "API keys are required";

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub markdown: String,
    pub html: String,
    pub message: String,
    pub collection_name: String,
    pub pages_processed: usize,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub collection_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub relevant_documents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionsResponse {
    pub collections: Vec<String>,
    pub current_collection: Option<String>,
}

/// Crawl a documentation site and index it into a fresh collection
#[instrument(skip_all)]
pub async fn scrape<C, E>(
    State(state): State<AppState<C, E>>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ScrapeResponse>, ApiError>
where
    C: CompletionModel + 'static,
    E: EmbeddingModel + 'static,
{
    let Json(request) = payload?;

    let raw_url = request
        .url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::BadRequest("URL is required".to_string()))?;
    let url = validate_start_url(&raw_url)?;
    let client = require_client(&state)?;

    let report = crawl_website(&state.fetcher, url.as_str(), &state.crawler_config).await?;

    let rag = RagSystem::create_fresh(
        state.db.clone(),
        client.clone(),
        &collection_name_for(&url, Utc::now()),
        state.rag_options.clone(),
    )
    .await?;
    rag.add_records_or_discard(&report.records).await?;
    let collection_name = rag.collection().to_string();

    state.set_current_collection(collection_name.clone()).await;
    info!(
        "Indexed {} pages from {} into {}",
        report.records.len(),
        url,
        collection_name
    );

    Ok(Json(ScrapeResponse {
        markdown: report.to_markdown(),
        html: report.to_html(),
        message: format!(
            "Documentation scraped successfully. Processed {} pages.",
            report.visited
        ),
        collection_name,
        pages_processed: report.visited,
    }))
}

/// Answer a question from a collection, by default the current one
#[instrument(skip_all)]
pub async fn query<C, E>(
    State(state): State<AppState<C, E>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError>
where
    C: CompletionModel + 'static,
    E: EmbeddingModel + 'static,
{
    let Json(request) = payload?;

    let question = request
        .query
        .filter(|query| !query.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query is required".to_string()))?;

    let requested = request
        .collection_name
        .filter(|name| !name.trim().is_empty());
    let collection_name = match requested {
        Some(name) => name,
        None => state
            .current_collection()
            .await
            .ok_or_else(|| ApiError::BadRequest("No active document collection".to_string()))?,
    };
    let client = require_client(&state)?;

    let rag = RagSystem::existing(
        state.db.clone(),
        client.clone(),
        &collection_name,
        state.rag_options.clone(),
    )
    .await?;
    let (answer, result) = rag.answer(&question, state.rag_options.top_k).await;

    Ok(Json(QueryResponse {
        answer,
        relevant_documents: result.documents().into_iter().map(str::to_string).collect(),
        metadata: result.metadatas().into_iter().cloned().collect(),
        distances: result.distances(),
    }))
}

/// List all collections and the current one
#[instrument(skip_all)]
pub async fn collections<C, E>(
    State(state): State<AppState<C, E>>,
) -> Result<Json<CollectionsResponse>, ApiError>
where
    C: CompletionModel + 'static,
    E: EmbeddingModel + 'static,
{
    let collections = state
        .db
        .list_collections()
        .await?
        .into_iter()
        .map(|collection| collection.name)
        .collect();

    Ok(Json(CollectionsResponse {
        collections,
        current_collection: state.current_collection().await,
    }))
}

fn validate_start_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw).map_err(|e| ApiError::BadRequest(format!("Invalid URL: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ApiError::BadRequest(format!(
            "Invalid URL: {} (expected an http(s) URL with a host)",
            raw
        )));
    }
    Ok(url)
}

fn require_client<C, E>(state: &AppState<C, E>) -> Result<&Client<C, E>, ApiError>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    state
        .client
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest(MISSING_API_KEYS.to_string()))
}
