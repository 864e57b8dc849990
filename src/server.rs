//! # HTTP Service
//!
//! An axum router exposing the crawler and the RAG system:
//!
//! - `POST /scrape` crawls `{url}` into a new collection and makes it current
//! - `POST /query` answers `{query, collection_name?}`
//! - `GET /collections` lists collection names and the current collection
//!
//! All responses are JSON. Failures are `{"error": message}` with status 400
//! for bad input and 500 for everything else.

mod error;
mod handlers;
mod state;

pub use error::ApiError;
pub use handlers::{
    CollectionsResponse, QueryRequest, QueryResponse, ScrapeRequest, ScrapeResponse,
};
pub use state::AppState;

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{get, post};
use rig::completion::CompletionModel;
use rig::embeddings::EmbeddingModel;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the router for the service
pub fn create_router<C, E>(state: AppState<C, E>) -> Router
where
    C: CompletionModel + 'static,
    E: EmbeddingModel + 'static,
{
    Router::new()
        .route("/scrape", post(handlers::scrape::<C, E>))
        .route("/query", post(handlers::query::<C, E>))
        .route("/collections", get(handlers::collections::<C, E>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the router on `addr` until Ctrl-C
pub async fn serve<C, E>(state: AppState<C, E>, addr: SocketAddr) -> crate::Result<()>
where
    C: CompletionModel + 'static,
    E: EmbeddingModel + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CrawlerConfig;
    use crate::index::Database;
    use crate::model::Client;
    use crate::model::mock_model::{MockCompletionModel, MockEmbeddingModel};
    use crate::rag::RagOptions;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    type MockState = AppState<MockCompletionModel, MockEmbeddingModel>;

    async fn test_state(with_client: bool) -> (MockState, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new_from_path(&dir.path().join("api.db").to_string_lossy())
            .await
            .unwrap();
        let client = with_client
            .then(|| Client::new(MockCompletionModel::new(), MockEmbeddingModel::default()));
        let config = CrawlerConfig::builder().rate_limit_ms(0).build();

        let state = AppState::new(db, client, config, RagOptions::default()).unwrap();
        (state, dir)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_collections_starts_empty() {
        let (state, _dir) = test_state(true).await;

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/collections")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "collections": [], "current_collection": null })
        );
    }

    #[tokio::test]
    async fn test_query_without_collection_is_rejected() {
        let (state, _dir) = test_state(true).await;

        let response = create_router(state)
            .oneshot(post_json("/query", json!({ "query": "how do I install?" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "No active document collection"
        );
    }

    #[tokio::test]
    async fn test_query_requires_question() {
        let (state, _dir) = test_state(true).await;
        let app = create_router(state);

        let missing = app
            .clone()
            .oneshot(post_json("/query", json!({ "collection_name": "docs_x" })))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(missing).await["error"], "Query is required");

        let blank = app
            .oneshot(post_json("/query", json!({ "query": "   " })))
            .await
            .unwrap();
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_query_unknown_collection_is_rejected() {
        let (state, _dir) = test_state(true).await;

        let response = create_router(state)
            .oneshot(post_json(
                "/query",
                json!({ "query": "anything", "collection_name": "docs_missing" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_json(response).await["error"]
                .as_str()
                .unwrap()
                .contains("docs_missing")
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_bad_request() {
        let (state, _dir) = test_state(true).await;

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/scrape")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_scrape_validates_url() {
        let (state, _dir) = test_state(true).await;
        let app = create_router(state);

        let missing = app
            .clone()
            .oneshot(post_json("/scrape", json!({})))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(missing).await["error"], "URL is required");

        let empty = app
            .clone()
            .oneshot(post_json("/scrape", json!({ "url": "" })))
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let no_scheme = app
            .oneshot(post_json("/scrape", json!({ "url": "mailto:docs@site.com" })))
            .await
            .unwrap();
        assert_eq!(no_scheme.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_model_endpoints_require_api_keys() {
        let (state, _dir) = test_state(false).await;
        state.set_current_collection("docs_x").await;
        let app = create_router(state);

        let scrape = app
            .clone()
            .oneshot(post_json("/scrape", json!({ "url": "https://site.com/docs" })))
            .await
            .unwrap();
        assert_eq!(scrape.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(scrape).await["error"], "API keys are required");

        let query = app
            .oneshot(post_json("/query", json!({ "query": "anything" })))
            .await
            .unwrap();
        assert_eq!(query.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(query).await["error"], "API keys are required");
    }
}
