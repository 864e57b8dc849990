//! Error responses of the HTTP service

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::crawler::CrawlError;
use crate::error::Error as CrateError;
use crate::index::DbError;
use crate::rag::RagError;

/// Error returned by a handler, rendered as `{"error": message}`
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request cannot be served as sent (400)
    #[error("{0}")]
    BadRequest(String),

    /// Anything else (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<CrateError> for ApiError {
    fn from(err: CrateError) -> Self {
        match err {
            CrateError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CrawlError> for ApiError {
    fn from(err: CrawlError) -> Self {
        CrateError::from(err).into()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        CrateError::from(err).into()
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        CrateError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let missing: ApiError = RagError::CollectionNotFound("docs_x".into()).into();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.to_string(), "Collection not found: docs_x");

        let start: ApiError = CrawlError::InvalidStartUrl("ftp://x".into()).into();
        assert_eq!(start.status(), StatusCode::BAD_REQUEST);

        let db: ApiError = DbError::Query("disk full".into()).into();
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
