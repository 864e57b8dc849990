//! Error types for the docrag crate

use thiserror::Error;

/// Result type for docrag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error, the meeting point of every module's own error type
///
/// Only [`Error::InvalidRequest`] is the caller's fault. The HTTP layer maps
/// it to 400 and everything else to 500.
#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unusable settings such as a zero chunk size
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad input: unparseable URLs, unknown collections, blank questions
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Crawl error: {0}")]
    Crawl(String),

    #[error("Database error: {0}")]
    Database(String),

    /// Embedding or answer generation failed
    #[error("RAG error: {0}")]
    Rag(String),
}
