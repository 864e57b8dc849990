//! Error types for the RAG orchestrator

use rig::completion::PromptError;
use rig::embeddings::EmbeddingError;
use thiserror::Error;

use crate::error::Error as CrateError;
use crate::index::DbError;
use crate::processor::ProcessError;

/// Errors that can occur while indexing or answering
#[derive(Debug, Error)]
pub enum RagError {
    /// Error occurred during database operations
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Error occurred while chunking documents
    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    /// Error occurred during embedding generation
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The language model call failed
    #[error("Completion error: {0}")]
    Completion(#[from] PromptError),

    /// The embedding provider returned a different number of vectors than requested
    #[error("Expected {expected} embeddings, got {actual}")]
    EmbeddingCount { expected: usize, actual: usize },

    /// The collection has not been created
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Caller-supplied arguments are inconsistent
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<RagError> for CrateError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Database(e) => e.into(),
            RagError::Process(e) => e.into(),
            RagError::CollectionNotFound(_) | RagError::InvalidInput(_) => {
                CrateError::InvalidRequest(err.to_string())
            }
            _ => CrateError::Rag(err.to_string()),
        }
    }
}
