//! Configuration for the RAG orchestrator

use crate::processor::ChunkOptions;

/// Default number of chunks retrieved per question
pub const DEFAULT_TOP_K: usize = 3;

/// Configuration for indexing and retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagOptions {
    /// How documents are split before embedding
    pub chunk_options: ChunkOptions,

    /// Number of chunks retrieved when no explicit count is given
    pub top_k: usize,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            chunk_options: ChunkOptions::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Builder for RagOptions
#[derive(Debug, Default)]
pub struct RagOptionsBuilder {
    options: RagOptions,
}

impl RagOptionsBuilder {
    /// Create a new builder with default options
    pub fn new() -> Self {
        Self {
            options: RagOptions::default(),
        }
    }

    /// Set the chunk options
    pub fn chunk_options(mut self, chunk_options: ChunkOptions) -> Self {
        self.options.chunk_options = chunk_options;
        self
    }

    /// Set the maximum chunk size in characters
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.options.chunk_options.chunk_size = chunk_size;
        self
    }

    /// Set the default number of retrieved chunks
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.options.top_k = top_k;
        self
    }

    /// Build the options
    pub fn build(self) -> RagOptions {
        self.options
    }
}

impl RagOptions {
    /// Create a new builder
    pub fn builder() -> RagOptionsBuilder {
        RagOptionsBuilder::new()
    }
}
