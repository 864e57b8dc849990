//! # Processor Configuration Module
//!
//! Controls how page text is cut into chunks before it is embedded. The
//! default wraps text into chunks of roughly 1000 characters; the whole
//! document strategy keeps each document as a single chunk.

/// How a document is split into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkStrategy {
    /// Greedy word wrap at `chunk_size` characters
    #[default]
    Wrap,

    /// One chunk per document
    WholeDocument,
}

/// Configuration for chunking text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Maximum size of each chunk in characters
    pub chunk_size: usize,

    /// Splitting strategy
    pub strategy: ChunkStrategy,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            strategy: ChunkStrategy::default(),
        }
    }
}

/// Builder for ChunkOptions
#[derive(Debug, Default)]
pub struct ChunkOptionsBuilder {
    options: ChunkOptions,
}

impl ChunkOptionsBuilder {
    /// Create a new builder with default options
    pub fn new() -> Self {
        Self {
            options: ChunkOptions::default(),
        }
    }

    /// Set the maximum chunk size in characters
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.options.chunk_size = chunk_size;
        self
    }

    /// Set the splitting strategy
    pub fn strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    /// Build the options
    pub fn build(self) -> ChunkOptions {
        self.options
    }
}

impl ChunkOptions {
    /// Create a new builder
    pub fn builder() -> ChunkOptionsBuilder {
        ChunkOptionsBuilder::new()
    }
}
