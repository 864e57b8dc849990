//! Content processor module for RAG
//!
//! Turns the text of crawled pages into identified chunks ready to be
//! embedded and stored.

mod chunking;
mod config;
mod error;

pub use chunking::{TextChunk, chunk_document, chunk_id, wrap_text};
pub use config::{ChunkOptions, ChunkOptionsBuilder, ChunkStrategy};
pub use error::ProcessError;
