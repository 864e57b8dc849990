//! Index manager module for RAG
//!
//! Persistent, named collections of embedded text chunks with
//! nearest-neighbour lookup by cosine distance.

mod database;
pub mod error;
mod schema;

pub use database::Database;
pub use error::DbError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata stored alongside every chunk
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Where the chunk came from, `"documentation"` for crawled pages
    pub source: String,

    /// URL of the page the chunk was cut from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Title of the page the chunk was cut from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A chunk ready to be written to a collection
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    /// Id, unique within the collection
    pub id: String,

    /// Text of the chunk
    pub document: String,

    pub metadata: ChunkMetadata,

    /// Embedding of `document`
    pub embedding: Vec<f32>,
}

/// A chunk returned by a nearest-neighbour lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkMatch {
    pub id: String,
    pub document: String,
    pub metadata: ChunkMetadata,

    /// Cosine distance to the query, lower is closer
    pub distance: f32,
}

/// A named collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A collection with the number of chunks stored in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub chunks: usize,
}

/// Cosine distance between two vectors, in `[0, 2]`
///
/// Returns `None` when the dimensions differ. A zero vector is at distance 1
/// from everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(1.0);
    }

    Some(1.0 - dot / (norm_a.sqrt() * norm_b.sqrt()))
}
