//! # Database Schema Module
//!
//! Two tables back the index:
//!
//! 1. `collections` - one row per crawl, keyed by collection name
//! 2. `chunks` - embedded text chunks keyed by `(collection, id)`, with the
//!    chunk metadata as JSON and the embedding as a little-endian `f32` blob
//!
//! Similarity is computed in the application, so no vector index is created.

use crate::index::error::DbError;
use libsql::Connection;
use tracing::debug;

const STATEMENTS: [(&str, &str); 3] = [
    (
        "collections table",
        "CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            created_at TEXT NOT NULL
        )",
    ),
    (
        "chunks table",
        "CREATE TABLE IF NOT EXISTS chunks (
            collection TEXT NOT NULL REFERENCES collections(name),
            id TEXT NOT NULL,
            document TEXT NOT NULL,
            metadata TEXT NOT NULL,
            embedding BLOB NOT NULL,
            PRIMARY KEY (collection, id)
        )",
    ),
    (
        "chunk collection index",
        "CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection)",
    ),
];

/// Create the index tables if they do not exist yet
pub async fn initialize_schema(conn: &Connection) -> Result<(), DbError> {
    for (what, sql) in STATEMENTS {
        conn.execute(sql, ())
            .await
            .map_err(|e| DbError::Schema(format!("Failed to create {}: {}", what, e)))?;
    }
    debug!("Index schema ready");

    Ok(())
}
