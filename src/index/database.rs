//! Database operations for the index module

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Row, Rows, params};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::index::error::DbError;
use crate::index::schema;
use crate::index::{
    ChunkMatch, ChunkMetadata, CollectionInfo, CollectionSummary, StoredChunk, cosine_distance,
};
use crate::model::embedding::{vector_from_binary, vector_to_binary};

/// Maximum numeric suffix tried by [`Database::create_fresh_collection`]
const MAX_NAME_SUFFIX: usize = 1000;

/// Database manager for the index
///
/// Clones share one connection. Writes go through a shared lock so that a
/// transaction opened by one task never picks up another task's statements.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    writes: Arc<Mutex<()>>,
}

impl Database {
    /// Create a new database manager
    #[instrument(skip(conn))]
    pub async fn new(conn: Connection) -> Result<Self, DbError> {
        schema::initialize_schema(&conn).await?;

        Ok(Self {
            conn,
            writes: Arc::new(Mutex::new(())),
        })
    }

    /// Create a new database manager from a path
    ///
    /// Missing parent directories are created.
    pub async fn new_from_path(path: &str) -> Result<Self, DbError> {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DbError::Connection(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::Connection(format!("Failed to connect to database: {}", e)))?;

        Self::new(conn).await
    }

    /// Execute a custom query with parameters
    pub async fn execute_query<P>(&self, sql: &str, params: P) -> Result<Rows, DbError>
    where
        P: libsql::params::IntoParams,
    {
        self.conn
            .query(sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to execute query: {}", e)))
    }

    /// Create a collection if it does not exist yet
    ///
    /// Returns `true` when the collection was created by this call and
    /// `false` when it already existed.
    #[instrument(skip(self))]
    pub async fn create_collection(&self, name: &str) -> Result<bool, DbError> {
        let _writes = self.writes.lock().await;
        self.insert_collection(name).await
    }

    /// Create a new, empty collection named `base` or `base_2`, `base_3`, ...
    ///
    /// An existing collection is never reused. Returns the name that was
    /// created.
    #[instrument(skip(self))]
    pub async fn create_fresh_collection(&self, base: &str) -> Result<String, DbError> {
        let _writes = self.writes.lock().await;

        if self.insert_collection(base).await? {
            return Ok(base.to_string());
        }
        for suffix in 2..=MAX_NAME_SUFFIX {
            let candidate = format!("{}_{}", base, suffix);
            if self.insert_collection(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(DbError::Query(format!(
            "No free collection name left for {}",
            base
        )))
    }

    /// Remove a collection and all of its chunks
    ///
    /// Returns `false` when there was no such collection.
    #[instrument(skip(self))]
    pub async fn delete_collection(&self, name: &str) -> Result<bool, DbError> {
        let _writes = self.writes.lock().await;

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;
        tx.execute(
            "DELETE FROM chunks WHERE collection = ?",
            params![name.to_string()],
        )
        .await
        .map_err(|e| DbError::Query(format!("Failed to delete chunks of {}: {}", name, e)))?;
        let removed = tx
            .execute(
                "DELETE FROM collections WHERE name = ?",
                params![name.to_string()],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to delete collection {}: {}", name, e)))?;
        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        debug!("Deleted collection {}", name);
        Ok(removed > 0)
    }

    // Callers hold the write lock
    async fn insert_collection(&self, name: &str) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let inserted = self
            .conn
            .execute(
                "INSERT INTO collections (name, created_at) VALUES (?, ?)
                 ON CONFLICT(name) DO NOTHING",
                params![name.to_string(), now],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to create collection: {}", e)))?;

        if inserted > 0 {
            debug!("Created collection {}", name);
        }
        Ok(inserted > 0)
    }

    /// Check whether a collection exists
    pub async fn collection_exists(&self, name: &str) -> Result<bool, DbError> {
        let mut rows = self
            .conn
            .query(
                "SELECT 1 FROM collections WHERE name = ?",
                params![name.to_string()],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to look up collection: {}", e)))?;

        match rows.next().await {
            Ok(row) => Ok(row.is_some()),
            Err(e) => Err(DbError::Data(format!("Failed to look up collection: {}", e))),
        }
    }

    /// All collections, oldest first
    #[instrument(skip(self))]
    pub async fn list_collections(&self) -> Result<Vec<CollectionInfo>, DbError> {
        let mut rows = self
            .conn
            .query(
                "SELECT name, created_at FROM collections ORDER BY created_at, rowid",
                params![],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to list collections: {}", e)))?;

        let mut collections = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to read collection: {}", e)))?
        {
            collections.push(self.row_to_collection(&row)?);
        }

        Ok(collections)
    }

    /// All collections with their chunk counts, oldest first
    pub async fn collection_summaries(&self) -> Result<Vec<CollectionSummary>, DbError> {
        let mut summaries = Vec::new();
        for CollectionInfo { name, created_at } in self.list_collections().await? {
            let chunks = self.count_chunks(&name).await?;
            summaries.push(CollectionSummary {
                name,
                created_at,
                chunks,
            });
        }

        Ok(summaries)
    }

    /// Write chunks to a collection in one transaction
    ///
    /// A chunk whose id already exists in the collection replaces it.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn add_chunks(
        &self,
        collection: &str,
        chunks: &[StoredChunk],
    ) -> Result<usize, DbError> {
        let _writes = self.writes.lock().await;

        if !self.collection_exists(collection).await? {
            return Err(DbError::CollectionNotFound(collection.to_string()));
        }

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        for chunk in chunks {
            let metadata = serde_json::to_string(&chunk.metadata)
                .map_err(|e| DbError::Data(format!("Failed to encode metadata: {}", e)))?;

            tx.execute(
                "INSERT OR REPLACE INTO chunks (collection, id, document, metadata, embedding)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    collection.to_string(),
                    chunk.id.clone(),
                    chunk.document.clone(),
                    metadata,
                    libsql::Value::Blob(vector_to_binary(&chunk.embedding)),
                ],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to insert chunk {}: {}", chunk.id, e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        debug!("Stored {} chunks in {}", chunks.len(), collection);
        Ok(chunks.len())
    }

    /// The `k` chunks of a collection closest to `query`
    ///
    /// Results are ordered by ascending cosine distance, ties broken by id.
    /// Chunks whose embedding has a different dimension than the query are
    /// skipped.
    #[instrument(skip(self, query), fields(dims = query.len()))]
    pub async fn nearest(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ChunkMatch>, DbError> {
        if !self.collection_exists(collection).await? {
            return Err(DbError::CollectionNotFound(collection.to_string()));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut rows = self
            .conn
            .query(
                "SELECT id, document, metadata, embedding FROM chunks WHERE collection = ?",
                params![collection.to_string()],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to read chunks: {}", e)))?;

        let mut matches = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to read chunk: {}", e)))?
        {
            let chunk = self.row_to_chunk(&row)?;
            match cosine_distance(query, &chunk.embedding) {
                Some(distance) => matches.push(ChunkMatch {
                    id: chunk.id,
                    document: chunk.document,
                    metadata: chunk.metadata,
                    distance,
                }),
                None => warn!(
                    "Skipping chunk {} with {} dimensions, query has {}",
                    chunk.id,
                    chunk.embedding.len(),
                    query.len()
                ),
            }
        }

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(k);

        Ok(matches)
    }

    /// Number of chunks stored in a collection
    pub async fn count_chunks(&self, collection: &str) -> Result<usize, DbError> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM chunks WHERE collection = ?",
                params![collection.to_string()],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to count chunks: {}", e)))?;

        let row = match rows.next().await {
            Ok(Some(row)) => row,
            Ok(None) => return Err(DbError::Data("No count returned".to_string())),
            Err(e) => return Err(DbError::Data(format!("Failed to count chunks: {}", e))),
        };

        let count: i64 = row
            .get(0)
            .map_err(|e| DbError::Data(format!("Failed to get count: {}", e)))?;
        Ok(count as usize)
    }

    /// Convert a database row to a CollectionInfo
    fn row_to_collection(&self, row: &Row) -> Result<CollectionInfo, DbError> {
        let name: String = row
            .get(0)
            .map_err(|e| DbError::Data(format!("Failed to get name: {}", e)))?;
        let created_at: String = row
            .get(1)
            .map_err(|e| DbError::Data(format!("Failed to get created_at: {}", e)))?;

        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| DbError::Data(format!("Invalid created_at for {}: {}", name, e)))?
            .with_timezone(&Utc);

        Ok(CollectionInfo { name, created_at })
    }

    /// Convert a database row to a StoredChunk
    fn row_to_chunk(&self, row: &Row) -> Result<StoredChunk, DbError> {
        let id: String = row
            .get(0)
            .map_err(|e| DbError::Data(format!("Failed to get id: {}", e)))?;
        let document: String = row
            .get(1)
            .map_err(|e| DbError::Data(format!("Failed to get document: {}", e)))?;
        let metadata: String = row
            .get(2)
            .map_err(|e| DbError::Data(format!("Failed to get metadata: {}", e)))?;
        let embedding_blob: Vec<u8> = row
            .get(3)
            .map_err(|e| DbError::Data(format!("Failed to get embedding: {}", e)))?;

        let metadata: ChunkMetadata = serde_json::from_str(&metadata)
            .map_err(|e| DbError::Data(format!("Invalid metadata for {}: {}", id, e)))?;
        let embedding = vector_from_binary(&embedding_blob)
            .ok_or_else(|| DbError::Data(format!("Malformed embedding for {}", id)))?;

        Ok(StoredChunk {
            id,
            document,
            metadata,
            embedding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    async fn setup_test_db() -> Result<(Database, tempfile::TempDir), DbError> {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();

        let db = Database::new_from_path(&db_path).await?;

        Ok((db, temp_dir))
    }

    fn chunk(id: &str, document: &str, embedding: Vec<f32>) -> StoredChunk {
        StoredChunk {
            id: id.to_string(),
            document: document.to_string(),
            metadata: ChunkMetadata {
                source: "documentation".to_string(),
                ..Default::default()
            },
            embedding,
        }
    }

    #[tokio::test]
    async fn test_database_initialization() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        let mut result = db
            .execute_query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('collections', 'chunks')",
                params![],
            )
            .await
            .unwrap();

        let mut tables = Vec::new();
        while let Ok(Some(row)) = result.next().await {
            let table_name: String = row.get(0).unwrap();
            tables.push(table_name);
        }

        assert_eq!(tables.len(), 2);
        assert!(tables.contains(&"collections".to_string()));
        assert!(tables.contains(&"chunks".to_string()));
    }

    #[tokio::test]
    async fn test_new_from_path_creates_parent_directories() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested/dir/index.db");

        Database::new_from_path(&db_path.to_string_lossy()).await.unwrap();

        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_collections_lifecycle() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        assert!(!db.collection_exists("docs_a").await.unwrap());
        assert!(db.list_collections().await.unwrap().is_empty());

        assert!(db.create_collection("docs_a").await.unwrap());
        assert!(db.create_collection("docs_b").await.unwrap());
        assert!(!db.create_collection("docs_a").await.unwrap());

        assert!(db.collection_exists("docs_a").await.unwrap());
        let names: Vec<_> = db
            .list_collections()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["docs_a".to_string(), "docs_b".to_string()]);
    }

    #[tokio::test]
    async fn test_fresh_collections_never_reuse_a_name() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.create_collection("docs_site_20240101_000000").await.unwrap();
        db.add_chunks(
            "docs_site_20240101_000000",
            &[chunk("0_chunk_0", "first crawl", vec![1.0, 0.0])],
        )
        .await
        .unwrap();

        let second = db
            .create_fresh_collection("docs_site_20240101_000000")
            .await
            .unwrap();
        let third = db
            .create_fresh_collection("docs_site_20240101_000000")
            .await
            .unwrap();

        assert_eq!(second, "docs_site_20240101_000000_2");
        assert_eq!(third, "docs_site_20240101_000000_3");
        assert_eq!(db.count_chunks("docs_site_20240101_000000").await.unwrap(), 1);
        assert_eq!(db.count_chunks(&second).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_collection_removes_its_chunks() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.create_collection("docs").await.unwrap();
        db.create_collection("kept").await.unwrap();
        db.add_chunks("docs", &[chunk("0_chunk_0", "gone", vec![1.0])])
            .await
            .unwrap();
        db.add_chunks("kept", &[chunk("0_chunk_0", "stays", vec![1.0])])
            .await
            .unwrap();

        let counts: Vec<_> = db
            .collection_summaries()
            .await
            .unwrap()
            .into_iter()
            .map(|summary| (summary.name, summary.chunks))
            .collect();
        assert_eq!(counts, vec![("docs".to_string(), 1), ("kept".to_string(), 1)]);

        assert!(db.delete_collection("docs").await.unwrap());
        assert!(!db.delete_collection("docs").await.unwrap());

        assert!(!db.collection_exists("docs").await.unwrap());
        assert_eq!(db.count_chunks("docs").await.unwrap(), 0);
        assert_eq!(db.count_chunks("kept").await.unwrap(), 1);

        let summaries = db.collection_summaries().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].name, "kept");
        let json = serde_json::to_value(&summaries).unwrap();
        assert_eq!(json[0]["chunks"], 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_do_not_share_a_transaction() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.create_collection("left").await.unwrap();
        db.create_collection("right").await.unwrap();

        let batch = |prefix: &str| -> Vec<StoredChunk> {
            (0..200)
                .map(|i| chunk(&format!("{}_chunk_{}", prefix, i), "text", vec![1.0, 0.0]))
                .collect()
        };
        let left_chunks = batch("0");
        let right_chunks = batch("1");

        let mut handles = Vec::new();
        for (collection, chunks) in [("left", left_chunks), ("right", right_chunks)] {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.add_chunks(collection, &chunks).await
            }));
        }
        let fresh = {
            let db = db.clone();
            tokio::spawn(async move { db.create_fresh_collection("left").await })
        };

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 200);
        }
        assert_eq!(fresh.await.unwrap().unwrap(), "left_2");
        assert_eq!(db.count_chunks("left").await.unwrap(), 200);
        assert_eq!(db.count_chunks("right").await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_add_chunks_requires_collection() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        let result = db.add_chunks("missing", &[chunk("0_chunk_0", "x", vec![1.0])]).await;

        assert!(matches!(result, Err(DbError::CollectionNotFound(name)) if name == "missing"));
    }

    #[tokio::test]
    async fn test_add_chunks_replaces_existing_ids() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.create_collection("docs").await.unwrap();

        db.add_chunks(
            "docs",
            &[
                chunk("0_chunk_0", "first", vec![1.0, 0.0]),
                chunk("0_chunk_1", "second", vec![0.0, 1.0]),
            ],
        )
        .await
        .unwrap();
        db.add_chunks("docs", &[chunk("0_chunk_0", "replaced", vec![1.0, 0.0])])
            .await
            .unwrap();

        assert_eq!(db.count_chunks("docs").await.unwrap(), 2);
        let best = db.nearest("docs", &[1.0, 0.0], 1).await.unwrap();
        assert_eq!(best[0].document, "replaced");
    }

    #[tokio::test]
    async fn test_nearest_orders_by_distance() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.create_collection("docs").await.unwrap();
        db.create_collection("other").await.unwrap();

        db.add_chunks(
            "docs",
            &[
                chunk("far", "far away", vec![-1.0, 0.0]),
                chunk("near", "close by", vec![0.9, 0.1]),
                chunk("mid", "orthogonal", vec![0.0, 1.0]),
                chunk("bad", "wrong dims", vec![1.0, 0.0, 0.0]),
            ],
        )
        .await
        .unwrap();
        db.add_chunks("other", &[chunk("exact", "other collection", vec![1.0, 0.0])])
            .await
            .unwrap();

        let matches = db.nearest("docs", &[1.0, 0.0], 3).await.unwrap();
        let ids: Vec<_> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        assert!(matches.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(matches[0].metadata.source, "documentation");

        assert_eq!(db.nearest("docs", &[1.0, 0.0], 10).await.unwrap().len(), 3);
        assert!(db.nearest("docs", &[1.0, 0.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nearest_breaks_ties_by_id() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.create_collection("docs").await.unwrap();
        db.add_chunks(
            "docs",
            &[
                chunk("b", "same", vec![0.0, 1.0]),
                chunk("a", "same", vec![0.0, 2.0]),
            ],
        )
        .await
        .unwrap();

        let ids: Vec<_> = db
            .nearest("docs", &[0.0, 1.0], 2)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_nearest_unknown_collection() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        let result = db.nearest("missing", &[1.0], 3).await;

        assert!(matches!(result, Err(DbError::CollectionNotFound(_))));
    }
}
