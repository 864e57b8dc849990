//! The RAG system: indexing documents and answering questions over one collection

use rig::agent::AgentBuilder;
use rig::completion::{CompletionModel, Prompt};
use rig::embeddings::EmbeddingModel;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::crawler::PageRecord;
use crate::index::{ChunkMatch, ChunkMetadata, Database, StoredChunk};
use crate::model::{Client, EmbeddingConversion};
use crate::processor::chunk_document;
use crate::rag::prompt::{NO_DOCUMENTS_MESSAGE, SYSTEM_PREAMBLE, build_prompt};
use crate::rag::{RagError, RagOptions};

/// Source recorded in the metadata of every crawled chunk
pub const DOCUMENTATION_SOURCE: &str = "documentation";

/// Chunks retrieved for a question, closest first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub matches: Vec<ChunkMatch>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Texts of the retrieved chunks
    pub fn documents(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.document.as_str()).collect()
    }

    /// Metadata of the retrieved chunks
    pub fn metadatas(&self) -> Vec<&ChunkMetadata> {
        self.matches.iter().map(|m| &m.metadata).collect()
    }

    /// Distances of the retrieved chunks
    pub fn distances(&self) -> Vec<f32> {
        self.matches.iter().map(|m| m.distance).collect()
    }
}

/// A document waiting to be chunked and embedded
struct PendingDocument {
    id: String,
    text: String,
    metadata: ChunkMetadata,
}

/// RAG over a single collection
///
/// Model calls go through the models held by `client`, so rate limiting is
/// whatever the client's models apply.
pub struct RagSystem<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    db: Database,
    client: Client<C, E>,
    collection: String,
    options: RagOptions,
}

impl<C, E> RagSystem<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    /// Open a collection, creating it when it does not exist
    #[instrument(skip(db, client, options))]
    pub async fn open(
        db: Database,
        client: Client<C, E>,
        collection: &str,
        options: RagOptions,
    ) -> Result<Self, RagError> {
        db.create_collection(collection).await?;

        Ok(Self {
            db,
            client,
            collection: collection.to_string(),
            options,
        })
    }

    /// Create a new, empty collection named after `base`
    ///
    /// When `base` is already taken a numeric suffix is appended, so a new
    /// crawl never writes into an earlier one.
    #[instrument(skip(db, client, options))]
    pub async fn create_fresh(
        db: Database,
        client: Client<C, E>,
        base: &str,
        options: RagOptions,
    ) -> Result<Self, RagError> {
        let collection = db.create_fresh_collection(base).await?;

        Ok(Self {
            db,
            client,
            collection,
            options,
        })
    }

    /// Open a collection that must already exist
    #[instrument(skip(db, client, options))]
    pub async fn existing(
        db: Database,
        client: Client<C, E>,
        collection: &str,
        options: RagOptions,
    ) -> Result<Self, RagError> {
        if !db.collection_exists(collection).await? {
            return Err(RagError::CollectionNotFound(collection.to_string()));
        }

        Ok(Self {
            db,
            client,
            collection: collection.to_string(),
            options,
        })
    }

    /// Name of the collection this system reads and writes
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn options(&self) -> &RagOptions {
        &self.options
    }

    /// Chunk, embed and store plain documents
    ///
    /// Documents get the ids `"0".."n-1"` unless `ids` is given. Every chunk is
    /// tagged with the documentation source. Returns the number of chunks
    /// stored.
    #[instrument(skip(self, texts, ids), fields(collection = %self.collection, count = texts.len()))]
    pub async fn add_documents(
        &self,
        texts: &[String],
        ids: Option<&[String]>,
    ) -> Result<usize, RagError> {
        if let Some(ids) = ids {
            if ids.len() != texts.len() {
                return Err(RagError::InvalidInput(format!(
                    "{} ids given for {} documents",
                    ids.len(),
                    texts.len()
                )));
            }
        }

        let documents = texts
            .iter()
            .enumerate()
            .map(|(i, text)| PendingDocument {
                id: ids.map_or_else(|| i.to_string(), |ids| ids[i].clone()),
                text: text.clone(),
                metadata: ChunkMetadata {
                    source: DOCUMENTATION_SOURCE.to_string(),
                    ..Default::default()
                },
            })
            .collect();

        self.index(documents).await
    }

    /// Chunk, embed and store crawled pages
    ///
    /// Records get sequential ids and their url and title are kept in the
    /// chunk metadata.
    #[instrument(skip(self, records), fields(collection = %self.collection, count = records.len()))]
    pub async fn add_records(&self, records: &[PageRecord]) -> Result<usize, RagError> {
        let documents = records
            .iter()
            .enumerate()
            .map(|(i, record)| PendingDocument {
                id: i.to_string(),
                text: record.content.clone(),
                metadata: ChunkMetadata {
                    source: DOCUMENTATION_SOURCE.to_string(),
                    url: Some(record.url.clone()),
                    title: Some(record.title.clone()),
                },
            })
            .collect();

        self.index(documents).await
    }

    /// Index crawled pages, dropping the whole collection if indexing fails
    ///
    /// Meant for a collection made by [`RagSystem::create_fresh`], which
    /// holds nothing but these pages.
    pub async fn add_records_or_discard(&self, records: &[PageRecord]) -> Result<usize, RagError> {
        match self.add_records(records).await {
            Ok(count) => Ok(count),
            Err(e) => {
                warn!("Indexing into {} failed, discarding it: {}", self.collection, e);
                if let Err(cleanup) = self.db.delete_collection(&self.collection).await {
                    warn!("Failed to discard {}: {}", self.collection, cleanup);
                }
                Err(e)
            }
        }
    }

    /// Retrieve the `k` chunks closest to `text`
    ///
    /// Failures are logged and produce an empty result.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn query(&self, text: &str, k: usize) -> QueryResult {
        match self.try_query(text, k).await {
            Ok(result) => {
                debug!("Retrieved {} chunks", result.len());
                result
            }
            Err(e) => {
                warn!("Query against {} failed: {}", self.collection, e);
                QueryResult::default()
            }
        }
    }

    /// Answer a question from the `k` closest chunks
    ///
    /// Returns the fixed no-documents message without calling the model when
    /// nothing is retrieved, and an error message instead of an answer when
    /// the model call fails.
    pub async fn generate_response(&self, query: &str, k: usize) -> String {
        self.answer(query, k).await.0
    }

    /// Answer a question and return the chunks the answer was based on
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn answer(&self, query: &str, k: usize) -> (String, QueryResult) {
        let result = self.query(query, k).await;
        if result.is_empty() {
            return (NO_DOCUMENTS_MESSAGE.to_string(), result);
        }

        let prompt = build_prompt(query, result.documents());
        let answer = match self.complete(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Answer generation failed: {}", e);
                format!("Error generating response: {}", e)
            }
        };

        (answer, result)
    }

    async fn try_query(&self, text: &str, k: usize) -> Result<QueryResult, RagError> {
        let embeddings = self
            .client
            .embedding()
            .embed_texts(vec![text.to_string()])
            .await?;
        let query_vector = embeddings
            .first()
            .ok_or(RagError::EmbeddingCount {
                expected: 1,
                actual: 0,
            })?
            .to_f32_vec();

        let matches = self.db.nearest(&self.collection, &query_vector, k).await?;
        Ok(QueryResult { matches })
    }

    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let agent = AgentBuilder::new(self.client.completion().clone())
            .preamble(SYSTEM_PREAMBLE)
            .build();

        Ok(agent.prompt(prompt).await?)
    }

    async fn index(&self, documents: Vec<PendingDocument>) -> Result<usize, RagError> {
        let mut pending = Vec::new();
        for document in documents {
            for chunk in chunk_document(&document.id, &document.text, &self.options.chunk_options)? {
                pending.push((chunk.id, chunk.text, document.metadata.clone()));
            }
        }

        if pending.is_empty() {
            info!("Nothing to index in {}", self.collection);
            return Ok(0);
        }

        let batch_size = E::MAX_DOCUMENTS.max(1);
        let mut stored = Vec::with_capacity(pending.len());
        for batch in pending.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|(_, text, _)| text.clone()).collect();
            let embeddings = self.client.embedding().embed_texts(texts).await?;
            if embeddings.len() != batch.len() {
                return Err(RagError::EmbeddingCount {
                    expected: batch.len(),
                    actual: embeddings.len(),
                });
            }

            stored.extend(batch.iter().zip(embeddings).map(
                |((id, document, metadata), embedding)| StoredChunk {
                    id: id.clone(),
                    document: document.clone(),
                    metadata: metadata.clone(),
                    embedding: embedding.to_f32_vec(),
                },
            ));
        }

        let count = self.db.add_chunks(&self.collection, &stored).await?;
        info!("Indexed {} chunks into {}", count, self.collection);
        Ok(count)
    }
}
