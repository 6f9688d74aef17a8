//! Retrieval engine: the orchestration layer that ties the chunker, the
//! embedding provider, the vector index, and the memory store together.
//!
//! All methods are synchronous. The engine owns the single database connection
//! behind a mutex; callers in async contexts (MCP tools, the HTTP server) run
//! engine calls inside `tokio::task::spawn_blocking`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::chunker;
use crate::config::ArcaConfig;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::error::{ArcaError, Result};
use crate::index::{self, IndexedDocument, MetadataFilter, SearchHit};
use crate::memory::search as memory_search;
use crate::memory::store as memory_store;
use crate::memory::types::{ChatMessage, HistoryEntry, MemoryItem, ScoredMemory};
use crate::reader;

/// Outcome of an ingestion call.
#[derive(Debug, serde::Serialize)]
pub struct IngestReport {
    pub collection: String,
    /// Number of chunks written (re-ingesting identical text rewrites the
    /// same ids, so the document count may grow by less).
    pub chunks: usize,
    pub ids: Vec<String>,
}

/// Document hits and memory hits for one query, ranked independently.
#[derive(Debug, serde::Serialize)]
pub struct AugmentedResults {
    pub documents: Vec<SearchHit>,
    pub memories: Vec<ScoredMemory>,
}

pub struct RetrievalEngine {
    db: Arc<Mutex<Connection>>,
    embedding: Arc<dyn EmbeddingProvider>,
    config: Arc<ArcaConfig>,
}

impl RetrievalEngine {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        embedding: Arc<dyn EmbeddingProvider>,
        config: Arc<ArcaConfig>,
    ) -> Self {
        Self {
            db,
            embedding,
            config,
        }
    }

    /// Open the configured database and embedding provider.
    ///
    /// Records the embedding model name in `schema_meta` on first run and
    /// warns if the database was built with a different model, since vectors
    /// from different models are not comparable.
    pub fn from_config(config: Arc<ArcaConfig>) -> anyhow::Result<Self> {
        let conn = crate::db::open_database(config.resolved_db_path())?;
        let embedding = create_provider(&config.embedding)?;

        match crate::db::get_meta(&conn, "embedding_model")? {
            None => crate::db::set_meta(&conn, "embedding_model", &config.embedding.model)?,
            Some(recorded) if recorded != config.embedding.model => {
                tracing::warn!(
                    recorded,
                    configured = %config.embedding.model,
                    "database was built with a different embedding model; results will be unreliable"
                );
            }
            Some(_) => {}
        }

        Ok(Self::new(
            Arc::new(Mutex::new(conn)),
            Arc::from(embedding),
            config,
        ))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|e| ArcaError::upstream("db-lock", "sqlite", e.to_string()))
    }

    fn collection_or_default<'a>(&'a self, collection: Option<&'a str>) -> &'a str {
        collection.unwrap_or(&self.config.storage.default_collection)
    }

    /// Chunk, embed, and upsert a text. Whitespace-only text is a no-op
    /// reported as zero chunks.
    pub fn ingest_text(
        &self,
        text: &str,
        collection: Option<&str>,
        metadata: Option<&BTreeMap<String, String>>,
    ) -> Result<IngestReport> {
        let collection = self.collection_or_default(collection).to_string();
        let chunks: Vec<chunker::Chunk> = chunker::chunk(
            text,
            self.config.retrieval.chunk_size,
            self.config.retrieval.chunk_overlap,
        )?
        .collect();

        if chunks.is_empty() {
            return Ok(IngestReport {
                collection,
                chunks: 0,
                ids: Vec::new(),
            });
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = self.embedding.embed_batch(&texts)?;

        let total = chunks.len();
        let documents: Vec<IndexedDocument> = chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (chunk, vector))| {
                let mut meta = metadata.cloned().unwrap_or_default();
                meta.insert("chunk_index".into(), i.to_string());
                meta.insert("chunk_count".into(), total.to_string());
                IndexedDocument {
                    id: chunk.id,
                    text: chunk.text,
                    vector,
                    metadata: meta,
                }
            })
            .collect();

        let ids = documents.iter().map(|d| d.id.clone()).collect();
        let mut conn = self.conn()?;
        index::upsert(&mut conn, &collection, &documents)?;

        tracing::info!(collection, chunks = total, "text ingested");
        Ok(IngestReport {
            collection,
            chunks: total,
            ids,
        })
    }

    /// Read a file and ingest its text. Format metadata from the reader
    /// (filename, filepath, extension, type) is attached to every chunk;
    /// caller metadata wins on key conflicts.
    pub fn ingest_file(
        &self,
        path: &str,
        collection: Option<&str>,
        metadata: Option<&BTreeMap<String, String>>,
    ) -> Result<IngestReport> {
        let document = reader::read(path)?;
        let mut merged = document.metadata;
        if let Some(extra) = metadata {
            for (key, value) in extra {
                merged.insert(key.clone(), value.clone());
            }
        }
        self.ingest_text(&document.text, collection, Some(&merged))
    }

    /// Semantic search over a collection.
    pub fn search(
        &self,
        query: &str,
        collection: Option<&str>,
        limit: Option<usize>,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>> {
        let collection = self.collection_or_default(collection);
        let limit = limit.unwrap_or(self.config.retrieval.default_limit);
        let vector = self.embedding.embed(query)?;
        let conn = self.conn()?;
        index::search(&conn, collection, &vector, limit, filter)
    }

    /// Document search plus the user's most relevant memories, as two
    /// independently ranked lists. The query is embedded once and reused.
    pub fn search_with_memory(
        &self,
        query: &str,
        user_id: &str,
        collection: Option<&str>,
        limit: Option<usize>,
    ) -> Result<AugmentedResults> {
        let collection = self.collection_or_default(collection);
        let limit = limit.unwrap_or(self.config.retrieval.default_limit);
        let vector = self.embedding.embed(query)?;

        let conn = self.conn()?;
        let documents = index::search(&conn, collection, &vector, limit, None)?;
        let memories = memory_search::search_memories(
            &conn,
            user_id,
            &vector,
            self.config.retrieval.memory_results,
        )?;
        Ok(AugmentedResults {
            documents,
            memories,
        })
    }

    /// Store each message of a conversation as a memory item for `user_id`.
    pub fn add_conversation(
        &self,
        messages: &[ChatMessage],
        user_id: &str,
        metadata: Option<&serde_json::Value>,
    ) -> Result<Vec<String>> {
        let texts: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        if texts.is_empty() {
            return Err(ArcaError::Validation("messages must not be empty".into()));
        }
        let embeddings = self.embedding.embed_batch(&texts)?;
        let mut conn = self.conn()?;
        memory_store::add_memories(&mut conn, messages, user_id, metadata, &embeddings)
    }

    pub fn search_memories(
        &self,
        query: &str,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredMemory>> {
        let limit = limit.unwrap_or(self.config.retrieval.default_limit);
        let vector = self.embedding.embed(query)?;
        let conn = self.conn()?;
        memory_search::search_memories(&conn, user_id, &vector, limit)
    }

    pub fn get_all_memories(&self, user_id: &str) -> Result<Vec<MemoryItem>> {
        let conn = self.conn()?;
        memory_search::get_all(&conn, user_id)
    }

    pub fn get_memory(&self, memory_id: &str) -> Result<MemoryItem> {
        let conn = self.conn()?;
        memory_search::get_memory(&conn, memory_id)
    }

    /// Replace a memory's content, re-embedding it.
    pub fn update_memory(&self, memory_id: &str, content: &str) -> Result<()> {
        if content.is_empty() {
            return Err(ArcaError::Validation("content must not be empty".into()));
        }
        let vector = self.embedding.embed(content)?;
        let mut conn = self.conn()?;
        memory_store::update_memory(&mut conn, memory_id, content, &vector)
    }

    pub fn delete_memory(&self, memory_id: &str) -> Result<()> {
        let mut conn = self.conn()?;
        memory_store::delete_memory(&mut conn, memory_id)
    }

    /// Delete all of a user's memories, returning how many were removed.
    pub fn delete_all_memories(&self, user_id: &str) -> Result<u64> {
        let mut conn = self.conn()?;
        memory_store::delete_all(&mut conn, user_id)
    }

    pub fn memory_history(&self, memory_id: &str) -> Result<Vec<HistoryEntry>> {
        let conn = self.conn()?;
        memory_search::history(&conn, memory_id)
    }

    pub fn list_collections(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        index::list_collections(&conn)
    }

    pub fn count_documents(&self, collection: Option<&str>) -> Result<u64> {
        let collection = self.collection_or_default(collection);
        let conn = self.conn()?;
        index::count_documents(&conn, collection)
    }
}
