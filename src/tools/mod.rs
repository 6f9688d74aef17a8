pub mod add_memory;
pub mod delete_all_memories;
pub mod delete_memory;
pub mod get_all_memories;
pub mod ingest_file;
pub mod ingest_text;
pub mod memory_history;
pub mod search_documents;
pub mod search_memories;
pub mod search_with_memory;

use add_memory::AddMemoryParams;
use delete_all_memories::DeleteAllMemoriesParams;
use delete_memory::DeleteMemoryParams;
use get_all_memories::GetAllMemoriesParams;
use ingest_file::IngestFileParams;
use ingest_text::IngestTextParams;
use memory_history::MemoryHistoryParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use search_documents::SearchDocumentsParams;
use search_memories::SearchMemoriesParams;
use search_with_memory::SearchWithMemoryParams;
use std::sync::Arc;

use crate::engine::RetrievalEngine;
use crate::error::Result;

/// The Arca MCP tool handler. Holds the shared retrieval engine and exposes
/// all MCP tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct ArcaTools {
    tool_router: ToolRouter<Self>,
    engine: Arc<RetrievalEngine>,
}

impl ArcaTools {
    pub fn new(engine: Arc<RetrievalEngine>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            engine,
        }
    }

    /// Engine calls are synchronous (SQLite plus ONNX inference), so every
    /// tool runs them off the async executor.
    async fn run<T, F>(&self, task: F) -> std::result::Result<T, String>
    where
        T: Send + 'static,
        F: FnOnce(&RetrievalEngine) -> Result<T> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || task(&engine))
            .await
            .map_err(|e| format!("task failed: {e}"))?
            .map_err(|e| e.to_string())
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> std::result::Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

#[tool_router]
impl ArcaTools {
    /// Ingest raw text into a collection.
    #[tool(description = "Chunk, embed, and store text for semantic search. Returns the collection, chunk count, and chunk ids.")]
    async fn ingest_text(
        &self,
        Parameters(params): Parameters<IngestTextParams>,
    ) -> std::result::Result<String, String> {
        tracing::info!(
            text_len = params.text.len(),
            collection = params.collection.as_deref().unwrap_or("documents"),
            "ingest_text called"
        );
        let report = self
            .run(move |engine| {
                engine.ingest_text(
                    &params.text,
                    params.collection.as_deref(),
                    params.metadata.as_ref(),
                )
            })
            .await?;
        to_json(&report)
    }

    /// Ingest a file from disk.
    #[tool(description = "Read a file (txt, md, or source code) and ingest its contents. Unknown formats are read as plain text.")]
    async fn ingest_file(
        &self,
        Parameters(params): Parameters<IngestFileParams>,
    ) -> std::result::Result<String, String> {
        tracing::info!(path = %params.path, "ingest_file called");
        let report = self
            .run(move |engine| {
                engine.ingest_file(
                    &params.path,
                    params.collection.as_deref(),
                    params.metadata.as_ref(),
                )
            })
            .await?;
        to_json(&report)
    }

    /// Semantic search over stored documents.
    #[tool(description = "Search documents by natural language query. Returns ranked results with cosine similarity scores.")]
    async fn search_documents(
        &self,
        Parameters(params): Parameters<SearchDocumentsParams>,
    ) -> std::result::Result<String, String> {
        tracing::info!(query = %params.query, "search_documents called");
        let hits = self
            .run(move |engine| {
                engine.search(
                    &params.query,
                    params.collection.as_deref(),
                    params.limit,
                    params.filter.as_ref(),
                )
            })
            .await?;
        let total = hits.len();
        to_json(&serde_json::json!({ "results": hits, "total": total }))
    }

    /// Document search augmented with the user's relevant memories.
    #[tool(description = "Search documents and the user's memories with one query. Returns two independently ranked lists.")]
    async fn search_with_memory(
        &self,
        Parameters(params): Parameters<SearchWithMemoryParams>,
    ) -> std::result::Result<String, String> {
        tracing::info!(query = %params.query, user_id = %params.user_id, "search_with_memory called");
        let results = self
            .run(move |engine| {
                engine.search_with_memory(
                    &params.query,
                    &params.user_id,
                    params.collection.as_deref(),
                    params.limit,
                )
            })
            .await?;
        to_json(&results)
    }

    /// Retain conversation messages as user memories.
    #[tool(description = "Store conversation messages as memories for a user. Each message becomes one memory item.")]
    async fn add_memory(
        &self,
        Parameters(params): Parameters<AddMemoryParams>,
    ) -> std::result::Result<String, String> {
        tracing::info!(
            user_id = %params.user_id,
            messages = params.messages.len(),
            "add_memory called"
        );
        let ids = self
            .run(move |engine| {
                engine.add_conversation(&params.messages, &params.user_id, params.metadata.as_ref())
            })
            .await?;
        let stored = ids.len();
        to_json(&serde_json::json!({ "ids": ids, "stored": stored }))
    }

    /// Search one user's memories.
    #[tool(description = "Search a user's memories by natural language query. Results never include other users' memories.")]
    async fn search_memories(
        &self,
        Parameters(params): Parameters<SearchMemoriesParams>,
    ) -> std::result::Result<String, String> {
        tracing::info!(query = %params.query, user_id = %params.user_id, "search_memories called");
        let memories = self
            .run(move |engine| engine.search_memories(&params.query, &params.user_id, params.limit))
            .await?;
        let total = memories.len();
        to_json(&serde_json::json!({ "memories": memories, "total": total }))
    }

    /// List all of a user's memories.
    #[tool(description = "List all memories for a user, oldest first.")]
    async fn get_all_memories(
        &self,
        Parameters(params): Parameters<GetAllMemoriesParams>,
    ) -> std::result::Result<String, String> {
        let memories = self
            .run(move |engine| engine.get_all_memories(&params.user_id))
            .await?;
        let total = memories.len();
        to_json(&serde_json::json!({ "memories": memories, "total": total }))
    }

    /// Delete a single memory.
    #[tool(description = "Delete a memory by ID. Its change history is retained.")]
    async fn delete_memory(
        &self,
        Parameters(params): Parameters<DeleteMemoryParams>,
    ) -> std::result::Result<String, String> {
        tracing::info!(memory_id = %params.memory_id, "delete_memory called");
        self.run(move |engine| engine.delete_memory(&params.memory_id))
            .await?;
        to_json(&serde_json::json!({ "status": "deleted" }))
    }

    /// Delete all of a user's memories.
    #[tool(description = "Delete all memories for a user. Requires confirm=true as a safety gate.")]
    async fn delete_all_memories(
        &self,
        Parameters(params): Parameters<DeleteAllMemoriesParams>,
    ) -> std::result::Result<String, String> {
        if !params.confirm {
            return Err("confirm must be true to delete all memories".into());
        }
        tracing::info!(user_id = %params.user_id, "delete_all_memories called");
        let deleted = self
            .run(move |engine| engine.delete_all_memories(&params.user_id))
            .await?;
        to_json(&serde_json::json!({ "deleted": deleted }))
    }

    /// Inspect a memory's change history.
    #[tool(description = "Get the full change history of a memory (add, update, delete events), including deleted memories.")]
    async fn memory_history(
        &self,
        Parameters(params): Parameters<MemoryHistoryParams>,
    ) -> std::result::Result<String, String> {
        let history = self
            .run(move |engine| engine.memory_history(&params.memory_id))
            .await?;
        to_json(&serde_json::json!({ "history": history }))
    }

    /// List collections.
    #[tool(description = "List all vector collections.")]
    async fn list_collections(&self) -> std::result::Result<String, String> {
        let collections = self.run(|engine| engine.list_collections()).await?;
        to_json(&serde_json::json!({ "collections": collections }))
    }
}

#[tool_handler]
impl ServerHandler for ArcaTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Arca is a local semantic retrieval server. Use ingest_text or ingest_file \
                 to index content, search_documents to query it, and the memory tools to \
                 retain and recall per-user conversational context."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
