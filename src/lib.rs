//! Local semantic retrieval engine with per-user memory.
//!
//! Arca is an [MCP](https://modelcontextprotocol.io/) server and library that
//! turns raw text into searchable knowledge without leaving the machine:
//! documents are chunked, embedded with a local ONNX model, and stored in
//! SQLite next to a per-user conversational memory layer. One query can search
//! both at once.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   for nearest-neighbor search, one file on disk
//! - **Embeddings**: Local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions,
//!   L2-normalized, cosine similarity throughout)
//! - **Memory**: Per-user memory items with a full append-only change history
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP/SSE
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`chunker`] — Word-window text chunking with content-derived ids
//! - [`db`] — SQLite initialization, schema, and health checks
//! - [`embedding`] — Text-to-vector embedding pipeline via ONNX Runtime
//! - [`index`] — Vector collections: upsert, KNN search, metadata filtering
//! - [`memory`] — Per-user memory store: add, search, update, delete, history
//! - [`engine`] — The orchestration layer tying chunking, embedding, index, and memory together
//! - [`llm`] — Optional generation providers (Anthropic or Ollama)
//! - [`reader`] — File-to-text resolution for ingestion

pub mod chunker;
pub mod config;
pub mod db;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod index;
pub mod llm;
pub mod memory;
pub mod reader;
