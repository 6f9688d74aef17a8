//! MCP `ingest_text` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters for the `ingest_text` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IngestTextParams {
    /// The raw text to chunk, embed, and index.
    #[schemars(description = "The text to chunk, embed, and store for semantic search")]
    pub text: String,

    /// Target collection. Defaults to the configured default collection.
    #[schemars(description = "Collection to store into. Defaults to 'documents'.")]
    pub collection: Option<String>,

    /// String key/value metadata attached to every chunk.
    #[schemars(description = "Metadata key/value pairs attached to every chunk")]
    pub metadata: Option<BTreeMap<String, String>>,
}
