//! MCP `search_documents` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters for the `search_documents` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchDocumentsParams {
    /// Natural language query.
    #[schemars(description = "Natural language query to search for")]
    pub query: String,

    /// Collection to search. Defaults to the configured default collection.
    #[schemars(description = "Collection to search. Defaults to 'documents'.")]
    pub collection: Option<String>,

    /// Maximum number of results. Defaults to 5.
    #[schemars(description = "Maximum number of results to return. Defaults to 5.")]
    pub limit: Option<usize>,

    /// Metadata equality filter. Only documents matching every pair are returned.
    #[schemars(
        description = "Metadata equality filter: only documents matching every key/value pair are returned"
    )]
    pub filter: Option<BTreeMap<String, String>>,
}
