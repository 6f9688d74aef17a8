use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchWithMemoryParams {
    #[schemars(description = "Natural language query to search for")]
    pub query: String,

    #[schemars(description = "User whose memories to include alongside document results")]
    pub user_id: String,

    #[schemars(description = "Collection to search. Defaults to 'documents'.")]
    pub collection: Option<String>,

    #[schemars(description = "Maximum number of document results. Defaults to 5.")]
    pub limit: Option<usize>,
}
