use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchMemoriesParams {
    #[schemars(description = "Natural language query to search memories with")]
    pub query: String,

    #[schemars(description = "User whose memories to search")]
    pub user_id: String,

    #[schemars(description = "Maximum number of results. Defaults to 5.")]
    pub limit: Option<usize>,
}
