use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetAllMemoriesParams {
    #[schemars(description = "User whose memories to list, in insertion order")]
    pub user_id: String,
}
