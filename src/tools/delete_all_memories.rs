use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteAllMemoriesParams {
    #[schemars(description = "User whose memories to delete. History entries are kept.")]
    pub user_id: String,

    #[schemars(description = "Must be true. Safety gate against accidental bulk deletion.")]
    pub confirm: bool,
}
