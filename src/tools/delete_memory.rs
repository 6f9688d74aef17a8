use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteMemoryParams {
    #[schemars(description = "ID of the memory to delete")]
    pub memory_id: String,
}
