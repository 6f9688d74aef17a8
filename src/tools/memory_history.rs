use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MemoryHistoryParams {
    #[schemars(description = "ID of the memory whose change history to return")]
    pub memory_id: String,
}
