//! MCP `add_memory` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::memory::types::ChatMessage;

/// Parameters for the `add_memory` MCP tool.
///
/// Each message becomes one memory item owned by `user_id`.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AddMemoryParams {
    /// Conversation turns to retain, each with a `role` and `content`.
    #[schemars(
        description = "Conversation messages to retain. Each message is stored as one memory item."
    )]
    pub messages: Vec<ChatMessage>,

    /// Owner of the new memories.
    #[schemars(description = "User the memories belong to")]
    pub user_id: String,

    /// Optional JSON metadata attached to every item.
    #[schemars(description = "Optional JSON metadata attached to every stored item")]
    pub metadata: Option<serde_json::Value>,
}
