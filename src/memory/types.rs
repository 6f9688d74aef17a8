//! Memory store type definitions.
//!
//! Defines [`MemoryItem`] (a user-scoped record), [`ScoredMemory`] (a search
//! result), [`ChatMessage`] (a conversational turn, shared with the generation
//! providers), and [`MemoryOp`] (history event kinds).

use serde::{Deserialize, Serialize};

/// A discrete, user-scoped fact or conversational fragment retained for later
/// semantic recall. Matches the `memories` table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    /// Owning user. A memory item always belongs to exactly one user.
    pub user_id: String,
    /// The full text content of the memory.
    pub content: String,
    /// Arbitrary JSON metadata attached at add time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-modification timestamp.
    pub updated_at: String,
}

/// A memory search result with its relevance score (cosine similarity).
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMemory {
    #[serde(flatten)]
    pub memory: MemoryItem,
    pub score: f64,
}

/// One turn of a conversation, as passed to `add` and to the generation
/// providers' `chat`.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ChatMessage {
    /// `"user"`, `"assistant"`, or `"system"`.
    pub role: String,
    pub content: String,
}

/// Kinds of events in the append-only memory history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryOp {
    Add,
    Update,
    Delete,
}

impl MemoryOp {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for MemoryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(format!("unknown memory operation: {s}")),
        }
    }
}

/// A prior state of a memory item, as recorded in `memory_history`.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub memory_id: String,
    pub operation: MemoryOp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,
    pub created_at: String,
}
