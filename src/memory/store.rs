//! Memory write path — add, update, delete, and the append-only history.
//!
//! Every mutation runs inside a transaction and writes a `memory_history`
//! event before committing, so the audit trail and the row state never
//! diverge. Embeddings are computed by the caller (the engine batches them)
//! and passed in.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{ArcaError, Result};
use crate::index::vector_to_bytes;
use crate::memory::types::{ChatMessage, MemoryOp};

/// Store one memory item per message (verbatim extraction policy).
///
/// `embeddings` must align one-to-one with `messages`. Returns the new ids in
/// message order. Repeated adds with identical content create distinct items —
/// there is no uniqueness constraint on memory content.
pub fn add_memories(
    conn: &mut Connection,
    messages: &[ChatMessage],
    user_id: &str,
    metadata: Option<&serde_json::Value>,
    embeddings: &[Vec<f32>],
) -> Result<Vec<String>> {
    require_user_id(user_id)?;
    if messages.is_empty() {
        return Err(ArcaError::Validation("messages must not be empty".into()));
    }
    if messages.len() != embeddings.len() {
        return Err(ArcaError::Validation(format!(
            "got {} messages but {} embeddings",
            messages.len(),
            embeddings.len()
        )));
    }

    let metadata_json = metadata.map(|m| m.to_string());
    let now = chrono::Utc::now().to_rfc3339();
    let mut ids = Vec::with_capacity(messages.len());

    let tx = conn.transaction()?;
    for (message, embedding) in messages.iter().zip(embeddings) {
        if message.content.is_empty() {
            return Err(ArcaError::Validation("message content must not be empty".into()));
        }
        let id = uuid::Uuid::now_v7().to_string();
        tx.execute(
            "INSERT INTO memories (id, user_id, content, embedding, metadata, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                id,
                user_id,
                message.content,
                vector_to_bytes(embedding),
                metadata_json,
                now,
            ],
        )?;
        write_history(&tx, &id, MemoryOp::Add, None, Some(&message.content))?;
        ids.push(id);
    }
    tx.commit()?;

    tracing::debug!(user_id, count = ids.len(), "memories added");
    Ok(ids)
}

/// Replace a memory's content (and its embedding). Unknown id is `NotFound`.
pub fn update_memory(
    conn: &mut Connection,
    memory_id: &str,
    content: &str,
    embedding: &[f32],
) -> Result<()> {
    if content.is_empty() {
        return Err(ArcaError::Validation("content must not be empty".into()));
    }

    let tx = conn.transaction()?;
    let old_content: Option<String> = tx
        .query_row(
            "SELECT content FROM memories WHERE id = ?1",
            params![memory_id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(old_content) = old_content else {
        return Err(ArcaError::NotFound(format!("memory {memory_id}")));
    };

    tx.execute(
        "UPDATE memories SET content = ?1, embedding = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            content,
            vector_to_bytes(embedding),
            chrono::Utc::now().to_rfc3339(),
            memory_id,
        ],
    )?;
    write_history(&tx, memory_id, MemoryOp::Update, Some(&old_content), Some(content))?;
    tx.commit()?;

    Ok(())
}

/// Delete one memory. Immediately invisible to search and `get_all`; the
/// history trail remains. Unknown id is `NotFound`.
pub fn delete_memory(conn: &mut Connection, memory_id: &str) -> Result<()> {
    let tx = conn.transaction()?;
    let old_content: Option<String> = tx
        .query_row(
            "SELECT content FROM memories WHERE id = ?1",
            params![memory_id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(old_content) = old_content else {
        return Err(ArcaError::NotFound(format!("memory {memory_id}")));
    };

    tx.execute("DELETE FROM memories WHERE id = ?1", params![memory_id])?;
    write_history(&tx, memory_id, MemoryOp::Delete, Some(&old_content), None)?;
    tx.commit()?;

    Ok(())
}

/// Delete every memory belonging to `user_id`. Returns the number removed.
/// Deleting for a user with no memories is not an error.
pub fn delete_all(conn: &mut Connection, user_id: &str) -> Result<u64> {
    require_user_id(user_id)?;

    let tx = conn.transaction()?;
    let rows: Vec<(String, String)> = {
        let mut stmt =
            tx.prepare("SELECT id, content FROM memories WHERE user_id = ?1")?;
        let rows = stmt
            .query_map(params![user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows
    };

    for (id, content) in &rows {
        write_history(&tx, id, MemoryOp::Delete, Some(content), None)?;
    }
    tx.execute("DELETE FROM memories WHERE user_id = ?1", params![user_id])?;
    tx.commit()?;

    tracing::debug!(user_id, count = rows.len(), "all memories deleted");
    Ok(rows.len() as u64)
}

fn require_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(ArcaError::Validation("user_id is required".into()));
    }
    Ok(())
}

/// Append one event to `memory_history`. Never updated or deleted afterwards.
fn write_history(
    conn: &Connection,
    memory_id: &str,
    operation: MemoryOp,
    old_content: Option<&str>,
    new_content: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO memory_history (memory_id, operation, old_content, new_content, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            memory_id,
            operation.as_str(),
            old_content,
            new_content,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}
