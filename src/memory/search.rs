//! Memory read path — per-user relevance search, listing, and history.
//!
//! Search scopes to one `user_id` before ranking: the candidate set is the
//! user's own rows, scored by cosine similarity in Rust, so another user's
//! items can never leak into the results regardless of how well they score.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{ArcaError, Result};
use crate::index::bytes_to_vector;
use crate::memory::types::{HistoryEntry, MemoryItem, MemoryOp, ScoredMemory};

/// Relevance-ranked memories for one user, best first, up to `limit`.
pub fn search_memories(
    conn: &Connection,
    user_id: &str,
    query: &[f32],
    limit: usize,
) -> Result<Vec<ScoredMemory>> {
    if user_id.is_empty() {
        return Err(ArcaError::Validation("user_id is required".into()));
    }
    if limit == 0 {
        return Err(ArcaError::Validation("limit must be greater than 0".into()));
    }

    let mut stmt = conn.prepare(
        "SELECT rowid, id, user_id, content, embedding, metadata, created_at, updated_at \
         FROM memories WHERE user_id = ?1",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row_to_item(row, 1)?,
            row.get::<_, Vec<u8>>(4)?,
        ))
    })?;

    let mut scored: Vec<(i64, ScoredMemory)> = Vec::new();
    for row in rows {
        let (rowid, memory, embedding) = row?;
        let vector = bytes_to_vector(&embedding);
        let score = cosine_similarity(query, &vector);
        scored.push((rowid, ScoredMemory { memory, score }));
    }

    scored.sort_by(|(rowid_a, a), (rowid_b, b)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(rowid_a.cmp(rowid_b))
    });
    scored.truncate(limit);
    Ok(scored.into_iter().map(|(_, m)| m).collect())
}

/// All memories for one user, in insertion order.
pub fn get_all(conn: &Connection, user_id: &str) -> Result<Vec<MemoryItem>> {
    if user_id.is_empty() {
        return Err(ArcaError::Validation("user_id is required".into()));
    }

    let mut stmt = conn.prepare(
        "SELECT id, user_id, content, embedding, metadata, created_at, updated_at \
         FROM memories WHERE user_id = ?1 ORDER BY rowid",
    )?;
    let items = stmt
        .query_map(params![user_id], |row| row_to_item(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Fetch a single memory by id. Unknown id is `NotFound`.
pub fn get_memory(conn: &Connection, memory_id: &str) -> Result<MemoryItem> {
    let item = conn
        .query_row(
            "SELECT id, user_id, content, embedding, metadata, created_at, updated_at \
             FROM memories WHERE id = ?1",
            params![memory_id],
            |row| row_to_item(row, 0),
        )
        .optional()?;
    item.ok_or_else(|| ArcaError::NotFound(format!("memory {memory_id}")))
}

/// The append-only audit trail of one memory, oldest first.
///
/// A deleted memory keeps its trail; an id that never existed is `NotFound`.
pub fn history(conn: &Connection, memory_id: &str) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT memory_id, operation, old_content, new_content, created_at \
         FROM memory_history WHERE memory_id = ?1 ORDER BY seq",
    )?;
    let entries = stmt
        .query_map(params![memory_id], |row| {
            let operation: String = row.get(1)?;
            Ok(HistoryEntry {
                memory_id: row.get(0)?,
                operation: operation.parse::<MemoryOp>().unwrap_or(MemoryOp::Add),
                old_content: row.get(2)?,
                new_content: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if entries.is_empty() {
        return Err(ArcaError::NotFound(format!("memory {memory_id}")));
    }
    Ok(entries)
}

/// Map a row slice starting at `base` (id, user_id, content, embedding,
/// metadata, created_at, updated_at) to a [`MemoryItem`].
fn row_to_item(row: &rusqlite::Row<'_>, base: usize) -> rusqlite::Result<MemoryItem> {
    let metadata_str: Option<String> = row.get(base + 4)?;
    Ok(MemoryItem {
        id: row.get(base)?,
        user_id: row.get(base + 1)?,
        content: row.get(base + 2)?,
        metadata: metadata_str.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: row.get(base + 5)?,
        updated_at: row.get(base + 6)?,
    })
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
