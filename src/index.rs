//! Durable per-collection vector storage with similarity search.
//!
//! Collections are named namespaces of `(id, text, vector, metadata)` records
//! sharing one fixed dimension. Unfiltered nearest-neighbor queries go through
//! the per-collection sqlite-vec `vec0` table; filtered queries scan the
//! collection's rows and rank exactly in Rust so that documents matching the
//! filter are ranked purely by distance among themselves. The declared metric
//! is cosine similarity over the provider's L2-normalized vectors (sqlite-vec
//! L2 distance is converted: `score = 1 - d^2 / 2`).

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{ArcaError, Result};

/// A document stored in a collection. The vector length must match the
/// collection's dimension exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// A search result: the stored document (without its vector) and its score.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
    /// Cosine similarity to the query, higher is better.
    pub score: f64,
}

/// Conjunction of equality predicates over metadata fields.
pub type MetadataFilter = BTreeMap<String, String>;

/// Create the collection on first use, or verify its dimension.
///
/// An existing collection with a conflicting dimension is a configuration
/// error; creation is otherwise idempotent.
pub fn ensure_collection(conn: &Connection, name: &str, dimension: usize) -> Result<()> {
    validate_collection_name(name)?;
    if dimension == 0 {
        return Err(ArcaError::Config(format!(
            "collection {name}: dimension must be greater than 0"
        )));
    }

    if let Some(existing) = collection_dimension(conn, name)? {
        if existing != dimension {
            return Err(ArcaError::Config(format!(
                "collection {name} has dimension {existing}, requested {dimension}"
            )));
        }
        return Ok(());
    }

    conn.execute(
        "INSERT INTO collections (name, dimension, created_at) VALUES (?1, ?2, ?3)",
        params![name, dimension as i64, chrono::Utc::now().to_rfc3339()],
    )?;
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING vec0(id TEXT PRIMARY KEY, embedding FLOAT[{dimension}]);",
        vec_table(name),
    ))?;

    tracing::info!(collection = name, dimension, "collection created");
    Ok(())
}

/// Insert or replace documents by id, all-or-nothing.
///
/// The whole batch is validated against the collection dimension before any
/// write; a single malformed vector fails the call without partial effects.
/// The collection is lazily created with the first document's dimension.
/// Replacing an existing id keeps its original rowid, so insertion order (the
/// search tie-breaker) is stable across re-ingestion.
pub fn upsert(conn: &mut Connection, collection: &str, documents: &[IndexedDocument]) -> Result<()> {
    if documents.is_empty() {
        return Ok(());
    }

    // Validate before touching the catalog: a malformed batch must not leave
    // behind a collection created at the wrong dimension.
    let dimension = match collection_dimension(conn, collection)? {
        Some(existing) => existing,
        None => documents[0].vector.len(),
    };
    for doc in documents {
        if doc.id.is_empty() {
            return Err(ArcaError::Validation("document id must not be empty".into()));
        }
        if doc.vector.len() != dimension {
            return Err(ArcaError::Validation(format!(
                "document {} has vector length {}, collection {collection} expects {dimension}",
                doc.id,
                doc.vector.len()
            )));
        }
    }
    ensure_collection(conn, collection, dimension)?;

    let vec_table = vec_table(collection);
    let now = chrono::Utc::now().to_rfc3339();
    let tx = conn.transaction()?;
    {
        let mut doc_stmt = tx.prepare(
            "INSERT INTO documents (collection, id, text, embedding, metadata, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(collection, id) DO UPDATE SET \
               text = excluded.text, embedding = excluded.embedding, metadata = excluded.metadata",
        )?;
        let mut vec_delete = tx.prepare(&format!("DELETE FROM {vec_table} WHERE id = ?1"))?;
        let mut vec_insert =
            tx.prepare(&format!("INSERT INTO {vec_table} (id, embedding) VALUES (?1, ?2)"))?;

        for doc in documents {
            let metadata = serde_json::to_string(&doc.metadata)?;
            doc_stmt.execute(params![
                collection,
                doc.id,
                doc.text,
                vector_to_bytes(&doc.vector),
                metadata,
                now,
            ])?;
            // vec0 has no upsert; replace by delete + insert
            vec_delete.execute(params![doc.id])?;
            vec_insert.execute(params![doc.id, vector_to_bytes(&doc.vector)])?;
        }
    }
    tx.commit()?;

    tracing::debug!(collection, count = documents.len(), "documents upserted");
    Ok(())
}

/// Nearest-neighbor search, best-first, ties broken by insertion order.
///
/// Searching a collection that does not exist auto-creates an empty one and
/// returns zero results ("read never fails on absence"). A query vector whose
/// length conflicts with an existing collection's dimension is a hard error.
pub fn search(
    conn: &Connection,
    collection: &str,
    query: &[f32],
    k: usize,
    filter: Option<&MetadataFilter>,
) -> Result<Vec<SearchHit>> {
    if k == 0 {
        return Err(ArcaError::Validation("k must be greater than 0".into()));
    }
    if query.is_empty() {
        return Err(ArcaError::Validation("query vector must not be empty".into()));
    }

    match collection_dimension(conn, collection)? {
        None => {
            ensure_collection(conn, collection, query.len())?;
            return Ok(Vec::new());
        }
        Some(dimension) if dimension != query.len() => {
            return Err(ArcaError::Config(format!(
                "query vector length {} does not match collection {collection} dimension {dimension}",
                query.len()
            )));
        }
        Some(_) => {}
    }

    match filter {
        Some(f) if !f.is_empty() => filtered_search(conn, collection, query, k, f),
        _ => knn_search(conn, collection, query, k),
    }
}

/// Names of all collections, sorted.
pub fn list_collections(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM collections ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Drop a collection and all its documents. No-op if the collection is absent.
pub fn drop_collection(conn: &mut Connection, name: &str) -> Result<()> {
    validate_collection_name(name)?;
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM documents WHERE collection = ?1", params![name])?;
    tx.execute("DELETE FROM collections WHERE name = ?1", params![name])?;
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", vec_table(name)))?;
    tx.commit()?;
    tracing::info!(collection = name, "collection dropped");
    Ok(())
}

/// Number of documents currently stored in a collection.
pub fn count_documents(conn: &Connection, collection: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE collection = ?1",
        params![collection],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Rows fetched past `k` in a KNN query. sqlite-vec picks which rows make the
/// cut at the k-th distance arbitrarily; the margin lets the rowid tie-break
/// decide the boundary instead.
const KNN_TIE_MARGIN: usize = 32;

/// KNN via the sqlite-vec vec0 table, then hydrate, stable-sort and truncate.
fn knn_search(conn: &Connection, collection: &str, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
    let fetch = k.saturating_add(KNN_TIE_MARGIN);
    let mut stmt = conn.prepare(&format!(
        "SELECT id, distance FROM {} WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
        vec_table(collection),
    ))?;
    let nearest: Vec<(String, f64)> = stmt
        .query_map(params![vector_to_bytes(query), fetch as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut hits: Vec<(i64, SearchHit)> = Vec::with_capacity(nearest.len());
    for (id, distance) in nearest {
        let row = conn
            .query_row(
                "SELECT rowid, text, metadata FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        // The vec table and documents table are written in one transaction;
        // a missing row here means the id was dropped concurrently.
        let Some((rowid, text, metadata_json)) = row else {
            continue;
        };
        hits.push((
            rowid,
            SearchHit {
                id,
                text,
                metadata: serde_json::from_str(&metadata_json)?,
                score: l2_to_cosine(distance),
            },
        ));
    }

    sort_hits(&mut hits);
    hits.truncate(k);
    Ok(hits.into_iter().map(|(_, hit)| hit).collect())
}

/// Exact scan of the collection with the metadata filter applied first, so
/// filtered-out documents never displace matching ones from the top-k.
fn filtered_search(
    conn: &Connection,
    collection: &str,
    query: &[f32],
    k: usize,
    filter: &MetadataFilter,
) -> Result<Vec<SearchHit>> {
    let mut stmt = conn.prepare(
        "SELECT rowid, id, text, embedding, metadata FROM documents WHERE collection = ?1",
    )?;
    let rows = stmt.query_map(params![collection], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Vec<u8>>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut hits: Vec<(i64, SearchHit)> = Vec::new();
    for row in rows {
        let (rowid, id, text, embedding, metadata_json) = row?;
        let metadata: BTreeMap<String, String> = serde_json::from_str(&metadata_json)?;
        if !filter.iter().all(|(key, value)| metadata.get(key) == Some(value)) {
            continue;
        }
        let vector = bytes_to_vector(&embedding);
        hits.push((
            rowid,
            SearchHit {
                id,
                text,
                metadata,
                score: cosine_similarity(query, &vector),
            },
        ));
    }

    sort_hits(&mut hits);
    hits.truncate(k);
    Ok(hits.into_iter().map(|(_, hit)| hit).collect())
}

/// Best score first; equal scores resolve to the earlier-inserted document.
fn sort_hits(hits: &mut [(i64, SearchHit)]) {
    hits.sort_by(|(rowid_a, a), (rowid_b, b)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(rowid_a.cmp(rowid_b))
    });
}

fn collection_dimension(conn: &Connection, name: &str) -> Result<Option<usize>> {
    let dim: Option<i64> = conn
        .query_row(
            "SELECT dimension FROM collections WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(dim.map(|d| d as usize))
}

/// Quoted identifier of the per-collection vec0 table.
fn vec_table(name: &str) -> String {
    format!("\"vec_{name}\"")
}

/// Collection names become part of a table identifier, so the charset is
/// restricted rather than escaped.
fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ArcaError::Validation("collection name must not be empty".into()));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ArcaError::Validation(format!(
            "invalid collection name {name:?}: only ASCII letters, digits, '_' and '-' are allowed"
        )));
    }
    Ok(())
}

/// Convert an f32 vector to raw little-endian bytes for storage / sqlite-vec.
pub fn vector_to_bytes(vector: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            vector.as_ptr() as *const u8,
            vector.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Inverse of [`vector_to_bytes`].
pub fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// sqlite-vec reports L2 distance; for unit vectors `d^2 = 2 - 2cos`, so
/// `cos = 1 - d^2 / 2`.
fn l2_to_cosine(distance: f64) -> f64 {
    1.0 - distance * distance / 2.0
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    const DIM: usize = 8;

    fn test_conn() -> Connection {
        db::open_memory_database().unwrap()
    }

    /// Unit vector with a spike at `seed`.
    fn vec_at(seed: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; DIM];
        v[seed % DIM] = 1.0;
        v
    }

    fn doc(id: &str, seed: usize, meta: &[(&str, &str)]) -> IndexedDocument {
        IndexedDocument {
            id: id.into(),
            text: format!("text for {id}"),
            vector: vec_at(seed),
            metadata: meta
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn upsert_and_search_nearest() {
        let mut conn = test_conn();
        upsert(
            &mut conn,
            "docs",
            &[doc("a", 0, &[]), doc("b", 1, &[]), doc("c", 2, &[])],
        )
        .unwrap();

        let hits = search(&conn, "docs", &vec_at(1), 2, None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "b");
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn search_never_exceeds_k() {
        let mut conn = test_conn();
        let docs: Vec<IndexedDocument> = (0..6).map(|i| doc(&format!("d{i}"), i, &[])).collect();
        upsert(&mut conn, "docs", &docs).unwrap();

        let hits = search(&conn, "docs", &vec_at(0), 3, None).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn upsert_by_id_replaces_not_duplicates() {
        let mut conn = test_conn();
        upsert(&mut conn, "docs", &[doc("a", 0, &[])]).unwrap();
        assert_eq!(count_documents(&conn, "docs").unwrap(), 1);

        // Same id again — effective count must not grow
        upsert(&mut conn, "docs", &[doc("a", 0, &[])]).unwrap();
        assert_eq!(count_documents(&conn, "docs").unwrap(), 1);

        let mut updated = doc("a", 3, &[]);
        updated.text = "replaced".into();
        upsert(&mut conn, "docs", &[updated]).unwrap();
        assert_eq!(count_documents(&conn, "docs").unwrap(), 1);

        let hits = search(&conn, "docs", &vec_at(3), 1, None).unwrap();
        assert_eq!(hits[0].text, "replaced");
    }

    #[test]
    fn malformed_vector_fails_whole_batch() {
        let mut conn = test_conn();
        let mut bad = doc("bad", 0, &[]);
        bad.vector = vec![0.0; DIM + 1];

        let result = upsert(&mut conn, "docs", &[doc("good", 0, &[]), bad]);
        assert!(matches!(result, Err(ArcaError::Validation(_))));
        // nothing was applied
        assert_eq!(count_documents(&conn, "docs").unwrap(), 0);
    }

    #[test]
    fn malformed_first_vector_leaves_no_collection_behind() {
        let mut conn = test_conn();
        let mut bad = doc("bad", 0, &[]);
        bad.vector = vec![0.0; DIM + 1];

        // Bad document first: the collection must not be created at DIM + 1
        let result = upsert(&mut conn, "docs", &[bad, doc("good", 0, &[])]);
        assert!(matches!(result, Err(ArcaError::Validation(_))));
        assert!(list_collections(&conn).unwrap().is_empty());

        // A later all-valid batch establishes the collection at DIM
        upsert(&mut conn, "docs", &[doc("good", 0, &[])]).unwrap();
        assert_eq!(count_documents(&conn, "docs").unwrap(), 1);
    }

    #[test]
    fn filter_is_a_hard_boundary() {
        let mut conn = test_conn();
        // "near" is closest to the query but has the wrong tag
        upsert(
            &mut conn,
            "docs",
            &[
                doc("near", 0, &[("lang", "en")]),
                doc("far", 5, &[("lang", "de")]),
            ],
        )
        .unwrap();

        let filter: MetadataFilter =
            [("lang".to_string(), "de".to_string())].into_iter().collect();
        let hits = search(&conn, "docs", &vec_at(0), 10, Some(&filter)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "far");
    }

    #[test]
    fn filter_is_equality_conjunction() {
        let mut conn = test_conn();
        upsert(
            &mut conn,
            "docs",
            &[
                doc("both", 0, &[("lang", "en"), ("kind", "note")]),
                doc("one", 1, &[("lang", "en"), ("kind", "report")]),
            ],
        )
        .unwrap();

        let filter: MetadataFilter = [
            ("lang".to_string(), "en".to_string()),
            ("kind".to_string(), "note".to_string()),
        ]
        .into_iter()
        .collect();
        let hits = search(&conn, "docs", &vec_at(1), 10, Some(&filter)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "both");
    }

    #[test]
    fn equal_scores_break_ties_by_insertion_order() {
        let mut conn = test_conn();
        upsert(
            &mut conn,
            "docs",
            &[doc("first", 2, &[("t", "x")]), doc("second", 2, &[("t", "x")])],
        )
        .unwrap();

        let filter: MetadataFilter = [("t".to_string(), "x".to_string())].into_iter().collect();
        let hits = search(&conn, "docs", &vec_at(2), 2, Some(&filter)).unwrap();
        assert_eq!(hits[0].id, "first");
        assert_eq!(hits[1].id, "second");
    }

    #[test]
    fn search_missing_collection_auto_creates_empty() {
        let conn = test_conn();
        let hits = search(&conn, "ghost", &vec_at(0), 5, None).unwrap();
        assert!(hits.is_empty());
        // the collection now exists
        assert_eq!(list_collections(&conn).unwrap(), vec!["ghost".to_string()]);
    }

    #[test]
    fn dimension_conflict_is_config_error() {
        let conn = test_conn();
        ensure_collection(&conn, "docs", DIM).unwrap();
        let result = ensure_collection(&conn, "docs", DIM + 1);
        assert!(matches!(result, Err(ArcaError::Config(_))));
    }

    #[test]
    fn query_dimension_mismatch_is_hard_error() {
        let mut conn = test_conn();
        upsert(&mut conn, "docs", &[doc("a", 0, &[])]).unwrap();
        let result = search(&conn, "docs", &vec![0.0; DIM + 1], 5, None);
        assert!(matches!(result, Err(ArcaError::Config(_))));
    }

    #[test]
    fn zero_k_is_rejected() {
        let mut conn = test_conn();
        upsert(&mut conn, "docs", &[doc("a", 0, &[])]).unwrap();
        assert!(matches!(
            search(&conn, "docs", &vec_at(0), 0, None),
            Err(ArcaError::Validation(_))
        ));
    }

    #[test]
    fn list_and_drop_collections() {
        let mut conn = test_conn();
        upsert(&mut conn, "alpha", &[doc("a", 0, &[])]).unwrap();
        upsert(&mut conn, "beta", &[doc("b", 1, &[])]).unwrap();
        assert_eq!(
            list_collections(&conn).unwrap(),
            vec!["alpha".to_string(), "beta".to_string()]
        );

        drop_collection(&mut conn, "alpha").unwrap();
        assert_eq!(list_collections(&conn).unwrap(), vec!["beta".to_string()]);
        // dropping again is a no-op
        drop_collection(&mut conn, "alpha").unwrap();
    }

    #[test]
    fn invalid_collection_name_rejected() {
        let conn = test_conn();
        assert!(matches!(
            ensure_collection(&conn, "bad name; drop", DIM),
            Err(ArcaError::Validation(_))
        ));
        assert!(matches!(
            ensure_collection(&conn, "", DIM),
            Err(ArcaError::Validation(_))
        ));
    }

    #[test]
    fn vector_bytes_roundtrip() {
        let v = vec![0.25f32, -1.5, 3.0];
        assert_eq!(bytes_to_vector(vector_to_bytes(&v)), v);
    }
}
