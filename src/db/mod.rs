pub mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Open (or create) the Arca database at the given path, with all extensions
/// loaded and schema initialized.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    load_sqlite_vec();

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    // WAL for concurrent readers during ingestion
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    schema::init_schema(&conn).context("failed to initialize schema")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open an in-memory database with the full schema. Used by tests and by the
/// integration helpers in `tests/helpers`.
pub fn open_memory_database() -> Result<Connection> {
    load_sqlite_vec();
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    Ok(conn)
}

/// Read a value from the `schema_meta` table.
pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM schema_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// Write a value to the `schema_meta` table (insert or replace).
pub fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_meta (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Health report produced by [`check_database_health`], consumed by `arca doctor`.
#[derive(Debug)]
pub struct HealthReport {
    pub schema_version: String,
    pub sqlite_vec_version: String,
    pub embedding_model: Option<String>,
    pub collection_count: u64,
    pub document_count: u64,
    pub memory_count: u64,
    pub history_count: u64,
    pub integrity_ok: bool,
    pub integrity_details: String,
}

/// Run diagnostics: versions, row counts, and a SQLite integrity check.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let schema_version =
        get_meta(conn, "schema_version")?.unwrap_or_else(|| "unknown".to_string());
    let embedding_model = get_meta(conn, "embedding_model")?;

    let sqlite_vec_version: String =
        conn.query_row("SELECT vec_version()", [], |r| r.get(0))?;

    let count = |sql: &str| -> Result<u64> {
        Ok(conn.query_row(sql, [], |r| r.get::<_, i64>(0))? as u64)
    };
    let collection_count = count("SELECT COUNT(*) FROM collections")?;
    let document_count = count("SELECT COUNT(*) FROM documents")?;
    let memory_count = count("SELECT COUNT(*) FROM memories")?;
    let history_count = count("SELECT COUNT(*) FROM memory_history")?;

    let integrity_details: String =
        conn.query_row("PRAGMA integrity_check", [], |r| r.get(0))?;
    let integrity_ok = integrity_details == "ok";

    Ok(HealthReport {
        schema_version,
        sqlite_vec_version,
        embedding_model,
        collection_count,
        document_count,
        memory_count,
        history_count,
        integrity_ok,
        integrity_details,
    })
}
