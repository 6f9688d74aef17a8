mod helpers;

use arca::db;
use helpers::test_db;

#[test]
fn fresh_database_has_all_tables() {
    let conn = test_db();
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('collections', 'documents', 'memories', 'memory_history', 'schema_meta')",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(count, 5);
}

#[test]
fn sqlite_vec_extension_is_loaded() {
    let conn = test_db();
    let version: String = conn.query_row("SELECT vec_version()", [], |r| r.get(0)).unwrap();
    assert!(version.starts_with('v'), "unexpected vec_version: {version}");
}

#[test]
fn health_check_on_fresh_database() {
    let conn = test_db();
    let report = db::check_database_health(&conn).unwrap();
    assert_eq!(report.schema_version, "1");
    assert!(report.integrity_ok);
    assert_eq!(report.collection_count, 0);
    assert_eq!(report.document_count, 0);
    assert_eq!(report.memory_count, 0);
    assert_eq!(report.history_count, 0);
    assert_eq!(report.embedding_model, None);
}

#[test]
fn open_database_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("arca.db");
    let conn = db::open_database(&path).unwrap();
    drop(conn);
    assert!(path.exists());

    // Reopening is idempotent.
    let conn = db::open_database(&path).unwrap();
    let report = db::check_database_health(&conn).unwrap();
    assert!(report.integrity_ok);
}
