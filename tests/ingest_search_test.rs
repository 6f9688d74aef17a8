mod helpers;

use std::collections::BTreeMap;
use std::io::Write;

use helpers::test_engine;

#[test]
fn ingest_text_end_to_end() {
    let engine = test_engine();
    let report = engine
        .ingest_text(
            "apple banana cherry durian grapes melon coffee juice",
            None,
            None,
        )
        .unwrap();
    // 8 words, window 4, overlap 1 -> windows at 0, 3, 6
    assert_eq!(report.chunks, 3);
    assert_eq!(report.collection, "documents");

    let hits = engine.search("apple banana", None, None, None).unwrap();
    assert!(!hits.is_empty());
    assert!(hits[0].text.contains("apple"));
}

#[test]
fn reingest_is_idempotent() {
    let engine = test_engine();
    let text = "apple banana cherry durian grapes melon";
    let first = engine.ingest_text(text, None, None).unwrap();
    let second = engine.ingest_text(text, None, None).unwrap();

    // Content-derived ids: identical text produces identical ids and the
    // collection does not grow.
    assert_eq!(first.ids, second.ids);
    assert_eq!(
        engine.count_documents(None).unwrap(),
        first.chunks as u64
    );
}

#[test]
fn caller_metadata_reaches_every_chunk() {
    let engine = test_engine();
    let mut metadata = BTreeMap::new();
    metadata.insert("source".to_string(), "unit".to_string());
    engine
        .ingest_text(
            "apple banana cherry durian grapes melon coffee juice",
            None,
            Some(&metadata),
        )
        .unwrap();

    let filter: BTreeMap<String, String> =
        [("source".to_string(), "unit".to_string())].into();
    let hits = engine
        .search("apple", None, Some(10), Some(&filter))
        .unwrap();
    assert_eq!(hits.len(), 3);

    let other: BTreeMap<String, String> =
        [("source".to_string(), "elsewhere".to_string())].into();
    let hits = engine.search("apple", None, Some(10), Some(&other)).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn ingest_file_attaches_format_metadata() {
    let engine = test_engine();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "# Fruit Notes").unwrap();
    writeln!(file, "apple banana cherry durian").unwrap();
    drop(file);

    let report = engine
        .ingest_file(path.to_str().unwrap(), None, None)
        .unwrap();
    assert!(report.chunks > 0);

    let filter: BTreeMap<String, String> =
        [("extension".to_string(), "md".to_string())].into();
    let hits = engine.search("apple", None, Some(10), Some(&filter)).unwrap();
    assert_eq!(hits.len(), report.chunks);
    assert_eq!(hits[0].metadata.get("filename").unwrap(), "notes.md");
}

#[test]
fn missing_file_is_not_found() {
    let engine = test_engine();
    let err = engine
        .ingest_file("/nonexistent/path.txt", None, None)
        .unwrap_err();
    assert!(matches!(err, arca::error::ArcaError::NotFound(_)));
}

#[test]
fn collections_are_isolated() {
    let engine = test_engine();
    engine.ingest_text("apple banana cherry", Some("fruit"), None).unwrap();
    engine.ingest_text("coffee juice", Some("drinks"), None).unwrap();

    let hits = engine.search("apple", Some("drinks"), None, None).unwrap();
    assert!(hits.iter().all(|h| !h.text.contains("apple")));

    assert_eq!(
        engine.list_collections().unwrap(),
        vec!["drinks".to_string(), "fruit".to_string()]
    );
}
