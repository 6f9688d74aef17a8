//! CLI `ingest` command — index a file or literal text from the terminal.

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::config::ArcaConfig;
use crate::engine::RetrievalEngine;

pub async fn ingest(
    config: &ArcaConfig,
    file: Option<String>,
    text: Option<String>,
    collection: Option<String>,
) -> Result<()> {
    let engine = Arc::new(RetrievalEngine::from_config(Arc::new(config.clone()))?);

    let report = tokio::task::spawn_blocking(move || match (file, text) {
        (Some(path), None) => engine.ingest_file(&path, collection.as_deref(), None),
        (None, Some(text)) => engine.ingest_text(&text, collection.as_deref(), None),
        _ => Err(crate::error::ArcaError::Validation(
            "provide exactly one of --file or --text".into(),
        )),
    })
    .await??;

    if report.chunks == 0 {
        bail!("input contained no indexable text");
    }

    println!(
        "Ingested {} chunk(s) into '{}':",
        report.chunks, report.collection
    );
    for id in &report.ids {
        println!("  {id}");
    }

    Ok(())
}
