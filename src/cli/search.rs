use anyhow::Result;
use std::sync::Arc;

use crate::config::ArcaConfig;
use crate::engine::RetrievalEngine;
use crate::index::SearchHit;
use crate::memory::types::ScoredMemory;

/// Run an interactive search from the terminal. With `--user-id`, memory
/// results are shown alongside document results.
pub async fn search(
    config: &ArcaConfig,
    query: String,
    collection: Option<String>,
    limit: Option<usize>,
    user_id: Option<String>,
) -> Result<()> {
    let engine = Arc::new(RetrievalEngine::from_config(Arc::new(config.clone()))?);

    match user_id {
        Some(user) => {
            let results = tokio::task::spawn_blocking(move || {
                engine.search_with_memory(&query, &user, collection.as_deref(), limit)
            })
            .await??;
            print_documents(&results.documents);
            print_memories(&results.memories);
        }
        None => {
            let hits = tokio::task::spawn_blocking(move || {
                engine.search(&query, collection.as_deref(), limit, None)
            })
            .await??;
            print_documents(&hits);
        }
    }

    Ok(())
}

fn print_documents(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No documents found.");
        return;
    }
    println!("Documents ({}):\n", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        println!("  {}. {} (score: {:.4})", i + 1, hit.id, hit.score);
        println!("     {}", preview(&hit.text));
        println!();
    }
}

fn print_memories(memories: &[ScoredMemory]) {
    if memories.is_empty() {
        return;
    }
    println!("Memories ({}):\n", memories.len());
    for (i, m) in memories.iter().enumerate() {
        println!("  {}. {} (score: {:.4})", i + 1, m.memory.id, m.score);
        println!("     {}", preview(&m.memory.content));
        println!();
    }
}

fn preview(text: &str) -> String {
    // char boundary safe truncation
    if text.chars().count() > 120 {
        let cut: String = text.chars().take(120).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
