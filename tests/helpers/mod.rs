#![allow(dead_code)]

use arca::config::ArcaConfig;
use arca::db;
use arca::embedding::EmbeddingProvider;
use arca::engine::RetrievalEngine;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Dimension used by the stub embedder. Small on purpose.
pub const DIM: usize = 32;

/// Open a fresh in-memory database with the schema applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Deterministic embedding with a spike at position `seed`. Each seed gives a
/// distinct, mutually orthogonal vector.
pub fn test_embedding(seed: u8) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    v[seed as usize % DIM] = 1.0;
    v
}

/// Deterministic bag-of-words embedder: each word maps to one dimension by
/// byte sum, so texts sharing words score close together and identical texts
/// score 1.0. No model files needed.
pub struct StubEmbedder;

impl StubEmbedder {
    fn bucket(word: &str) -> usize {
        word.bytes().map(|b| b as usize).sum::<usize>() % DIM
    }
}

impl EmbeddingProvider for StubEmbedder {
    fn embed(&self, text: &str) -> arca::error::Result<Vec<f32>> {
        let mut v = vec![0.0f32; DIM];
        for word in text.split_whitespace() {
            v[Self::bucket(word)] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Engine over an in-memory database and the stub embedder, with small chunk
/// windows so multi-chunk behavior is easy to trigger.
pub fn test_engine() -> RetrievalEngine {
    let mut config = ArcaConfig::default();
    config.retrieval.chunk_size = 4;
    config.retrieval.chunk_overlap = 1;
    config.retrieval.default_limit = 5;
    config.retrieval.memory_results = 3;
    RetrievalEngine::new(
        Arc::new(Mutex::new(test_db())),
        Arc::new(StubEmbedder),
        Arc::new(config),
    )
}
