//! Word-window text chunking.
//!
//! Splits raw text into overlapping, identifiable segments for independent
//! embedding. Windows are `chunk_size` whitespace-delimited words, advancing
//! by `chunk_size - overlap` words per step. Each chunk's id is the first 16
//! hex characters of the SHA-256 digest of the chunk text, so identical text
//! always maps to the same id — ingestion is naturally idempotent.

use sha2::{Digest, Sha256};

use crate::error::{ArcaError, Result};

/// A bounded, overlapping text window derived from a larger document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Content-derived id: first 16 hex chars of SHA-256(text).
    pub id: String,
    /// The chunk text, window words joined by single spaces.
    pub text: String,
}

/// Lazy, restartable iterator over the chunks of one text.
///
/// Created by [`chunk`]. Holds the word list and yields windows on demand.
pub struct Chunks<'a> {
    words: Vec<&'a str>,
    chunk_size: usize,
    step: usize,
    /// First window start that is no longer emitted. A window starting past
    /// `words - overlap` would contain only words already covered by the
    /// previous window, so iteration stops there.
    limit: usize,
    pos: usize,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.pos >= self.limit {
            return None;
        }
        let end = (self.pos + self.chunk_size).min(self.words.len());
        let text = self.words[self.pos..end].join(" ");
        self.pos += self.step;
        Some(Chunk {
            id: content_id(&text),
            text,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.pos >= self.limit {
            0
        } else {
            (self.limit - self.pos).div_ceil(self.step)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

/// Split `text` into overlapping word windows.
///
/// Validates the configuration before any chunking work: `chunk_size` must be
/// positive and strictly greater than `overlap` (otherwise the window would
/// never advance). Empty input yields an empty iterator, not an error.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Chunks<'_>> {
    if chunk_size == 0 {
        return Err(ArcaError::Config("chunk_size must be greater than 0".into()));
    }
    if overlap >= chunk_size {
        return Err(ArcaError::Config(format!(
            "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
        )));
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    // Chunk count is ceil(max(1, words - overlap) / (chunk_size - overlap))
    // for non-empty input, zero for empty input.
    let limit = if words.is_empty() {
        0
    } else {
        (words.len() - overlap.min(words.len())).max(1)
    };

    Ok(Chunks {
        words,
        chunk_size,
        step: chunk_size - overlap,
        limit,
        pos: 0,
    })
}

/// First 16 hex characters of the SHA-256 digest of `text`.
pub fn content_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}
