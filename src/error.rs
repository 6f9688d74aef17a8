//! Crate-wide error taxonomy.
//!
//! Library modules return [`ArcaError`] directly; the binary and the MCP tool
//! layer convert to `anyhow::Error` or string errors at the boundary.

use thiserror::Error;

/// Errors surfaced by the retrieval engine and its stores.
#[derive(Debug, Error)]
pub enum ArcaError {
    /// A referenced resource does not exist (file, memory id).
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid or conflicting configuration (chunk sizes, dimensions, provider names).
    #[error("configuration error: {0}")]
    Config(String),

    /// An upstream backend (embedding or generation) is unreachable or misconfigured.
    /// Carries the operation and backend name so callers can log and retry.
    #[error("upstream error during {operation} ({backend}): {message}")]
    Upstream {
        operation: &'static str,
        backend: String,
        message: String,
    },

    /// Malformed input: wrong vector length, empty required field.
    #[error("validation error: {0}")]
    Validation(String),

    /// SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the library modules.
pub type Result<T, E = ArcaError> = std::result::Result<T, E>;

impl ArcaError {
    /// Build an [`ArcaError::Upstream`] with operation and backend context.
    pub fn upstream(
        operation: &'static str,
        backend: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Upstream {
            operation,
            backend: backend.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_names_operation_and_backend() {
        let err = ArcaError::upstream("embed", "local", "model file missing");
        let msg = err.to_string();
        assert!(msg.contains("embed"));
        assert!(msg.contains("local"));
        assert!(msg.contains("model file missing"));
    }

    #[test]
    fn config_error_display() {
        let err = ArcaError::Config("overlap must be smaller than chunk_size".into());
        assert!(err.to_string().contains("configuration error"));
    }
}
