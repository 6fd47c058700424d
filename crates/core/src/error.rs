//! Error types for cocosearch-core.
//!
//! Uses a hierarchical error enum so callers can pattern-match on the
//! subsystem that failed, following the recoverable/degraded/fatal/wrapped
//! split a caller needs to decide whether to skip a file, fall back to
//! keyword-only search, or abort the whole run.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all cocosearch-core operations.
#[derive(Debug, Error)]
pub enum CocoError {
    // ---- Recoverable (operation failed, system healthy) ----
    /// A single file failed to parse. Indexing continues past it.
    #[error("parse error for {path}: {message}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// Embedding inference failed for a chunk. Keyword search still works.
    #[error("embedding error for chunk {chunk_id}: {message}")]
    Embed {
        /// Stable chunk identifier `(filename, location)` as text.
        chunk_id: String,
        /// Human-readable error description.
        message: String,
    },

    /// Requested file, index, or chunk was not found.
    #[error("not found: {entity}")]
    NotFound {
        /// Description of what was not found.
        entity: String,
    },

    // ---- Degraded (system works with reduced capability) ----
    /// The embedding endpoint is unreachable or returned no usable result.
    /// Search falls back to keyword-only mode.
    #[error("embedding endpoint unavailable: {reason}")]
    EmbedderUnavailable {
        /// Why the embedding endpoint couldn't be reached.
        reason: String,
    },

    // ---- Fatal (system cannot operate) ----
    /// Configuration is invalid, missing required fields, or names an
    /// unknown key.
    #[error("configuration error: {details}")]
    Config {
        /// What's wrong with the config.
        details: String,
    },

    /// Project/path resolution failed: ambiguous or colliding index name,
    /// unreachable project root, or broken registry state.
    #[error("resolution error: {details}")]
    Resolution {
        /// What went wrong during resolution.
        details: String,
    },

    /// A query could not be answered at all (e.g. malformed filter).
    #[error("query error: {details}")]
    Query {
        /// What's wrong with the query.
        details: String,
    },

    /// An ingestion run hit an unrecoverable condition and aborted.
    #[error("ingestion failed: {details}")]
    IngestionFatal {
        /// Diagnostic details.
        details: String,
    },

    // ---- Wrapped external errors ----
    /// Postgres / sqlx error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error talking to the embedding endpoint.
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// YAML (de)serialization error for `cocosearch.yaml`.
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error for unexpected conditions.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CocoError {
    /// Whether the error leaves keyword search available (embedding-only
    /// degradation) rather than taking the whole engine down.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, CocoError::EmbedderUnavailable { .. })
    }

    /// Whether the error is specific to one file and should not abort the
    /// rest of an ingestion run.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CocoError::Parse { .. } | CocoError::Embed { .. } | CocoError::NotFound { .. }
        )
    }
}

/// Convenience type alias for Results in cocosearch-core.
pub type CocoResult<T> = Result<T, CocoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_classification() {
        let err = CocoError::EmbedderUnavailable {
            reason: "connection refused".into(),
        };
        assert!(err.is_degraded());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn recoverable_classification() {
        let err = CocoError::Parse {
            path: PathBuf::from("src/lib.rs"),
            message: "unexpected token".into(),
        };
        assert!(err.is_recoverable());
        assert!(!err.is_degraded());
    }
}
