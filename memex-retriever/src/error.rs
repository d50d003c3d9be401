//! Error taxonomy for the retriever crate.
//!
//! Three conditions matter to callers and get their own variants:
//! - `SearchUnavailable`: no embedding provider is configured. Semantic
//!   search cannot run; this is never collapsed into "zero matches".
//! - `SourceNotFound`: `index_file` was pointed at a path that does not
//!   exist. Surfaced explicitly so automation can tell "nothing new was
//!   written" apart from "nothing was there to index".
//! - `Chunking`: degenerate window geometry, rejected before any work.
//!
//! Everything else wraps the underlying library error.

use std::path::PathBuf;

/// Result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Semantic search requested but no embedding provider is configured.
    #[error("semantic search is unavailable: no embedding provider configured")]
    SearchUnavailable,

    /// The file handed to `index_file` does not exist.
    #[error("source path not found: {0}")]
    SourceNotFound(PathBuf),

    /// Invalid chunking geometry (overlap >= window size).
    #[error("chunking configuration: {0}")]
    Chunking(#[from] memex_context::ChunkError),

    /// Invalid file glob pattern for directory indexing.
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] ignore::Error),

    /// Embedding generation failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] memex_embed::EmbedError),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem read failed (including non-UTF-8 content).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata serialization failed.
    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// A stored timestamp failed to parse as RFC 3339.
    #[error("timestamp error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    /// Configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),
}
