//! memex-retriever: durable memory capture and semantic retrieval
//!
//! This crate persists short textual memories and retrieves the most
//! relevant ones for a query. Two retrieval strategies coexist: exact
//! substring search over a relational memory store, and approximate
//! semantic search over chunked, embedded document text.
//!
//! ## Key Modules
//!
//! - **[`storage`]**: SQLite persistence, covering the chunk index
//!   (vector store) and the relational memory store
//! - **[`retrieval`]**: the indexing pipeline and the semantic searcher
//! - **[`config`]**: optional `memex.toml` configuration
//! - **[`error`]**: the crate's error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use memex_retriever::retrieval::{Indexer, Searcher};
//! use memex_retriever::storage::{ChunkIndex, Database};
//! use memex_context::ChunkingConfig;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let db = Database::open(Path::new(".")).await?;
//! let index = ChunkIndex::new(db.pool().clone()).await?;
//!
//! // No embedding provider configured: indexing still records text and
//! // fingerprints, and search reports itself unavailable.
//! let indexer = Indexer::new(index.clone(), None, ChunkingConfig::default());
//! let written = indexer.index_directory(Path::new("notes"), "*.md", false).await?;
//! println!("wrote {written} chunks");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! files → chunker → fingerprint (dedup) → embeddings → chunk index (SQLite)
//!                                                          ↓
//! query → embeddings → cosine scoring over all stored vectors → ranked hits
//! ```

pub mod config;
pub mod error;
pub mod retrieval;
pub mod storage;

pub use error::{Result, RetrievalError};
