//! SQLite persistence for memex.
//!
//! One database file (`.memex.db` in the base directory) holds two
//! independent table groups:
//!
//! - **chunks** ([`chunk_index`]): the semantic index. Overlapping word
//!   windows of source documents with content fingerprints and optional
//!   f16 embedding vectors. Fingerprint uniqueness is enforced here, at
//!   the storage layer, so concurrent indexers racing on the same new
//!   chunk produce one winner and one no-op rather than duplicate rows.
//! - **memories** ([`memory_store`]): the relational capture log of
//!   immutable memory records searched by substring, plus question/answer
//!   pairs left for future sessions.
//!
//! ## SQLite configuration
//!
//! The pool is opened with WAL journaling, NORMAL synchronous mode, a busy
//! timeout, 64 KiB pages (embedding blobs are large), and full auto-vacuum.

use crate::error::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::path::Path;

pub mod chunk_index;
pub mod memory_store;

pub use chunk_index::{ChunkIndex, ChunkRecord, EmbeddedChunk, IndexStats, UpsertOutcome};
pub use memory_store::{Ask, Memory, MemoryStats, MemoryStore};

/// Name of the database file inside the base directory.
pub const DB_FILE_NAME: &str = ".memex.db";

/// Handle to the shared SQLite pool.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if missing) the database under `base`.
    pub async fn open(base: &Path) -> Result<Self> {
        let db_path = base.join(DB_FILE_NAME);

        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(db_path)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(5))
                .create_if_missing(true)
                .auto_vacuum(sqlx::sqlite::SqliteAutoVacuum::Full)
                .page_size(1 << 16)
                .optimize_on_close(true, 1 << 10),
        )
        .await?;
        Ok(Self { pool })
    }

    /// Opens an in-memory database for testing.
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:").await?;
        Ok(Self { pool })
    }

    /// Get the underlying SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
