//! The chunk index: durable vector storage with fingerprint deduplication.
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE chunks (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     source_path TEXT NOT NULL,       -- absolute path of the source document
//!     chunk_index INTEGER NOT NULL,    -- zero-based window position in the source
//!     content TEXT NOT NULL,           -- the window text
//!     fingerprint BLOB NOT NULL UNIQUE,-- truncated blake3 of content: the dedup key
//!     embedding BLOB,                  -- f16 embedding vector (optional)
//!     created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
//!     metadata TEXT                    -- JSON bag: source + chunk index
//! );
//! ```
//!
//! The uniqueness key is the fingerprint, not (source, position): identical
//! text appearing in two files, or twice in one file, is stored once.
//! `source_path`/`chunk_index` record provenance of whichever write won.

use crate::error::Result;
use memex_context::Fingerprint;
use sqlx::{Row, SqlitePool};

/// A chunk headed for, or read from, the index.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    /// Database id (None for records not yet inserted)
    pub id: Option<i64>,
    /// Absolute path of the originating document
    pub source_path: String,
    /// Zero-based position of this chunk within its source document
    pub chunk_index: usize,
    /// The window text
    pub content: String,
    /// Fingerprint of `content`; unique across the store
    pub fingerprint: Fingerprint,
    /// Optional embedding vector (absent when indexed without a provider)
    pub embedding: Option<Vec<half::f16>>,
}

/// What a call to [`ChunkIndex::upsert`] actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// New fingerprint, row inserted.
    Inserted,
    /// Fingerprint already present and `force` was false; no write.
    Skipped,
    /// Fingerprint already present and `force` was true; row replaced in place.
    Replaced,
}

/// A stored chunk that carries an embedding, as read back for scoring.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub source_path: String,
    pub content: String,
    pub embedding: Vec<half::f16>,
}

/// Counts reported by [`ChunkIndex::stats`].
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub total_files: usize,
}

/// SQLite-backed chunk storage. Cheap to clone; clones share the pool.
#[derive(Clone, Debug)]
pub struct ChunkIndex {
    pool: SqlitePool,
}

impl ChunkIndex {
    /// Wraps a pool and ensures the chunks table exists.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_path TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                fingerprint BLOB NOT NULL UNIQUE,
                embedding BLOB,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                metadata TEXT
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_path)")
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }

    /// Whether a chunk with this fingerprint is already stored.
    pub async fn contains(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE fingerprint = ?1")
            .bind(&fingerprint.as_bytes()[..])
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Insert or replace a chunk keyed by its fingerprint.
    ///
    /// With `force = false` an existing fingerprint is left untouched and
    /// `Skipped` is returned. With `force = true` the existing row's
    /// provenance, embedding, metadata and timestamp are replaced in place;
    /// no history of the prior value is kept. Conflict resolution rides on
    /// the UNIQUE constraint, so two processes racing on the same new
    /// fingerprint end up with exactly one row.
    pub async fn upsert(&self, record: &ChunkRecord, force: bool) -> Result<UpsertOutcome> {
        let embedding_bytes = record
            .embedding
            .as_ref()
            .map(|e| bytemuck::cast_slice::<half::f16, u8>(e));
        let metadata = serde_json::to_string(&serde_json::json!({
            "source": record.source_path,
            "chunk": record.chunk_index,
        }))?;

        if !force {
            let result = sqlx::query(
                r#"
                INSERT INTO chunks (source_path, chunk_index, content, fingerprint, embedding, metadata)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(fingerprint) DO NOTHING
                "#,
            )
            .bind(&record.source_path)
            .bind(record.chunk_index as i64)
            .bind(&record.content)
            .bind(&record.fingerprint.as_bytes()[..])
            .bind(embedding_bytes)
            .bind(&metadata)
            .execute(&self.pool)
            .await?;

            return Ok(if result.rows_affected() == 0 {
                UpsertOutcome::Skipped
            } else {
                UpsertOutcome::Inserted
            });
        }

        let existed = self.contains(&record.fingerprint).await?;
        sqlx::query(
            r#"
            INSERT INTO chunks (source_path, chunk_index, content, fingerprint, embedding, metadata)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(fingerprint) DO UPDATE SET
                source_path = excluded.source_path,
                chunk_index = excluded.chunk_index,
                content = excluded.content,
                embedding = excluded.embedding,
                metadata = excluded.metadata,
                created_at = datetime('now')
            "#,
        )
        .bind(&record.source_path)
        .bind(record.chunk_index as i64)
        .bind(&record.content)
        .bind(&record.fingerprint.as_bytes()[..])
        .bind(embedding_bytes)
        .bind(&metadata)
        .execute(&self.pool)
        .await?;

        Ok(if existed {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Inserted
        })
    }

    /// Every stored chunk that carries an embedding, in insertion order.
    /// The searcher re-sorts by score; insertion order is its tie-break.
    pub async fn all_embedded(&self) -> Result<Vec<EmbeddedChunk>> {
        let rows = sqlx::query(
            "SELECT source_path, content, embedding FROM chunks
             WHERE embedding IS NOT NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut chunks = Vec::with_capacity(rows.len());
        for row in rows {
            let source_path: String = row.get("source_path");
            let content: String = row.get("content");
            let embedding_bytes: Vec<u8> = row.get("embedding");
            let embedding = bytemuck::cast_slice::<u8, half::f16>(&embedding_bytes).to_vec();

            chunks.push(EmbeddedChunk {
                source_path,
                content,
                embedding,
            });
        }
        Ok(chunks)
    }

    /// Fetch a chunk by fingerprint.
    pub async fn get_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ChunkRecord>> {
        let row = sqlx::query(
            "SELECT id, source_path, chunk_index, content, fingerprint, embedding
             FROM chunks WHERE fingerprint = ?1",
        )
        .bind(&fingerprint.as_bytes()[..])
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let id: i64 = row.get("id");
        let source_path: String = row.get("source_path");
        let chunk_index: i64 = row.get("chunk_index");
        let content: String = row.get("content");
        let embedding_bytes: Option<Vec<u8>> = row.get("embedding");
        let embedding =
            embedding_bytes.map(|bytes| bytemuck::cast_slice::<u8, half::f16>(&bytes).to_vec());

        Ok(Some(ChunkRecord {
            id: Some(id),
            source_path,
            chunk_index: chunk_index as usize,
            content,
            fingerprint: *fingerprint,
            embedding,
        }))
    }

    /// Total chunk count and distinct source file count.
    pub async fn stats(&self) -> Result<IndexStats> {
        let total_chunks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        let total_files: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT source_path) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(IndexStats {
            total_chunks: total_chunks as usize,
            total_files: total_files as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn record(source: &str, idx: usize, content: &str) -> ChunkRecord {
        ChunkRecord {
            id: None,
            source_path: source.to_string(),
            chunk_index: idx,
            content: content.to_string(),
            fingerprint: Fingerprint::of(content),
            embedding: None,
        }
    }

    async fn index() -> ChunkIndex {
        let db = Database::open_memory().await.unwrap();
        ChunkIndex::new(db.pool().clone()).await.unwrap()
    }

    #[tokio::test]
    async fn insert_then_skip() {
        let index = index().await;
        let rec = record("/notes/a.md", 0, "the same paragraph");

        assert_eq!(index.upsert(&rec, false).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(index.upsert(&rec, false).await.unwrap(), UpsertOutcome::Skipped);

        let stats = index.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 1);
    }

    #[tokio::test]
    async fn identical_text_across_sources_stored_once() {
        let index = index().await;
        let a = record("/notes/a.md", 0, "shared paragraph text");
        let b = record("/notes/b.md", 3, "shared paragraph text");

        assert_eq!(index.upsert(&a, false).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(index.upsert(&b, false).await.unwrap(), UpsertOutcome::Skipped);

        let stats = index.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 1);
        assert_eq!(stats.total_files, 1);

        // Provenance belongs to the first writer.
        let stored = index
            .get_by_fingerprint(&a.fingerprint)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.source_path, "/notes/a.md");
    }

    #[tokio::test]
    async fn force_replaces_in_place() {
        let index = index().await;
        let rec = record("/notes/a.md", 0, "stable text");
        index.upsert(&rec, false).await.unwrap();

        let mut moved = rec.clone();
        moved.source_path = "/notes/moved.md".to_string();
        moved.embedding = Some(vec![half::f16::from_f32(0.5); 4]);
        assert_eq!(index.upsert(&moved, true).await.unwrap(), UpsertOutcome::Replaced);

        let stored = index
            .get_by_fingerprint(&rec.fingerprint)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.source_path, "/notes/moved.md");
        assert!(stored.embedding.is_some());

        let stats = index.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 1);
    }

    #[tokio::test]
    async fn force_insert_of_new_fingerprint_reports_inserted() {
        let index = index().await;
        let rec = record("/notes/a.md", 0, "fresh text");
        assert_eq!(index.upsert(&rec, true).await.unwrap(), UpsertOutcome::Inserted);
    }

    #[tokio::test]
    async fn all_embedded_skips_vectorless_rows_and_preserves_order() {
        let index = index().await;

        let mut first = record("/a.md", 0, "first with vector");
        first.embedding = Some(vec![half::f16::from_f32(1.0), half::f16::from_f32(0.0)]);
        let bare = record("/a.md", 1, "no vector here");
        let mut second = record("/b.md", 0, "second with vector");
        second.embedding = Some(vec![half::f16::from_f32(0.0), half::f16::from_f32(1.0)]);

        index.upsert(&first, false).await.unwrap();
        index.upsert(&bare, false).await.unwrap();
        index.upsert(&second, false).await.unwrap();

        let embedded = index.all_embedded().await.unwrap();
        assert_eq!(embedded.len(), 2);
        assert_eq!(embedded[0].content, "first with vector");
        assert_eq!(embedded[1].content, "second with vector");
        assert_eq!(embedded[0].embedding.len(), 2);

        let stats = index.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 3);
        assert_eq!(stats.total_files, 2);
    }
}
