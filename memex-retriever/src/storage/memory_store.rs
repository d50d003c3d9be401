//! The relational memory store: the capture log.
//!
//! Memories are short pieces of text captured with context (platform,
//! project, tags). They are immutable after insert and never deleted.
//! Search here is a plain substring match ordered newest-first; the
//! semantic path in [`crate::retrieval`] is a separate pipeline over
//! chunked document text.
//!
//! Alongside the memories live question/answer pairs ([`Ask`]): short
//! notes left for a future session, optionally tied to a memory.
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE memories (
//!     id TEXT PRIMARY KEY,      -- truncated blake3 of content + timestamp
//!     content TEXT NOT NULL,
//!     timestamp TEXT NOT NULL,  -- RFC 3339 UTC
//!     platform TEXT,
//!     project TEXT,
//!     tags TEXT,                -- JSON array of strings, order preserved
//!     context TEXT              -- JSON object, open key/value bag
//! );
//!
//! CREATE TABLE asks (
//!     question TEXT NOT NULL,
//!     answer TEXT NOT NULL,
//!     memory_id TEXT,           -- optional related memory
//!     timestamp TEXT NOT NULL   -- RFC 3339 UTC
//! );
//! ```

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

/// A single captured memory.
#[derive(Debug, Clone, Serialize)]
pub struct Memory {
    /// Content + timestamp hash, assigned at capture time
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Platform/source (e.g. "discord", "terminal", "cli")
    pub platform: String,
    pub project: String,
    /// Ordered tags
    pub tags: Vec<String>,
    /// Open key/value bag
    pub context: serde_json::Value,
}

impl Memory {
    fn derive_id(content: &str, timestamp: &DateTime<Utc>) -> String {
        let digest = blake3::hash(format!("{content}{}", timestamp.to_rfc3339()).as_bytes());
        hex::encode(&digest.as_bytes()[..8])
    }
}

/// A question/answer pair left for a future session.
#[derive(Debug, Clone, Serialize)]
pub struct Ask {
    pub question: String,
    pub answer: String,
    /// Optional id of a related memory
    pub memory_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Counts reported by [`MemoryStore::stats`].
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub total_memories: usize,
    pub total_asks: usize,
    pub platforms: BTreeMap<String, usize>,
    pub projects: BTreeMap<String, usize>,
}

/// SQLite-backed memory storage. Cheap to clone; clones share the pool.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    pool: SqlitePool,
}

impl MemoryStore {
    /// Wraps a pool and ensures the memories and asks tables exist.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memories (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                platform TEXT,
                project TEXT,
                tags TEXT,
                context TEXT
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS asks (
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                memory_id TEXT,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        for statement in [
            "CREATE INDEX IF NOT EXISTS idx_memories_timestamp ON memories(timestamp)",
            "CREATE INDEX IF NOT EXISTS idx_memories_platform ON memories(platform)",
            "CREATE INDEX IF NOT EXISTS idx_memories_project ON memories(project)",
        ] {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Capture a new memory. The record is immutable once stored.
    pub async fn add(
        &self,
        content: &str,
        platform: &str,
        project: &str,
        tags: Vec<String>,
        context: serde_json::Value,
    ) -> Result<Memory> {
        let timestamp = Utc::now();
        let memory = Memory {
            id: Memory::derive_id(content, &timestamp),
            content: content.to_string(),
            timestamp,
            platform: platform.to_string(),
            project: project.to_string(),
            tags,
            context,
        };

        sqlx::query(
            r#"
            INSERT INTO memories (id, content, timestamp, platform, project, tags, context)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&memory.id)
        .bind(&memory.content)
        .bind(memory.timestamp.to_rfc3339())
        .bind(&memory.platform)
        .bind(&memory.project)
        .bind(serde_json::to_string(&memory.tags)?)
        .bind(serde_json::to_string(&memory.context)?)
        .execute(&self.pool)
        .await?;

        Ok(memory)
    }

    /// Substring search over memory content, newest first.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Memory>> {
        // Escape LIKE wildcards in the user's query
        let pattern = format!("%{}%", Self::escape_like(query));

        let rows = sqlx::query(
            r#"
            SELECT id, content, timestamp, platform, project, tags, context
            FROM memories
            WHERE content LIKE ?1 ESCAPE '\'
            ORDER BY timestamp DESC
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_memory).collect()
    }

    /// The latest memories, for session continuity.
    pub async fn recent(&self, limit: usize) -> Result<Vec<Memory>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content, timestamp, platform, project, tags, context
            FROM memories
            ORDER BY timestamp DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_memory).collect()
    }

    /// Leave a question/answer pair, optionally tied to a memory.
    pub async fn ask(
        &self,
        question: &str,
        answer: &str,
        memory_id: Option<&str>,
    ) -> Result<Ask> {
        let ask = Ask {
            question: question.to_string(),
            answer: answer.to_string(),
            memory_id: memory_id.map(str::to_string),
            timestamp: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO asks (question, answer, memory_id, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&ask.question)
        .bind(&ask.answer)
        .bind(ask.memory_id.as_deref())
        .bind(ask.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(ask)
    }

    /// Stored question/answer pairs, newest first. A query filters on the
    /// question by substring.
    pub async fn asks(&self, query: Option<&str>) -> Result<Vec<Ask>> {
        let rows = match query {
            Some(query) => {
                let pattern = format!("%{}%", Self::escape_like(query));
                sqlx::query(
                    r#"
                    SELECT question, answer, memory_id, timestamp
                    FROM asks
                    WHERE question LIKE ?1 ESCAPE '\'
                    ORDER BY timestamp DESC
                    "#,
                )
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT question, answer, memory_id, timestamp
                    FROM asks
                    ORDER BY timestamp DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter()
            .map(|row| {
                let timestamp: String = row.get("timestamp");
                Ok(Ask {
                    question: row.get("question"),
                    answer: row.get("answer"),
                    memory_id: row.get("memory_id"),
                    timestamp: DateTime::parse_from_rfc3339(&timestamp)?.with_timezone(&Utc),
                })
            })
            .collect()
    }

    /// Totals plus per-platform and per-project counts.
    pub async fn stats(&self) -> Result<MemoryStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memories")
            .fetch_one(&self.pool)
            .await?;
        let total_asks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM asks")
            .fetch_one(&self.pool)
            .await?;

        let mut platforms = BTreeMap::new();
        for row in
            sqlx::query("SELECT platform, COUNT(*) AS n FROM memories GROUP BY platform")
                .fetch_all(&self.pool)
                .await?
        {
            let platform: String = row.get("platform");
            let n: i64 = row.get("n");
            platforms.insert(platform, n as usize);
        }

        let mut projects = BTreeMap::new();
        for row in sqlx::query("SELECT project, COUNT(*) AS n FROM memories GROUP BY project")
            .fetch_all(&self.pool)
            .await?
        {
            let project: String = row.get("project");
            let n: i64 = row.get("n");
            projects.insert(project, n as usize);
        }

        Ok(MemoryStats {
            total_memories: total as usize,
            total_asks: total_asks as usize,
            platforms,
            projects,
        })
    }

    fn escape_like(query: &str) -> String {
        query.replace('%', "\\%").replace('_', "\\_")
    }

    fn row_to_memory(row: sqlx::sqlite::SqliteRow) -> Result<Memory> {
        let timestamp: String = row.get("timestamp");
        let tags: String = row.get("tags");
        let context: String = row.get("context");

        // A timestamp that fails to parse is a decode error like bad tags
        // or context JSON, not a record from the epoch.
        Ok(Memory {
            id: row.get("id"),
            content: row.get("content"),
            timestamp: DateTime::parse_from_rfc3339(&timestamp)?.with_timezone(&Utc),
            platform: row.get("platform"),
            project: row.get("project"),
            tags: serde_json::from_str(&tags)?,
            context: serde_json::from_str(&context)?,
        })
    }
}
