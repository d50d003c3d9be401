//! Indexing orchestration: files in, deduplicated chunks out.

use crate::error::{Result, RetrievalError};
use crate::storage::{ChunkIndex, ChunkRecord, UpsertOutcome};
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use memex_context::{ChunkingConfig, Fingerprint, chunk_text};
use memex_embed::EmbeddingProvider;
use std::path::Path;
use std::sync::Arc;

/// Drives chunking, fingerprinting, embedding and storage for files and
/// directory trees.
///
/// The embedding provider is optional. Without one, chunks are stored with
/// text and fingerprint only (vector NULL); the index stays useful and a
/// later re-index with `force` can fill vectors in.
pub struct Indexer {
    index: ChunkIndex,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    chunking: ChunkingConfig,
}

impl Indexer {
    pub fn new(
        index: ChunkIndex,
        provider: Option<Arc<dyn EmbeddingProvider>>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            index,
            provider,
            chunking,
        }
    }

    /// Index a single file. Returns the number of chunks actually written
    /// (inserted or replaced), not the number chunked, so a second run
    /// over unchanged content returns 0.
    ///
    /// A missing path is an explicit [`RetrievalError::SourceNotFound`],
    /// never a silent zero.
    pub async fn index_file(&self, path: &Path, force: bool) -> Result<usize> {
        if !path.exists() {
            return Err(RetrievalError::SourceNotFound(path.to_path_buf()));
        }
        let canonical = tokio::fs::canonicalize(path).await?;
        let source_path = canonical.to_string_lossy().to_string();

        let content = tokio::fs::read_to_string(&canonical).await?;
        let windows = chunk_text(&content, &self.chunking)?;

        // Work out which windows need writing before touching the model:
        // embedding is the expensive step, dedup is the cheap one.
        let mut pending: Vec<(usize, String, Fingerprint)> = Vec::new();
        for (chunk_index, window) in windows.into_iter().enumerate() {
            let fingerprint = Fingerprint::of(&window);
            if !force && self.index.contains(&fingerprint).await? {
                continue;
            }
            pending.push((chunk_index, window, fingerprint));
        }
        if pending.is_empty() {
            tracing::debug!(path = %source_path, "nothing new to index");
            return Ok(0);
        }

        let embeddings: Vec<Option<Vec<half::f16>>> = match &self.provider {
            Some(provider) => {
                let texts: Vec<String> = pending.iter().map(|(_, text, _)| text.clone()).collect();
                provider
                    .embed_texts(&texts)
                    .await?
                    .embeddings
                    .into_iter()
                    .map(Some)
                    .collect()
            }
            None => vec![None; pending.len()],
        };

        let mut written = 0;
        for ((chunk_index, content, fingerprint), embedding) in
            pending.into_iter().zip(embeddings)
        {
            let record = ChunkRecord {
                id: None,
                source_path: source_path.clone(),
                chunk_index,
                content,
                fingerprint,
                embedding,
            };
            if self.index.upsert(&record, force).await? != UpsertOutcome::Skipped {
                written += 1;
            }
        }

        tracing::debug!(path = %source_path, written, "indexed file");
        Ok(written)
    }

    /// Recursively index every file under `root` matching the glob
    /// `pattern`, summing per-file write counts. `force` applies to every
    /// visited file, as in [`index_file`](Self::index_file).
    ///
    /// Files are processed sequentially and independently: one file failing
    /// to read or decode is logged and counted as zero, and the walk
    /// continues. Each file's chunks commit independently, so file N's
    /// failure cannot corrupt file N+1's work.
    pub async fn index_directory(&self, root: &Path, pattern: &str, force: bool) -> Result<usize> {
        let mut overrides = OverrideBuilder::new(root);
        overrides.add(pattern)?;
        let walker = WalkBuilder::new(root)
            .overrides(overrides.build()?)
            // Plain filesystem walk: no VCS or hidden-file filtering.
            .standard_filters(false)
            .build();

        let mut total = 0;
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(%error, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            match self.index_file(entry.path(), force).await {
                Ok(written) => {
                    if written > 0 {
                        tracing::info!(path = %entry.path().display(), written, "indexed");
                    }
                    total += written;
                }
                Err(error) => {
                    tracing::warn!(path = %entry.path().display(), %error, "skipping file");
                }
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::test_support::FixedProvider;
    use crate::storage::Database;
    use memex_context::ChunkingConfig;
    use tempfile::tempdir;

    async fn chunk_index() -> ChunkIndex {
        let db = Database::open_memory().await.unwrap();
        ChunkIndex::new(db.pool().clone()).await.unwrap()
    }

    fn small_windows() -> ChunkingConfig {
        ChunkingConfig {
            window_size: 8,
            overlap: 2,
        }
    }

    #[tokio::test]
    async fn indexing_twice_writes_zero_the_second_time() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("note.md");
        std::fs::write(&file, "one two three four five six seven eight nine ten").unwrap();

        let indexer = Indexer::new(chunk_index().await, None, small_windows());
        let first = indexer.index_file(&file, false).await.unwrap();
        assert!(first > 0);

        let second = indexer.index_file(&file, false).await.unwrap();
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn identical_paragraph_in_two_files_stored_once() {
        let temp = tempdir().unwrap();
        let a = temp.path().join("a.md");
        let b = temp.path().join("b.md");
        std::fs::write(&a, "the very same eight words appear right here").unwrap();
        std::fs::write(&b, "the very same eight words appear right here").unwrap();

        let index = chunk_index().await;
        let indexer = Indexer::new(index.clone(), None, small_windows());
        assert_eq!(indexer.index_file(&a, false).await.unwrap(), 1);
        assert_eq!(indexer.index_file(&b, false).await.unwrap(), 0);

        assert_eq!(index.stats().await.unwrap().total_chunks, 1);
    }

    #[tokio::test]
    async fn missing_file_is_an_explicit_error() {
        let indexer = Indexer::new(chunk_index().await, None, small_windows());
        let result = indexer
            .index_file(Path::new("/definitely/not/here.md"), false)
            .await;
        assert!(matches!(result, Err(RetrievalError::SourceNotFound(_))));
    }

    #[tokio::test]
    async fn degraded_mode_stores_text_without_vectors() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("note.md");
        std::fs::write(&file, "degraded mode still keeps the words").unwrap();

        let index = chunk_index().await;
        let indexer = Indexer::new(index.clone(), None, small_windows());
        assert_eq!(indexer.index_file(&file, false).await.unwrap(), 1);

        assert_eq!(index.stats().await.unwrap().total_chunks, 1);
        assert!(index.all_embedded().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_vectors_are_persisted() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("note.md");
        std::fs::write(&file, "vectors should come back out of the store").unwrap();

        let index = chunk_index().await;
        let provider = Arc::new(FixedProvider::new(vec![0.6, 0.8]));
        let indexer = Indexer::new(index.clone(), Some(provider), small_windows());
        indexer.index_file(&file, false).await.unwrap();

        let embedded = index.all_embedded().await.unwrap();
        assert_eq!(embedded.len(), 1);
        assert_eq!(embedded[0].embedding.len(), 2);
    }

    #[tokio::test]
    async fn force_reindex_after_edit_replaces_changed_chunks() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("note.md");
        std::fs::write(&file, "original text lives here").unwrap();

        let index = chunk_index().await;
        let indexer = Indexer::new(index.clone(), None, small_windows());
        indexer.index_file(&file, false).await.unwrap();

        std::fs::write(&file, "edited text lives here").unwrap();
        let written = indexer.index_file(&file, true).await.unwrap();
        assert_eq!(written, 1);

        let fp = memex_context::Fingerprint::of("edited text lives here");
        let stored = index.get_by_fingerprint(&fp).await.unwrap().unwrap();
        assert_eq!(stored.content, "edited text lives here");
    }

    #[tokio::test]
    async fn directory_walk_matches_pattern_and_survives_bad_files() {
        let temp = tempdir().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        std::fs::write(temp.path().join("a.md"), "first markdown file words").unwrap();
        std::fs::write(temp.path().join("sub/b.md"), "second markdown file words").unwrap();
        std::fs::write(temp.path().join("ignored.txt"), "not matched at all").unwrap();
        // Invalid UTF-8: must be skipped, not abort the walk.
        std::fs::write(temp.path().join("sub/binary.md"), [0xff, 0xfe, 0x00, 0x92]).unwrap();

        let index = chunk_index().await;
        let indexer = Indexer::new(index.clone(), None, small_windows());
        let total = indexer
            .index_directory(temp.path(), "*.md", false)
            .await
            .unwrap();

        assert_eq!(total, 2);
        assert_eq!(index.stats().await.unwrap().total_files, 2);
    }

    #[tokio::test]
    async fn rerunning_directory_index_is_idempotent() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("a.md"), "repeatable words in a file").unwrap();

        let indexer = Indexer::new(chunk_index().await, None, small_windows());
        assert_eq!(
            indexer.index_directory(temp.path(), "*.md", false).await.unwrap(),
            1
        );
        assert_eq!(
            indexer.index_directory(temp.path(), "*.md", false).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn force_applies_to_every_file_in_a_directory_walk() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("a.md"), "first file words").unwrap();
        std::fs::write(temp.path().join("b.md"), "second file words").unwrap();

        let index = chunk_index().await;
        let indexer = Indexer::new(index.clone(), None, small_windows());
        assert_eq!(
            indexer.index_directory(temp.path(), "*.md", false).await.unwrap(),
            2
        );

        // Vectorless rows get re-written when a provider appears.
        let provider = Arc::new(FixedProvider::new(vec![0.6, 0.8]));
        let backfill = Indexer::new(index.clone(), Some(provider), small_windows());
        assert_eq!(
            backfill.index_directory(temp.path(), "*.md", true).await.unwrap(),
            2
        );

        assert_eq!(index.all_embedded().await.unwrap().len(), 2);
        assert_eq!(index.stats().await.unwrap().total_chunks, 2);
    }

    #[tokio::test]
    async fn bad_chunk_geometry_fails_fast() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("note.md");
        std::fs::write(&file, "words").unwrap();

        let indexer = Indexer::new(
            chunk_index().await,
            None,
            ChunkingConfig {
                window_size: 4,
                overlap: 4,
            },
        );
        assert!(matches!(
            indexer.index_file(&file, false).await,
            Err(RetrievalError::Chunking(_))
        ));
    }
}
