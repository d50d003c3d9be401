//! Query-time scoring: exhaustive cosine similarity over stored vectors.

use crate::error::{Result, RetrievalError};
use crate::storage::ChunkIndex;
use half::f16;
use memex_embed::EmbeddingProvider;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

/// One ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub source_path: String,
    pub content: String,
    pub score: f32,
}

/// Cosine similarity of two f16 vectors, computed in f32.
///
/// A zero-magnitude vector makes the quotient undefined; it scores 0.0,
/// which any positive `min_score` threshold then excludes. Mismatched
/// dimensions (a model change without re-indexing) also score 0.0.
pub fn cosine_similarity(a: &[f16], b: &[f16]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (x.to_f32(), y.to_f32());
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}

/// Scores every stored embedded chunk against a query.
pub struct Searcher {
    index: ChunkIndex,
    provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl Searcher {
    pub fn new(index: ChunkIndex, provider: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        Self { index, provider }
    }

    /// Return the `top_k` chunks scoring at least `min_score` against
    /// `query`, best first. Ties keep insertion order.
    ///
    /// With no provider configured this returns
    /// [`RetrievalError::SearchUnavailable`] rather than an empty result a
    /// caller could mistake for "searched, found nothing".
    pub async fn search(&self, query: &str, top_k: usize, min_score: f32) -> Result<Vec<SearchHit>> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(RetrievalError::SearchUnavailable)?;

        let query_vector = provider.embed_text(query).await?;
        let chunks = self.index.all_embedded().await?;
        tracing::debug!(candidates = chunks.len(), "scoring stored chunks");

        let mut hits: Vec<SearchHit> = chunks
            .into_iter()
            .filter_map(|chunk| {
                let score = cosine_similarity(&query_vector, &chunk.embedding);
                (score >= min_score).then_some(SearchHit {
                    source_path: chunk.source_path,
                    content: chunk.content,
                    score,
                })
            })
            .collect();

        // Stable sort: equal scores stay in insertion order.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }
}
