//! The semantic pipeline: indexing and search.
//!
//! [`Indexer`] drives files through chunking, fingerprint deduplication and
//! (optionally) embedding into the [`ChunkIndex`](crate::storage::ChunkIndex).
//! [`Searcher`] embeds a query and ranks every stored vector against it by
//! cosine similarity. The scan is exhaustive, sized for the small-to-medium
//! corpora memex targets; a larger deployment would swap an
//! approximate-nearest-neighbor index in behind the same contract.
//!
//! Both ends share one degraded mode: with no embedding provider configured,
//! indexing records text and fingerprints without vectors, and search
//! returns [`RetrievalError::SearchUnavailable`](crate::error::RetrievalError)
//! instead of a misleading empty result.

pub mod indexer;
pub mod search;

pub use indexer::Indexer;
pub use search::{SearchHit, Searcher, cosine_similarity};

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use half::f16;
    use memex_embed::{EmbeddingProvider, EmbeddingResult};

    /// Provider that returns the same fixed vector for every input.
    /// Lets tests store chunks at chosen cosine distances from any query.
    pub struct FixedProvider {
        pub vector: Vec<f16>,
    }

    impl FixedProvider {
        pub fn new(vector: Vec<f32>) -> Self {
            Self {
                vector: vector.into_iter().map(f16::from_f32).collect(),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        async fn embed_text(&self, _text: &str) -> memex_embed::Result<Vec<f16>> {
            Ok(self.vector.clone())
        }

        async fn embed_texts(&self, texts: &[String]) -> memex_embed::Result<EmbeddingResult> {
            Ok(EmbeddingResult::new(
                texts.iter().map(|_| self.vector.clone()).collect(),
            ))
        }

        fn embedding_dimension(&self) -> usize {
            self.vector.len()
        }

        fn provider_name(&self) -> &str {
            "fixed"
        }
    }

    pub fn vec_f16(values: &[f32]) -> Vec<f16> {
        values.iter().copied().map(f16::from_f32).collect()
    }
}
