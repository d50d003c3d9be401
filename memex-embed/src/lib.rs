//! # memex-embed
//!
//! Text embedding for memex, built on local ONNX models via FastEmbed.
//! The crate exposes a small async provider abstraction so the rest of the
//! system never talks to a concrete model directly: the retriever takes an
//! `Option<Arc<dyn EmbeddingProvider>>` and treats absence as a first-class
//! degraded mode (index without vectors, report search as unavailable).
//!
//! ## Quick Start
//!
//! ```no_run
//! use memex_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = FastEmbedProvider::create(EmbedConfig::default()).await?;
//! let vector = provider.embed_text("what did I learn about sqlite?").await?;
//! assert_eq!(vector.len(), provider.embedding_dimension());
//! # Ok(())
//! # }
//! ```
//!
//! Embeddings are half-precision (`f16`) and L2-normalized by the provider,
//! so cosine similarity downstream reduces to a dot product plus a guard for
//! zero vectors. Loaded models are cached process-wide; constructing two
//! providers with the same configuration loads the model once.

pub mod config;
pub mod error;
pub mod provider;

pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, FastEmbedProvider};
