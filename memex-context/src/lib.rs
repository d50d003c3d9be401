//! # memex-context
//!
//! Pure text processing for the memex indexing pipeline: splitting documents
//! into overlapping word windows and fingerprinting chunk content for
//! deduplication. This crate performs no I/O; the retriever crate feeds it
//! file content and persists what comes out.
//!
//! ## Quick Start
//!
//! ```
//! use memex_context::{ChunkingConfig, Fingerprint, chunk_text};
//!
//! let config = ChunkingConfig { window_size: 8, overlap: 2 };
//! let windows = chunk_text("one two three four five six seven eight nine ten", &config)?;
//! assert_eq!(windows.len(), 2);
//!
//! let fp = Fingerprint::of(&windows[0]);
//! assert_eq!(fp, Fingerprint::of(&windows[0]));
//! # Ok::<(), memex_context::ChunkError>(())
//! ```

pub mod chunk;
pub mod fingerprint;

pub use chunk::{ChunkError, ChunkingConfig, chunk_text};
pub use fingerprint::{FINGERPRINT_LEN, Fingerprint};
