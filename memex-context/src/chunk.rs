//! Overlapping word-window chunking.
//!
//! Documents are split on whitespace into word tokens, then re-joined into
//! successive windows of `window_size` words that advance by
//! `window_size - overlap` words per step. The trailing window may be
//! shorter. Windows are the unit the retriever embeds and stores, so a
//! document that produces no windows at all (empty or whitespace-only
//! content) still yields a single window holding the original text verbatim:
//! every document gets at least one indexable unit.
//!
//! Note that windows are whitespace-joined word sequences, not raw
//! substrings of the source. Original inter-word spacing is not preserved.

use serde::{Deserialize, Serialize};

/// Errors raised while chunking text.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// The window would never advance, so chunking would loop forever.
    #[error("overlap ({overlap}) must be strictly less than window size ({window_size})")]
    OverlapTooLarge { window_size: usize, overlap: usize },
}

/// Window geometry for [`chunk_text`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Number of words per window.
    pub window_size: usize,
    /// Number of words shared between consecutive windows.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_size: 500,
            overlap: 50,
        }
    }
}

impl ChunkingConfig {
    /// Fail fast on geometry that cannot advance. `overlap >= window_size`
    /// (including a zero window) is a configuration error, not a runtime one.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.overlap >= self.window_size {
            return Err(ChunkError::OverlapTooLarge {
                window_size: self.window_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }

    /// How far the window start advances each step.
    pub fn step(&self) -> usize {
        self.window_size - self.overlap
    }
}

/// Split `text` into overlapping word windows.
///
/// Returns at least one window for any input: when whitespace tokenization
/// produces no words, the original text is returned as a single window.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>, ChunkError> {
    config.validate()?;

    let words: Vec<&str> = text.split_whitespace().collect();
    let mut windows = Vec::new();

    let mut start = 0;
    while start < words.len() {
        let end = (start + config.window_size).min(words.len());
        windows.push(words[start..end].join(" "));
        start += config.step();
    }

    if windows.is_empty() {
        windows.push(text.to_string());
    }
    Ok(windows)
}
