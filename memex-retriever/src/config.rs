//! Optional configuration file.
//!
//! A `memex.toml` next to the database (in the base directory) overrides
//! the defaults below. A missing file means defaults; a malformed file is
//! a reported error rather than a silent fallback.
//!
//! ```toml
//! [chunking]
//! window_size = 500
//! overlap = 50
//!
//! [embedding]
//! model_name = "all-MiniLM-L6-v2"
//!
//! [search]
//! min_score = 0.3
//! limit = 5
//! ```

use crate::error::Result;
use memex_context::ChunkingConfig;
use memex_embed::EmbedConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file inside the base directory.
pub const CONFIG_FILE_NAME: &str = "memex.toml";

/// Defaults applied to `search` when flags are not given.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub min_score: f32,
    pub limit: usize,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            min_score: 0.3,
            limit: 5,
        }
    }
}

/// Top-level configuration for the memex CLI and library callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemexConfig {
    pub chunking: ChunkingConfig,
    pub embedding: EmbedConfig,
    pub search: SearchDefaults,
}

impl MemexConfig {
    /// Load configuration from `base/memex.toml`, falling back to defaults
    /// when the file does not exist.
    pub fn load(base: &Path) -> Result<Self> {
        let path = base.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_means_defaults() {
        let temp = tempdir().unwrap();
        let config = MemexConfig::load(temp.path()).unwrap();
        assert_eq!(config.chunking.window_size, 500);
        assert_eq!(config.search.limit, 5);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[chunking]\nwindow_size = 100\n\n[search]\nmin_score = 0.5\n",
        )
        .unwrap();

        let config = MemexConfig::load(temp.path()).unwrap();
        assert_eq!(config.chunking.window_size, 100);
        assert_eq!(config.chunking.overlap, 50);
        assert!((config.search.min_score - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.embedding.model_name(), "all-MiniLM-L6-v2");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "not [valid toml").unwrap();
        assert!(MemexConfig::load(temp.path()).is_err());
    }
}
