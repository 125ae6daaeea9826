//! Configuration types for nova-index.
//!
//! The [`Config`] struct controls index behavior including:
//! - Embedding dimension (384, 768, or custom)
//! - Checkpoint cadence and write durability
//! - Length of raw-text metadata excerpts
//!
//! # Example
//! ```rust
//! use novaindex::{Config, EmbeddingDimension, SyncMode};
//!
//! // Use defaults (384 dimensions, checkpoint every 10 inserts)
//! let config = Config::default();
//!
//! // Checkpoint after every insert, fsync the directory too
//! let config = Config {
//!     embedding_dimension: EmbeddingDimension::D768,
//!     checkpoint_interval: 1,
//!     sync_mode: SyncMode::Paranoid,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// Largest accepted custom dimension.
pub const MAX_DIMENSION: usize = 4096;

/// Default number of successful inserts between checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 10;

/// Default length (in characters) of raw-text metadata excerpts.
pub const DEFAULT_TEXT_EXCERPT_CHARS: usize = 500;

/// Index configuration options.
///
/// All fields have sensible defaults. Use struct update syntax to override
/// specific settings:
///
/// ```rust
/// use novaindex::Config;
///
/// let config = Config {
///     checkpoint_interval: 100,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Embedding vector dimension (must match the embedding source).
    pub embedding_dimension: EmbeddingDimension,

    /// Number of successful inserts between automatic checkpoints.
    ///
    /// Up to `checkpoint_interval - 1` recent inserts can be lost on an
    /// unclean termination. `1` checkpoints after every insert.
    /// Default: 10
    pub checkpoint_interval: usize,

    /// Durability mode for checkpoint writes.
    pub sync_mode: SyncMode,

    /// Characters of source text kept in `text` metadata excerpts.
    ///
    /// Default: 500
    pub text_excerpt_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // 384 matches all-MiniLM-L6-v2, the model the paper service embeds with
            embedding_dimension: EmbeddingDimension::D384,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            sync_mode: SyncMode::Normal,
            text_excerpt_chars: DEFAULT_TEXT_EXCERPT_CHARS,
        }
    }
}

impl Config {
    /// Creates a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Config for the given embedding dimension.
    ///
    /// # Example
    /// ```rust
    /// use novaindex::{Config, EmbeddingDimension};
    ///
    /// // OpenAI text-embedding-3-small uses 1536 dimensions
    /// let config = Config::with_dimension(EmbeddingDimension::Custom(1536));
    /// assert_eq!(config.dimension(), 1536);
    /// ```
    pub fn with_dimension(dimension: EmbeddingDimension) -> Self {
        Self {
            embedding_dimension: dimension,
            ..Default::default()
        }
    }

    /// Validates the configuration.
    ///
    /// Called automatically by `DocumentIndex::open()`. You can also call
    /// this explicitly to check configuration before attempting to open.
    ///
    /// # Errors
    /// Returns `IndexError::Config` if:
    /// - Custom dimension is 0 or > 4096
    /// - `checkpoint_interval` is 0
    /// - `text_excerpt_chars` is 0
    pub fn validate(&self) -> Result<(), IndexError> {
        if let EmbeddingDimension::Custom(dim) = self.embedding_dimension {
            if dim == 0 {
                return Err(IndexError::config(
                    "embedding_dimension: custom dimension must be greater than 0",
                ));
            }
            if dim > MAX_DIMENSION {
                return Err(IndexError::config(format!(
                    "embedding_dimension: custom dimension must not exceed {}",
                    MAX_DIMENSION
                )));
            }
        }

        if self.checkpoint_interval == 0 {
            return Err(IndexError::config(
                "checkpoint_interval: must be greater than 0",
            ));
        }

        if self.text_excerpt_chars == 0 {
            return Err(IndexError::config(
                "text_excerpt_chars: must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Returns the embedding dimension as a numeric value.
    pub fn dimension(&self) -> usize {
        self.embedding_dimension.size()
    }
}

/// Embedding vector dimensions.
///
/// Standard dimensions are provided for common models. Use `Custom` for
/// other embedding services.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingDimension {
    /// 384 dimensions (all-MiniLM-L6-v2).
    #[default]
    D384,

    /// 768 dimensions (bge-base-en-v1.5, BERT-base).
    D768,

    /// Custom dimension for other embedding models.
    ///
    /// Must be between 1 and 4096.
    Custom(usize),
}

impl EmbeddingDimension {
    /// Returns the numeric size of this dimension.
    ///
    /// # Example
    /// ```rust
    /// use novaindex::EmbeddingDimension;
    ///
    /// assert_eq!(EmbeddingDimension::D384.size(), 384);
    /// assert_eq!(EmbeddingDimension::D768.size(), 768);
    /// assert_eq!(EmbeddingDimension::Custom(3).size(), 3);
    /// ```
    #[inline]
    pub const fn size(&self) -> usize {
        match self {
            Self::D384 => 384,
            Self::D768 => 768,
            Self::Custom(n) => *n,
        }
    }
}

/// Durability mode for checkpoint writes.
///
/// Controls the trade-off between checkpoint latency and crash safety.
/// Every mode writes through a temporary file and an atomic rename, so a
/// reader never sees a half-written snapshot; the modes differ only in
/// when data is forced to disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// fsync each snapshot file before renaming it into place.
    #[default]
    Normal,

    /// Skip fsync (faster checkpoints, an OS crash may lose the latest one).
    Fast,

    /// fsync files and the containing directory after each rename.
    Paranoid,
}

impl SyncMode {
    /// Returns true if file contents are fsynced before rename.
    pub fn syncs_files(&self) -> bool {
        !matches!(self, Self::Fast)
    }

    /// Returns true if the parent directory is fsynced after rename.
    pub fn syncs_directory(&self) -> bool {
        matches!(self, Self::Paranoid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.embedding_dimension, EmbeddingDimension::D384);
        assert_eq!(config.checkpoint_interval, 10);
        assert_eq!(config.sync_mode, SyncMode::Normal);
        assert_eq!(config.text_excerpt_chars, 500);
    }

    #[test]
    fn test_with_dimension() {
        let config = Config::with_dimension(EmbeddingDimension::Custom(3));
        assert_eq!(config.dimension(), 3);
        assert_eq!(config.checkpoint_interval, DEFAULT_CHECKPOINT_INTERVAL);
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_custom_dimension_zero() {
        let config = Config::with_dimension(EmbeddingDimension::Custom(0));
        let err = config.validate().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_validate_custom_dimension_too_large() {
        let config = Config::with_dimension(EmbeddingDimension::Custom(5000));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_checkpoint_interval_zero() {
        let config = Config {
            checkpoint_interval: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("checkpoint_interval"));
    }

    #[test]
    fn test_validate_excerpt_zero() {
        let config = Config {
            text_excerpt_chars: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sync_mode_checks() {
        assert!(SyncMode::Normal.syncs_files());
        assert!(!SyncMode::Normal.syncs_directory());
        assert!(!SyncMode::Fast.syncs_files());
        assert!(SyncMode::Paranoid.syncs_files());
        assert!(SyncMode::Paranoid.syncs_directory());
    }

    #[test]
    fn test_embedding_dimension_serialization() {
        let dim = EmbeddingDimension::Custom(1536);
        let bytes = bincode::serialize(&dim).unwrap();
        let restored: EmbeddingDimension = bincode::deserialize(&bytes).unwrap();
        assert_eq!(dim, restored);
    }
}
