//! Error types for nova-index.
//!
//! nova-index uses a hierarchical error system:
//! - `IndexError` is the top-level error returned by all public APIs
//! - Specific error types (`PersistenceError`, `ValidationError`) provide detail
//!
//! Expected outcomes of normal use (a duplicate identifier, a lookup that
//! finds nothing) are *not* errors: they come back as
//! [`InsertOutcome::Duplicate`](crate::InsertOutcome) or `None`.
//!
//! # Error Handling Pattern
//! ```rust,ignore
//! use novaindex::{DocumentIndex, Config, Result};
//!
//! fn example() -> Result<()> {
//!     let index = DocumentIndex::open("./data/index", Config::default())?;
//!     // ... operations that may fail ...
//!     index.close()?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Position;

/// Result type alias for nova-index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Top-level error enum for all nova-index operations.
///
/// This is the only error type returned by public APIs.
/// Use pattern matching to handle specific error cases.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Snapshot read/write error.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error (fatal at construction).
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of what's wrong with the configuration.
        reason: String,
    },

    /// Requested entity not found.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// Embedding generation error from the embedding source.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Internal invariant failure (e.g. a poisoned lock).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IndexError {
    /// Creates a configuration error with the given reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Creates an embedding error with the given message.
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a persistence error.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Returns true if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if a vector's length disagreed with the index dimension.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Validation(ValidationError::DimensionMismatch { .. })
        )
    }
}

/// Snapshot persistence errors.
///
/// Checkpoint failures surface to the caller of `checkpoint`. Restore
/// failures are absorbed by the engine (degraded empty start), so callers
/// only see them from [`persistence::restore`](crate::persistence::restore)
/// directly.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Snapshot file read/write failed.
    #[error("Snapshot I/O failed at {path}: {source}")]
    Io {
        /// File that was being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Snapshot is structurally invalid.
    #[error("Snapshot corrupted: {0}")]
    Corrupted(String),

    /// Snapshot was written by an incompatible format version.
    #[error("Snapshot format version mismatch: expected {expected}, found {found}")]
    FormatVersionMismatch {
        /// Format version this build writes.
        expected: u32,
        /// Format version found on disk.
        found: u32,
    },

    /// Snapshot dimension differs from the configured dimension.
    #[error("Snapshot dimension mismatch: configured {expected}, snapshot has {found}")]
    DimensionMismatch {
        /// Configured dimension.
        expected: usize,
        /// Dimension recorded in the snapshot.
        found: usize,
    },

    /// Snapshot directory is locked by another writer.
    #[error("Snapshot directory is locked by another writer: {0}")]
    Locked(PathBuf),
}

impl PersistenceError {
    /// Creates an I/O error tagged with the file path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a corruption error with the given message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }
}

// Convert codec errors to PersistenceError
impl From<bincode::Error> for PersistenceError {
    fn from(err: bincode::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

/// Validation errors for input data.
///
/// These errors indicate problems with data provided by the caller and are
/// always raised before any mutation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Vector length doesn't match the index dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension the index was constructed with.
        expected: usize,
        /// Actual length provided.
        got: usize,
    },

    /// Vector contains NaN or an infinite component.
    #[error("Embedding component {index} is not finite")]
    NonFiniteComponent {
        /// Offset of the first offending component.
        index: usize,
    },

    /// Vector component is large enough that a distance could overflow.
    #[error("Embedding component {index} exceeds magnitude {limit}")]
    ComponentOutOfRange {
        /// Offset of the first offending component.
        index: usize,

        /// Largest accepted magnitude for this dimension.
        limit: f32,
    },

    /// Parallel batch inputs have different lengths.
    #[error("Batch length mismatch: {ids} ids, {vectors} vectors, {metadata} metadata records")]
    BatchLengthMismatch {
        /// Number of identifiers.
        ids: usize,
        /// Number of vectors.
        vectors: usize,
        /// Number of metadata records.
        metadata: usize,
    },

    /// A field has an invalid value.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the invalid field.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },
}

impl ValidationError {
    /// Creates a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, got: usize) -> Self {
        Self::DimensionMismatch { expected, got }
    }

    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Not found errors for specific entity types.
#[derive(Debug, Error)]
pub enum NotFoundError {
    /// No live binding for the document identifier.
    #[error("Document not found: {0}")]
    Document(String),

    /// Position was never assigned.
    #[error("Position not found: {0}")]
    Position(Position),
}

impl NotFoundError {
    /// Creates a document not found error.
    pub fn document(id: impl ToString) -> Self {
        Self::Document(id.to_string())
    }
}
