//! # nova-index
//!
//! Embedded semantic document index: exact nearest-neighbor search over
//! fixed-dimension embeddings, with per-document metadata and crash-safe
//! snapshots.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use novaindex::{Config, DocumentIndex, Metadata};
//!
//! // Open or create an index (restores the last snapshot if present)
//! let index = DocumentIndex::open("./data/index", Config::default())?;
//!
//! // Insert a document with a pre-computed embedding
//! index.insert("2401.00001", &embedding, Metadata::new())?;
//!
//! // Find its nearest neighbors
//! let hits = index.search(&query_embedding, 10)?;
//!
//! // Final checkpoint
//! index.close()?;
//! ```
//!
//! ## Key Concepts
//!
//! ### Position
//!
//! Every stored vector has a dense **position** `0, 1, 2, …` assigned in
//! insertion order. Positions are never reused.
//!
//! ### Identity map
//!
//! The identity map binds caller-chosen document identifiers to positions
//! and holds each document's metadata. Removing a document is logical: its
//! vector stays searchable as a *tombstone*.
//!
//! ### Snapshot
//!
//! The whole index is checkpointed to a directory every N inserts and on
//! close. Restore falls back to an empty index if the snapshot is absent or
//! unreadable.
//!
//! ### Embeddings
//!
//! The index stores vectors; it does not compute them. Either pass vectors
//! directly or hand an [`EmbeddingService`] to the text helpers
//! ([`DocumentIndex::index_text`], [`DocumentIndex::search_text`]).
//!
//! ## Thread Safety
//!
//! `DocumentIndex` is `Send + Sync` and can be shared across threads using
//! `Arc`. Searches run concurrently; inserts are exclusive.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

// ============================================================================
// Module declarations
// ============================================================================

mod config;
mod error;
mod index;
mod types;

pub mod document;
pub mod embedding;
pub mod identity;
pub mod persistence;

/// Exact vector store over squared Euclidean distance.
pub mod vector;

// ============================================================================
// Public API re-exports
// ============================================================================

// Main index interface
pub use index::DocumentIndex;

// Configuration
pub use config::{
    Config, EmbeddingDimension, SyncMode, DEFAULT_CHECKPOINT_INTERVAL, MAX_DIMENSION,
};

// Error handling
pub use error::{IndexError, NotFoundError, PersistenceError, Result, ValidationError};

// Core types
pub use types::{
    similarity_from_distance, BatchReport, Embedding, IndexStats, InsertOutcome, Metadata,
    Position, SearchHit,
};

// Domain types
pub use document::Paper;
pub use embedding::{EmbeddingService, ExternalEmbedding};
pub use persistence::Recovery;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Convenient imports for common nova-index usage.
///
/// ```rust
/// use novaindex::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Config, EmbeddingDimension, SyncMode};
    pub use crate::embedding::EmbeddingService;
    pub use crate::error::{IndexError, Result};
    pub use crate::index::DocumentIndex;
    pub use crate::types::{InsertOutcome, Metadata, Position, SearchHit};
}
