//! Vector index abstractions for semantic search.
//!
//! This module provides a trait-based abstraction over the vector store,
//! the component that owns the raw vectors and answers nearest-neighbor
//! queries by [`Position`]. The implementation is [`FlatIndex`], an exact
//! (brute-force) index over squared Euclidean distance.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │         VectorIndex trait         │
//! └──────────┬───────────────────────┘
//!            │
//!    ┌───────┴────────┐
//!    │   FlatIndex    │  (exact squared-L2 scan)
//!    └────────────────┘
//! ```
//!
//! The store knows nothing about document identifiers or metadata. It only
//! appends: there is no deletion or in-place mutation of a stored vector.

mod flat;

pub use flat::{squared_l2, FlatIndex};

use crate::error::{Result, ValidationError};
use crate::types::Position;

/// Vector store trait for nearest-neighbor search.
///
/// Mutation takes `&mut self`; the owning engine serializes writers and
/// readers around it so an append and the identity binding that goes with
/// it are observed together.
pub trait VectorIndex: Send + Sync {
    /// Returns the fixed dimension of every stored vector.
    fn dimension(&self) -> usize;

    /// Returns the number of vectors ever appended.
    fn len(&self) -> usize;

    /// Returns true if the store holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a vector and returns the position it was assigned.
    ///
    /// Fails with `DimensionMismatch` if `embedding.len() != dimension()`.
    fn append(&mut self, embedding: &[f32]) -> Result<Position>;

    /// Returns up to `min(k, len())` `(position, distance)` pairs.
    ///
    /// Sorted by ascending squared L2 distance, ties broken by ascending
    /// position. An empty store yields an empty vector, not an error.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Position, f32)>>;
}

/// Largest component magnitude accepted for vectors of `dimension`.
///
/// Two vectors within this bound have a squared L2 distance of at most a
/// quarter of `f32::MAX`, so distances and similarities stay finite.
pub fn max_component_magnitude(dimension: usize) -> f32 {
    (f32::MAX / dimension.max(1) as f32).sqrt() / 4.0
}

/// Checks a vector's length and rejects NaN, infinite, or oversized
/// components.
pub fn validate_embedding(dimension: usize, embedding: &[f32]) -> Result<()> {
    if embedding.len() != dimension {
        return Err(ValidationError::dimension_mismatch(dimension, embedding.len()).into());
    }
    if let Some(index) = embedding.iter().position(|v| !v.is_finite()) {
        return Err(ValidationError::NonFiniteComponent { index }.into());
    }
    let limit = max_component_magnitude(dimension);
    if let Some(index) = embedding.iter().position(|v| v.abs() > limit) {
        return Err(ValidationError::ComponentOutOfRange { index, limit }.into());
    }
    Ok(())
}
