//! Exact vector store over squared Euclidean distance.
//!
//! Vectors live in one contiguous `Vec<f32>`: the vector at position `p`
//! occupies `data[p * dimension..(p + 1) * dimension]`. This is also the
//! layout of the persisted vector table, so checkpoint and restore move the
//! buffer without reshaping it.

use std::cmp::Ordering;

use crate::error::{IndexError, Result};
use crate::types::Position;

use super::{validate_embedding, VectorIndex};

/// Brute-force nearest-neighbor index.
///
/// Search is a linear scan over every stored vector, so it is exact and its
/// cost is bounded by `len() * dimension()`.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatIndex {
    /// Embedding dimension (must match all inserted vectors).
    dimension: usize,

    /// Row-major vector table in position order.
    data: Vec<f32>,
}

impl FlatIndex {
    /// Creates an empty store.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Config` if `dimension` is 0.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(IndexError::config("vector dimension must be greater than 0"));
        }
        Ok(Self {
            dimension,
            data: Vec::new(),
        })
    }

    /// Rebuilds a store from a row-major vector table.
    ///
    /// Returns `None` if the dimension is 0 or the table length is not a
    /// whole number of vectors.
    pub(crate) fn from_raw(dimension: usize, data: Vec<f32>) -> Option<Self> {
        if dimension == 0 || data.len() % dimension != 0 {
            return None;
        }
        Some(Self { dimension, data })
    }

    /// Returns the stored vector at `position`, if it exists.
    pub fn vector(&self, position: Position) -> Option<&[f32]> {
        let start = position.get().checked_mul(self.dimension)?;
        let end = start.checked_add(self.dimension)?;
        self.data.get(start..end)
    }

    /// Returns the raw row-major table.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    fn append(&mut self, embedding: &[f32]) -> Result<Position> {
        validate_embedding(self.dimension, embedding)?;
        let position = Position(self.len());
        self.data.extend_from_slice(embedding);
        Ok(position)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Position, f32)>> {
        validate_embedding(self.dimension, query)?;

        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(Position, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(i, stored)| (Position(i), squared_l2(query, stored)))
            .collect();

        // Partition first so only the k winners get fully sorted
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_position);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance_then_position);

        Ok(scored)
    }
}

/// Squared Euclidean distance between two equal-length vectors.
///
/// Finite for any pair that passed [`validate_embedding`].
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn by_distance_then_position(a: &(Position, f32), b: &(Position, f32)) -> Ordering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}
