//! Core type definitions shared across the index.
//!
//! Positions are dense, zero-based, and assigned in strict insertion order.
//! Document identifiers are opaque strings chosen by the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Embedding vector (dense f32 array of the index dimension).
pub type Embedding = Vec<f32>;

/// Opaque per-document metadata record.
///
/// Title, abstract, authors, categories, or a truncated text excerpt.
/// The index never interprets it; it is passed through as-is.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Dense address of a vector inside the index store.
///
/// Assigned once per successful insert, starting at 0 and incrementing by
/// exactly 1. Never reused, not even after the document is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position(pub usize);

impl Position {
    /// Returns the raw position as a `usize` offset.
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl From<usize> for Position {
    #[inline]
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Converts a squared L2 distance to a similarity score.
///
/// `1 / (1 + distance)`: monotonically decreasing, bounded in (0, 1], and
/// exactly 1.0 only at zero distance. Not a normalized probability.
#[inline]
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Result of a single insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The vector was appended and bound at this position.
    Inserted(Position),

    /// The identifier already had a live binding; nothing was mutated.
    Duplicate,
}

impl InsertOutcome {
    /// Returns true if the insert was skipped as a duplicate.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate)
    }

    /// Returns the assigned position, if the vector was inserted.
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Inserted(p) => Some(*p),
            Self::Duplicate => None,
        }
    }
}

/// Summary of an `insert_batch` call.
///
/// Partial success is normal: duplicates are skipped individually.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Positions assigned to newly inserted documents, in input order.
    pub inserted: Vec<Position>,

    /// Identifiers skipped because they were already bound.
    pub skipped: Vec<String>,

    /// Whether the post-batch checkpoint succeeded.
    ///
    /// Always true for an in-memory index.
    pub persisted: bool,
}

/// A single nearest-neighbor result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Document identifier bound to the matched position.
    pub id: String,

    /// Position of the matched vector.
    pub position: Position,

    /// Squared Euclidean distance from the query.
    pub distance: f32,

    /// `1 / (1 + distance)`.
    pub similarity: f32,

    /// Metadata record; empty if the document was removed.
    pub metadata: Metadata,
}

/// Read-only index statistics for operational monitoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of live identifier bindings.
    pub document_count: usize,

    /// Total vectors ever appended, including removed documents.
    pub total_vectors: usize,

    /// Index-wide embedding dimension.
    pub dimension: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_at_zero_distance_is_one() {
        assert_eq!(similarity_from_distance(0.0), 1.0);
    }

    #[test]
    fn test_similarity_decreases_with_distance() {
        let near = similarity_from_distance(0.5);
        let far = similarity_from_distance(2.0);
        assert!(near > far);
        assert!(far > 0.0);
        assert!((far - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_position_display_and_ordering() {
        assert_eq!(Position(42).to_string(), "42");
        assert!(Position(1) < Position(2));
        assert_eq!(Position::from(3).get(), 3);
    }

    #[test]
    fn test_insert_outcome_accessors() {
        let inserted = InsertOutcome::Inserted(Position(5));
        assert_eq!(inserted.position(), Some(Position(5)));
        assert!(!inserted.is_duplicate());

        assert!(InsertOutcome::Duplicate.is_duplicate());
        assert_eq!(InsertOutcome::Duplicate.position(), None);
    }

    #[test]
    fn test_stats_serialization() {
        let stats = IndexStats {
            document_count: 2,
            total_vectors: 3,
            dimension: 384,
        };
        let json = serde_json::to_string(&stats).unwrap();
        let restored: IndexStats = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, restored);
    }
}
