//! Identity map: document identifiers ↔ dense positions, plus metadata.
//!
//! The map is the only place that knows which document a stored vector
//! belongs to. It maintains:
//!
//! - a forward table `id → position` for live bindings,
//! - a reverse table `position → id` covering every position ever bound,
//! - the metadata record of each live identifier.
//!
//! # Tombstones
//!
//! [`IdentityMap::detach`] is a *logical* removal. It drops the forward
//! entry and the metadata record, but the reverse entry stays: the vector
//! at that position is still physically in the store, still returned by
//! search, and still resolves to the old identifier. Such a position is a
//! tombstone. Reclaiming it would require rebuilding the store, which this
//! crate does not do.
//!
//! Because the forward entry is gone, a detached identifier may be bound
//! again; it then gets a fresh position and the old one stays a tombstone.

use std::collections::HashMap;

use thiserror::Error;

use crate::types::{Metadata, Position};

/// Why a bind was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    /// The identifier already has a live binding. Nothing was mutated.
    #[error("Document already indexed: {0}")]
    Duplicate(String),

    /// Positions must be bound densely, in order.
    #[error("Position {got} bound out of order (next position is {expected})")]
    NonSequentialPosition {
        /// The next position the map expects.
        expected: Position,
        /// The position the caller tried to bind.
        got: Position,
    },
}

/// Bidirectional identifier/position table with per-document metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IdentityMap {
    /// Forward map: identifier → position (live bindings only).
    id_to_position: HashMap<String, Position>,

    /// Reverse map: position → identifier.
    /// Uses Vec for O(1) lookup; its length is the number of bound positions.
    position_to_id: Vec<String>,

    /// Metadata records keyed by live identifier.
    metadata: HashMap<String, Metadata>,
}

impl IdentityMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `id` to `position` and records its metadata.
    ///
    /// `position` must be the next unbound position (`total_positions()`).
    /// On error the map is left untouched.
    pub fn bind(
        &mut self,
        id: impl Into<String>,
        position: Position,
        metadata: Metadata,
    ) -> Result<(), BindError> {
        let id = id.into();
        if self.id_to_position.contains_key(&id) {
            return Err(BindError::Duplicate(id));
        }

        let expected = Position(self.position_to_id.len());
        if position != expected {
            return Err(BindError::NonSequentialPosition {
                expected,
                got: position,
            });
        }

        self.position_to_id.push(id.clone());
        self.metadata.insert(id.clone(), metadata);
        self.id_to_position.insert(id, position);
        Ok(())
    }

    /// Returns the identifier bound at `position`, tombstones included.
    pub fn resolve(&self, position: Position) -> Option<&str> {
        self.position_to_id.get(position.get()).map(String::as_str)
    }

    /// Returns the live position of `id`.
    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.id_to_position.get(id).copied()
    }

    /// Returns the metadata record of a live identifier.
    pub fn metadata_for(&self, id: &str) -> Option<&Metadata> {
        self.metadata.get(id)
    }

    /// Returns true if `id` has a live binding.
    pub fn is_bound(&self, id: &str) -> bool {
        self.id_to_position.contains_key(id)
    }

    /// Returns the metadata for the document at `position`, if that position
    /// is the identifier's live binding (not a tombstone).
    pub fn live_metadata_at(&self, position: Position) -> Option<&Metadata> {
        let id = self.resolve(position)?;
        match self.id_to_position.get(id) {
            Some(&live) if live == position => self.metadata.get(id),
            _ => None,
        }
    }

    /// Logically removes `id`.
    ///
    /// Drops the forward mapping and metadata; the reverse entry and the
    /// stored vector stay. Returns the detached position, or `None` if `id`
    /// had no live binding.
    pub fn detach(&mut self, id: &str) -> Option<Position> {
        let position = self.id_to_position.remove(id)?;
        self.metadata.remove(id);
        Some(position)
    }

    /// Number of live bindings.
    pub fn live_count(&self) -> usize {
        self.id_to_position.len()
    }

    /// Number of positions ever bound (live and tombstoned).
    pub fn total_positions(&self) -> usize {
        self.position_to_id.len()
    }

    /// Iterates live `(id, position)` bindings in arbitrary order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, Position)> {
        self.id_to_position.iter().map(|(id, &p)| (id.as_str(), p))
    }

    /// Iterates `(position, id)` over every bound position, in order.
    pub fn positions(&self) -> impl Iterator<Item = (Position, &str)> {
        self.position_to_id
            .iter()
            .enumerate()
            .map(|(i, id)| (Position(i), id.as_str()))
    }

    /// Iterates live metadata records in arbitrary order.
    pub fn records(&self) -> impl Iterator<Item = (&str, &Metadata)> {
        self.metadata.iter().map(|(id, m)| (id.as_str(), m))
    }

    /// Reassembles a map from persisted tables, checking every invariant.
    ///
    /// Returns a description of the first violated invariant.
    pub(crate) fn from_parts(
        id_to_position: HashMap<String, Position>,
        position_to_id: Vec<String>,
        metadata: HashMap<String, Metadata>,
    ) -> Result<Self, String> {
        for (id, &position) in &id_to_position {
            match position_to_id.get(position.get()) {
                Some(bound) if bound == id => {}
                Some(bound) => {
                    return Err(format!(
                        "id '{}' maps to position {} which is bound to '{}'",
                        id, position, bound
                    ))
                }
                None => {
                    return Err(format!(
                        "id '{}' maps to position {} outside [0, {})",
                        id,
                        position,
                        position_to_id.len()
                    ))
                }
            }
        }

        if let Some(orphan) = metadata.keys().find(|id| !id_to_position.contains_key(*id)) {
            return Err(format!("metadata for unbound id '{}'", orphan));
        }

        Ok(Self {
            id_to_position,
            position_to_id,
            metadata,
        })
    }
}
