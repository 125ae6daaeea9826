//! Document ingestion helpers.
//!
//! Builds the metadata records stored next to each vector and validates
//! document identifiers before they reach the identity map. Two record
//! shapes are produced:
//!
//! - **paper** records (`id`, `title`, `abstract`, `authors`, `categories`)
//!   from a [`Paper`]
//! - **text** records (`id`, `text`) holding a bounded excerpt of the raw
//!   source text
//!
//! The index itself never reads these keys back; they are opaque to it.

pub mod types;

pub use types::Paper;

use serde_json::json;

use crate::error::{IndexError, ValidationError};
use crate::types::Metadata;

/// Rejects identifiers the index cannot key on.
///
/// Identifiers are opaque, but an empty string would be indistinguishable
/// from "no identifier" to every caller of the index.
pub(crate) fn validate_document_id(id: &str) -> Result<(), IndexError> {
    if id.is_empty() {
        return Err(ValidationError::invalid_field("id", "must not be empty").into());
    }
    Ok(())
}

/// Returns at most `max_chars` characters of `text`, cut on a char boundary.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Metadata record for a raw-text document: `{ "id", "text" }`.
pub fn text_metadata(id: &str, text: &str, max_chars: usize) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("id".into(), json!(id));
    metadata.insert("text".into(), json!(excerpt(text, max_chars)));
    metadata
}
