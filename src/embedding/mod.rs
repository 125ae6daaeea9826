//! Embedding source abstractions.
//!
//! The index stores vectors; it does not produce them. Text is turned into
//! vectors by an external embedding service (a sentence-transformer model
//! behind an HTTP endpoint, a hosted API, ...). This module defines the
//! boundary with that service.
//!
//! # Providers
//!
//! - [`ExternalEmbedding`] - For pre-computed embeddings supplied by the caller
//! - Any type implementing [`EmbeddingService`] - plugged into
//!   [`DocumentIndex::index_text`](crate::DocumentIndex::index_text) and friends
//!
//! # Example
//!
//! ```rust
//! use novaindex::embedding::{EmbeddingService, ExternalEmbedding};
//!
//! // External mode - caller provides embeddings
//! let service = ExternalEmbedding::new(384);
//! assert_eq!(service.dimension(), 384);
//!
//! // Dimension only - cannot generate embeddings
//! assert!(service.embed("hello").is_err());
//! ```

use crate::error::{IndexError, Result};
use crate::types::Embedding;

/// Embedding service trait for generating vector representations of text.
///
/// Implementations must be thread-safe (`Send + Sync`) so a shared index
/// can embed from several request handlers at once.
///
/// # Implementing a Custom Provider
///
/// ```rust,ignore
/// use novaindex::embedding::EmbeddingService;
/// use novaindex::{Embedding, Result};
///
/// struct MiniLmService {
///     client: MyHttpClient,
/// }
///
/// impl EmbeddingService for MiniLmService {
///     fn embed(&self, text: &str) -> Result<Embedding> {
///         Ok(self.client.embed(text)?)
///     }
///
///     fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
///         Ok(self.client.embed_many(texts)?)
///     }
///
///     fn dimension(&self) -> usize {
///         384
///     }
/// }
/// ```
pub trait EmbeddingService: Send + Sync {
    /// Generates an embedding for a single text.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Embedding` if embedding generation fails.
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generates embeddings for multiple texts, in input order.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Embedding` if any embedding generation fails.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Returns the dimension of embeddings produced by this service.
    fn dimension(&self) -> usize;
}

/// External embedding provider.
///
/// Used when embeddings are generated outside the index and handed to
/// [`DocumentIndex::insert`](crate::DocumentIndex::insert) directly. It
/// reports a dimension but cannot generate embeddings itself.
///
/// # Example
///
/// ```rust
/// use novaindex::embedding::{EmbeddingService, ExternalEmbedding};
///
/// // Create for OpenAI text-embedding-3-small (1536 dimensions)
/// let service = ExternalEmbedding::new(1536);
/// assert_eq!(service.dimension(), 1536);
/// ```
#[derive(Clone, Debug)]
pub struct ExternalEmbedding {
    dimension: usize,
}

impl ExternalEmbedding {
    /// Creates a new external embedding provider with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl EmbeddingService for ExternalEmbedding {
    fn embed(&self, _text: &str) -> Result<Embedding> {
        Err(IndexError::embedding(
            "External embedding mode: embeddings must be provided by the caller",
        ))
    }

    fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Embedding>> {
        Err(IndexError::embedding(
            "External embedding mode: embeddings must be provided by the caller",
        ))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
