//! Data types for paper ingestion.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::Metadata;

/// Bibliographic record of a research paper.
///
/// The embedding is computed from [`Paper::embedding_text`]; the fields
/// themselves become the document's metadata record.
///
/// # Example
///
/// ```rust
/// use novaindex::Paper;
///
/// let paper = Paper {
///     title: "Attention Is All You Need".into(),
///     abstract_text: "The dominant sequence transduction models...".into(),
///     authors: vec!["Ashish Vaswani".into()],
///     categories: vec!["cs.CL".into()],
/// };
/// assert!(paper.embedding_text().starts_with("Attention Is All You Need. "));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Paper title.
    pub title: String,

    /// Paper abstract.
    #[serde(rename = "abstract")]
    pub abstract_text: String,

    /// Author names, in byline order.
    #[serde(default)]
    pub authors: Vec<String>,

    /// Subject categories (e.g. arXiv `cs.LG`).
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Paper {
    /// Text fed to the embedding service: `"{title}. {abstract}"`.
    pub fn embedding_text(&self) -> String {
        format!("{}. {}", self.title, self.abstract_text)
    }

    /// Metadata record stored alongside the paper's vector.
    ///
    /// Keys: `id`, `title`, `abstract`, `authors`, `categories`.
    pub fn to_metadata(&self, id: &str) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("id".into(), json!(id));
        metadata.insert("title".into(), json!(self.title));
        metadata.insert("abstract".into(), json!(self.abstract_text));
        metadata.insert("authors".into(), json!(self.authors));
        metadata.insert("categories".into(), json!(self.categories));
        metadata
    }
}
