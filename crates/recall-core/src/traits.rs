use crate::error::Result;
use crate::types::{TaskMode, Vector};

/// Source of embeddings for documents and queries.
///
/// Implementations wrap a remote API or a local stand-in. Every call for a
/// given `embedder_id` must return vectors of the same length; the retrieval
/// engine checks this rather than trusting it.
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `gemini:text-embedding-004`).
    fn embedder_id(&self) -> &str;

    /// Embed `text`. `title` is only meaningful in [`TaskMode::Document`].
    fn embed(&self, text: &str, title: Option<&str>, mode: TaskMode) -> Result<Vector>;
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn embedder_id(&self) -> &str {
        (**self).embedder_id()
    }

    fn embed(&self, text: &str, title: Option<&str>, mode: TaskMode) -> Result<Vector> {
        (**self).embed(text, title, mode)
    }
}
