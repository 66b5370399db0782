use std::sync::{PoisonError, RwLock};

use tracing::{debug, info};

use recall_core::{Document, EmbeddingProvider, Error, Record, Result, ScoredResult, TaskMode, Vector};

use crate::corpus::Corpus;

/// In-memory semantic search over an append-only corpus.
///
/// The embedding provider is injected at construction. `search` holds the
/// read lock while ranking; `ingest` embeds first and holds the write lock
/// only to append, so concurrent searches never observe a half-added record.
pub struct SemanticSearchEngine {
    embedder: Box<dyn EmbeddingProvider>,
    corpus: RwLock<Corpus>,
}

impl SemanticSearchEngine {
    pub fn new(embedder: Box<dyn EmbeddingProvider>) -> Self {
        Self { embedder, corpus: RwLock::new(Corpus::new()) }
    }

    pub fn embedder_id(&self) -> &str {
        self.embedder.embedder_id()
    }

    /// Embed `text` in document mode (with `title` as context when non-empty)
    /// and append the record.
    pub fn ingest(&self, text: &str, title: &str) -> Result<Record> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput("document text must not be empty".to_string()));
        }
        let hint = Some(title).filter(|t| !t.trim().is_empty());
        let vector = self.embed(text, hint, TaskMode::Document)?;
        let record = Record { title: title.to_string(), text: text.to_string(), vector };

        let mut corpus = self.corpus.write().unwrap_or_else(PoisonError::into_inner);
        corpus.push(record.clone())?;
        debug!(title, dim = record.dim(), len = corpus.len(), "record ingested");
        Ok(record)
    }

    pub fn ingest_document(&self, doc: &Document) -> Result<Record> {
        self.ingest(&doc.text, &doc.title)
    }

    /// Rank the whole corpus against `query_text`, best first.
    ///
    /// `top_k = None` returns every record. An empty corpus yields an empty
    /// list without calling the provider.
    pub fn search(&self, query_text: &str, top_k: Option<usize>) -> Result<Vec<ScoredResult>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query_text.trim().is_empty() {
            return Err(Error::EmptyInput("query text must not be empty".to_string()));
        }
        let query = self.embed(query_text, None, TaskMode::Query)?;
        let results = self.search_by_vector(&query, top_k)?;
        info!(query = query_text, hits = results.len(), "search complete");
        Ok(results)
    }

    /// Ranking step only, for callers that already hold a query vector.
    pub fn search_by_vector(&self, query: &[f32], top_k: Option<usize>) -> Result<Vec<ScoredResult>> {
        self.corpus.read().unwrap_or_else(PoisonError::into_inner).rank(query, top_k)
    }

    pub fn len(&self) -> usize {
        self.corpus.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.corpus.read().unwrap_or_else(PoisonError::into_inner).dim()
    }

    /// Snapshot of all records in insertion order.
    pub fn records(&self) -> Vec<Record> {
        self.corpus.read().unwrap_or_else(PoisonError::into_inner).records().to_vec()
    }

    /// Provider call with its failures normalised to `EmbeddingFailure` and
    /// malformed vectors (empty, non-finite) rejected.
    fn embed(&self, text: &str, title: Option<&str>, mode: TaskMode) -> Result<Vector> {
        let id = self.embedder.embedder_id();
        let vector = self.embedder.embed(text, title, mode).map_err(|e| match e {
            Error::EmbeddingFailure { .. } => e,
            other => Error::embedding(id, other.to_string()),
        })?;
        if vector.is_empty() {
            return Err(Error::embedding(id, "provider returned an empty vector"));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(Error::embedding(id, "provider returned non-finite values"));
        }
        Ok(vector)
    }
}
