//! Domain types shared by the providers and the retrieval engine.

use serde::{Deserialize, Serialize};

/// Dense embedding as returned by a provider.
pub type Vector = Vec<f32>;

/// Hint passed to the embedding provider.
///
/// Documents and queries land in the same vector space but are embedded with
/// different task hints; providers that support asymmetric retrieval
/// embeddings produce better rankings when the two are kept apart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskMode {
    Document,
    Query,
}

impl TaskMode {
    /// The `taskType` value understood by the Gemini embedding API.
    pub fn as_gemini_str(self) -> &'static str {
        match self {
            TaskMode::Document => "RETRIEVAL_DOCUMENT",
            TaskMode::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// An input document before it has been embedded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    #[serde(default)]
    pub title: String,
    pub text: String,
}

impl Document {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self { title: title.into(), text: text.into() }
    }
}

/// An immutable unit of retrievable content.
///
/// - `text`: body that is matched and shown to the consumer
/// - `title`: short label, also passed to the provider as embedding context
/// - `vector`: embedding of `text` (conditioned on `title` when non-empty)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub title: String,
    pub text: String,
    pub vector: Vector,
}

impl Record {
    pub fn dim(&self) -> usize {
        self.vector.len()
    }
}

/// One ranked hit. `score` is cosine similarity in `[-1, 1]`, or
/// `f64::NEG_INFINITY` when the record's vector had zero norm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredResult {
    pub title: String,
    pub text: String,
    pub score: f64,
}

impl ScoredResult {
    /// True when the score is the sentinel for an undefined similarity.
    pub fn is_degenerate(&self) -> bool {
        self.score == f64::NEG_INFINITY
    }
}
