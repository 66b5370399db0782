//! Deterministic offline embedder.
//!
//! Hashed bag-of-words: each lowercase alphanumeric token lands in one slot
//! with a hash-derived sign, and the result is L2-normalized. Texts sharing
//! tokens get positive cosine similarity; disjoint texts score near zero.
use std::hash::Hasher;
use twox_hash::XxHash64;

use recall_core::{EmbeddingProvider, Error, Result, TaskMode, Vector};

pub const DEFAULT_FAKE_DIM: usize = 256;

pub struct FakeEmbedder {
    dim: usize,
    id: String,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("fake:d{}", dim) }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn add_tokens(&self, v: &mut [f32], text: &str) {
        for token in tokenize(text) {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
    }
}

impl Default for FakeEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_FAKE_DIM)
    }
}

impl EmbeddingProvider for FakeEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn embed(&self, text: &str, title: Option<&str>, mode: TaskMode) -> Result<Vector> {
        if self.dim == 0 {
            return Err(Error::embedding("fake", "dimension must be > 0"));
        }
        let mut v = vec![0f32; self.dim];
        self.add_tokens(&mut v, text);
        // Mirrors Gemini: a title is only accepted for retrieval documents.
        if let (TaskMode::Document, Some(title)) = (mode, title) {
            self.add_tokens(&mut v, title);
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        }
        Ok(v)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}
