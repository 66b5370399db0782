//! Append-only in-memory corpus and the linear-scan ranking over it.

use tracing::warn;

use recall_core::{Error, Record, Result, ScoredResult};

use crate::similarity::{cosine_similarity, l2_norm};

/// Records in insertion order. Append is the only mutation; the first record
/// fixes the dimensionality for the rest.
#[derive(Debug, Default, Clone)]
pub struct Corpus {
    records: Vec<Record>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dimensionality of the stored vectors, `None` until the first append.
    pub fn dim(&self) -> Option<usize> {
        self.records.first().map(Record::dim)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Append `record`. Fails without touching the corpus when its vector is
    /// empty, holds NaN or infinite components, or its length differs from the
    /// records already stored.
    pub fn push(&mut self, record: Record) -> Result<()> {
        if record.vector.is_empty() {
            return Err(Error::DimensionMismatch { expected: self.dim().unwrap_or(0), got: 0 });
        }
        if !all_finite(&record.vector) {
            return Err(Error::DegenerateVector(format!("record {:?} has non-finite components", record.title)));
        }
        if let Some(expected) = self.dim() {
            if record.dim() != expected {
                return Err(Error::DimensionMismatch { expected, got: record.dim() });
            }
        }
        self.records.push(record);
        Ok(())
    }

    /// Score every record against `query` and return them best first.
    ///
    /// Ties keep insertion order. A zero-norm record scores
    /// `f64::NEG_INFINITY`. A zero-norm or non-finite query is an error
    /// because no record can be ranked against it.
    pub fn rank(&self, query: &[f32], top_k: Option<usize>) -> Result<Vec<ScoredResult>> {
        if self.records.is_empty() || top_k == Some(0) {
            return Ok(Vec::new());
        }
        if let Some(expected) = self.dim() {
            if query.len() != expected {
                return Err(Error::DimensionMismatch { expected, got: query.len() });
            }
        }
        if !all_finite(query) {
            return Err(Error::DegenerateVector("query embedding has non-finite components".to_string()));
        }
        if l2_norm(query) == 0.0 {
            return Err(Error::DegenerateVector("query embedding has zero norm".to_string()));
        }

        let mut scored = Vec::with_capacity(self.records.len());
        for (idx, record) in self.records.iter().enumerate() {
            let score = match cosine_similarity(&record.vector, query) {
                Ok(s) => s,
                Err(Error::DegenerateVector(_)) => {
                    warn!(idx, title = %record.title, "record embedding has zero norm; ranking it last");
                    f64::NEG_INFINITY
                }
                Err(e) => return Err(e),
            };
            scored.push(ScoredResult { title: record.title.clone(), text: record.text.clone(), score });
        }

        // stable: equal scores stay in corpus order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        if let Some(k) = top_k {
            scored.truncate(k);
        }
        Ok(scored)
    }
}

fn all_finite(v: &[f32]) -> bool {
    v.iter().all(|x| x.is_finite())
}
