//! Semantic retrieval over a small in-memory corpus.
//!
//! Records are embedded once at ingest and ranked by a full linear scan of
//! cosine similarity per query. No index structure; meant for corpora of a
//! few dozen to a few thousand records.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod corpus;
pub mod search;
pub mod similarity;

pub use corpus::Corpus;
pub use search::SemanticSearchEngine;
pub use similarity::cosine_similarity;
