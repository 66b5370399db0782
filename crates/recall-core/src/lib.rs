#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod documents;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::EmbeddingProvider;
pub use types::{Document, Record, ScoredResult, TaskMode, Vector};
