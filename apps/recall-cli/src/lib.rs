pub mod answer;
pub mod ingest;

pub use answer::{build_prompt, generator_from_settings, AnswerGenerator, GenerationBackend};
pub use ingest::{ingest_documents, IngestReport};
