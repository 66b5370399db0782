use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use recall_core::config::OnError;
use recall_core::{Document, Result};
use recall_vector::SemanticSearchEngine;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub ingested: usize,
    /// `(index into the input, error message)` for skipped documents.
    pub skipped: Vec<(usize, String)>,
}

/// Ingest `docs` one by one. Under [`OnError::Abort`] the first failure is
/// returned; under [`OnError::Skip`] it is logged and recorded in the report.
pub fn ingest_documents(
    engine: &SemanticSearchEngine,
    docs: &[Document],
    on_error: OnError,
    progress: bool,
) -> Result<IngestReport> {
    let pb = if progress { ProgressBar::new(docs.len() as u64) } else { ProgressBar::hidden() };
    if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}") {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut report = IngestReport::default();
    for (i, doc) in docs.iter().enumerate() {
        pb.set_message(doc.title.clone());
        match engine.ingest_document(doc) {
            Ok(_) => report.ingested += 1,
            Err(e) if on_error == OnError::Skip => {
                warn!(index = i, title = %doc.title, error = %e, "skipping document");
                report.skipped.push((i, e.to_string()));
            }
            Err(e) => {
                pb.abandon_with_message("ingest aborted");
                return Err(e);
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");
    Ok(report)
}
