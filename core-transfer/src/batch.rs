//! # Batch Orchestrator
//!
//! Runs the [`TransferEngine`] over a list of documents, one at a time.
//! Downloads are strictly sequential so the remote side sees the same
//! request rate as during enumeration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use core_library::models::DocumentDescriptor;
use core_runtime::logging::LogContext;
use tracing::{info, warn, Instrument};

use crate::engine::TransferEngine;
use crate::error::{DownloadError, Result};

/// Called after every attempt with `(completed, total)`.
pub type ProgressFn = dyn Fn(usize, usize) + Send + Sync;

/// Outcome of a batch run.
///
/// `results` is keyed by the document's original name; when two documents
/// share a name the later one wins, so use the counters for totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport<T> {
    pub results: HashMap<String, T>,
    pub attempted: usize,
    pub succeeded: usize,
}

impl<T> BatchReport<T> {
    fn new() -> Self {
        Self {
            results: HashMap::new(),
            attempted: 0,
            succeeded: 0,
        }
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

pub struct BatchOrchestrator {
    engine: Arc<TransferEngine>,
    log: LogContext,
}

impl BatchOrchestrator {
    pub fn new(engine: Arc<TransferEngine>, log: LogContext) -> Self {
        Self {
            engine,
            log: log.component("batch"),
        }
    }

    pub fn engine(&self) -> &TransferEngine {
        &self.engine
    }

    /// Download every document below `root`.
    ///
    /// Failed documents are logged and left out of `results`; they never
    /// stop the batch.
    pub async fn download_all(
        &self,
        documents: &[DocumentDescriptor],
        root: &Path,
        on_progress: Option<&ProgressFn>,
    ) -> BatchReport<PathBuf> {
        let span = self.log.operation("download_all");
        async {
            let total = documents.len();
            let mut report = BatchReport::new();
            info!(total, root = %root.display(), "Starting batch download");

            for (index, doc) in documents.iter().enumerate() {
                report.attempted += 1;
                match self.engine.download(doc, root).await {
                    Ok(path) => {
                        report.succeeded += 1;
                        report.results.insert(doc.name.clone(), path);
                    }
                    Err(e) => log_failure(doc, &e),
                }
                if let Some(progress) = on_progress {
                    progress(index + 1, total);
                }
            }

            info!(
                succeeded = report.succeeded,
                failed = report.failed(),
                "Batch download finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    /// Download and ingest every document below `root`.
    ///
    /// Every document appears in `results`: `true` when both steps worked.
    ///
    /// # Errors
    ///
    /// [`DownloadError::IngestionNotConfigured`] before anything is
    /// downloaded when the engine has no ingestor.
    pub async fn download_all_and_ingest(
        &self,
        documents: &[DocumentDescriptor],
        root: &Path,
        on_progress: Option<&ProgressFn>,
    ) -> Result<BatchReport<bool>> {
        if !self.engine.has_ingestor() {
            return Err(DownloadError::IngestionNotConfigured);
        }

        let span = self.log.operation("download_all_and_ingest");
        let report = async {
            let total = documents.len();
            let mut report = BatchReport::new();
            info!(total, root = %root.display(), "Starting batch download with ingestion");

            for (index, doc) in documents.iter().enumerate() {
                report.attempted += 1;
                let ok = match self.engine.download_and_ingest(doc, root).await {
                    Ok(_) => true,
                    Err(e) => {
                        log_failure(doc, &e);
                        false
                    }
                };
                if ok {
                    report.succeeded += 1;
                }
                report.results.insert(doc.name.clone(), ok);
                if let Some(progress) = on_progress {
                    progress(index + 1, total);
                }
            }

            info!(
                succeeded = report.succeeded,
                failed = report.failed(),
                "Batch ingestion finished"
            );
            report
        }
        .instrument(span)
        .await;

        Ok(report)
    }
}

fn log_failure(doc: &DocumentDescriptor, error: &DownloadError) {
    warn!(
        document = %doc.name,
        library = %doc.library_name,
        folder = %doc.folder_path,
        error = %error,
        "Document failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report: BatchReport<bool> = BatchReport::new();
        report.attempted = 5;
        report.succeeded = 3;
        assert_eq!(report.failed(), 2);
    }
}
