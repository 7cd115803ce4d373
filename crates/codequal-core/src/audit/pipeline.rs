use std::fs;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use super::{file_scanner::FileScanner, FailureKind, ProjectReport};
use crate::extract::ResponseExtractor;
use crate::llm::{analysis_request, ModelGateway};

/// Sequential audit pipeline: scan, analyse each file through the model
/// gateway, extract, aggregate.
///
/// Files are processed one at a time in scan order. A failure while handling
/// one file (read, gateway, extraction) is logged, recorded against that file,
/// and never stops the run.
pub struct Auditor<G: ModelGateway> {
    gateway: G,
    scanner: FileScanner,
    model: String,
    repair_model: String,
}

impl<G: ModelGateway> Auditor<G> {
    pub fn new(
        gateway: G,
        scanner: FileScanner,
        model: impl Into<String>,
        repair_model: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            scanner,
            model: model.into(),
            repair_model: repair_model.into(),
        }
    }

    /// Audit every eligible file under `root` and return the project report.
    ///
    /// Always succeeds: per-file errors are folded into the report as
    /// failures, keeping one ratings entry per attempted file.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub async fn audit(&self, root: &Path) -> ProjectReport {
        let files = self.scanner.scan(root);
        info!(files = files.len(), "starting project audit");

        let mut report = ProjectReport::default();
        let extractor = ResponseExtractor::new(&self.gateway, self.repair_model.clone());
        for path in &files {
            self.audit_file(path, &extractor, &mut report).await;
        }

        info!(
            files = report.files_attempted(),
            failures = report.failures.len(),
            "project audit finished"
        );
        report
    }

    async fn audit_file(
        &self,
        path: &Path,
        extractor: &ResponseExtractor<'_, G>,
        report: &mut ProjectReport,
    ) {
        debug!(file = %path.display(), "analysing file");
        let code = match fs::read_to_string(path) {
            Ok(code) => code,
            Err(err) => {
                warn!(file = %path.display(), %err, "file unreadable, skipping");
                report.record_failure(path, FailureKind::Read, err.to_string());
                return;
            }
        };

        let request = analysis_request(&self.model, &code);
        let raw = match self.gateway.chat(&request).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(file = %path.display(), %err, "model call failed");
                report.record_failure(path, FailureKind::Gateway, err.to_string());
                return;
            }
        };

        match extractor.extract(&raw).await {
            Ok(analysis) => {
                debug!(
                    file = %path.display(),
                    rating = analysis.code_quality_rating,
                    "analysis recorded"
                );
                report.record(path, analysis);
            }
            Err(err) => {
                warn!(file = %path.display(), %err, "no structured result recovered");
                report.record_failure(path, FailureKind::Extraction, err.to_string());
            }
        }
    }
}
