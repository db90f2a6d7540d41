//! Batch processing across documents.
//!
//! Documents in a batch are independent: they share only the read-only
//! configuration and the collaborator handles, run in parallel when enabled,
//! and one document's failure never aborts its siblings. The only fatal
//! error is a missing OCR engine at startup, checked before any document is
//! touched.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;

use crate::aggregate::{CleaningSession, PreviewArtifact};
use crate::config::CleaningConfig;
use crate::error::{Error, Result};
use crate::model::Document;
use crate::ocr::chunker::ChunkOrchestrator;
use crate::ocr::OcrEngine;
use crate::pdf::PdfRebuilder;
use crate::report::{BatchReport, DocumentReport, SkippedFile};

/// Cooperative cancellation flag shared across a batch.
///
/// Cancelling stops new documents and new chunks from being issued; work
/// that already merged is left intact.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a batch run is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Produce plans and reports; mutate nothing.
    Preview,
    /// Apply plans previewed by an earlier run.
    Apply,
}

/// Processes a set of documents through the cleaning pipeline.
pub struct BatchRunner<'a> {
    engine: &'a dyn OcrEngine,
    rebuilder: &'a dyn PdfRebuilder,
    config: &'a CleaningConfig,
}

impl<'a> BatchRunner<'a> {
    /// Create a runner, validating the configuration and collaborators.
    ///
    /// A missing OCR engine aborts here, before any document is touched.
    pub fn new(
        engine: &'a dyn OcrEngine,
        rebuilder: &'a dyn PdfRebuilder,
        config: &'a CleaningConfig,
    ) -> Result<Self> {
        config.validate()?;
        if !engine.is_available() {
            return Err(Error::EngineUnavailable(
                "recognition engine did not respond to the availability probe".into(),
            ));
        }
        Ok(Self {
            engine,
            rebuilder,
            config,
        })
    }

    /// Process every file and write the batch report.
    pub fn run(
        &self,
        files: &[PathBuf],
        mode: RunMode,
        cancel: &CancelFlag,
    ) -> Result<BatchReport> {
        fs::create_dir_all(&self.config.output_dir)?;
        fs::create_dir_all(&self.config.report_dir)?;

        let results: Vec<(PathBuf, Result<DocumentReport>)> = if self.config.parallel {
            files
                .par_iter()
                .map(|path| (path.clone(), self.process_document(path, mode, cancel)))
                .collect()
        } else {
            files
                .iter()
                .map(|path| (path.clone(), self.process_document(path, mode, cancel)))
                .collect()
        };

        let mut reports = Vec::new();
        let mut skipped = Vec::new();
        for (path, result) in results {
            match result {
                Ok(report) => reports.push(report),
                Err(err) => {
                    log::error!("skipping {}: {}", path.display(), err);
                    skipped.push(SkippedFile {
                        file_name: path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| path.display().to_string()),
                        error: err.to_string(),
                    });
                }
            }
        }

        let report = BatchReport {
            total_files: files.len(),
            processed: reports.len(),
            skipped,
            preview_mode: mode == RunMode::Preview,
            finished_at: Utc::now(),
            files: reports,
        };
        report.save(&self.config.report_dir.join("batch_report.json"))?;
        Ok(report)
    }

    /// Run one document through extract -> plan -> preview (-> apply).
    fn process_document(
        &self,
        path: &Path,
        mode: RunMode,
        cancel: &CancelFlag,
    ) -> Result<DocumentReport> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let started_at = Utc::now();
        let timer = Instant::now();
        let language = self.config.language_for(path);
        log::info!("processing {} (language {})", path.display(), language);

        // Apply is gated on the artifact a previous preview run wrote for
        // this same input; resolve it before spending OCR time.
        let stem = file_stem(path);
        let stored_token = match mode {
            RunMode::Preview => None,
            RunMode::Apply => {
                let artifact = self.load_preview(&stem).map_err(|_| {
                    Error::Report(format!(
                        "no preview artifact for {}; run preview first",
                        path.display()
                    ))
                })?;
                Some(artifact.token)
            }
        };

        let orchestrator = ChunkOrchestrator::new(self.engine, self.rebuilder, self.config);
        let pages = orchestrator.run(path, &language, cancel)?;
        let document = Document::new(path, language, pages);

        let mut session = CleaningSession::new(self.config, document);
        session.plan()?;
        let artifact = session.preview()?;

        // Only preview runs write the gate artifact; a failed apply must
        // not refresh it and let a retry skip review.
        if mode == RunMode::Preview {
            self.save_preview(&stem, &artifact)?;
        }
        let cleaned_text = session.document().cleaned_text(&artifact.plan);
        fs::write(
            self.config.output_dir.join(format!("{stem}.cleaned.txt")),
            cleaned_text,
        )?;

        if let Some(token) = stored_token {
            let outcome = session.apply(&token, self.rebuilder, &self.config.output_dir)?;
            log::info!(
                "applied {}: {} region(s) removed, backups at {}",
                path.display(),
                outcome.removed,
                outcome.backups.cleaned.display()
            );
        }

        let report = DocumentReport::new(
            session.document(),
            session.current_plan().expect("session was planned"),
            session.detection().expect("session was planned"),
            started_at,
            timer.elapsed().as_secs_f64(),
        );
        report.save(&self.config.report_dir.join(format!("{stem}.report.json")))?;
        Ok(report)
    }

    fn preview_path(&self, stem: &str) -> PathBuf {
        self.config.report_dir.join(format!("{stem}.preview.json"))
    }

    fn save_preview(&self, stem: &str, artifact: &PreviewArtifact) -> Result<()> {
        let json = serde_json::to_string_pretty(artifact)?;
        fs::write(self.preview_path(stem), json)?;
        Ok(())
    }

    /// Load the preview artifact a prior run wrote for `stem`.
    pub fn load_preview(&self, stem: &str) -> Result<PreviewArtifact> {
        let json = fs::read_to_string(self.preview_path(stem))?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());

        let shared = flag.clone();
        shared.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("in/annual_report.pdf")), "annual_report");
    }
}
