//! # naqi
//!
//! Cleaning decision engine for bilingual (Arabic/English) scanned
//! documents.
//!
//! naqi decides — without ever altering surviving text — which page regions
//! and embedded images are noise (repeated headers and footers, decorative
//! imagery) versus protected content (tables, substantive text), and
//! produces a cleaned artifact safe for downstream semantic indexing.
//!
//! ## Pipeline
//!
//! ```text
//! Layout Extractor -> Chunk Orchestrator -> { Detector, Classifier } -> Aggregator
//! ```
//!
//! Each stage consumes and produces an immutable value: the orchestrator
//! merges chunked OCR output into an ordered [`model::Page`] sequence, the
//! repeated-element detector and the region classifier score that snapshot
//! independently, and the aggregator merges their outputs into one
//! [`model::CleaningPlan`] gated by the preview/apply state machine.
//!
//! ## Quick Start
//!
//! ```no_run
//! use naqi::{BatchRunner, CancelFlag, CleaningConfig, LopdfRebuilder, RunMode};
//! use std::path::PathBuf;
//!
//! fn main() -> naqi::Result<()> {
//!     let config = CleaningConfig::new().with_chunk_size(200);
//!     let rebuilder = LopdfRebuilder::new();
//!     # let engine = naqi::doctest_support::NullEngine;
//!     let runner = BatchRunner::new(&engine, &rebuilder, &config)?;
//!
//!     let files = vec![PathBuf::from("context/annual_report.pdf")];
//!     let report = runner.run(&files, RunMode::Preview, &CancelFlag::new())?;
//!     println!("processed {} of {}", report.processed, report.total_files);
//!     Ok(())
//! }
//! ```
//!
//! ## Safety guarantees
//!
//! - An image region with at least the configured minimum of recognized
//!   text lines is never removed (table protection), enforced as a runtime
//!   assertion before any apply.
//! - Preview mode never deletes or mutates anything.
//! - Apply either leaves all three backups (raw, post-OCR, cleaned) or none.

pub mod aggregate;
pub mod batch;
pub mod classify;
pub mod config;
pub mod detect;
pub mod error;
pub mod layout;
pub mod model;
pub mod ocr;
pub mod pdf;
pub mod report;

// Re-export commonly used types
pub use aggregate::{backup::BackupSet, ApplyOutcome, CleaningSession, PreviewArtifact};
pub use batch::{BatchRunner, CancelFlag, RunMode};
pub use classify::{classify_region, RegionClass};
pub use config::CleaningConfig;
pub use detect::{Algorithm, Band, BandDetection, DetectionOutcome, RepeatedElementDetector};
pub use error::{Error, Result};
pub use model::{
    BBox, CleaningPlan, Direction, Document, ImageRegion, KeepReason, Language, Page, PlanMode,
    PlanToken, RemoveReason, TextBlock,
};
pub use ocr::{chunker::ChunkOrchestrator, OcrEngine, PageOcr, RecognizedLine};
pub use pdf::{LopdfRebuilder, PdfRebuilder};
pub use report::{BatchReport, DocumentReport};

/// Support types for documentation examples. Not part of the public API.
#[doc(hidden)]
pub mod doctest_support {
    use super::*;
    use std::ops::Range;
    use std::path::Path;

    /// Engine stub used by crate-level doc examples.
    pub struct NullEngine;

    impl OcrEngine for NullEngine {
        fn is_available(&self) -> bool {
            true
        }

        fn recognize(
            &self,
            _source: &Path,
            pages: Range<usize>,
            _language: &Language,
        ) -> Result<Vec<PageOcr>> {
            Ok(pages.map(|_| PageOcr::new(595.0, 842.0)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports_compose() {
        let config = CleaningConfig::new().with_detection_threshold(0.9);
        assert!(config.validate().is_ok());

        let region = ImageRegion::new(BBox::new(0.0, 0.0, 10.0, 10.0), 0.01, 5, false);
        assert_eq!(
            classify_region(&region, &config),
            RegionClass::Keep(KeepReason::TableProtected)
        );
    }
}
