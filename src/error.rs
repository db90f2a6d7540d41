//! Error types for the naqi cleaning engine.

use std::io;
use thiserror::Error;

/// Result type alias for naqi operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while cleaning a document batch.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required collaborator (OCR engine) is missing at startup.
    ///
    /// Raised before any document is touched; never a per-document failure.
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Error reading or rewriting the source PDF.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// The OCR collaborator failed for one document.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// A chunk produced a different number of pages than its declared range.
    ///
    /// Silent page loss is the worst failure mode for these documents, so
    /// the whole document fails rather than merging a short sequence.
    #[error("chunk merge mismatch: expected {expected} pages, got {actual}")]
    ChunkMerge {
        /// Pages the chunk range covered.
        expected: usize,
        /// Pages the OCR pass actually returned.
        actual: usize,
    },

    /// A state-machine transition was requested out of order.
    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition {
        /// Stage the session was in.
        from: &'static str,
        /// Stage that was requested.
        to: &'static str,
    },

    /// The apply step received a token that does not match the previewed plan.
    #[error("cleaning plan does not match the previewed plan")]
    PlanMismatch,

    /// A region marked for removal satisfies the table-protection predicate.
    ///
    /// Internal defect; aborts the apply step for the document.
    #[error("table-protection invariant violated: {0}")]
    InvariantViolation(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The batch was cancelled before this work item started.
    #[error("cancelled before processing started")]
    Cancelled,

    /// Report or artifact serialization failure.
    #[error("report error: {0}")]
    Report(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::Pdf(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Report(err.to_string())
    }
}
