//! OCR collaborator abstraction.
//!
//! The recognition engine is an external black box behind the [`OcrEngine`]
//! trait: it takes a source document and a page range, performs its own
//! rasterization, and returns recognized lines with bounding boxes and a
//! page-level confidence. Concrete adapters live outside the library core
//! (the CLI ships a subprocess-based one); tests use mocks.

pub mod chunker;

use std::ops::Range;
use std::path::Path;

use crate::error::Result;
use crate::model::{BBox, ImageRegion, Language};

/// One recognized text line inside a page.
#[derive(Debug, Clone)]
pub struct RecognizedLine {
    /// Recognized text, exactly as the engine produced it.
    pub text: String,
    /// Line position on the page.
    pub bbox: BBox,
}

impl RecognizedLine {
    /// Create a recognized line.
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// Raw per-page OCR output, before layout normalization.
#[derive(Debug, Clone)]
pub struct PageOcr {
    /// Page width in page units.
    pub width: f32,
    /// Page height in page units.
    pub height: f32,
    /// Recognized lines in engine order.
    pub lines: Vec<RecognizedLine>,
    /// Image regions observed on the page.
    pub images: Vec<ImageRegion>,
    /// Page confidence in [0, 1].
    pub confidence: f32,
}

impl PageOcr {
    /// Create an empty page result.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            lines: Vec::new(),
            images: Vec::new(),
            confidence: 0.0,
        }
    }
}

/// Abstract interface to the external OCR engine.
///
/// Implementations must be safe to call from the rayon worker pool; the
/// orchestrator issues at most one in-flight call per chunk.
pub trait OcrEngine: Send + Sync {
    /// Whether the engine can run at all. A `false` here is a fatal startup
    /// error for the batch, checked before any document is touched.
    fn is_available(&self) -> bool;

    /// Recognize a contiguous page range of `source`.
    ///
    /// Must return exactly one [`PageOcr`] per page in `pages`, in ascending
    /// page order. Runs to completion or fails; no partial results are
    /// consumed.
    fn recognize(
        &self,
        source: &Path,
        pages: Range<usize>,
        language: &Language,
    ) -> Result<Vec<PageOcr>>;
}
