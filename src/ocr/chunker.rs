//! Chunked OCR orchestration.
//!
//! Large documents are partitioned into bounded page ranges so peak memory
//! stays at roughly one chunk's worth of rasters on the engine side. Each
//! chunk is recognized independently (on the rayon pool when parallelism is
//! enabled) and the results merge back into one contiguous page sequence in
//! ascending index order. A chunk whose page count does not match its
//! declared range fails the whole document: a short merge would silently
//! lose pages.

use std::ops::Range;
use std::path::Path;

use rayon::prelude::*;

use crate::batch::CancelFlag;
use crate::config::CleaningConfig;
use crate::error::{Error, Result};
use crate::layout;
use crate::model::{Language, Page};
use crate::ocr::OcrEngine;
use crate::pdf::PdfRebuilder;

/// Partition `[0, page_count)` into consecutive ranges of at most
/// `chunk_size` pages.
pub fn partition(page_count: usize, chunk_size: usize) -> Vec<Range<usize>> {
    assert!(chunk_size > 0, "chunk_size must be nonzero");
    let mut ranges = Vec::with_capacity(page_count.div_ceil(chunk_size));
    let mut start = 0;
    while start < page_count {
        let end = (start + chunk_size).min(page_count);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// A transient chunk: its range and the pages it produced.
///
/// Exists only between recognition and merge; merging consumes it and hands
/// page ownership to the document.
struct Chunk {
    range: Range<usize>,
    pages: Vec<Page>,
}

/// Drives the OCR engine chunk by chunk and merges the results.
pub struct ChunkOrchestrator<'a> {
    engine: &'a dyn OcrEngine,
    rebuilder: &'a dyn PdfRebuilder,
    config: &'a CleaningConfig,
}

impl<'a> ChunkOrchestrator<'a> {
    /// Create an orchestrator over the given collaborators.
    pub fn new(
        engine: &'a dyn OcrEngine,
        rebuilder: &'a dyn PdfRebuilder,
        config: &'a CleaningConfig,
    ) -> Self {
        Self {
            engine,
            rebuilder,
            config,
        }
    }

    /// Recognize the whole document and return its ordered page sequence.
    ///
    /// Either every chunk merges and the sequence covers all pages, or the
    /// document fails with no page sequence at all.
    pub fn run(
        &self,
        source: &Path,
        language: &Language,
        cancel: &CancelFlag,
    ) -> Result<Vec<Page>> {
        let page_count = self.rebuilder.page_count(source)?;
        let ranges = partition(page_count, self.config.chunk_size);
        log::info!(
            "{}: {} pages in {} chunk(s) of up to {}",
            source.display(),
            page_count,
            ranges.len(),
            self.config.chunk_size
        );

        let chunks: Vec<Result<Chunk>> = if self.config.parallel {
            ranges
                .into_par_iter()
                .map(|range| self.process_chunk(source, range, language, cancel))
                .collect()
        } else {
            ranges
                .into_iter()
                .map(|range| self.process_chunk(source, range, language, cancel))
                .collect()
        };

        // Ordered collection above is the join barrier: chunks may finish in
        // any order, the merge below always walks them in ascending range
        // order.
        let mut pages = Vec::with_capacity(page_count);
        for chunk in chunks {
            let chunk = chunk?;
            log::debug!(
                "{}: merged chunk {}..{}",
                source.display(),
                chunk.range.start,
                chunk.range.end
            );
            pages.extend(chunk.pages);
        }

        if pages.len() != page_count {
            return Err(Error::ChunkMerge {
                expected: page_count,
                actual: pages.len(),
            });
        }
        debug_assert!(pages.iter().enumerate().all(|(i, p)| p.index == i));

        Ok(pages)
    }

    fn process_chunk(
        &self,
        source: &Path,
        range: Range<usize>,
        language: &Language,
        cancel: &CancelFlag,
    ) -> Result<Chunk> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let expected = range.len();
        let outputs = self.engine.recognize(source, range.clone(), language)?;
        if outputs.len() != expected {
            return Err(Error::ChunkMerge {
                expected,
                actual: outputs.len(),
            });
        }

        let pages = outputs
            .into_iter()
            .enumerate()
            .map(|(offset, ocr)| layout::page_from_ocr(range.start + offset, ocr, self.config))
            .collect();

        Ok(Chunk { range, pages })
    }
}
