//! Integration tests for chunked OCR orchestration.

use std::ops::Range;
use std::path::Path;
use std::sync::Mutex;

use naqi::ocr::chunker::{partition, ChunkOrchestrator};
use naqi::{
    BBox, CancelFlag, CleaningConfig, Error, Language, OcrEngine, PageOcr, PdfRebuilder,
    RecognizedLine, Result,
};

/// Engine that fabricates one page per requested index and records the
/// ranges it was called with.
struct MockEngine {
    calls: Mutex<Vec<Range<usize>>>,
}

impl MockEngine {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    fn recorded_calls(&self) -> Vec<Range<usize>> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort_by_key(|r| r.start);
        calls
    }
}

impl OcrEngine for MockEngine {
    fn is_available(&self) -> bool {
        true
    }

    fn recognize(
        &self,
        _source: &Path,
        pages: Range<usize>,
        _language: &Language,
    ) -> Result<Vec<PageOcr>> {
        self.calls.lock().unwrap().push(pages.clone());
        Ok(pages
            .map(|index| {
                let mut ocr = PageOcr::new(595.0, 842.0);
                ocr.confidence = 0.9;
                ocr.lines.push(RecognizedLine::new(
                    format!("Body of page {index}"),
                    BBox::new(50.0, 400.0, 545.0, 415.0),
                ));
                ocr
            })
            .collect())
    }
}

/// Engine that silently drops the last page of every chunk.
struct ShortEngine;

impl OcrEngine for ShortEngine {
    fn is_available(&self) -> bool {
        true
    }

    fn recognize(
        &self,
        _source: &Path,
        pages: Range<usize>,
        _language: &Language,
    ) -> Result<Vec<PageOcr>> {
        Ok(pages.skip(1).map(|_| PageOcr::new(595.0, 842.0)).collect())
    }
}

struct MockRebuilder {
    pages: usize,
}

impl PdfRebuilder for MockRebuilder {
    fn page_count(&self, _source: &Path) -> Result<usize> {
        Ok(self.pages)
    }

    fn rebuild(
        &self,
        _source: &Path,
        _remove: &[naqi::model::RemoveRegion],
        output: &Path,
    ) -> Result<()> {
        std::fs::write(output, b"%PDF-1.7 rebuilt")?;
        Ok(())
    }
}

#[test]
fn test_450_pages_split_into_three_chunks() {
    let engine = MockEngine::new();
    let rebuilder = MockRebuilder { pages: 450 };
    let config = CleaningConfig::new().with_chunk_size(200);

    let orchestrator = ChunkOrchestrator::new(&engine, &rebuilder, &config);
    let pages = orchestrator
        .run(Path::new("large.pdf"), &Language::AraEng, &CancelFlag::new())
        .unwrap();

    assert_eq!(pages.len(), 450);
    assert!(pages.iter().enumerate().all(|(i, p)| p.index == i));
    assert_eq!(engine.recorded_calls(), vec![0..200, 200..400, 400..450]);
}

#[test]
fn test_merge_is_lossless_for_any_chunk_size() {
    for chunk_size in [1, 3, 7, 50, 200, 1000] {
        let engine = MockEngine::new();
        let rebuilder = MockRebuilder { pages: 37 };
        let config = CleaningConfig::new().with_chunk_size(chunk_size);

        let orchestrator = ChunkOrchestrator::new(&engine, &rebuilder, &config);
        let pages = orchestrator
            .run(Path::new("doc.pdf"), &Language::Eng, &CancelFlag::new())
            .unwrap();

        assert_eq!(pages.len(), 37, "chunk_size {chunk_size} changed page count");
        assert!(pages.iter().enumerate().all(|(i, p)| p.index == i));
    }
}

#[test]
fn test_merge_preserves_page_content_order() {
    let engine = MockEngine::new();
    let rebuilder = MockRebuilder { pages: 25 };
    let config = CleaningConfig::new().with_chunk_size(10);

    let orchestrator = ChunkOrchestrator::new(&engine, &rebuilder, &config);
    let pages = orchestrator
        .run(Path::new("doc.pdf"), &Language::Eng, &CancelFlag::new())
        .unwrap();

    for (i, page) in pages.iter().enumerate() {
        assert_eq!(page.text_blocks[0].text, format!("Body of page {i}"));
    }
}

#[test]
fn test_short_chunk_fails_the_document() {
    let engine = ShortEngine;
    let rebuilder = MockRebuilder { pages: 20 };
    let config = CleaningConfig::new().with_chunk_size(10).sequential();

    let orchestrator = ChunkOrchestrator::new(&engine, &rebuilder, &config);
    let result = orchestrator.run(Path::new("doc.pdf"), &Language::Eng, &CancelFlag::new());

    match result {
        Err(Error::ChunkMerge { expected, actual }) => {
            assert_eq!(expected, 10);
            assert_eq!(actual, 9);
        }
        other => panic!("expected ChunkMerge, got {other:?}"),
    }
}

#[test]
fn test_cancelled_document_produces_no_pages() {
    let engine = MockEngine::new();
    let rebuilder = MockRebuilder { pages: 100 };
    let config = CleaningConfig::new().with_chunk_size(10);

    let cancel = CancelFlag::new();
    cancel.cancel();

    let orchestrator = ChunkOrchestrator::new(&engine, &rebuilder, &config);
    let result = orchestrator.run(Path::new("doc.pdf"), &Language::Eng, &cancel);
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn test_rerun_is_idempotent() {
    let rebuilder = MockRebuilder { pages: 30 };
    let config = CleaningConfig::new().with_chunk_size(8);

    let run = || {
        let engine = MockEngine::new();
        let orchestrator = ChunkOrchestrator::new(&engine, &rebuilder, &config);
        orchestrator
            .run(Path::new("doc.pdf"), &Language::AraEng, &CancelFlag::new())
            .unwrap()
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_partition_covers_without_overlap() {
    let ranges = partition(1003, 97);
    assert_eq!(ranges.iter().map(|r| r.len()).sum::<usize>(), 1003);
    for pair in ranges.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
}
