//! Layout extraction: raw OCR output into normalized pages.
//!
//! Thin adapter between the OCR collaborator and the decision engine. Text
//! is NFC-normalized and direction-tagged here; image regions get their
//! area fraction computed against the page area. Nothing downstream ever
//! touches raw engine output.

use crate::config::CleaningConfig;
use crate::model::{ImageRegion, Page, TextBlock};
use crate::ocr::PageOcr;

/// Fallback font size when a line's bbox height is degenerate.
const DEFAULT_FONT_SIZE: f32 = 10.0;

/// Fraction of line height attributed to the glyph body (the rest is
/// leading).
const LINE_HEIGHT_RATIO: f32 = 0.8;

/// Convert one page of raw OCR output into a [`Page`].
pub fn page_from_ocr(index: usize, ocr: PageOcr, _config: &CleaningConfig) -> Page {
    let mut page = Page::new(index, ocr.width, ocr.height);
    page.ocr_confidence = ocr.confidence.clamp(0.0, 1.0);

    let page_area = (ocr.width * ocr.height).max(f32::MIN_POSITIVE);

    for line in ocr.lines {
        if line.text.trim().is_empty() {
            continue;
        }
        let font_size = estimate_font_size(line.bbox.height());
        page.text_blocks
            .push(TextBlock::new(line.text, line.bbox, font_size));
    }

    for image in ocr.images {
        let area_fraction = if image.area_fraction > 0.0 {
            image.area_fraction
        } else {
            (image.bbox.area() / page_area).clamp(0.0, 1.0)
        };
        page.images.push(ImageRegion::new(
            image.bbox,
            area_fraction,
            image.ocr_line_count,
            image.has_table_structure,
        ));
    }

    page
}

/// Estimate a font size from the line bbox height.
fn estimate_font_size(line_height: f32) -> f32 {
    if line_height <= 0.0 {
        DEFAULT_FONT_SIZE
    } else {
        line_height * LINE_HEIGHT_RATIO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, Direction};
    use crate::ocr::RecognizedLine;

    #[test]
    fn test_page_from_ocr_normalizes_blocks() {
        let mut ocr = PageOcr::new(595.0, 842.0);
        ocr.confidence = 0.92;
        ocr.lines.push(RecognizedLine::new(
            "التقرير السنوي",
            BBox::new(40.0, 30.0, 300.0, 45.0),
        ));
        ocr.lines
            .push(RecognizedLine::new("   ", BBox::new(0.0, 0.0, 5.0, 5.0)));

        let page = page_from_ocr(3, ocr, &CleaningConfig::default());
        assert_eq!(page.index, 3);
        assert_eq!(page.ocr_confidence, 0.92);
        // Blank line dropped.
        assert_eq!(page.text_blocks.len(), 1);
        assert_eq!(page.text_blocks[0].direction, Direction::Rtl);
        assert!((page.text_blocks[0].font_size - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_page_from_ocr_computes_area_fraction() {
        let mut ocr = PageOcr::new(100.0, 100.0);
        ocr.images.push(ImageRegion::new(
            BBox::new(0.0, 0.0, 10.0, 10.0),
            0.0, // left for the extractor to compute
            0,
            false,
        ));

        let page = page_from_ocr(0, ocr, &CleaningConfig::default());
        assert!((page.images[0].area_fraction - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_page_from_ocr_keeps_engine_area_fraction() {
        let mut ocr = PageOcr::new(100.0, 100.0);
        ocr.images.push(ImageRegion::new(
            BBox::new(0.0, 0.0, 10.0, 10.0),
            0.25,
            0,
            false,
        ));

        let page = page_from_ocr(0, ocr, &CleaningConfig::default());
        assert_eq!(page.images[0].area_fraction, 0.25);
    }

    #[test]
    fn test_font_size_fallback() {
        assert_eq!(estimate_font_size(0.0), DEFAULT_FONT_SIZE);
        assert_eq!(estimate_font_size(-2.0), DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_confidence_clamped() {
        let mut ocr = PageOcr::new(100.0, 100.0);
        ocr.confidence = 1.7;
        let page = page_from_ocr(0, ocr, &CleaningConfig::default());
        assert_eq!(page.ocr_confidence, 1.0);
    }
}
