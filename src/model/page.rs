//! Page-level types.
//!
//! Pages and their text blocks and image regions are created once per OCR
//! pass and never partially mutated; a reprocessed chunk replaces its pages
//! wholesale.

use serde::{Deserialize, Serialize};
use unicode_bidi::{bidi_class, BidiClass};
use unicode_normalization::UnicodeNormalization;

/// An axis-aligned bounding box in page units, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge.
    pub x0: f32,
    /// Top edge.
    pub y0: f32,
    /// Right edge.
    pub x1: f32,
    /// Bottom edge.
    pub y1: f32,
}

impl BBox {
    /// Create a new bounding box.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Box width.
    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    /// Box height.
    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    /// Box area.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Center point as (x, y).
    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Approximate equality, used to relate plan regions back to the
    /// regions they were derived from.
    pub fn approx_eq(&self, other: &BBox, epsilon: f32) -> bool {
        (self.x0 - other.x0).abs() <= epsilon
            && (self.y0 - other.y0).abs() <= epsilon
            && (self.x1 - other.x1).abs() <= epsilon
            && (self.y1 - other.y1).abs() <= epsilon
    }
}

/// Dominant text direction of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Left-to-right (Latin).
    Ltr,
    /// Right-to-left (Arabic).
    Rtl,
}

/// Infer the dominant direction of a text fragment from Unicode bidi
/// classes: R and AL characters vote right-to-left, L characters vote
/// left-to-right. Digits and neutrals do not vote; ties resolve to LTR.
pub fn infer_direction(text: &str) -> Direction {
    let mut rtl = 0usize;
    let mut ltr = 0usize;
    for ch in text.chars() {
        match bidi_class(ch) {
            BidiClass::R | BidiClass::AL => rtl += 1,
            BidiClass::L => ltr += 1,
            _ => {}
        }
    }
    if rtl > ltr {
        Direction::Rtl
    } else {
        Direction::Ltr
    }
}

/// A block of recognized text on a page.
///
/// The text is NFC-normalized at construction and otherwise untouched: no
/// reshaping, no spelling correction, no whitespace rewriting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    /// Recognized text (NFC).
    pub text: String,

    /// Position on the page.
    pub bbox: BBox,

    /// Font size in page units (estimated from line height when the OCR
    /// engine reports none).
    pub font_size: f32,

    /// Inferred dominant direction.
    pub direction: Direction,
}

impl TextBlock {
    /// Create a block, applying NFC normalization and direction inference.
    pub fn new(text: impl Into<String>, bbox: BBox, font_size: f32) -> Self {
        let text: String = text.into().nfc().collect();
        let direction = infer_direction(&text);
        Self {
            text,
            bbox,
            font_size,
            direction,
        }
    }
}

/// An embedded image region on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRegion {
    /// Position on the page.
    pub bbox: BBox,

    /// Image area divided by page area, in [0, 1].
    pub area_fraction: f32,

    /// Text lines the OCR pass recognized inside this bbox.
    pub ocr_line_count: u32,

    /// Structural signal from line/edge density heuristics (grid or ruling
    /// lines detected).
    pub has_table_structure: bool,
}

impl ImageRegion {
    /// Create a new image region.
    pub fn new(bbox: BBox, area_fraction: f32, ocr_line_count: u32, has_table_structure: bool) -> Self {
        Self {
            bbox,
            area_fraction,
            ocr_line_count,
            has_table_structure,
        }
    }
}

/// A single page of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// 0-based page index, immutable for the page's lifetime.
    pub index: usize,

    /// Page width in page units.
    pub width: f32,

    /// Page height in page units.
    pub height: f32,

    /// Recognized text blocks, in reading order as returned by OCR.
    pub text_blocks: Vec<TextBlock>,

    /// Embedded image regions.
    pub images: Vec<ImageRegion>,

    /// Page-level OCR confidence in [0, 1].
    pub ocr_confidence: f32,
}

impl Page {
    /// Create an empty page.
    pub fn new(index: usize, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            text_blocks: Vec::new(),
            images: Vec::new(),
            ocr_confidence: 0.0,
        }
    }

    /// Check whether the page has no recognized content.
    pub fn is_empty(&self) -> bool {
        self.text_blocks.is_empty() && self.images.is_empty()
    }

    /// Plain text of the page, blocks joined by newlines.
    pub fn plain_text(&self) -> String {
        self.text_blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Dominant direction over the page's blocks.
    pub fn dominant_direction(&self) -> Direction {
        let rtl = self
            .text_blocks
            .iter()
            .filter(|b| b.direction == Direction::Rtl)
            .count();
        if rtl * 2 > self.text_blocks.len() {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_geometry() {
        let b = BBox::new(10.0, 20.0, 110.0, 40.0);
        assert_eq!(b.width(), 100.0);
        assert_eq!(b.height(), 20.0);
        assert_eq!(b.area(), 2000.0);
        assert_eq!(b.center(), (60.0, 30.0));
    }

    #[test]
    fn test_bbox_union() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 5.0, 20.0, 8.0);
        let u = a.union(&b);
        assert_eq!(u, BBox::new(0.0, 0.0, 20.0, 10.0));
    }

    #[test]
    fn test_direction_arabic() {
        assert_eq!(infer_direction("تقرير سنوي"), Direction::Rtl);
        assert_eq!(infer_direction("Annual Report"), Direction::Ltr);
        // Digits alone do not vote; ties resolve to LTR.
        assert_eq!(infer_direction("123"), Direction::Ltr);
    }

    #[test]
    fn test_direction_mixed() {
        // Arabic-dominant mixed line.
        assert_eq!(infer_direction("الصفحة 3 من Page"), Direction::Rtl);
    }

    #[test]
    fn test_text_block_nfc() {
        // "é" as e + combining acute composes to a single char under NFC.
        let block = TextBlock::new("cafe\u{0301}", BBox::new(0.0, 0.0, 10.0, 5.0), 10.0);
        assert_eq!(block.text, "café");
        assert_eq!(block.direction, Direction::Ltr);
    }

    #[test]
    fn test_page_dominant_direction() {
        let mut page = Page::new(0, 595.0, 842.0);
        page.text_blocks.push(TextBlock::new(
            "الفصل الأول",
            BBox::new(0.0, 0.0, 100.0, 10.0),
            10.0,
        ));
        page.text_blocks.push(TextBlock::new(
            "مقدمة",
            BBox::new(0.0, 20.0, 100.0, 30.0),
            10.0,
        ));
        page.text_blocks.push(TextBlock::new(
            "Introduction",
            BBox::new(0.0, 40.0, 100.0, 50.0),
            10.0,
        ));
        assert_eq!(page.dominant_direction(), Direction::Rtl);
    }
}
