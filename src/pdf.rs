//! PDF reconstruction collaborator.
//!
//! The decision engine never edits documents itself; it hands the surviving
//! layout and the removal set to a [`PdfRebuilder`]. The concrete
//! [`LopdfRebuilder`] masks removed regions by overlaying opaque white
//! rectangles in the affected pages' content streams, which leaves every
//! surviving glyph untouched.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document as LopdfDocument, Object};

use crate::error::{Error, Result};
use crate::model::RemoveRegion;

/// Abstract interface to the PDF rendering/reconstruction library.
pub trait PdfRebuilder: Send + Sync {
    /// Number of pages in the source document.
    fn page_count(&self, source: &Path) -> Result<usize>;

    /// Write a rebuilt copy of `source` to `output` with every region in
    /// `remove` excised.
    fn rebuild(&self, source: &Path, remove: &[RemoveRegion], output: &Path) -> Result<()>;
}

/// Concrete [`PdfRebuilder`] backed by `lopdf`.
#[derive(Debug, Default)]
pub struct LopdfRebuilder;

impl LopdfRebuilder {
    /// Create a rebuilder.
    pub fn new() -> Self {
        Self
    }
}

impl PdfRebuilder for LopdfRebuilder {
    fn page_count(&self, source: &Path) -> Result<usize> {
        let doc = LopdfDocument::load(source)?;
        Ok(doc.get_pages().len())
    }

    fn rebuild(&self, source: &Path, remove: &[RemoveRegion], output: &Path) -> Result<()> {
        let mut doc = LopdfDocument::load(source)?;
        let pages = doc.get_pages();

        // Group removals by page; untouched pages keep their streams as-is.
        let mut by_page: BTreeMap<usize, Vec<&RemoveRegion>> = BTreeMap::new();
        for region in remove {
            by_page.entry(region.page_index).or_default().push(region);
        }

        for (page_index, regions) in &by_page {
            let page_number = (*page_index + 1) as u32;
            let page_id = *pages.get(&page_number).ok_or_else(|| {
                Error::Pdf(format!(
                    "removal targets page {} but document has {} pages",
                    page_index,
                    pages.len()
                ))
            })?;

            let page_height = page_height(&doc, page_id)?;
            let data = doc.get_page_content(page_id)?;
            let mut content = Content::decode(&data)?;

            for region in regions {
                push_mask_ops(&mut content, region, page_height);
            }

            let encoded = content.encode()?;
            doc.change_page_content(page_id, encoded)?;
        }

        doc.save(output)?;
        log::info!(
            "rebuilt {} -> {} ({} region(s) masked on {} page(s))",
            source.display(),
            output.display(),
            remove.len(),
            by_page.len()
        );
        Ok(())
    }
}

/// Append the masking operators for one region.
///
/// Region coordinates use a top-left origin; PDF user space is bottom-left,
/// so the rectangle's y is flipped against the page height.
fn push_mask_ops(content: &mut Content, region: &RemoveRegion, page_height: f32) {
    let x = region.bbox.x0;
    let y = page_height - region.bbox.y1;
    let w = region.bbox.width();
    let h = region.bbox.height();

    content.operations.push(Operation::new("q", vec![]));
    content.operations.push(Operation::new(
        "rg",
        vec![
            Object::Real(1.0),
            Object::Real(1.0),
            Object::Real(1.0),
        ],
    ));
    content.operations.push(Operation::new(
        "re",
        vec![
            Object::Real(x),
            Object::Real(y),
            Object::Real(w),
            Object::Real(h),
        ],
    ));
    content.operations.push(Operation::new("f", vec![]));
    content.operations.push(Operation::new("Q", vec![]));
}

/// Page height from the MediaBox, falling back to Letter.
fn page_height(doc: &LopdfDocument, page_id: (u32, u16)) -> Result<f32> {
    if let Ok(page_dict) = doc.get_dictionary(page_id) {
        if let Ok(media_box) = page_dict.get(b"MediaBox") {
            if let Ok(array) = media_box.as_array() {
                if array.len() >= 4 {
                    if let Some(height) = as_float(&array[3]) {
                        return Ok(height);
                    }
                }
            }
        }
    }
    Ok(792.0)
}

fn as_float(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
