//! The cleaning plan: every keep/remove decision for one document.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::page::{BBox, Page};
use crate::error::{Error, Result};

/// How far the plan is allowed to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// Report only; zero mutation.
    Preview,
    /// Cleared for application after a matching preview.
    Apply,
}

/// Why a region is being removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveReason {
    /// Member of the winning repeated-header cluster.
    RepeatedHeader,
    /// Member of the winning repeated-footer cluster.
    RepeatedFooter,
    /// Small image with no recognized text and no table structure.
    DecorativeSmallImage,
}

/// Why a region is being kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepReason {
    /// At least the configured minimum of recognized text lines.
    TableProtected,
    /// Grid/ruling structure detected.
    TableStructureDetected,
    /// Ambiguous or large non-table image; conservative default.
    DefaultKeep,
}

impl fmt::Display for RemoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RemoveReason::RepeatedHeader => "repeated_header",
            RemoveReason::RepeatedFooter => "repeated_footer",
            RemoveReason::DecorativeSmallImage => "decorative_small_image",
        };
        f.write_str(s)
    }
}

impl fmt::Display for KeepReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeepReason::TableProtected => "table_protected",
            KeepReason::TableStructureDetected => "table_structure_detected",
            KeepReason::DefaultKeep => "default_keep",
        };
        f.write_str(s)
    }
}

/// One region scheduled for removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveRegion {
    /// 0-based page index.
    pub page_index: usize,
    /// Exact region on the page.
    pub bbox: BBox,
    /// Reason code.
    pub reason: RemoveReason,
}

/// One region explicitly kept (image classifications only; surviving text
/// blocks are implicit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeepRegion {
    /// 0-based page index.
    pub page_index: usize,
    /// Exact region on the page.
    pub bbox: BBox,
    /// Reason code.
    pub reason: KeepReason,
}

/// Opaque identity of a planned decision set.
///
/// Preview emits it; apply must present it back. Two plans share a token
/// exactly when their decisions are identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanToken(pub String);

impl fmt::Display for PlanToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The full set of keep/remove decisions for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningPlan {
    /// Regions to excise, in (page, position) order.
    pub remove_regions: Vec<RemoveRegion>,

    /// Image regions explicitly kept, with reasons.
    pub keep_regions: Vec<KeepRegion>,

    /// Preview or apply.
    pub mode: PlanMode,

    /// True when low document confidence forced minimal mode.
    pub degraded: bool,
}

/// Bbox tolerance when matching plan regions back to source regions.
const REGION_EPSILON: f32 = 0.01;

impl CleaningPlan {
    /// Number of planned removals.
    pub fn remove_count(&self) -> usize {
        self.remove_regions.len()
    }

    /// Number of explicit keeps.
    pub fn keep_count(&self) -> usize {
        self.keep_regions.len()
    }

    /// Whether a text block at `bbox` on page `page_index` is removed.
    pub fn removes_block(&self, page_index: usize, bbox: &BBox) -> bool {
        self.remove_regions.iter().any(|r| {
            r.page_index == page_index
                && matches!(
                    r.reason,
                    RemoveReason::RepeatedHeader | RemoveReason::RepeatedFooter
                )
                && r.bbox.approx_eq(bbox, REGION_EPSILON)
        })
    }

    /// Content fingerprint of the decision set.
    pub fn fingerprint(&self) -> PlanToken {
        let mut hasher = Sha256::new();
        for r in &self.remove_regions {
            hasher.update(format!(
                "-|{}|{}|{:.3},{:.3},{:.3},{:.3}\n",
                r.page_index, r.reason, r.bbox.x0, r.bbox.y0, r.bbox.x1, r.bbox.y1
            ));
        }
        for k in &self.keep_regions {
            hasher.update(format!(
                "+|{}|{}|{:.3},{:.3},{:.3},{:.3}\n",
                k.page_index, k.reason, k.bbox.x0, k.bbox.y0, k.bbox.x1, k.bbox.y1
            ));
        }
        hasher.update([self.degraded as u8]);
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        PlanToken(hex)
    }

    /// Runtime check of the table-protection invariant.
    ///
    /// A region in `remove_regions` must never satisfy the table-protection
    /// predicate. Violation is an internal defect and aborts the apply step
    /// for this document.
    pub fn verify_against(&self, pages: &[Page], min_lines_for_table: u32) -> Result<()> {
        for removal in &self.remove_regions {
            let Some(page) = pages.iter().find(|p| p.index == removal.page_index) else {
                return Err(Error::InvariantViolation(format!(
                    "removal targets missing page {}",
                    removal.page_index
                )));
            };
            for image in &page.images {
                if image.bbox.approx_eq(&removal.bbox, REGION_EPSILON)
                    && image.ocr_line_count >= min_lines_for_table
                {
                    return Err(Error::InvariantViolation(format!(
                        "page {} image at ({:.1},{:.1}) has {} recognized lines but is marked {}",
                        removal.page_index,
                        removal.bbox.x0,
                        removal.bbox.y0,
                        image.ocr_line_count,
                        removal.reason
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageRegion;

    fn plan_with_removal(reason: RemoveReason) -> CleaningPlan {
        CleaningPlan {
            remove_regions: vec![RemoveRegion {
                page_index: 0,
                bbox: BBox::new(10.0, 10.0, 50.0, 30.0),
                reason,
            }],
            keep_regions: vec![],
            mode: PlanMode::Preview,
            degraded: false,
        }
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(RemoveReason::RepeatedHeader.to_string(), "repeated_header");
        assert_eq!(
            RemoveReason::DecorativeSmallImage.to_string(),
            "decorative_small_image"
        );
        assert_eq!(KeepReason::TableProtected.to_string(), "table_protected");
        assert_eq!(KeepReason::DefaultKeep.to_string(), "default_keep");
    }

    #[test]
    fn test_fingerprint_is_content_addressed() {
        let a = plan_with_removal(RemoveReason::RepeatedHeader);
        let b = plan_with_removal(RemoveReason::RepeatedHeader);
        let c = plan_with_removal(RemoveReason::RepeatedFooter);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_removes_block_matches_band_removals_only() {
        let plan = plan_with_removal(RemoveReason::DecorativeSmallImage);
        // Image removals never suppress text blocks.
        assert!(!plan.removes_block(0, &BBox::new(10.0, 10.0, 50.0, 30.0)));

        let plan = plan_with_removal(RemoveReason::RepeatedFooter);
        assert!(plan.removes_block(0, &BBox::new(10.0, 10.0, 50.0, 30.0)));
        assert!(!plan.removes_block(1, &BBox::new(10.0, 10.0, 50.0, 30.0)));
    }

    #[test]
    fn test_verify_catches_protected_removal() {
        let mut page = Page::new(0, 595.0, 842.0);
        page.images.push(ImageRegion::new(
            BBox::new(10.0, 10.0, 50.0, 30.0),
            0.01,
            4,
            false,
        ));

        let plan = plan_with_removal(RemoveReason::DecorativeSmallImage);
        let result = plan.verify_against(&[page], 3);
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_verify_passes_clean_plan() {
        let mut page = Page::new(0, 595.0, 842.0);
        page.images.push(ImageRegion::new(
            BBox::new(10.0, 10.0, 50.0, 30.0),
            0.01,
            0,
            false,
        ));

        let plan = plan_with_removal(RemoveReason::DecorativeSmallImage);
        assert!(plan.verify_against(&[page], 3).is_ok());
    }
}
