//! Image region classification with table protection.
//!
//! Classification is a pure function of `(ocr_line_count,
//! has_table_structure, area_fraction)`, evaluated in a fixed priority
//! order. Rule 1 is the system's core safety guarantee and cannot be
//! overridden by any other signal. No other component may mark an image
//! for removal.

use serde::{Deserialize, Serialize};

use crate::config::CleaningConfig;
use crate::model::{ImageRegion, KeepReason, RemoveReason};

/// Classification verdict for one image region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "reason")]
pub enum RegionClass {
    /// Region survives, with the reason code.
    Keep(KeepReason),
    /// Region is removed, with the reason code.
    Remove(RemoveReason),
}

impl RegionClass {
    /// Whether the verdict keeps the region.
    pub fn is_keep(&self) -> bool {
        matches!(self, RegionClass::Keep(_))
    }
}

/// Classify one image region.
///
/// Rules, in order:
/// 1. `ocr_line_count >= min_lines_for_table` → keep (`table_protected`).
/// 2. `has_table_structure` → keep (`table_structure_detected`).
/// 3. `area_fraction < area_threshold` → remove (`decorative_small_image`).
/// 4. otherwise → keep (`default_keep`).
pub fn classify_region(region: &ImageRegion, config: &CleaningConfig) -> RegionClass {
    if region.ocr_line_count >= config.min_lines_for_table {
        return RegionClass::Keep(KeepReason::TableProtected);
    }
    if region.has_table_structure {
        return RegionClass::Keep(KeepReason::TableStructureDetected);
    }
    if region.area_fraction < config.area_threshold {
        return RegionClass::Remove(RemoveReason::DecorativeSmallImage);
    }
    RegionClass::Keep(KeepReason::DefaultKeep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn region(area_fraction: f32, ocr_line_count: u32, has_table_structure: bool) -> ImageRegion {
        ImageRegion::new(
            BBox::new(0.0, 0.0, 50.0, 50.0),
            area_fraction,
            ocr_line_count,
            has_table_structure,
        )
    }

    #[test]
    fn test_table_protection_beats_small_area() {
        // ocr_line_count = 3 on a tiny image: rule 1 fires before rule 3
        // would have removed it.
        let r = region(0.01, 3, false);
        assert_eq!(
            classify_region(&r, &CleaningConfig::default()),
            RegionClass::Keep(KeepReason::TableProtected)
        );
    }

    #[test]
    fn test_table_structure_without_lines() {
        let r = region(0.01, 0, true);
        assert_eq!(
            classify_region(&r, &CleaningConfig::default()),
            RegionClass::Keep(KeepReason::TableStructureDetected)
        );
    }

    #[test]
    fn test_small_blank_image_removed() {
        let r = region(0.01, 0, false);
        assert_eq!(
            classify_region(&r, &CleaningConfig::default()),
            RegionClass::Remove(RemoveReason::DecorativeSmallImage)
        );
    }

    #[test]
    fn test_large_blank_image_kept_by_default() {
        let r = region(0.40, 0, false);
        assert_eq!(
            classify_region(&r, &CleaningConfig::default()),
            RegionClass::Keep(KeepReason::DefaultKeep)
        );
    }

    #[test]
    fn test_boundary_area_kept() {
        // Exactly at the threshold is not "below" it.
        let r = region(0.05, 0, false);
        assert_eq!(
            classify_region(&r, &CleaningConfig::default()),
            RegionClass::Keep(KeepReason::DefaultKeep)
        );
    }

    #[test]
    fn test_two_lines_not_protected() {
        let r = region(0.01, 2, false);
        assert_eq!(
            classify_region(&r, &CleaningConfig::default()),
            RegionClass::Remove(RemoveReason::DecorativeSmallImage)
        );
    }
}
