//! Integration and property tests for region classification.

use naqi::{
    classify_region, BBox, CleaningConfig, ImageRegion, KeepReason, RegionClass, RemoveReason,
};
use proptest::prelude::*;

fn region(area_fraction: f32, ocr_line_count: u32, has_table_structure: bool) -> ImageRegion {
    ImageRegion::new(
        BBox::new(100.0, 100.0, 200.0, 180.0),
        area_fraction,
        ocr_line_count,
        has_table_structure,
    )
}

#[test]
fn test_rule_order_is_fixed() {
    let config = CleaningConfig::default();

    // Rule 1 fires before the area rule would have removed the region.
    assert_eq!(
        classify_region(&region(0.01, 3, false), &config),
        RegionClass::Keep(KeepReason::TableProtected)
    );

    // Rule 2 protects structure even with zero recognized lines.
    assert_eq!(
        classify_region(&region(0.01, 0, true), &config),
        RegionClass::Keep(KeepReason::TableStructureDetected)
    );

    // Rule 3 removes small blank images.
    assert_eq!(
        classify_region(&region(0.01, 0, false), &config),
        RegionClass::Remove(RemoveReason::DecorativeSmallImage)
    );

    // Rule 4 keeps everything else.
    assert_eq!(
        classify_region(&region(0.30, 0, false), &config),
        RegionClass::Keep(KeepReason::DefaultKeep)
    );
}

#[test]
fn test_custom_minimum_lines() {
    let config = CleaningConfig::new().with_min_lines_for_table(5);
    assert_eq!(
        classify_region(&region(0.01, 4, false), &config),
        RegionClass::Remove(RemoveReason::DecorativeSmallImage)
    );
    assert_eq!(
        classify_region(&region(0.01, 5, false), &config),
        RegionClass::Keep(KeepReason::TableProtected)
    );
}

proptest! {
    /// Table protection is absolute: three or more recognized lines keep
    /// the region no matter what the other fields say.
    #[test]
    fn prop_table_protection_is_absolute(
        area_fraction in 0.0f32..=1.0,
        ocr_line_count in 3u32..200,
        has_table_structure in any::<bool>(),
    ) {
        let config = CleaningConfig::default();
        let r = region(area_fraction, ocr_line_count, has_table_structure);
        prop_assert_eq!(
            classify_region(&r, &config),
            RegionClass::Keep(KeepReason::TableProtected)
        );
    }

    /// A region is removed only under the exact decorative conditions.
    #[test]
    fn prop_removal_bound(
        area_fraction in 0.0f32..=1.0,
        ocr_line_count in 0u32..200,
        has_table_structure in any::<bool>(),
    ) {
        let config = CleaningConfig::default();
        let r = region(area_fraction, ocr_line_count, has_table_structure);
        let verdict = classify_region(&r, &config);

        let removable = area_fraction < config.area_threshold
            && ocr_line_count < config.min_lines_for_table
            && !has_table_structure;

        if removable {
            prop_assert_eq!(verdict, RegionClass::Remove(RemoveReason::DecorativeSmallImage));
        } else {
            prop_assert!(verdict.is_keep());
        }
    }

    /// Classification always terminates with a definite verdict and never
    /// panics, whatever the field values.
    #[test]
    fn prop_total_function(
        area_fraction in any::<f32>(),
        ocr_line_count in any::<u32>(),
        has_table_structure in any::<bool>(),
    ) {
        let config = CleaningConfig::default();
        let _ = classify_region(
            &region(area_fraction, ocr_line_count, has_table_structure),
            &config,
        );
    }
}
