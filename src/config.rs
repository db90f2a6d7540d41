//! Cleaning configuration.
//!
//! One immutable [`CleaningConfig`] value is built up front and threaded
//! through the orchestrator, detector, classifier, and aggregator
//! constructors. There is no ambient/global configuration lookup.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Language;

/// Configuration for the cleaning pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Maximum pages processed per OCR chunk.
    pub chunk_size: usize,

    /// Minimum consistency score for a band to be removed.
    pub detection_threshold: f32,

    /// Fraction of page height scanned as the header band (and, mirrored,
    /// the footer band).
    pub band_fraction: f32,

    /// Minimum recognized text lines for an image to be table-protected.
    pub min_lines_for_table: u32,

    /// Images below this fraction of page area are decorative candidates.
    pub area_threshold: f32,

    /// Documents below this mean OCR confidence degrade to minimal mode.
    pub confidence_threshold: f32,

    /// Table protection switch. Must stay `true`; `validate` rejects the
    /// alternative so the classifier bypass cannot be configured.
    pub keep_tables: bool,

    /// Geometric tolerance for bounding-box clustering, as a fraction of
    /// page width/height. Empirically chosen default; tunable.
    pub position_tolerance: f32,

    /// Jaro-Winkler similarity cutoff for fuzzy band grouping.
    /// Empirically chosen default; tunable.
    pub similarity_cutoff: f64,

    /// Band blocks shorter than this (trimmed chars) are ignored.
    pub min_block_chars: usize,

    /// Whether chunks and batch documents run on the rayon pool.
    pub parallel: bool,

    /// Language used when no per-file override matches.
    pub default_language: Language,

    /// Per-document language overrides, keyed by file name.
    pub language_overrides: BTreeMap<String, Language>,

    /// Directory for cleaned artifacts and backups.
    pub output_dir: PathBuf,

    /// Directory for preview and batch reports.
    pub report_dir: PathBuf,
}

impl CleaningConfig {
    /// Create a configuration with the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size in pages.
    pub fn with_chunk_size(mut self, pages: usize) -> Self {
        self.chunk_size = pages;
        self
    }

    /// Set the band detection threshold.
    pub fn with_detection_threshold(mut self, threshold: f32) -> Self {
        self.detection_threshold = threshold;
        self
    }

    /// Set the header/footer band fraction.
    pub fn with_band_fraction(mut self, fraction: f32) -> Self {
        self.band_fraction = fraction;
        self
    }

    /// Set the table-protection line minimum.
    pub fn with_min_lines_for_table(mut self, lines: u32) -> Self {
        self.min_lines_for_table = lines;
        self
    }

    /// Set the decorative-image area threshold.
    pub fn with_area_threshold(mut self, threshold: f32) -> Self {
        self.area_threshold = threshold;
        self
    }

    /// Set the minimal-mode confidence threshold.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the bounding-box clustering tolerance.
    pub fn with_position_tolerance(mut self, tolerance: f32) -> Self {
        self.position_tolerance = tolerance;
        self
    }

    /// Set the fuzzy similarity cutoff.
    pub fn with_similarity_cutoff(mut self, cutoff: f64) -> Self {
        self.similarity_cutoff = cutoff;
        self
    }

    /// Set the default OCR language.
    pub fn with_default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }

    /// Add a per-file language override.
    pub fn with_language_override(
        mut self,
        file_name: impl Into<String>,
        language: Language,
    ) -> Self {
        self.language_overrides.insert(file_name.into(), language);
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the report directory.
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = dir.into();
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Resolve the OCR language for a document path.
    pub fn language_for(&self, path: &std::path::Path) -> Language {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| self.language_overrides.get(n).cloned())
            .unwrap_or_else(|| self.default_language.clone())
    }

    /// Check configuration invariants.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.detection_threshold) {
            return Err(Error::Config(
                "detection_threshold must be within [0, 1]".into(),
            ));
        }
        if !(0.0..0.5).contains(&self.band_fraction) || self.band_fraction <= 0.0 {
            return Err(Error::Config(
                "band_fraction must be within (0, 0.5)".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.area_threshold) {
            return Err(Error::Config("area_threshold must be within [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::Config(
                "confidence_threshold must be within [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_cutoff) {
            return Err(Error::Config(
                "similarity_cutoff must be within [0, 1]".into(),
            ));
        }
        if !self.keep_tables {
            // Disabling table protection together with region classification
            // would allow table deletion; the configuration surface refuses it.
            return Err(Error::Config(
                "keep_tables cannot be disabled; table protection is mandatory".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            detection_threshold: 0.85,
            band_fraction: 0.10,
            min_lines_for_table: 3,
            area_threshold: 0.05,
            confidence_threshold: 0.70,
            keep_tables: true,
            position_tolerance: 0.02,
            similarity_cutoff: 0.85,
            min_block_chars: 4,
            parallel: true,
            default_language: Language::AraEng,
            language_overrides: BTreeMap::new(),
            output_dir: PathBuf::from("output"),
            report_dir: PathBuf::from("report"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_config_builder() {
        let config = CleaningConfig::new()
            .with_chunk_size(50)
            .with_detection_threshold(0.9)
            .with_language_override("annual_report.pdf", Language::Ara)
            .sequential();

        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.detection_threshold, 0.9);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = CleaningConfig::default();
        assert_eq!(config.chunk_size, 200);
        assert_eq!(config.detection_threshold, 0.85);
        assert_eq!(config.min_lines_for_table, 3);
        assert_eq!(config.area_threshold, 0.05);
        assert_eq!(config.confidence_threshold, 0.70);
        assert!(config.keep_tables);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let config = CleaningConfig::new().with_chunk_size(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_disabled_table_protection() {
        let config = CleaningConfig {
            keep_tables: false,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_language_resolution() {
        let config =
            CleaningConfig::new().with_language_override("contract_ar.pdf", Language::Ara);

        assert_eq!(
            config.language_for(Path::new("in/contract_ar.pdf")),
            Language::Ara
        );
        assert_eq!(
            config.language_for(Path::new("in/other.pdf")),
            Language::AraEng
        );
    }
}
