//! Repeated-element (header/footer) detection.
//!
//! Three independent algorithms score the same band snapshot; the highest
//! consistency score wins, with ties resolved toward the most conservative
//! algorithm. A band is only marked for removal when the winning score
//! reaches the detection threshold — under-detection is acceptable,
//! over-removal is not.

pub mod algorithms;
pub mod normalize;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::CleaningConfig;
use crate::model::{BBox, Page};

use algorithms::{bbox_matching, fuzzy_matching, text_repetition, BandBlock, BandPage};
use normalize::Normalizer;

/// Page band scanned for repeated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    /// Top margin strip.
    Header,
    /// Bottom margin strip.
    Footer,
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::Header => f.write_str("header"),
            Band::Footer => f.write_str("footer"),
        }
    }
}

/// The three detection algorithms, in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Exact normalized-text repetition.
    TextRepetition,
    /// Geometric position clustering.
    BboxMatching,
    /// Jaro-Winkler similarity grouping.
    FuzzyMatching,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Algorithm::TextRepetition => "text_repetition",
            Algorithm::BboxMatching => "bbox_matching",
            Algorithm::FuzzyMatching => "fuzzy_matching",
        };
        f.write_str(s)
    }
}

/// Consistency score of each algorithm over one band.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AlgorithmScores {
    /// Score of the exact-repetition algorithm.
    pub text_repetition: f32,
    /// Score of the position-clustering algorithm.
    pub bbox_matching: f32,
    /// Score of the fuzzy-grouping algorithm.
    pub fuzzy_matching: f32,
}

impl AlgorithmScores {
    /// Score of one algorithm.
    pub fn get(&self, algorithm: Algorithm) -> f32 {
        match algorithm {
            Algorithm::TextRepetition => self.text_repetition,
            Algorithm::BboxMatching => self.bbox_matching,
            Algorithm::FuzzyMatching => self.fuzzy_matching,
        }
    }
}

/// A band that cleared the detection threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandDetection {
    /// Which band.
    pub band: Band,
    /// Winning algorithm.
    pub algorithm: Algorithm,
    /// The winning algorithm's consistency score.
    pub score: f32,
    /// All three scores, for the report.
    pub scores: AlgorithmScores,
    /// Winning cluster key (normalized text, position key, or fuzzy
    /// reference).
    pub signature: String,
    /// Member pages with the exact region to remove on each.
    pub regions: BTreeMap<usize, BBox>,
}

/// Detection result for both bands. `None` means the band stays untouched
/// on every page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionOutcome {
    /// Header band result.
    pub header: Option<BandDetection>,
    /// Footer band result.
    pub footer: Option<BandDetection>,
}

/// Detects repeated headers and footers across a page sequence.
pub struct RepeatedElementDetector<'a> {
    config: &'a CleaningConfig,
    normalizer: Normalizer,
}

impl<'a> RepeatedElementDetector<'a> {
    /// Create a detector over the given configuration.
    pub fn new(config: &'a CleaningConfig) -> Self {
        Self {
            config,
            normalizer: Normalizer::new(),
        }
    }

    /// Run all three algorithms over both bands and select per band.
    pub fn detect(&self, pages: &[Page]) -> DetectionOutcome {
        DetectionOutcome {
            header: self.detect_band(pages, Band::Header),
            footer: self.detect_band(pages, Band::Footer),
        }
    }

    fn detect_band(&self, pages: &[Page], band: Band) -> Option<BandDetection> {
        let total_pages = pages.len();
        if total_pages == 0 {
            return None;
        }

        let bands = self.band_snapshot(pages, band);

        let text = text_repetition(&bands, total_pages, &self.normalizer);
        let bbox = bbox_matching(&bands, total_pages, self.config);
        let fuzzy = fuzzy_matching(&bands, total_pages, &self.normalizer, self.config);

        let scores = AlgorithmScores {
            text_repetition: text.score,
            bbox_matching: bbox.score,
            fuzzy_matching: fuzzy.score,
        };

        // Highest score wins; candidates are visited in tie-break priority
        // order (most conservative first), so an equal later score never
        // displaces an earlier one.
        let candidates = [
            (Algorithm::TextRepetition, text),
            (Algorithm::BboxMatching, bbox),
            (Algorithm::FuzzyMatching, fuzzy),
        ];
        let mut best: Option<(Algorithm, algorithms::AlgorithmOutcome)> = None;
        for (algorithm, outcome) in candidates {
            if best
                .as_ref()
                .map_or(true, |(_, b)| outcome.score > b.score)
            {
                best = Some((algorithm, outcome));
            }
        }
        let (algorithm, outcome) = best?;

        log::debug!(
            "{} band: text={:.2} bbox={:.2} fuzzy={:.2} -> {} ({:.2})",
            band,
            scores.text_repetition,
            scores.bbox_matching,
            scores.fuzzy_matching,
            algorithm,
            outcome.score
        );

        if outcome.score < self.config.detection_threshold {
            log::info!(
                "{} band below threshold ({:.2} < {:.2}); left untouched",
                band,
                outcome.score,
                self.config.detection_threshold
            );
            return None;
        }

        Some(BandDetection {
            band,
            algorithm,
            score: outcome.score,
            scores,
            signature: outcome.signature,
            regions: outcome.regions,
        })
    }

    /// Collect each page's candidate blocks for one band.
    fn band_snapshot<'p>(&self, pages: &'p [Page], band: Band) -> Vec<BandPage<'p>> {
        let fraction = self.config.band_fraction;
        pages
            .iter()
            .filter_map(|page| {
                let blocks: Vec<BandBlock<'p>> = page
                    .text_blocks
                    .iter()
                    .filter(|block| {
                        let (_, cy) = block.bbox.center();
                        let in_band = match band {
                            Band::Header => cy < page.height * fraction,
                            Band::Footer => cy > page.height * (1.0 - fraction),
                        };
                        in_band && block.text.trim().chars().count() >= self.config.min_block_chars
                    })
                    .map(|block| BandBlock {
                        text: &block.text,
                        bbox: block.bbox,
                    })
                    .collect();

                if blocks.is_empty() {
                    None
                } else {
                    Some(BandPage {
                        page_index: page.index,
                        width: page.width,
                        height: page.height,
                        blocks,
                    })
                }
            })
            .collect()
    }
}
