//! The three repeated-element scoring algorithms.
//!
//! Each algorithm is a pure function over the same immutable band snapshot
//! and produces an independent consistency score, so the three can run over
//! one [`BandPage`] slice with no shared mutable state and be tested in
//! isolation.

use std::collections::BTreeMap;

use strsim::jaro_winkler;

use crate::config::CleaningConfig;
use crate::detect::normalize::Normalizer;
use crate::model::BBox;

/// A candidate block inside one page's band.
#[derive(Debug, Clone)]
pub struct BandBlock<'a> {
    /// Block text (raw, NFC).
    pub text: &'a str,
    /// Block position.
    pub bbox: BBox,
}

/// One page's view of a band.
#[derive(Debug, Clone)]
pub struct BandPage<'a> {
    /// 0-based page index.
    pub page_index: usize,
    /// Page width.
    pub width: f32,
    /// Page height.
    pub height: f32,
    /// Candidate blocks inside the band strip.
    pub blocks: Vec<BandBlock<'a>>,
}

impl BandPage<'_> {
    fn joined_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn union_bbox(&self) -> Option<BBox> {
        let mut blocks = self.blocks.iter();
        let first = blocks.next()?.bbox;
        Some(blocks.fold(first, |acc, b| acc.union(&b.bbox)))
    }
}

/// Result of one algorithm over one band.
#[derive(Debug, Clone)]
pub struct AlgorithmOutcome {
    /// Fraction of document pages covered by the dominant cluster.
    pub score: f32,
    /// Member pages of the dominant cluster with the exact region to
    /// remove on each.
    pub regions: BTreeMap<usize, BBox>,
    /// Cluster key: normalized text, position key, or fuzzy reference.
    pub signature: String,
}

impl AlgorithmOutcome {
    fn empty() -> Self {
        Self {
            score: 0.0,
            regions: BTreeMap::new(),
            signature: String::new(),
        }
    }
}

fn score(members: usize, total_pages: usize) -> f32 {
    if total_pages == 0 {
        0.0
    } else {
        members as f32 / total_pages as f32
    }
}

/// Algorithm 1: exact text repetition.
///
/// Pages whose normalized band text is identical form a group; the largest
/// group's coverage is the score. Robust to exact repeats, brittle to OCR
/// noise.
pub fn text_repetition(
    bands: &[BandPage<'_>],
    total_pages: usize,
    normalizer: &Normalizer,
) -> AlgorithmOutcome {
    let mut groups: BTreeMap<String, BTreeMap<usize, BBox>> = BTreeMap::new();

    for band in bands {
        let Some(bbox) = band.union_bbox() else {
            continue;
        };
        let key = normalizer.normalize(&band.joined_text());
        if key.is_empty() {
            continue;
        }
        groups.entry(key).or_default().insert(band.page_index, bbox);
    }

    let mut best: Option<(&String, &BTreeMap<usize, BBox>)> = None;
    for (key, members) in &groups {
        if best.map_or(true, |(_, b)| members.len() > b.len()) {
            best = Some((key, members));
        }
    }

    match best {
        Some((key, members)) => AlgorithmOutcome {
            score: score(members.len(), total_pages),
            regions: members.clone(),
            signature: key.clone(),
        },
        None => AlgorithmOutcome::empty(),
    }
}

/// Algorithm 2: bounding-box position matching.
///
/// Blocks cluster by quantized bbox center regardless of their text, so a
/// changing page number in a fixed slot still clusters. Robust to varying
/// text, brittle to layout drift.
pub fn bbox_matching(
    bands: &[BandPage<'_>],
    total_pages: usize,
    config: &CleaningConfig,
) -> AlgorithmOutcome {
    let tolerance = config.position_tolerance.max(f32::MIN_POSITIVE);
    let mut clusters: BTreeMap<(i64, i64), BTreeMap<usize, BBox>> = BTreeMap::new();

    for band in bands {
        for block in &band.blocks {
            let (cx, cy) = block.bbox.center();
            let key = (
                (cx / (band.width * tolerance)).round() as i64,
                (cy / (band.height * tolerance)).round() as i64,
            );
            clusters
                .entry(key)
                .or_default()
                .entry(band.page_index)
                .and_modify(|b| *b = b.union(&block.bbox))
                .or_insert(block.bbox);
        }
    }

    let mut best: Option<((i64, i64), &BTreeMap<usize, BBox>)> = None;
    for (key, members) in &clusters {
        if best.map_or(true, |(_, b)| members.len() > b.len()) {
            best = Some((*key, members));
        }
    }

    match best {
        Some((key, members)) => AlgorithmOutcome {
            score: score(members.len(), total_pages),
            regions: members.clone(),
            signature: format!("pos({},{})", key.0, key.1),
        },
        None => AlgorithmOutcome::empty(),
    }
}

/// Algorithm 3: fuzzy string matching.
///
/// Digit-masked band texts union into a group when their Jaro-Winkler
/// similarity to the group reference reaches the configured cutoff.
/// Tolerates minor OCR variance; the most expensive of the three.
pub fn fuzzy_matching(
    bands: &[BandPage<'_>],
    total_pages: usize,
    normalizer: &Normalizer,
    config: &CleaningConfig,
) -> AlgorithmOutcome {
    struct Group {
        reference: String,
        members: BTreeMap<usize, BBox>,
    }

    let mut groups: Vec<Group> = Vec::new();

    // Band pages arrive in ascending page order, so group formation (and
    // with it the selected reference) is deterministic.
    for band in bands {
        let Some(bbox) = band.union_bbox() else {
            continue;
        };
        let key = normalizer.fuzzy_key(&band.joined_text());
        if key.is_empty() {
            continue;
        }

        match groups
            .iter_mut()
            .find(|g| jaro_winkler(&g.reference, &key) >= config.similarity_cutoff)
        {
            Some(group) => {
                group.members.insert(band.page_index, bbox);
            }
            None => {
                let mut members = BTreeMap::new();
                members.insert(band.page_index, bbox);
                groups.push(Group {
                    reference: key,
                    members,
                });
            }
        }
    }

    let mut best: Option<&Group> = None;
    for group in &groups {
        if best.map_or(true, |b| group.members.len() > b.members.len()) {
            best = Some(group);
        }
    }

    match best {
        Some(group) => AlgorithmOutcome {
            score: score(group.members.len(), total_pages),
            regions: group.members.clone(),
            signature: group.reference.clone(),
        },
        None => AlgorithmOutcome::empty(),
    }
}
