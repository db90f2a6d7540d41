//! Decision aggregation and the preview/apply state machine.
//!
//! The aggregator is the single writer of a document's [`CleaningPlan`]. It
//! merges the detector and classifier outputs into one plan, exposes the
//! plan as a read-only preview, and only mutates anything when an apply is
//! requested with the token the preview emitted. Every ambiguous branch
//! resolves toward keeping content.

pub mod backup;

use serde::{Deserialize, Serialize};

use crate::classify::{classify_region, RegionClass};
use crate::config::CleaningConfig;
use crate::detect::{Band, BandDetection, DetectionOutcome, RepeatedElementDetector};
use crate::error::{Error, Result};
use crate::model::{
    CleaningPlan, Document, KeepRegion, PlanMode, PlanToken, RemoveReason, RemoveRegion,
};
use crate::pdf::PdfRebuilder;

use backup::{BackupSet, BackupWriter};

/// Stages of one document's cleaning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Pages merged; no decisions yet.
    Extracted,
    /// Plan built; nothing exposed.
    Planned,
    /// Plan serialized read-only; apply is now reachable.
    Previewed,
    /// Removals applied and triple backup written. Terminal.
    Applied,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::Extracted => "extracted",
            Stage::Planned => "planned",
            Stage::Previewed => "previewed",
            Stage::Applied => "applied",
        }
    }
}

/// Read-only preview of a plan, with the token that gates apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewArtifact {
    /// Identity of the previewed plan.
    pub token: PlanToken,
    /// The full decision set.
    pub plan: CleaningPlan,
    /// Per-band detection summary.
    pub detection: DetectionOutcome,
}

/// Result of a successful apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// The three backup artifacts, all present.
    pub backups: BackupSet,
    /// Number of regions excised.
    pub removed: usize,
}

/// State machine driving one document from extraction to a cleaned
/// artifact.
pub struct CleaningSession<'a> {
    config: &'a CleaningConfig,
    document: Document,
    stage: Stage,
    plan: Option<CleaningPlan>,
    detection: Option<DetectionOutcome>,
}

impl<'a> CleaningSession<'a> {
    /// Start a session over an extracted document.
    pub fn new(config: &'a CleaningConfig, document: Document) -> Self {
        Self {
            config,
            document,
            stage: Stage::Extracted,
            plan: None,
            detection: None,
        }
    }

    /// The session's document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Current stage name, for logs and reports.
    pub fn stage_name(&self) -> &'static str {
        self.stage.name()
    }

    /// The built plan, if planning has run.
    pub fn current_plan(&self) -> Option<&CleaningPlan> {
        self.plan.as_ref()
    }

    /// The detection outcome, if planning has run.
    pub fn detection(&self) -> Option<&DetectionOutcome> {
        self.detection.as_ref()
    }

    /// Build the cleaning plan (`Extracted -> Planned`).
    pub fn plan(&mut self) -> Result<&CleaningPlan> {
        if self.stage != Stage::Extracted {
            return Err(Error::InvalidTransition {
                from: self.stage.name(),
                to: Stage::Planned.name(),
            });
        }

        let detector = RepeatedElementDetector::new(self.config);
        let detection = detector.detect(&self.document.pages);

        let confidence = self.document.average_confidence();
        let degraded = confidence < self.config.confidence_threshold;
        if degraded {
            log::warn!(
                "{}: mean OCR confidence {:.2} below {:.2}; plan degraded to minimal mode",
                self.document.file_name(),
                confidence,
                self.config.confidence_threshold
            );
        }

        let plan = self.build_plan(&detection, degraded);
        self.detection = Some(detection);
        self.plan = Some(plan);
        self.stage = Stage::Planned;
        Ok(self.plan.as_ref().expect("plan just stored"))
    }

    /// Expose the plan read-only (`Planned -> Previewed`).
    ///
    /// Performs zero filesystem deletions and zero source mutation; always
    /// reachable from `Planned`.
    pub fn preview(&mut self) -> Result<PreviewArtifact> {
        if self.stage != Stage::Planned {
            return Err(Error::InvalidTransition {
                from: self.stage.name(),
                to: Stage::Previewed.name(),
            });
        }

        let plan = self.plan.as_ref().expect("planned stage holds a plan");
        let artifact = PreviewArtifact {
            token: plan.fingerprint(),
            plan: plan.clone(),
            detection: self.detection.clone().unwrap_or_default(),
        };
        self.stage = Stage::Previewed;
        Ok(artifact)
    }

    /// Apply the previewed plan (`Previewed -> Applied`).
    ///
    /// `token` must be the one the preview emitted for this exact plan; the
    /// invariant check runs before anything is written; the triple backup is
    /// staged and promoted as a set.
    pub fn apply(
        &mut self,
        token: &PlanToken,
        rebuilder: &dyn PdfRebuilder,
        backup_dir: &std::path::Path,
    ) -> Result<ApplyOutcome> {
        if self.stage != Stage::Previewed {
            return Err(Error::InvalidTransition {
                from: self.stage.name(),
                to: Stage::Applied.name(),
            });
        }

        let plan = self.plan.as_mut().expect("previewed stage holds a plan");
        if plan.fingerprint() != *token {
            return Err(Error::PlanMismatch);
        }

        // The one place "no text/table ever deleted" is a hard runtime
        // assertion: a protected region in the removal set aborts the apply.
        plan.verify_against(&self.document.pages, self.config.min_lines_for_table)?;

        plan.mode = PlanMode::Apply;
        let remove_regions = plan.remove_regions.clone();

        let layout_json = serde_json::to_string_pretty(&self.document)?;
        let writer = BackupWriter::new(backup_dir, self.document.stem());
        let source = self.document.source.clone();
        let backups = writer.write_all(&source, &layout_json, |cleaned| {
            rebuilder.rebuild(&source, &remove_regions, cleaned)
        })?;

        self.stage = Stage::Applied;
        Ok(ApplyOutcome {
            backups,
            removed: remove_regions.len(),
        })
    }

    fn build_plan(&self, detection: &DetectionOutcome, degraded: bool) -> CleaningPlan {
        let mut remove_regions = Vec::new();
        let mut keep_regions = Vec::new();

        // Band removals are suppressed document-wide in minimal mode.
        if !degraded {
            for band in [detection.header.as_ref(), detection.footer.as_ref()]
                .into_iter()
                .flatten()
            {
                push_band_removals(&mut remove_regions, band);
            }
        }

        for page in &self.document.pages {
            for image in &page.images {
                match classify_region(image, self.config) {
                    RegionClass::Remove(reason) => {
                        if degraded && !self.survives_minimal_mode(image) {
                            keep_regions.push(KeepRegion {
                                page_index: page.index,
                                bbox: image.bbox,
                                reason: crate::model::KeepReason::DefaultKeep,
                            });
                        } else {
                            remove_regions.push(RemoveRegion {
                                page_index: page.index,
                                bbox: image.bbox,
                                reason,
                            });
                        }
                    }
                    RegionClass::Keep(reason) => keep_regions.push(KeepRegion {
                        page_index: page.index,
                        bbox: image.bbox,
                        reason,
                    }),
                }
            }
        }

        sort_regions(&mut remove_regions);
        keep_regions.sort_by(|a, b| {
            (a.page_index, total_cmp_key(&a.bbox)).partial_cmp(&(b.page_index, total_cmp_key(&b.bbox)))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        CleaningPlan {
            remove_regions,
            keep_regions,
            mode: PlanMode::Preview,
            degraded,
        }
    }

    /// In minimal mode only unambiguous decorative removals survive: no
    /// recognized text, no structure, and well under the area threshold.
    fn survives_minimal_mode(&self, image: &crate::model::ImageRegion) -> bool {
        image.ocr_line_count == 0
            && !image.has_table_structure
            && image.area_fraction < self.config.area_threshold / 2.0
    }
}

fn push_band_removals(remove_regions: &mut Vec<RemoveRegion>, band: &BandDetection) {
    let reason = match band.band {
        Band::Header => RemoveReason::RepeatedHeader,
        Band::Footer => RemoveReason::RepeatedFooter,
    };
    for (page_index, bbox) in &band.regions {
        remove_regions.push(RemoveRegion {
            page_index: *page_index,
            bbox: *bbox,
            reason,
        });
    }
}

fn total_cmp_key(bbox: &crate::model::BBox) -> (f32, f32) {
    (bbox.y0, bbox.x0)
}

fn sort_regions(regions: &mut [RemoveRegion]) {
    regions.sort_by(|a, b| {
        (a.page_index, total_cmp_key(&a.bbox), a.reason)
            .partial_cmp(&(b.page_index, total_cmp_key(&b.bbox), b.reason))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
