//! Structured per-document and batch reports.
//!
//! One report per document enumerates every remove/keep decision with its
//! reason code; the batch report aggregates across documents. Reports are
//! the only user-facing account of what preview found and what apply did,
//! so they are written in both modes.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detect::{AlgorithmScores, Algorithm, Band, BandDetection, DetectionOutcome};
use crate::model::{CleaningPlan, Document, KeepRegion, PlanToken, RemoveRegion};

/// Summary of one band's detection, without the per-page region list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandSummary {
    /// Which band.
    pub band: Band,
    /// Winning algorithm.
    pub algorithm: Algorithm,
    /// Winning score.
    pub score: f32,
    /// All three scores.
    pub scores: AlgorithmScores,
    /// Pages covered by the winning cluster.
    pub pages: usize,
    /// Winning cluster key.
    pub signature: String,
}

impl From<&BandDetection> for BandSummary {
    fn from(detection: &BandDetection) -> Self {
        Self {
            band: detection.band,
            algorithm: detection.algorithm,
            score: detection.score,
            scores: detection.scores,
            pages: detection.regions.len(),
            signature: detection.signature.clone(),
        }
    }
}

/// Full report for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Source file name.
    pub file_name: String,
    /// OCR language used.
    pub language: String,
    /// Pages in the merged sequence.
    pub page_count: usize,
    /// Mean page OCR confidence.
    pub mean_confidence: f32,
    /// Whether low confidence forced minimal mode.
    pub degraded: bool,
    /// Pages whose dominant direction is RTL.
    pub rtl_pages: usize,
    /// Pages whose dominant direction is LTR.
    pub ltr_pages: usize,
    /// Header band summary, when detected.
    pub header: Option<BandSummary>,
    /// Footer band summary, when detected.
    pub footer: Option<BandSummary>,
    /// Every planned removal with its reason code.
    pub remove_regions: Vec<RemoveRegion>,
    /// Every explicit keep with its reason code.
    pub keep_regions: Vec<KeepRegion>,
    /// Identity of the plan these decisions belong to.
    pub plan_token: PlanToken,
    /// Human-readable guidance derived from the scores and counts.
    pub recommendations: Vec<String>,
    /// When processing of this document started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock processing time in seconds.
    pub duration_seconds: f64,
}

impl DocumentReport {
    /// Build a report from a planned document.
    pub fn new(
        document: &Document,
        plan: &CleaningPlan,
        detection: &DetectionOutcome,
        started_at: DateTime<Utc>,
        duration_seconds: f64,
    ) -> Self {
        Self {
            file_name: document.file_name(),
            language: document.language.code().to_string(),
            page_count: document.page_count(),
            mean_confidence: document.average_confidence(),
            degraded: plan.degraded,
            rtl_pages: document.rtl_pages().len(),
            ltr_pages: document.ltr_pages().len(),
            header: detection.header.as_ref().map(BandSummary::from),
            footer: detection.footer.as_ref().map(BandSummary::from),
            remove_regions: plan.remove_regions.clone(),
            keep_regions: plan.keep_regions.clone(),
            plan_token: plan.fingerprint(),
            recommendations: recommendations(document, plan, detection),
            started_at,
            duration_seconds,
        }
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("report saved to {}", path.display());
        Ok(())
    }
}

/// A document the batch skipped, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    /// Source file name.
    pub file_name: String,
    /// Error that caused the skip.
    pub error: String,
}

/// Aggregate report over one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Files the batch was asked to process.
    pub total_files: usize,
    /// Files that produced a document report.
    pub processed: usize,
    /// Files skipped with their errors.
    pub skipped: Vec<SkippedFile>,
    /// Whether this was a preview-only run.
    pub preview_mode: bool,
    /// When the batch finished.
    pub finished_at: DateTime<Utc>,
    /// Per-document reports.
    pub files: Vec<DocumentReport>,
}

impl BatchReport {
    /// Write the batch report as pretty JSON.
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("batch report saved to {}", path.display());
        Ok(())
    }
}

/// Derive reviewer guidance from the plan and detection results.
fn recommendations(
    document: &Document,
    plan: &CleaningPlan,
    detection: &DetectionOutcome,
) -> Vec<String> {
    let mut notes = Vec::new();

    if plan.degraded {
        notes.push(format!(
            "Mean OCR confidence is low ({:.2}); header/footer removal was suppressed. \
             Consider re-scanning or a different language setting.",
            document.average_confidence()
        ));
    }

    for band in [detection.header.as_ref(), detection.footer.as_ref()]
        .into_iter()
        .flatten()
    {
        if band.score < 0.90 {
            notes.push(format!(
                "{} detection score is {:.2}; review the member pages before applying.",
                band.band, band.score
            ));
        }
    }

    let protected = plan
        .keep_regions
        .iter()
        .filter(|k| {
            matches!(
                k.reason,
                crate::model::KeepReason::TableProtected
                    | crate::model::KeepReason::TableStructureDetected
            )
        })
        .count();
    if protected > 0 {
        notes.push(format!("Protected {protected} table region(s) from deletion."));
    }

    let decorative = plan
        .remove_regions
        .iter()
        .filter(|r| r.reason == crate::model::RemoveReason::DecorativeSmallImage)
        .count();
    if decorative > 0 {
        notes.push(format!(
            "{decorative} decorative image(s) will be removed; review samples to confirm."
        ));
    }

    if plan.remove_regions.is_empty() {
        notes.push("No removals planned; the document is already clean.".to_string());
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Language, PlanMode};

    fn empty_plan(degraded: bool) -> CleaningPlan {
        CleaningPlan {
            remove_regions: vec![],
            keep_regions: vec![],
            mode: PlanMode::Preview,
            degraded,
        }
    }

    #[test]
    fn test_report_counts_and_notes() {
        let document = Document::new("report_ar.pdf", Language::Ara, vec![]);
        let plan = empty_plan(false);
        let detection = DetectionOutcome::default();

        let report = DocumentReport::new(&document, &plan, &detection, Utc::now(), 1.5);
        assert_eq!(report.file_name, "report_ar.pdf");
        assert_eq!(report.language, "ara");
        assert!(report
            .recommendations
            .iter()
            .any(|n| n.contains("No removals planned")));
    }

    #[test]
    fn test_degraded_note_present() {
        let document = Document::new("scan.pdf", Language::AraEng, vec![]);
        let plan = empty_plan(true);
        let detection = DetectionOutcome::default();

        let report = DocumentReport::new(&document, &plan, &detection, Utc::now(), 0.1);
        assert!(report.degraded);
        assert!(report
            .recommendations
            .iter()
            .any(|n| n.contains("confidence is low")));
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let document = Document::new("a.pdf", Language::Eng, vec![]);
        let report = DocumentReport::new(
            &document,
            &empty_plan(false),
            &DetectionOutcome::default(),
            Utc::now(),
            2.0,
        );

        let json = serde_json::to_string(&report).unwrap();
        let back: DocumentReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.file_name, "a.pdf");
        assert_eq!(back.plan_token, report.plan_token);
    }
}
