//! Document-level types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::page::{Direction, Page};
use super::plan::CleaningPlan;

/// OCR language code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Language {
    /// Arabic.
    Ara,
    /// English.
    Eng,
    /// Mixed Arabic and English.
    AraEng,
    /// Any other engine-supported code, passed through verbatim.
    Other(String),
}

impl Language {
    /// The code string handed to the OCR engine.
    pub fn code(&self) -> &str {
        match self {
            Language::Ara => "ara",
            Language::Eng => "eng",
            Language::AraEng => "ara+eng",
            Language::Other(code) => code,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ara" => Language::Ara,
            "eng" => Language::Eng,
            "ara+eng" => Language::AraEng,
            other => Language::Other(other.to_string()),
        })
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> String {
        lang.code().to_string()
    }
}

impl TryFrom<String> for Language {
    type Error = std::convert::Infallible;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A fully extracted document: the ordered page sequence produced by the
/// chunk orchestrator, owned exclusively for the document's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable source identity.
    pub source: PathBuf,

    /// OCR language the document was recognized with.
    pub language: Language,

    /// Pages in ascending index order.
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a document from a merged page sequence.
    pub fn new(source: impl Into<PathBuf>, language: Language, pages: Vec<Page>) -> Self {
        Self {
            source: source.into(),
            language,
            pages,
        }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// File stem of the source, used to name derived artifacts.
    pub fn stem(&self) -> String {
        self.source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }

    /// File name of the source.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.stem())
    }

    /// Mean page OCR confidence, 0.0 for an empty document.
    pub fn average_confidence(&self) -> f32 {
        if self.pages.is_empty() {
            return 0.0;
        }
        self.pages.iter().map(|p| p.ocr_confidence).sum::<f32>() / self.pages.len() as f32
    }

    /// Page indices whose dominant direction is RTL.
    pub fn rtl_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|p| !p.text_blocks.is_empty() && p.dominant_direction() == Direction::Rtl)
            .map(|p| p.index)
            .collect()
    }

    /// Page indices whose dominant direction is LTR.
    pub fn ltr_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|p| !p.text_blocks.is_empty() && p.dominant_direction() == Direction::Ltr)
            .map(|p| p.index)
            .collect()
    }

    /// Concatenated page text with the plan's removed regions excluded.
    ///
    /// Surviving text is emitted verbatim (NFC only); pages are separated
    /// by blank lines.
    pub fn cleaned_text(&self, plan: &CleaningPlan) -> String {
        self.pages
            .iter()
            .map(|page| {
                page.text_blocks
                    .iter()
                    .filter(|block| !plan.removes_block(page.index, &block.bbox))
                    .map(|block| block.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Borrow the source path.
    pub fn source_path(&self) -> &Path {
        &self.source
    }
}
