//! Band text normalization.
//!
//! The repeated-element algorithms compare header/footer band text across
//! pages. Comparison happens on a normalized form; the document's own text
//! is never rewritten.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Normalizer with its compiled patterns.
pub struct Normalizer {
    /// A run of decimal digits in any script (ASCII, Arabic-Indic, ...).
    digit_run: Regex,
    /// Trailing page-number token with optional dash/dot decoration.
    trailing_page_number: Regex,
}

impl Normalizer {
    /// Compile the normalizer.
    pub fn new() -> Self {
        Self {
            digit_run: Regex::new(r"\p{Nd}+").unwrap(),
            trailing_page_number: Regex::new(r"[\s\-–—.·]*\p{Nd}+[\s\-–—.·]*$").unwrap(),
        }
    }

    /// Casefold and collapse whitespace (NFC first).
    pub fn casefold_collapse(&self, text: &str) -> String {
        let nfc: String = text.nfc().collect();
        nfc.to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Full normalization for exact-repetition grouping: casefold,
    /// whitespace collapse, then strip a trailing page-number token found
    /// by the digit-mask pass.
    pub fn normalize(&self, text: &str) -> String {
        let collapsed = self.casefold_collapse(text);
        self.trailing_page_number
            .replace(&collapsed, "")
            .trim()
            .to_string()
    }

    /// Replace every digit run with `#`, so "Page 3" and "Page 14" compare
    /// equal under fuzzy grouping.
    pub fn mask_digits(&self, text: &str) -> String {
        self.digit_run.replace_all(text, "#").into_owned()
    }

    /// Casefold, collapse, and mask all digit runs; the comparison form
    /// used by fuzzy matching.
    pub fn fuzzy_key(&self, text: &str) -> String {
        self.mask_digits(&self.casefold_collapse(text))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_casefold_collapse() {
        let n = Normalizer::new();
        assert_eq!(
            n.casefold_collapse("  Annual\tREPORT   2023 "),
            "annual report 2023"
        );
    }

    #[test]
    fn test_normalize_strips_trailing_page_number() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("Page 3"), "page");
        assert_eq!(n.normalize("Annual Report — 17"), "annual report");
        assert_eq!(n.normalize("Annual Report - 17 -"), "annual report");
    }

    #[test]
    fn test_normalize_keeps_inner_digits() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("Section 3 summary"), "section 3 summary");
    }

    #[test]
    fn test_normalize_arabic_indic_digits() {
        let n = Normalizer::new();
        // Arabic-Indic digits count as a trailing page number too.
        assert_eq!(n.normalize("التقرير السنوي ٣"), "التقرير السنوي");
    }

    #[test]
    fn test_mask_digits() {
        let n = Normalizer::new();
        assert_eq!(n.mask_digits("Page 3 of 450"), "Page # of #");
        assert_eq!(n.mask_digits("صفحة ٣"), "صفحة #");
    }

    #[test]
    fn test_fuzzy_key_equates_page_numbers() {
        let n = Normalizer::new();
        assert_eq!(n.fuzzy_key("Page 3"), n.fuzzy_key("page 14"));
    }
}
