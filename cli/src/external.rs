//! External OCR engine adapter.
//!
//! Drives the system `pdftoppm` and `tesseract` binaries as the recognition
//! collaborator. The engine is an external black box from the library's
//! point of view; everything here is subprocess plumbing and TSV parsing.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::Command;

use naqi::{BBox, Error, Language, OcrEngine, PageOcr, RecognizedLine, Result};

/// Rasterization resolution handed to `pdftoppm`.
const DEFAULT_DPI: u32 = 300;

/// OCR engine backed by Tesseract.
pub struct TesseractEngine {
    tesseract: PathBuf,
    pdftoppm: PathBuf,
    dpi: u32,
}

impl TesseractEngine {
    /// Create an engine using binaries found on `PATH`.
    pub fn new() -> Self {
        Self {
            tesseract: PathBuf::from("tesseract"),
            pdftoppm: PathBuf::from("pdftoppm"),
            dpi: DEFAULT_DPI,
        }
    }

    /// Override the binary locations.
    pub fn with_binaries(mut self, tesseract: impl Into<PathBuf>, pdftoppm: impl Into<PathBuf>) -> Self {
        self.tesseract = tesseract.into();
        self.pdftoppm = pdftoppm.into();
        self
    }

    fn probe(binary: &Path, arg: &str) -> bool {
        Command::new(binary)
            .arg(arg)
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn rasterize(&self, source: &Path, pages: &Range<usize>, dir: &Path) -> Result<Vec<PathBuf>> {
        let prefix = dir.join("page");
        let status = Command::new(&self.pdftoppm)
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg((pages.start + 1).to_string())
            .arg("-l")
            .arg(pages.end.to_string())
            .arg(source)
            .arg(&prefix)
            .status()
            .map_err(|e| Error::Ocr(format!("pdftoppm failed to start: {e}")))?;
        if !status.success() {
            return Err(Error::Ocr(format!("pdftoppm exited with {status}")));
        }

        let mut rasters: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "png"))
            .collect();
        rasters.sort();
        Ok(rasters)
    }

    fn recognize_raster(&self, raster: &Path, language: &Language) -> Result<PageOcr> {
        let output = Command::new(&self.tesseract)
            .arg(raster)
            .arg("stdout")
            .arg("--psm")
            .arg("6")
            .arg("-l")
            .arg(language.code())
            .arg("tsv")
            .output()
            .map_err(|e| Error::Ocr(format!("tesseract failed to start: {e}")))?;
        if !output.status.success() {
            return Err(Error::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        Ok(self.parse_tsv(&tsv))
    }

    /// Parse Tesseract TSV output into a page of recognized lines.
    ///
    /// Level 4 rows open a line with its bbox; level 5 rows contribute word
    /// text and confidence to the open line. Pixel coordinates scale back to
    /// points at 72/dpi.
    fn parse_tsv(&self, tsv: &str) -> PageOcr {
        let scale = 72.0 / self.dpi as f32;
        let mut page = PageOcr::new(0.0, 0.0);
        let mut current: Option<(BBox, Vec<String>)> = None;
        let mut conf_sum = 0.0f32;
        let mut conf_count = 0usize;

        for row in tsv.lines().skip(1) {
            let cols: Vec<&str> = row.split('\t').collect();
            if cols.len() < 12 {
                continue;
            }
            let level: u32 = cols[0].parse().unwrap_or(0);
            let left: f32 = cols[6].parse().unwrap_or(0.0);
            let top: f32 = cols[7].parse().unwrap_or(0.0);
            let width: f32 = cols[8].parse().unwrap_or(0.0);
            let height: f32 = cols[9].parse().unwrap_or(0.0);

            match level {
                1 => {
                    page.width = width * scale;
                    page.height = height * scale;
                }
                4 => {
                    flush_line(&mut page, current.take());
                    let bbox = BBox::new(
                        left * scale,
                        top * scale,
                        (left + width) * scale,
                        (top + height) * scale,
                    );
                    current = Some((bbox, Vec::new()));
                }
                5 => {
                    let word = cols[11].trim();
                    if word.is_empty() {
                        continue;
                    }
                    if let Ok(conf) = cols[10].parse::<f32>() {
                        if conf >= 0.0 {
                            conf_sum += conf;
                            conf_count += 1;
                        }
                    }
                    if let Some((_, words)) = current.as_mut() {
                        words.push(word.to_string());
                    }
                }
                _ => {}
            }
        }
        flush_line(&mut page, current.take());

        page.confidence = if conf_count > 0 {
            (conf_sum / conf_count as f32 / 100.0).clamp(0.0, 1.0)
        } else {
            0.0
        };
        page
    }
}

fn flush_line(page: &mut PageOcr, line: Option<(BBox, Vec<String>)>) {
    if let Some((bbox, words)) = line {
        if !words.is_empty() {
            page.lines.push(RecognizedLine::new(words.join(" "), bbox));
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn is_available(&self) -> bool {
        Self::probe(&self.tesseract, "--version") && Self::probe(&self.pdftoppm, "-v")
    }

    fn recognize(
        &self,
        source: &Path,
        pages: Range<usize>,
        language: &Language,
    ) -> Result<Vec<PageOcr>> {
        let scratch = tempfile::tempdir()?;
        let rasters = self.rasterize(source, &pages, scratch.path())?;
        if rasters.len() != pages.len() {
            return Err(Error::Ocr(format!(
                "rasterized {} page(s) for a {}-page range",
                rasters.len(),
                pages.len()
            )));
        }

        rasters
            .iter()
            .map(|raster| self.recognize_raster(raster, language))
            .collect()
    }
}
