//! Triple-backup writer.
//!
//! An applied document leaves three artifacts behind: the raw source copy,
//! the post-OCR layout snapshot, and the cleaned rebuild. All three must
//! exist before the apply step reports success, so every artifact is staged
//! under a temporary name and the set is promoted only once the last stage
//! write has landed. A failure mid-way removes the stages and leaves none
//! of the finals behind.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Paths of the three backup artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSet {
    /// Pre-processing copy of the source document.
    pub raw: PathBuf,
    /// Post-OCR, pre-clean layout snapshot (JSON).
    pub layout: PathBuf,
    /// Final cleaned document.
    pub cleaned: PathBuf,
}

impl BackupSet {
    /// Whether all three artifacts exist on disk.
    pub fn all_present(&self) -> bool {
        self.raw.is_file() && self.layout.is_file() && self.cleaned.is_file()
    }
}

/// Writes the triple backup for one document.
pub struct BackupWriter {
    dir: PathBuf,
    stem: String,
}

impl BackupWriter {
    /// Create a writer targeting `dir` with artifact names derived from
    /// `stem`.
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    /// Final artifact paths.
    pub fn target(&self) -> BackupSet {
        BackupSet {
            raw: self.dir.join(format!("{}.raw.pdf", self.stem)),
            layout: self.dir.join(format!("{}.ocr.json", self.stem)),
            cleaned: self.dir.join(format!("{}.cleaned.pdf", self.stem)),
        }
    }

    /// Stage and promote all three artifacts.
    ///
    /// `source` is copied as the raw backup, `layout_json` is the serialized
    /// layout snapshot, and `rebuild` writes the cleaned document to the
    /// staging path it receives.
    pub fn write_all(
        &self,
        source: &Path,
        layout_json: &str,
        rebuild: impl FnOnce(&Path) -> Result<()>,
    ) -> Result<BackupSet> {
        fs::create_dir_all(&self.dir)?;

        let target = self.target();
        let stage_raw = staging_path(&target.raw);
        let stage_layout = staging_path(&target.layout);
        let stage_cleaned = staging_path(&target.cleaned);
        let stages = [&stage_raw, &stage_layout, &stage_cleaned];

        let staged = (|| -> Result<()> {
            fs::copy(source, &stage_raw)?;
            fs::write(&stage_layout, layout_json)?;
            rebuild(&stage_cleaned)?;
            Ok(())
        })();

        if let Err(err) = staged {
            for stage in stages {
                let _ = fs::remove_file(stage);
            }
            return Err(err);
        }

        // All three stages exist; promotion is rename-only.
        fs::rename(&stage_raw, &target.raw)?;
        fs::rename(&stage_layout, &target.layout)?;
        fs::rename(&stage_cleaned, &target.cleaned)?;

        log::info!(
            "triple backup written: {}, {}, {}",
            target.raw.display(),
            target.layout.display(),
            target.cleaned.display()
        );
        Ok(target)
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(".tmp");
    target.with_file_name(name)
}
