//! iperc core library - hazard identification and risk assessment (IPERC) records

// Global invariants enforced in this crate:
// - Risk magnitude is always probability x severity, never taken from input
// - Classification is a pure lookup over a fixed ascending band table
// - Layout measures and draws text with the same style value
// - No global mutable state; stores are passed in explicitly
// - Identical records yield identical layouts and renderings

pub mod config;
pub mod error;
pub mod font;
pub mod html;
pub mod layout;
pub mod pdf;
pub mod record;
pub mod report;
pub mod risk;
pub mod service;
pub mod store;

pub use config::{ResolvedConfig, StoreKind};
pub use error::{NotFound, RecordError};
pub use layout::{layout, LayoutOptions, ReportLayout};
pub use pdf::{render_pdf, Disposition, PdfDocument};
pub use record::{EvaluationRecord, HazardRow, RecordDraft, RecordSummary, RowInput};
pub use report::{render_json, render_text};
pub use risk::{classify, RiskClassification, RiskLevel};
pub use store::{open_store, MemoryStore, RecordStore, SqliteStore};

use anyhow::{Context, Result};
use std::path::Path;

/// Write `bytes` to `path` via a temporary file and rename
///
/// Readers never observe a partially written file.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    use std::fs;
    use std::io::Write;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
    }

    let file_name = path
        .file_name()
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("failed to write to temp file: {}", tmp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync temp file: {}", tmp_path.display()))?;
    drop(file);

    fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename temp file to: {}", path.display()))?;
    Ok(())
}
