pub mod batch;
pub mod check;
pub mod clean;
pub mod schema;
pub mod sync;

use std::path::{Path, PathBuf};

use strsync_config::StrSyncConfig;
use strsync_domain::FileReport;
use strsync_services::util::sibling_lang_dir;

use crate::ui;

/// Explicit `--base-dir`, else the configured base language directory next to the file's `.lproj`.
pub(crate) fn base_dir_for(
    file: &Path,
    base_dir: Option<PathBuf>,
    cfg: &StrSyncConfig,
) -> Option<PathBuf> {
    base_dir.or_else(|| sibling_lang_dir(file, cfg.base_lang_dir()))
}

/// A base was found but the file was not saved (load errors or a failed write).
/// A file with no base at all is skipped with a warning instead.
pub(crate) fn write_failed(report: &FileReport) -> bool {
    !report.written && report.base_path.is_some()
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> color_eyre::Result<()> {
    serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    println!();
    Ok(())
}

pub(crate) fn print_file_report(report: &FileReport, use_color: bool) {
    crate::ui_out!(
        "{}: {} keys, {} missing, {} stale",
        ui::path(&report.path, use_color),
        report.keys,
        ui::count(report.missing, use_color),
        ui::count(report.stale.len(), use_color)
    );
    for m in &report.missing_keys {
        crate::ui_out!(
            "  [{}] {} = \"{}\"",
            ui::kind("missing", use_color),
            ui::key(&m.key, use_color),
            m.base
        );
    }
    for key in &report.stale {
        crate::ui_out!(
            "  [{}] {}",
            ui::kind("stale", use_color),
            ui::key(key, use_color)
        );
    }
    for issue in &report.issues {
        crate::ui_warn!("[{}] {}", ui::kind(&issue.kind, use_color), issue.message);
    }
}
