use std::path::{Path, PathBuf};

use color_eyre::eyre::bail;
use strsync_domain::{BaseKind, BatchReport, FileReport, SCHEMA_VERSION};
use strsync_parsers_xib::DEFAULT_EXTENSION;
use walkdir::WalkDir;

use crate::session::LocalizableFile;
use crate::util::{parent_dir_name, sibling_lang_dir};
use crate::Result;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub definition_ext: String,
    /// Save the reconciled file; otherwise only report.
    pub write: bool,
    pub backup: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            definition_ext: DEFAULT_EXTENSION.to_string(),
            write: false,
            backup: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory name of the base language, e.g. `Base.lproj`.
    pub base_lang_dir: String,
    /// Directory name of the language to reconcile, e.g. `de.lproj`.
    pub target_lang_dir: String,
    pub sync: SyncOptions,
}

/// Reconcile one translation file and optionally save it.
///
/// The file is only written when both sides loaded cleanly and the base has
/// at least one key; otherwise the serializer would drop every record.
pub fn sync_file(path: &Path, base_dir: Option<&Path>, opts: &SyncOptions) -> FileReport {
    let mut file = LocalizableFile::open(path, base_dir.map(Path::to_path_buf))
        .with_definition_extension(opts.definition_ext.clone());
    let update = file.update();

    let mut written = false;
    if opts.write {
        let skip = if file.base().kind() == BaseKind::None {
            Some(("no-base", "no base resource found; file left unchanged"))
        } else if !update.errors.is_empty() {
            Some(("not-written", "read or parse errors; file left unchanged"))
        } else if file.base().is_empty() {
            Some(("empty-base", "base resource has no keys; file left unchanged"))
        } else {
            None
        };
        match skip {
            Some((kind, message)) => {
                tracing::warn!(event = "sync_skipped", path = %path.display(), reason = kind);
                file.note_issue(kind, message);
            }
            None => written = file.save_with(opts.backup).is_ok(),
        }
    }
    file.report(written)
}

/// Every `.strings` file directly inside a `target_lang_dir` directory under `root`.
pub fn collect_targets(root: &Path, target_lang_dir: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "strings"))
        .filter(|p| parent_dir_name(p).as_deref() == Some(target_lang_dir))
        .collect();
    files.sort();
    files
}

/// Reconcile every target-language `.strings` file under `root` against the
/// sibling base-language directory.
pub fn sync_tree(root: &Path, opts: &BatchOptions) -> Result<BatchReport> {
    if !root.is_dir() {
        bail!("root is not a directory: {}", root.display());
    }
    if opts.base_lang_dir == opts.target_lang_dir {
        bail!(
            "base and target language directories are the same: {}",
            opts.base_lang_dir
        );
    }

    let targets = collect_targets(root, &opts.target_lang_dir);
    tracing::info!(
        event = "batch_start",
        root = %root.display(),
        target = %opts.target_lang_dir,
        files = targets.len()
    );

    let mut files = Vec::with_capacity(targets.len());
    for path in &targets {
        let base_dir = sibling_lang_dir(path, &opts.base_lang_dir);
        files.push(sync_file(path, base_dir.as_deref(), &opts.sync));
    }

    let report = BatchReport {
        schema_version: SCHEMA_VERSION,
        root: root.display().to_string(),
        base_lang_dir: opts.base_lang_dir.clone(),
        target_lang_dir: opts.target_lang_dir.clone(),
        processed: files.len(),
        total_missing: files.iter().map(|f| f.missing).sum(),
        total_stale: files.iter().map(|f| f.stale.len()).sum(),
        files,
    };
    tracing::info!(
        event = "batch_done",
        processed = report.processed,
        missing = report.total_missing,
        stale = report.total_stale
    );
    Ok(report)
}
