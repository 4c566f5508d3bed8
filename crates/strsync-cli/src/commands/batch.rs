use std::path::PathBuf;

use color_eyre::eyre::{bail, eyre};
use strsync_services::{sync_tree, BatchOptions, SyncOptions};

use super::{print_file_report, print_json, write_failed};
use crate::{ui, Ctx};

pub fn run_batch(
    ctx: &Ctx,
    root: Option<PathBuf>,
    base: Option<String>,
    lang: Option<String>,
    write: bool,
    backup: bool,
    format: &str,
) -> color_eyre::Result<()> {
    let batch_cfg = ctx.cfg.batch.clone().unwrap_or_default();
    let root = root
        .or_else(|| batch_cfg.root.map(PathBuf::from))
        .ok_or_else(|| eyre!("no --root given and no [batch] root configured"))?;
    let target_lang_dir = lang
        .or_else(|| ctx.cfg.target_lang_dir.clone())
        .ok_or_else(|| eyre!("no --lang given and no target_lang_dir configured"))?;
    let opts = BatchOptions {
        base_lang_dir: base.unwrap_or_else(|| ctx.cfg.base_lang_dir().to_string()),
        target_lang_dir,
        sync: SyncOptions {
            definition_ext: ctx.cfg.definition_ext().to_string(),
            write: write || batch_cfg.write.unwrap_or(false),
            backup: backup || ctx.cfg.backup(),
        },
    };

    let report = sync_tree(&root, &opts)?;
    if format == "json" {
        print_json(&report)?;
    } else {
        for file in &report.files {
            print_file_report(file, ctx.use_color);
        }
        crate::ui_ok!(
            "{} file(s) processed, {} missing, {} stale",
            report.processed,
            ui::count(report.total_missing, ctx.use_color),
            ui::count(report.total_stale, ctx.use_color)
        );
    }
    if opts.sync.write {
        let failed = report.files.iter().filter(|f| write_failed(f)).count();
        if failed > 0 {
            bail!("{failed} file(s) could not be written");
        }
    }
    Ok(())
}
