use std::path::PathBuf;

use color_eyre::eyre::bail;
use strsync_services::{sync_file, LocalizableFile, SyncOptions};

use super::{base_dir_for, print_file_report, print_json, write_failed};
use crate::Ctx;

pub fn run_sync(
    ctx: &Ctx,
    file: PathBuf,
    base_dir: Option<PathBuf>,
    dry_run: bool,
    backup: bool,
    format: &str,
) -> color_eyre::Result<()> {
    let base_dir = base_dir_for(&file, base_dir, &ctx.cfg);
    tracing::debug!(event = "sync_args", file = ?file, base_dir = ?base_dir, dry_run = dry_run);

    if dry_run {
        let mut session = LocalizableFile::open(&file, base_dir)
            .with_definition_extension(ctx.cfg.definition_ext());
        session.update();
        if format == "json" {
            return print_json(&session.report(false));
        }
        print!("{}", session.render());
        return Ok(());
    }

    let opts = SyncOptions {
        definition_ext: ctx.cfg.definition_ext().to_string(),
        write: true,
        backup: backup || ctx.cfg.backup(),
    };
    let report = sync_file(&file, base_dir.as_deref(), &opts);
    if format == "json" {
        print_json(&report)?;
    } else {
        print_file_report(&report, ctx.use_color);
        if report.written {
            crate::ui_ok!("written {}", report.path);
        }
    }
    if write_failed(&report) {
        bail!("{} was not written", report.path);
    }
    Ok(())
}
