use std::path::PathBuf;

use color_eyre::eyre::bail;
use strsync_services::{sync_file, SyncOptions};

use super::{base_dir_for, print_file_report, print_json};
use crate::Ctx;

pub fn run_check(
    ctx: &Ctx,
    file: PathBuf,
    base_dir: Option<PathBuf>,
    format: &str,
    strict: bool,
) -> color_eyre::Result<()> {
    let base_dir = base_dir_for(&file, base_dir, &ctx.cfg);
    let opts = SyncOptions {
        definition_ext: ctx.cfg.definition_ext().to_string(),
        ..SyncOptions::default()
    };
    let report = sync_file(&file, base_dir.as_deref(), &opts);

    if format == "json" {
        print_json(&report)?;
    } else {
        print_file_report(&report, ctx.use_color);
        if report.missing == 0 {
            crate::ui_ok!("no missing keys");
        }
    }
    if strict && report.missing > 0 {
        bail!("{} missing key(s) in {}", report.missing, report.path);
    }
    Ok(())
}
