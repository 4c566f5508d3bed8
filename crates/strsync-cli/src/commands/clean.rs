use std::path::PathBuf;

use color_eyre::eyre::bail;
use strsync_services::LocalizableFile;

use crate::{ui, Ctx};

pub fn run_clean(ctx: &Ctx, file: PathBuf, format: &str) -> color_eyre::Result<()> {
    // opening a session is what strips the fallback pairs
    let session = LocalizableFile::open(&file, None);
    if let Some(issue) = session.issues().first() {
        bail!("{}", issue.message);
    }
    let removed = session.fallbacks_removed();

    if format == "json" {
        #[derive(serde::Serialize)]
        struct Out {
            path: String,
            removed: usize,
        }
        return super::print_json(&Out {
            path: file.display().to_string(),
            removed,
        });
    }
    crate::ui_ok!(
        "{}: removed {} fallback entr{}",
        ui::path(&file.display().to_string(), ctx.use_color),
        removed,
        if removed == 1 { "y" } else { "ies" }
    );
    Ok(())
}
