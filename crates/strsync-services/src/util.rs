use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

/// `<file>.bak` next to `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(".bak");
    PathBuf::from(s)
}

/// Replace `path` with `contents` through a temp file in the same directory,
/// so readers never observe a partial write. Keeps the old file's permissions.
pub fn write_atomic(path: &Path, contents: &str, backup: bool) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let previous = std::fs::metadata(path).ok();
    if backup && previous.is_some() {
        std::fs::copy(path, backup_path(path))?;
    }

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    if let Some(meta) = previous {
        std::fs::set_permissions(tmp.path(), meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Language directory that sits next to the one containing `file`
/// (`de.lproj/Main.strings` + `Base.lproj` -> `Base.lproj`). An absolute
/// `lang_dir` is returned as is.
pub fn sibling_lang_dir(file: &Path, lang_dir: &str) -> Option<PathBuf> {
    let candidate = Path::new(lang_dir);
    if candidate.is_absolute() {
        return Some(candidate.to_path_buf());
    }
    let project = file.parent()?.parent()?;
    Some(project.join(candidate))
}

/// Name of the directory directly containing `path`.
pub fn parent_dir_name(path: &Path) -> Option<String> {
    path.parent()?
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}
