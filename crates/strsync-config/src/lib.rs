use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "strsync.toml";
pub const DEFAULT_BASE_LANG_DIR: &str = "Base.lproj";
pub const DEFAULT_DEFINITION_EXT: &str = "xib";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StrSyncConfig {
    /// Directory (relative to the translation's `.lproj` parent, or absolute) holding base resources.
    pub base_lang_dir: Option<String>,
    pub target_lang_dir: Option<String>,
    pub definition_ext: Option<String>,
    pub backup: Option<bool>,
    pub log_dir: Option<String>,
    pub batch: Option<BatchCfg>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BatchCfg {
    pub root: Option<String>,
    pub write: Option<bool>,
}

impl StrSyncConfig {
    pub fn base_lang_dir(&self) -> &str {
        self.base_lang_dir.as_deref().unwrap_or(DEFAULT_BASE_LANG_DIR)
    }

    pub fn definition_ext(&self) -> &str {
        self.definition_ext
            .as_deref()
            .unwrap_or(DEFAULT_DEFINITION_EXT)
    }

    pub fn backup(&self) -> bool {
        self.backup.unwrap_or(false)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Read one config file. A missing or unreadable file yields `Ok(None)`.
pub fn read_config_file(path: &Path) -> Result<Option<StrSyncConfig>, ConfigError> {
    let Ok(text) = std::fs::read_to_string(path) else {
        return Ok(None);
    };
    toml::from_str::<StrSyncConfig>(&text)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Candidate config locations, highest priority first.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(CONFIG_FILE_NAME));
    }
    if let Some(base) = dirs::config_dir() {
        paths.push(base.join("strsync").join(CONFIG_FILE_NAME));
    }
    paths
}

pub fn load_config() -> Result<StrSyncConfig, ConfigError> {
    // Search order: CWD/strsync.toml, $CONFIG/strsync/strsync.toml
    Ok(load_config_from(&config_search_paths()))
}

/// Merge configs from `paths`; earlier files win field by field. Malformed files are skipped.
pub fn load_config_from(paths: &[PathBuf]) -> StrSyncConfig {
    let mut merged = StrSyncConfig::default();
    for path in paths {
        match read_config_file(path) {
            Ok(Some(cfg)) => {
                tracing::debug!(event = "config_loaded", path = %path.display());
                merged = merge(merged, cfg);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(event = "config_ignored", error = %e),
        }
    }
    merged
}

fn merge(mut a: StrSyncConfig, b: StrSyncConfig) -> StrSyncConfig {
    if a.base_lang_dir.is_none() {
        a.base_lang_dir = b.base_lang_dir;
    }
    if a.target_lang_dir.is_none() {
        a.target_lang_dir = b.target_lang_dir;
    }
    if a.definition_ext.is_none() {
        a.definition_ext = b.definition_ext;
    }
    if a.backup.is_none() {
        a.backup = b.backup;
    }
    if a.log_dir.is_none() {
        a.log_dir = b.log_dir;
    }
    a.batch = merge_opt(a.batch, b.batch, merge_batch);
    a
}

fn merge_opt<T>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_batch(mut a: BatchCfg, b: BatchCfg) -> BatchCfg {
    if a.root.is_none() {
        a.root = b.root;
    }
    if a.write.is_none() {
        a.write = b.write;
    }
    a
}
