use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Which kind of base resource a translation was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BaseKind {
    Strings,
    UiDefinition,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MissingKey {
    pub key: String,
    pub base: String,
    pub class_name: Option<String>,
}

/// Non-fatal problem surfaced while processing a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IssueMsg {
    pub kind: String,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileReport {
    pub schema_version: u32,
    pub path: String,
    pub base_path: Option<String>,
    pub base_kind: BaseKind,
    /// Keys present in the translation file.
    pub keys: usize,
    /// Records that will be written on save.
    pub translated: usize,
    pub missing: usize,
    /// Translated keys with no base counterpart; dropped on save.
    pub stale: Vec<String>,
    pub missing_keys: Vec<MissingKey>,
    pub fallbacks_removed: usize,
    pub written: bool,
    pub issues: Vec<IssueMsg>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchReport {
    pub schema_version: u32,
    pub root: String,
    pub base_lang_dir: String,
    pub target_lang_dir: String,
    pub processed: usize,
    pub total_missing: usize,
    pub total_stale: usize,
    pub files: Vec<FileReport>,
}
