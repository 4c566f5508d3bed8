use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Ordered key/value table as read from a string table or derived from a UI definition.
pub type KeyMap = IndexMap<String, String>;

/// One translation record of a `.strings` file.
///
/// The key is dot-delimited: the first segment names the owning UI element,
/// the rest is the property path (`"objectID.title"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizationItem {
    pub key: String,
    /// Base-language text, `None` when the key is not in the base resource.
    pub base: Option<String>,
    /// Current translation, `None` for placeholders injected during reconciliation.
    pub localization: Option<String>,
    /// Class of the owning UI element; only known for UI-definition bases.
    pub base_class_name: Option<String>,
}

impl LocalizationItem {
    /// Record loaded from the translation file. Base fields are filled in later.
    pub fn translated(key: impl Into<String>, localization: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            base: None,
            localization: Some(localization.into()),
            base_class_name: None,
        }
    }

    /// Record for a key present in the base but missing from the translation.
    pub fn placeholder(
        key: impl Into<String>,
        base: impl Into<String>,
        base_class_name: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            base: Some(base.into()),
            localization: None,
            base_class_name,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.localization.is_none()
    }

    /// First key segment (owning element identifier).
    pub fn object_id(&self) -> &str {
        self.key.split_once('.').map_or(self.key.as_str(), |(id, _)| id)
    }

    /// Key without its leading element identifier; empty when the key has no dot.
    pub fn property_path(&self) -> &str {
        self.key.split_once('.').map_or("", |(_, rest)| rest)
    }

    /// Translation escaped for a quoted string-table value.
    pub fn escaped_localization(&self) -> Option<String> {
        self.localization.as_deref().map(escape_quoted)
    }

    /// Base text made safe for a single-line `/* ... */` comment.
    pub fn base_for_display(&self) -> String {
        let base = self.base.as_deref().unwrap_or_default();
        let mut out = String::with_capacity(base.len());
        for ch in base.chars() {
            match ch {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(ch),
            }
        }
        out.replace("*/", "*\\/")
    }
}

/// Escape `\` and `"` for a double-quoted string-table literal.
pub fn escape_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out
}

/// Key/value data extracted from a UI-definition document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiDefinition {
    /// `"<elementID>.<property>"` -> displayable title.
    pub titles: KeyMap,
    /// `"<elementID>.<property>"` -> class name of the owning element.
    pub classes: KeyMap,
}

/// Pluggable reader for UI-definition files (`.xib` and similar).
pub trait UiDefinitionExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, path: &Path) -> std::result::Result<UiDefinition, StringsError>;
}

/// Failures while reading, decoding or parsing localization resources.
#[derive(Debug, Error)]
pub enum StringsError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: file is not valid UTF-8 or UTF-16", path.display())]
    Encoding { path: PathBuf },
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{}: {message}", path.display())]
    Extract { path: PathBuf, message: String },
}

impl StringsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Machine-readable category used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Encoding { .. } => "encoding",
            Self::Parse { .. } => "parse",
            Self::Extract { .. } => "extract",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Encoding { path }
            | Self::Parse { path, .. }
            | Self::Extract { path, .. } => path,
        }
    }
}
