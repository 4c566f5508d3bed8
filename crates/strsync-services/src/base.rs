use std::path::{Path, PathBuf};

use strsync_core::{KeyMap, StringsError, UiDefinition, UiDefinitionExtractor};
use strsync_domain::BaseKind;
use strsync_parsers_strings::load_strings;

/// Base resource a translation is checked against, resolved once per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BaseSource {
    #[default]
    None,
    Flat(KeyMap),
    UiDefinition(UiDefinition),
}

impl BaseSource {
    pub fn titles(&self) -> Option<&KeyMap> {
        match self {
            Self::None => None,
            Self::Flat(map) => Some(map),
            Self::UiDefinition(def) => Some(&def.titles),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.titles().into_iter().flatten()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.titles()?.get(key).map(String::as_str)
    }

    pub fn class_of(&self, key: &str) -> Option<&str> {
        match self {
            Self::UiDefinition(def) => def.classes.get(key).map(String::as_str),
            _ => None,
        }
    }

    pub fn is_ui_definition(&self) -> bool {
        matches!(self, Self::UiDefinition(_))
    }

    pub fn len(&self) -> usize {
        self.titles().map_or(0, KeyMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> BaseKind {
        match self {
            Self::None => BaseKind::None,
            Self::Flat(_) => BaseKind::Strings,
            Self::UiDefinition(_) => BaseKind::UiDefinition,
        }
    }
}

/// Candidate base resources for one translation file, in probe order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePaths {
    pub strings: PathBuf,
    pub definition: PathBuf,
}

/// `<base_dir>/<file name>` and `<base_dir>/<stem>.<definition_ext>`.
pub fn base_candidates(file: &Path, base_dir: &Path, definition_ext: &str) -> Option<BasePaths> {
    let strings = base_dir.join(file.file_name()?);
    let definition = strings.with_extension(definition_ext);
    Some(BasePaths {
        strings,
        definition,
    })
}

#[derive(Debug, Default)]
pub struct ResolvedBase {
    pub source: BaseSource,
    /// File the base was read from, if one was found.
    pub path: Option<PathBuf>,
    /// Read/parse failure; `source` then holds an empty table of the detected kind.
    pub error: Option<StringsError>,
}

/// Probe the string-table candidate first, then the UI definition.
/// Neither existing is not an error.
pub fn resolve_base(paths: &BasePaths, extractor: &dyn UiDefinitionExtractor) -> ResolvedBase {
    if paths.strings.exists() {
        let (source, error) = match load_strings(&paths.strings) {
            Ok(map) => (BaseSource::Flat(map), None),
            Err(e) => (BaseSource::Flat(KeyMap::new()), Some(e)),
        };
        return ResolvedBase {
            source,
            path: Some(paths.strings.clone()),
            error,
        };
    }
    if paths.definition.exists() {
        let (source, error) = match extractor.extract(&paths.definition) {
            Ok(def) => (BaseSource::UiDefinition(def), None),
            Err(e) => (BaseSource::UiDefinition(UiDefinition::default()), Some(e)),
        };
        tracing::debug!(
            event = "base_ui_definition",
            extractor = extractor.name(),
            path = %paths.definition.display()
        );
        return ResolvedBase {
            source,
            path: Some(paths.definition.clone()),
            error,
        };
    }
    ResolvedBase::default()
}
