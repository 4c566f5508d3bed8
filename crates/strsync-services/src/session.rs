use std::path::{Path, PathBuf};

use strsync_core::{KeyMap, LocalizationItem, StringsError, UiDefinitionExtractor};
use strsync_domain::{FileReport, IssueMsg, MissingKey, SCHEMA_VERSION};
use strsync_parsers_strings::{load_strings, read_text, strip_fallbacks};
use strsync_parsers_xib::{XibExtractor, DEFAULT_EXTENSION};

use crate::base::{base_candidates, resolve_base, BasePaths, BaseSource};
use crate::render::render_records;
use crate::util::write_atomic;

/// Outcome of one `load -> resolve base -> diff` pass.
#[derive(Debug)]
pub struct UpdateReport {
    pub missing_key_count: usize,
    /// Non-fatal read/parse failures hit during this pass.
    pub errors: Vec<StringsError>,
}

/// Reconciliation session for one translated `.strings` file.
///
/// `content_dict` is what the translation file says; `content` is the record
/// list that gets rendered, including placeholders for keys only present in
/// the base resource.
pub struct LocalizableFile {
    path: PathBuf,
    base_dir: Option<PathBuf>,
    definition_ext: String,
    extractor: Box<dyn UiDefinitionExtractor>,
    content_dict: KeyMap,
    content: Vec<LocalizationItem>,
    base: BaseSource,
    base_path: Option<PathBuf>,
    missing_key_count: usize,
    fallbacks_removed: usize,
    issues: Vec<IssueMsg>,
}

impl std::fmt::Debug for LocalizableFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizableFile")
            .field("path", &self.path)
            .field("base_dir", &self.base_dir)
            .field("extractor", &self.extractor.name())
            .field("records", &self.content.len())
            .field("missing_key_count", &self.missing_key_count)
            .finish_non_exhaustive()
    }
}

impl LocalizableFile {
    /// Bind a session to `path` and strip stale English fallbacks from it on disk.
    pub fn open(path: impl Into<PathBuf>, base_dir: Option<PathBuf>) -> Self {
        let mut file = Self {
            path: path.into(),
            base_dir,
            definition_ext: DEFAULT_EXTENSION.to_string(),
            extractor: Box::new(XibExtractor),
            content_dict: KeyMap::new(),
            content: Vec::new(),
            base: BaseSource::None,
            base_path: None,
            missing_key_count: 0,
            fallbacks_removed: 0,
            issues: Vec::new(),
        };
        if let Err(e) = file.remove_fallbacks() {
            file.note(&e);
        }
        file
    }

    pub fn with_extractor(mut self, extractor: Box<dyn UiDefinitionExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_definition_extension(mut self, ext: impl Into<String>) -> Self {
        self.definition_ext = ext.into();
        self
    }

    /// Drop marker/fallback line pairs and rewrite the file when anything was removed.
    pub fn remove_fallbacks(&mut self) -> Result<usize, StringsError> {
        let text = read_text(&self.path)?;
        let (cleaned, removed) = strip_fallbacks(&text);
        if removed > 0 {
            write_atomic(&self.path, &cleaned, false)
                .map_err(|e| StringsError::io(&self.path, e))?;
            tracing::info!(event = "fallbacks_removed", path = %self.path.display(), removed = removed);
        }
        self.fallbacks_removed += removed;
        Ok(removed)
    }

    /// Read the translation file. On failure the session holds no records.
    pub fn load_file(&mut self) -> Result<(), StringsError> {
        self.content.clear();
        self.content_dict.clear();
        let dict = match load_strings(&self.path) {
            Ok(dict) => dict,
            Err(e) => {
                self.note(&e);
                return Err(e);
            }
        };
        self.content = dict
            .iter()
            .map(|(k, v)| LocalizationItem::translated(k.clone(), v.clone()))
            .collect();
        self.content_dict = dict;
        Ok(())
    }

    /// Resolve the base resource and refresh `base`/`base_class_name` on every record.
    pub fn load_base(&mut self) -> Result<(), StringsError> {
        self.base = BaseSource::None;
        self.base_path = None;
        let mut outcome = Ok(());

        if let Some(paths) = self.base_paths() {
            let resolved = resolve_base(&paths, self.extractor.as_ref());
            self.base = resolved.source;
            self.base_path = resolved.path;
            if let Some(e) = resolved.error {
                self.note(&e);
                outcome = Err(e);
            }
        }

        for item in &mut self.content {
            item.base = self.base.get(&item.key).map(str::to_owned);
            item.base_class_name = self.base.class_of(&item.key).map(str::to_owned);
        }
        outcome
    }

    /// Count base keys missing from the translation and append placeholders for them.
    pub fn check_for_issues(&mut self) {
        self.check_for_issues_with(true);
    }

    /// Like [`Self::check_for_issues`]; with `append_missing == false` only the count is updated.
    pub fn check_for_issues_with(&mut self, append_missing: bool) {
        if append_missing {
            // placeholders from an earlier pass are rebuilt below
            self.content.retain(|item| !item.is_placeholder());
        }
        self.missing_key_count = 0;
        for (key, value) in self.base.iter() {
            if self.content_dict.contains_key(key) {
                continue;
            }
            self.missing_key_count += 1;
            if append_missing {
                let class = self.base.class_of(key).map(str::to_owned);
                self.content
                    .push(LocalizationItem::placeholder(key.clone(), value.clone(), class));
            }
        }
        self.content.sort_by(|a, b| a.key.cmp(&b.key));
    }

    /// Full refresh: load the file, resolve the base, recompute missing keys.
    pub fn update(&mut self) -> UpdateReport {
        let mut errors = Vec::new();
        if let Err(e) = self.load_file() {
            errors.push(e);
        }
        if let Err(e) = self.load_base() {
            errors.push(e);
        }
        self.check_for_issues();
        tracing::info!(
            event = "update",
            path = %self.path.display(),
            base = ?self.base.kind(),
            records = self.content.len(),
            missing = self.missing_key_count,
            errors = errors.len()
        );
        UpdateReport {
            missing_key_count: self.missing_key_count,
            errors,
        }
    }

    /// Canonical file contents for the current records.
    pub fn render(&self) -> String {
        render_records(&self.content, self.base.is_ui_definition())
    }

    pub fn save(&mut self) -> Result<(), StringsError> {
        self.save_with(false)
    }

    /// Write [`Self::render`] atomically, optionally keeping a `.bak` copy.
    pub fn save_with(&mut self, backup: bool) -> Result<(), StringsError> {
        let rendered = self.render();
        if let Err(e) = write_atomic(&self.path, &rendered, backup) {
            let err = StringsError::io(&self.path, e);
            self.note(&err);
            return Err(err);
        }
        tracing::info!(event = "saved", path = %self.path.display(), bytes = rendered.len());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn base_paths(&self) -> Option<BasePaths> {
        base_candidates(&self.path, self.base_dir.as_deref()?, &self.definition_ext)
    }

    pub fn base(&self) -> &BaseSource {
        &self.base
    }

    /// Base file actually used by the last [`Self::load_base`].
    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    pub fn records(&self) -> &[LocalizationItem] {
        &self.content
    }

    pub fn content_dict(&self) -> &KeyMap {
        &self.content_dict
    }

    pub fn missing_key_count(&self) -> usize {
        self.missing_key_count
    }

    pub fn fallbacks_removed(&self) -> usize {
        self.fallbacks_removed
    }

    pub fn missing_keys(&self) -> impl Iterator<Item = &LocalizationItem> {
        self.content.iter().filter(|item| item.is_placeholder())
    }

    /// Translated keys the base does not know; they are dropped on save.
    pub fn stale_keys(&self) -> impl Iterator<Item = &str> {
        self.content
            .iter()
            .filter(|item| !item.is_placeholder() && item.base.is_none())
            .map(|item| item.key.as_str())
    }

    /// Records that [`Self::render`] writes out.
    pub fn translated_count(&self) -> usize {
        self.content
            .iter()
            .filter(|item| item.localization.is_some() && item.base.is_some())
            .count()
    }

    pub fn issues(&self) -> &[IssueMsg] {
        &self.issues
    }

    /// Record a problem the caller did not get as an error value.
    pub fn note_issue(&mut self, kind: &str, message: impl Into<String>) {
        self.issues.push(IssueMsg {
            kind: kind.to_string(),
            path: self.path.display().to_string(),
            message: message.into(),
        });
    }

    pub fn report(&self, written: bool) -> FileReport {
        FileReport {
            schema_version: SCHEMA_VERSION,
            path: self.path.display().to_string(),
            base_path: self.base_path.as_ref().map(|p| p.display().to_string()),
            base_kind: self.base.kind(),
            keys: self.content_dict.len(),
            translated: self.translated_count(),
            missing: self.missing_key_count,
            stale: self.stale_keys().map(str::to_owned).collect(),
            missing_keys: self
                .missing_keys()
                .map(|item| MissingKey {
                    key: item.key.clone(),
                    base: item.base.clone().unwrap_or_default(),
                    class_name: item.base_class_name.clone(),
                })
                .collect(),
            fallbacks_removed: self.fallbacks_removed,
            written,
            issues: self.issues.clone(),
        }
    }

    fn note(&mut self, err: &StringsError) {
        tracing::warn!(event = "strings_issue", kind = err.kind(), error = %err);
        self.issues.push(IssueMsg {
            kind: err.kind().to_string(),
            path: err.path().display().to_string(),
            message: err.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use strsync_core::UiDefinition;
    use strsync_domain::BaseKind;
    use strsync_parsers_strings::FALLBACK_MARKER;

    struct Project {
        _dir: tempfile::TempDir,
        base: PathBuf,
        file: PathBuf,
    }

    fn project(base_name: &str, base_text: &str, translation: &str) -> Project {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("Base.lproj");
        let target = dir.path().join("de.lproj");
        fs::create_dir_all(&base).expect("base dir");
        fs::create_dir_all(&target).expect("target dir");
        fs::write(base.join(base_name), base_text).expect("write base");
        let file = target.join("Main.strings");
        fs::write(&file, translation).expect("write translation");
        Project {
            _dir: dir,
            base,
            file,
        }
    }

    fn keys(file: &LocalizableFile) -> Vec<&str> {
        file.records().iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn update_adds_placeholder_for_missing_key() {
        let p = project(
            "Main.strings",
            "\"btn1.title\" = \"OK\";\n\"btn2.title\" = \"Cancel\";\n",
            "\"btn1.title\" = \"Ja\";\n",
        );
        let mut file = LocalizableFile::open(&p.file, Some(p.base.clone()));
        let report = file.update();

        assert!(report.errors.is_empty());
        assert_eq!(report.missing_key_count, 1);
        assert_eq!(keys(&file), ["btn1.title", "btn2.title"]);
        let btn2 = &file.records()[1];
        assert_eq!(btn2.base.as_deref(), Some("Cancel"));
        assert!(btn2.localization.is_none());
        assert_eq!(file.records()[0].base.as_deref(), Some("OK"));
        assert_eq!(file.base().kind(), BaseKind::Strings);
        assert_eq!(file.base_path(), Some(p.base.join("Main.strings").as_path()));

        file.save().expect("save");
        let written = fs::read_to_string(&p.file).expect("read back");
        assert_eq!(
            written,
            "/** Generated by strsync */\n\n\"btn1.title\" = \"Ja\";\n"
        );
    }

    #[test]
    fn repeated_checks_do_not_duplicate_placeholders() {
        let p = project(
            "Main.strings",
            "\"a.title\" = \"A\";\n\"b.title\" = \"B\";\n\"c.title\" = \"C\";\n",
            "\"b.title\" = \"Bee\";\n",
        );
        let mut file = LocalizableFile::open(&p.file, Some(p.base.clone()));
        file.update();
        let first = file.records().to_vec();
        file.check_for_issues();
        file.check_for_issues();
        file.update();
        assert_eq!(file.records(), first.as_slice());
        assert_eq!(file.missing_key_count(), 2);
        assert_eq!(file.missing_keys().count(), 2);
    }

    #[test]
    fn every_base_key_has_exactly_one_record_in_byte_order() {
        let p = project(
            "Main.strings",
            "\"b\" = \"1\";\n\"B\" = \"2\";\n\"a\" = \"3\";\n\"_\" = \"4\";\n",
            "\"a\" = \"x\";\n\"zz\" = \"stale\";\n",
        );
        let mut file = LocalizableFile::open(&p.file, Some(p.base.clone()));
        file.update();
        assert_eq!(keys(&file), ["B", "_", "a", "b", "zz"]);
        for key in ["b", "B", "a", "_"] {
            assert_eq!(file.records().iter().filter(|r| r.key == key).count(), 1);
        }
        assert_eq!(file.stale_keys().collect::<Vec<_>>(), ["zz"]);
        assert_eq!(file.translated_count(), 1);
    }

    #[test]
    fn count_only_check_leaves_records_untouched() {
        let p = project(
            "Main.strings",
            "\"a\" = \"A\";\n\"b\" = \"B\";\n",
            "\"a\" = \"x\";\n",
        );
        let mut file = LocalizableFile::open(&p.file, Some(p.base.clone()));
        file.load_file().expect("load");
        file.load_base().expect("base");
        file.check_for_issues_with(false);
        assert_eq!(file.missing_key_count(), 1);
        assert_eq!(keys(&file), ["a"]);

        // placeholders from a full pass survive a later count-only pass
        file.update();
        let before = file.records().to_vec();
        assert_eq!(before.len(), 2);
        file.check_for_issues_with(false);
        assert_eq!(file.records(), before.as_slice());
        assert_eq!(file.missing_key_count(), 1);
    }

    #[test]
    fn open_strips_fallback_pairs_from_disk() {
        let translation = format!(
            "\"a\" = \"x\";\n/* {FALLBACK_MARKER} */\n\"b\" = \"B\";\n\"c\" = \"y\";\n"
        );
        let p = project("Main.strings", "\"a\" = \"A\";\n\"b\" = \"B\";\n\"c\" = \"C\";\n", &translation);
        let mut file = LocalizableFile::open(&p.file, Some(p.base.clone()));
        assert_eq!(file.fallbacks_removed(), 1);
        assert_eq!(
            fs::read_to_string(&p.file).expect("read"),
            "\"a\" = \"x\";\n\"c\" = \"y\";\n"
        );
        file.update();
        assert_eq!(file.missing_key_count(), 1);
        assert_eq!(file.missing_keys().next().map(|r| r.key.as_str()), Some("b"));
    }

    #[test]
    fn clean_file_is_not_rewritten() {
        let p = project("Main.strings", "\"a\" = \"A\";", "\"a\" = \"x\";");
        let before = fs::metadata(&p.file).and_then(|m| m.modified()).expect("mtime");
        let file = LocalizableFile::open(&p.file, Some(p.base.clone()));
        assert_eq!(file.fallbacks_removed(), 0);
        let after = fs::metadata(&p.file).and_then(|m| m.modified()).expect("mtime");
        assert_eq!(before, after);
        assert_eq!(fs::read_to_string(&p.file).expect("read"), "\"a\" = \"x\";");
    }

    struct StubExtractor;

    impl UiDefinitionExtractor for StubExtractor {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn extract(&self, _path: &Path) -> Result<UiDefinition, StringsError> {
            let mut def = UiDefinition::default();
            def.titles.insert("w1.title".into(), "Window".into());
            def.classes.insert("w1.title".into(), "NSWindow".into());
            def.titles.insert("col.headerCell.title".into(), "Name".into());
            def.classes.insert("col.headerCell.title".into(), "NSTableColumn".into());
            Ok(def)
        }
    }

    #[test]
    fn injected_extractor_feeds_ui_definition_base() {
        let p = project("Main.nib", "ignored", "\"w1.title\" = \"Fenster\";\n");
        let mut file = LocalizableFile::open(&p.file, Some(p.base.clone()))
            .with_extractor(Box::new(StubExtractor))
            .with_definition_extension("nib");
        let report = file.update();
        assert!(report.errors.is_empty());
        assert!(file.base().is_ui_definition());
        assert_eq!(report.missing_key_count, 1);
        assert_eq!(keys(&file), ["col.headerCell.title", "w1.title"]);
        assert_eq!(file.records()[1].base_class_name.as_deref(), Some("NSWindow"));

        let rendered = file.render();
        assert!(rendered.contains(
            "/* Class = \"NSWindow\"; title = \"Window\"; ObjectID = \"w1\"; */\n\"w1.title\" = \"Fenster\";\n\n"
        ));
        assert!(!rendered.contains("col.headerCell.title"));
    }

    #[test]
    fn xib_base_is_used_when_no_string_table_exists() {
        let p = project(
            "Main.xib",
            r#"<document><objects><menuItem id="m1" title="Open"/></objects></document>"#,
            "",
        );
        let mut file = LocalizableFile::open(&p.file, Some(p.base.clone()));
        file.update();
        assert_eq!(file.base().kind(), BaseKind::UiDefinition);
        let item = file.missing_keys().next().expect("placeholder");
        assert_eq!(item.key, "m1.title");
        assert_eq!(item.base_class_name.as_deref(), Some("NSMenuItem"));
    }

    #[test]
    fn malformed_base_counts_as_empty_and_is_reported() {
        let p = project("Main.strings", "\"a\" = ", "\"a\" = \"x\";\n");
        let mut file = LocalizableFile::open(&p.file, Some(p.base.clone()));
        let report = file.update();
        assert_eq!(report.missing_key_count, 0);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind(), "parse");
        assert_eq!(file.issues().len(), 1);
        assert_eq!(keys(&file), ["a"]);
        assert!(file.records()[0].base.is_none());
    }

    #[test]
    fn malformed_translation_leaves_only_placeholders() {
        let p = project("Main.strings", "\"a\" = \"A\";\n", "\"a\" = \"x\"");
        let mut file = LocalizableFile::open(&p.file, Some(p.base.clone()));
        let report = file.update();
        assert_eq!(report.errors.len(), 1);
        assert!(file.content_dict().is_empty());
        assert_eq!(report.missing_key_count, 1);
        assert!(file.records().iter().all(LocalizationItem::is_placeholder));
    }

    #[test]
    fn without_base_dir_nothing_is_missing() {
        let p = project("Main.strings", "\"a\" = \"A\";", "\"a\" = \"x\";");
        let mut file = LocalizableFile::open(&p.file, None);
        let report = file.update();
        assert!(report.errors.is_empty());
        assert_eq!(report.missing_key_count, 0);
        assert_eq!(file.base(), &BaseSource::None);
        assert!(file.base_paths().is_none());

        let fr = file.report(false);
        assert_eq!(fr.base_kind, BaseKind::None);
        assert_eq!(fr.keys, 1);
        assert_eq!(fr.translated, 0);
        assert_eq!(fr.stale, ["a"]);
    }

    #[test]
    fn report_lists_missing_keys_with_base_text() {
        let p = project(
            "Main.strings",
            "\"a\" = \"A\";\n\"b\" = \"B\";\n",
            "\"a\" = \"x\";\n",
        );
        let mut file = LocalizableFile::open(&p.file, Some(p.base.clone()));
        file.update();
        let fr = file.report(false);
        assert_eq!(fr.missing, 1);
        assert_eq!(fr.translated, 1);
        assert_eq!(fr.missing_keys.len(), 1);
        assert_eq!(fr.missing_keys[0].key, "b");
        assert_eq!(fr.missing_keys[0].base, "B");
        assert!(fr.stale.is_empty());
    }

    #[test]
    fn save_with_backup_keeps_previous_contents() {
        let p = project("Main.strings", "\"a\" = \"A\";", "\"a\" = \"x\";");
        let mut file = LocalizableFile::open(&p.file, Some(p.base.clone()));
        file.update();
        file.save_with(true).expect("save");
        assert_eq!(
            fs::read_to_string(crate::util::backup_path(&p.file)).expect("backup"),
            "\"a\" = \"x\";"
        );
    }

    #[test]
    fn missing_translation_file_is_an_io_issue() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut file = LocalizableFile::open(dir.path().join("Nope.strings"), None);
        assert_eq!(file.issues().len(), 1);
        let err = file.load_file().expect_err("missing file");
        assert_eq!(err.kind(), "io");
    }
}
