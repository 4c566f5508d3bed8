use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use strsync_core::{StringsError, UiDefinition, UiDefinitionExtractor};

/// File extension of the documents [`XibExtractor`] reads.
pub const DEFAULT_EXTENSION: &str = "xib";

/// Attributes that carry user-visible text.
const LOCALIZABLE_ATTRS: &[&str] = &[
    "title",
    "alternateTitle",
    "placeholderString",
    "toolTip",
    "label",
    "paletteLabel",
];

/// XIB element name -> Cocoa class, for elements without `customClass`.
const CLASS_NAMES: &[(&str, &str)] = &[
    ("box", "NSBox"),
    ("button", "NSButton"),
    ("buttonCell", "NSButtonCell"),
    ("comboBox", "NSComboBox"),
    ("comboBoxCell", "NSComboBoxCell"),
    ("customObject", "NSObject"),
    ("customView", "NSView"),
    ("imageView", "NSImageView"),
    ("matrix", "NSMatrix"),
    ("menu", "NSMenu"),
    ("menuItem", "NSMenuItem"),
    ("panel", "NSPanel"),
    ("popUpButton", "NSPopUpButton"),
    ("popUpButtonCell", "NSPopUpButtonCell"),
    ("scrollView", "NSScrollView"),
    ("searchField", "NSSearchField"),
    ("searchFieldCell", "NSSearchFieldCell"),
    ("secureTextField", "NSSecureTextField"),
    ("secureTextFieldCell", "NSSecureTextFieldCell"),
    ("segmentedCell", "NSSegmentedCell"),
    ("segmentedControl", "NSSegmentedControl"),
    ("slider", "NSSlider"),
    ("sliderCell", "NSSliderCell"),
    ("stackView", "NSStackView"),
    ("tabView", "NSTabView"),
    ("tabViewItem", "NSTabViewItem"),
    ("tableColumn", "NSTableColumn"),
    ("tableHeaderCell", "NSTableHeaderCell"),
    ("textField", "NSTextField"),
    ("textFieldCell", "NSTextFieldCell"),
    ("textView", "NSTextView"),
    ("toolbarItem", "NSToolbarItem"),
    ("view", "NSView"),
    ("viewController", "NSViewController"),
    ("window", "NSWindow"),
    ("windowController", "NSWindowController"),
];

/// Class name for an element: lookup table, else `NS` + capitalized element name.
pub fn class_for_element(name: &str) -> String {
    if let Some((_, class)) = CLASS_NAMES.iter().find(|(n, _)| *n == name) {
        return (*class).to_string();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("NS{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "NSObject".to_string(),
    }
}

/// Default extractor for Interface Builder documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct XibExtractor;

impl UiDefinitionExtractor for XibExtractor {
    fn name(&self) -> &'static str {
        DEFAULT_EXTENSION
    }

    fn extract(&self, path: &Path) -> Result<UiDefinition, StringsError> {
        let text = std::fs::read_to_string(path).map_err(|e| StringsError::io(path, e))?;
        let def = extract_from_str(&text).map_err(|message| StringsError::Extract {
            path: path.to_path_buf(),
            message,
        })?;
        tracing::debug!(event = "xib_extracted", path = %path.display(), keys = def.titles.len());
        Ok(def)
    }
}

#[derive(Debug, Clone)]
struct Owner {
    id: String,
    class: String,
}

#[derive(Debug)]
struct Frame {
    name: String,
    owner: Option<Owner>,
}

/// `<string key="title">...</string>` child being collected.
struct Capture {
    owner: Owner,
    property: String,
    text: String,
}

#[derive(Default)]
struct Collector {
    def: UiDefinition,
    segment_index: HashMap<String, usize>,
}

impl Collector {
    fn record(&mut self, owner: &Owner, property: &str, value: String) {
        if value.is_empty() {
            return;
        }
        let key = format!("{}.{}", owner.id, property);
        self.def.classes.insert(key.clone(), owner.class.clone());
        self.def.titles.insert(key, value);
    }
}

/// Extract titles and classes from XIB text. Errors are human-readable descriptions.
pub fn extract_from_str(xml: &str) -> Result<UiDefinition, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut capture: Option<Capture> = None;
    let mut out = Collector::default();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| format!("at byte {}: {e}", reader.buffer_position()))?;
        match event {
            Event::Start(e) => {
                let frame = open_element(&e, &stack, &mut out, &mut capture)?;
                stack.push(frame);
            }
            Event::Empty(e) => {
                open_element(&e, &stack, &mut out, &mut capture)?;
                // an empty <string key="title"/> still closes its capture
                if let Some(c) = capture.take() {
                    out.record(&c.owner, &c.property, c.text);
                }
            }
            Event::Text(t) => {
                if let Some(c) = capture.as_mut() {
                    let text = t.unescape().map_err(|e| e.to_string())?;
                    c.text.push_str(&text);
                }
            }
            Event::CData(t) => {
                if let Some(c) = capture.as_mut() {
                    c.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack.pop();
                if frame.as_ref().is_some_and(|f| f.name == "string") {
                    if let Some(c) = capture.take() {
                        out.record(&c.owner, &c.property, c.text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(format!("unexpected end of document inside <{}>", open.name));
    }
    Ok(out.def)
}

fn open_element(
    e: &BytesStart<'_>,
    stack: &[Frame],
    out: &mut Collector,
    capture: &mut Option<Capture>,
) -> Result<Frame, String> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let attrs = attributes_of(e)?;
    let attr = |k: &str| {
        attrs
            .iter()
            .find(|(n, _)| n == k)
            .map(|(_, v)| v.as_str())
    };
    let parent_owner = stack.iter().rev().find_map(|f| f.owner.as_ref());

    let owner = attr("id").map(|id| Owner {
        id: id.to_string(),
        class: attr("customClass")
            .map(str::to_string)
            .unwrap_or_else(|| class_for_element(&name)),
    });

    match name.as_str() {
        // header titles are keyed by the owning column
        "tableHeaderCell" => {
            let column = stack
                .iter()
                .rev()
                .find(|f| f.name == "tableColumn")
                .and_then(|f| f.owner.as_ref());
            if let (Some(column), Some(title)) = (column, attr("title")) {
                out.record(column, "headerCell.title", title.to_string());
            }
        }
        "segment" => {
            if let Some(cell) = parent_owner {
                let index = out.segment_index.entry(cell.id.clone()).or_insert(0);
                let property = format!("ibShadowedLabels[{index}]");
                *index += 1;
                if let Some(label) = attr("label") {
                    out.record(cell, &property, label.to_string());
                }
            }
        }
        "string" => {
            let key = attr("key").filter(|k| LOCALIZABLE_ATTRS.contains(k));
            if let (Some(key), Some(owner)) = (key, parent_owner) {
                *capture = Some(Capture {
                    owner: owner.clone(),
                    property: key.to_string(),
                    text: String::new(),
                });
            }
        }
        _ => {
            if let Some(owner) = owner.as_ref() {
                for property in LOCALIZABLE_ATTRS.iter().copied() {
                    if let Some(value) = attr(property) {
                        out.record(owner, property, value.to_string());
                    }
                }
            }
        }
    }

    Ok(Frame { name, owner })
}

fn attributes_of(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, String> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        out.push((key, value));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<document type="com.apple.InterfaceBuilder3.Cocoa.XIB" version="3.0">
    <objects>
        <customObject id="-2" userLabel="File's Owner" customClass="PrefGeneralViewController"/>
        <window title="Preferences" id="F0z-JX-Cv5">
            <view key="contentView" id="se5-gp-TjO">
                <subviews>
                    <button id="btn1">
                        <buttonCell key="cell" type="push" title="OK" alternateTitle="" id="btn1-cell"/>
                    </button>
                    <textField id="tf1" customClass="IINATextField">
                        <textFieldCell key="cell" placeholderString="Search &amp; filter" id="tf1-cell">
                            <string key="title">Line one
Line two</string>
                        </textFieldCell>
                    </textField>
                    <tableColumn identifier="name" id="col1">
                        <tableHeaderCell key="headerCell" title="Name" id="hdr1"/>
                    </tableColumn>
                    <segmentedCell id="seg1">
                        <segments>
                            <segment label="Left"/>
                            <segment/>
                            <segment label="Right"/>
                        </segments>
                    </segmentedCell>
                </subviews>
            </view>
        </window>
        <menu title="Main" id="m1">
            <items>
                <menuItem title="Quit IINA" keyEquivalent="q" id="mi1"/>
            </items>
        </menu>
    </objects>
</document>
"#;

    #[test]
    fn extracts_titles_with_element_classes() {
        let def = extract_from_str(SAMPLE).expect("valid xib");
        assert_eq!(def.titles["F0z-JX-Cv5.title"], "Preferences");
        assert_eq!(def.classes["F0z-JX-Cv5.title"], "NSWindow");
        assert_eq!(def.titles["btn1-cell.title"], "OK");
        assert_eq!(def.classes["btn1-cell.title"], "NSButtonCell");
        assert_eq!(def.titles["mi1.title"], "Quit IINA");
        assert_eq!(def.classes["mi1.title"], "NSMenuItem");
        assert_eq!(def.titles["m1.title"], "Main");
        assert!(!def.titles.contains_key("btn1-cell.alternateTitle"));
    }

    #[test]
    fn unescapes_attributes_and_reads_string_children() {
        let def = extract_from_str(SAMPLE).expect("valid xib");
        assert_eq!(def.titles["tf1-cell.placeholderString"], "Search & filter");
        assert_eq!(def.titles["tf1-cell.title"], "Line one\nLine two");
        assert_eq!(def.classes["tf1-cell.title"], "NSTextFieldCell");
    }

    #[test]
    fn header_and_segment_labels_use_owner_ids() {
        let def = extract_from_str(SAMPLE).expect("valid xib");
        assert_eq!(def.titles["col1.headerCell.title"], "Name");
        assert_eq!(def.classes["col1.headerCell.title"], "NSTableColumn");
        assert_eq!(def.titles["seg1.ibShadowedLabels[0]"], "Left");
        assert_eq!(def.titles["seg1.ibShadowedLabels[2]"], "Right");
        assert!(!def.titles.contains_key("seg1.ibShadowedLabels[1]"));
        assert_eq!(def.classes["seg1.ibShadowedLabels[0]"], "NSSegmentedCell");
    }

    #[test]
    fn custom_class_wins_over_element_name() {
        let def = extract_from_str(
            r#"<document><objects><textField id="t" customClass="IINATextField" toolTip="Hint"/></objects></document>"#,
        )
        .expect("valid xib");
        assert_eq!(def.classes["t.toolTip"], "IINATextField");
        assert_eq!(class_for_element("levelIndicator"), "NSLevelIndicator");
    }

    #[test]
    fn malformed_documents_are_errors() {
        assert!(extract_from_str("<document><objects></document>").is_err());
        assert!(extract_from_str("<document><objects>").is_err());
    }

    #[test]
    fn extractor_reports_path_on_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bad = dir.path().join("Broken.xib");
        std::fs::write(&bad, "<document><a></b></document>").expect("write");
        let err = XibExtractor.extract(&bad).unwrap_err();
        assert_eq!(err.kind(), "extract");
        assert_eq!(err.path(), bad.as_path());

        let good = dir.path().join("Main.xib");
        std::fs::write(&good, SAMPLE).expect("write");
        let def = XibExtractor.extract(&good).expect("extract");
        assert!(def.titles.contains_key("mi1.title"));
    }
}
