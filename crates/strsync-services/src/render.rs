use strsync_core::{escape_quoted, LocalizationItem};

/// First line of every file we write.
pub const GENERATOR_MARKER: &str = "/** Generated by strsync */";

/// Render records in the given order. Records without a translation or
/// without a base text are skipped. With a UI-definition base every entry is
/// preceded by a comment naming class, property, base text and object id.
pub fn render_records(records: &[LocalizationItem], ui_definition: bool) -> String {
    let mut out = String::with_capacity(64 + records.len() * 48);
    out.push_str(GENERATOR_MARKER);
    out.push_str("\n\n");

    for item in records {
        let (Some(localization), Some(_)) = (item.escaped_localization(), item.base.as_ref())
        else {
            continue;
        };
        if ui_definition {
            out.push_str(&format!(
                "/* Class = \"{}\"; {} = \"{}\"; ObjectID = \"{}\"; */\n",
                item.base_class_name.as_deref().unwrap_or_default(),
                item.property_path(),
                item.base_for_display(),
                item.object_id(),
            ));
        }
        out.push_str(&format!(
            "\"{}\" = \"{}\";\n",
            escape_quoted(&item.key),
            localization
        ));
        if ui_definition {
            out.push('\n');
        }
    }
    out
}
