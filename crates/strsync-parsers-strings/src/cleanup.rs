//! Removal of machine-inserted English fallbacks.
//!
//! Older tooling wrote untranslated keys as a marker comment followed by the
//! English entry. Both lines are dropped so the key shows up as missing again.

/// Text that identifies a fallback marker comment.
pub const FALLBACK_MARKER: &str = "FIXME: Using English localization instead";

/// Drop every marker line together with the next non-empty line after it;
/// empty lines in between go too. Returns the kept lines and the number of
/// removed pairs.
pub fn strip_fallback_lines<'a, I>(lines: I) -> (Vec<&'a str>, usize)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut kept = Vec::new();
    let mut removed = 0usize;
    let mut skip_next = false;
    for line in lines {
        if skip_next {
            if line.trim().is_empty() {
                continue;
            }
            skip_next = false;
            continue;
        }
        if line.contains(FALLBACK_MARKER) {
            skip_next = true;
            removed += 1;
            continue;
        }
        kept.push(line);
    }
    (kept, removed)
}

/// Apply [`strip_fallback_lines`] to a whole file; each kept line is newline-terminated.
pub fn strip_fallbacks(text: &str) -> (String, usize) {
    let (kept, removed) = strip_fallback_lines(text.lines());
    let mut out = String::with_capacity(text.len());
    for line in kept {
        out.push_str(line);
        out.push('\n');
    }
    (out, removed)
}
