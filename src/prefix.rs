//! Prefix extraction
//!
//! Finds the fragment of text a completion would replace. Offsets are byte
//! offsets into the command line.

use serde::{Deserialize, Serialize};

/// The span of the command line a candidate replaces
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementRange {
    pub start: usize,
    pub length: usize,
}

impl ReplacementRange {
    /// Range ending at `cursor` and covering `prefix`
    pub fn for_prefix(cursor: usize, prefix: &str) -> Self {
        Self {
            start: cursor.saturating_sub(prefix.len()),
            length: prefix.len(),
        }
    }
}

/// Extract the text being completed at `cursor`.
///
/// Returns an empty string for blank lines, when the cursor sits inside a
/// word, or when the text before the cursor ends in whitespace. Cursor
/// offsets past the end of the line are treated as end of line.
pub fn extract_prefix(line: &str, cursor: usize) -> &str {
    if line.trim().is_empty() {
        return "";
    }

    let cursor = floor_char_boundary(line, cursor);

    // Completions only trigger at word boundaries
    if line[cursor..].chars().next().is_some_and(|c| !c.is_whitespace()) {
        return "";
    }

    let before = &line[..cursor];
    match before.rfind(char::is_whitespace) {
        Some(idx) => {
            let ws_len = before[idx..].chars().next().map_or(1, char::len_utf8);
            &before[idx + ws_len..]
        }
        None => before,
    }
}

/// Clamp `index` into `text` and move it back to the nearest char boundary
pub(crate) fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut idx = index;
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
