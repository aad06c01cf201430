//! Numbered step lists from plain text
//!
//! Used where the model answered with prose instead of JSON. Only lines that
//! start with `<digits>.` are kept; everything else is dropped silently.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref STEP_MARKER_REGEX: Regex = Regex::new(r"^[0-9]+\.\s*").unwrap();
}

/// Lazily yield the text of each numbered line, marker removed.
///
/// The iterator borrows `text` and holds no other state, so calling this
/// again on the same input restarts the sequence.
pub fn step_lines(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.lines()
        .map(str::trim)
        .filter_map(|line| STEP_MARKER_REGEX.find(line).map(|m| &line[m.end()..]))
}

/// Collect every numbered line of `text`, in order
pub fn extract_steps(text: &str) -> Vec<String> {
    step_lines(text).map(str::to_string).collect()
}
