//! Troubleshooting query canonicalization
//!
//! A query is reduced to letters, digits, whitespace and `- . , ? !`, trimmed,
//! and phrased as a question before it goes into the prompt template.

use super::{chain_sanitizers, SanitizeResult, Sanitizer};
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref DISALLOWED_QUERY_CHARS_REGEX: Regex =
        Regex::new(r"[^\p{Alphabetic}\p{N}\s\-.,?!]").unwrap();
}

const QUERY_SANITIZERS: &[Sanitizer<String>] = &[
    normalize_unicode,
    strip_disallowed_chars,
    trim_whitespace,
    ensure_question_mark,
];

/// Canonicalize a free-text query. Never fails; empty input yields `"?"`.
pub fn normalize_query(raw: &str) -> String {
    sanitize_query(raw).sanitized
}

/// [`normalize_query`] with a record of what was changed
pub fn sanitize_query(raw: &str) -> SanitizeResult<String> {
    chain_sanitizers(raw.to_string(), QUERY_SANITIZERS)
}

/// Normalize Unicode text (NFC form)
pub fn normalize_unicode(input: String) -> SanitizeResult<String> {
    let normalized = input.nfc().collect::<String>();

    if normalized == input {
        SanitizeResult::unmodified(input)
    } else {
        SanitizeResult::modified(normalized, Some("Normalized Unicode characters".to_string()))
    }
}

/// Remove anything that could break out of the quoted prompt slot
pub fn strip_disallowed_chars(input: String) -> SanitizeResult<String> {
    let stripped = DISALLOWED_QUERY_CHARS_REGEX.replace_all(&input, "").into_owned();

    if stripped == input {
        SanitizeResult::unmodified(input)
    } else {
        SanitizeResult::modified(stripped, Some("Removed disallowed characters".to_string()))
    }
}

/// Trim whitespace from beginning and end
pub fn trim_whitespace(input: String) -> SanitizeResult<String> {
    let trimmed = input.trim();

    if trimmed.len() == input.len() {
        SanitizeResult::unmodified(input)
    } else {
        SanitizeResult::modified(trimmed.to_string(), Some("Trimmed whitespace".to_string()))
    }
}

pub fn ensure_question_mark(input: String) -> SanitizeResult<String> {
    if input.ends_with('?') {
        SanitizeResult::unmodified(input)
    } else {
        SanitizeResult::modified(format!("{}?", input), Some("Appended question mark".to_string()))
    }
}
