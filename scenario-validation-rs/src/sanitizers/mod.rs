//! Input sanitization utilities
//!
//! Free text from users is cleaned here before it is embedded in a model
//! prompt. Each sanitizer reports whether it changed anything so callers can
//! log what happened to a query.

pub mod query;

pub use query::*;

/// Sanitization result containing the sanitized content and information
/// about whether changes were made during sanitization
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizeResult<T> {
    /// Sanitized content
    pub sanitized: T,
    /// Whether any changes were made during sanitization
    pub was_modified: bool,
    /// Optional details about what was modified
    pub details: Option<String>,
}

impl<T> SanitizeResult<T> {
    /// Create a result with unmodified content
    pub fn unmodified(content: T) -> Self {
        Self {
            sanitized: content,
            was_modified: false,
            details: None,
        }
    }

    /// Create a result with modified content
    pub fn modified(content: T, details: Option<String>) -> Self {
        Self {
            sanitized: content,
            was_modified: true,
            details,
        }
    }
}

/// A sanitizer step that takes ownership of its input
pub type Sanitizer<T> = fn(T) -> SanitizeResult<T>;

/// Run multiple sanitizers in sequence, merging their change details
pub fn chain_sanitizers<T>(input: T, sanitizers: &[Sanitizer<T>]) -> SanitizeResult<T> {
    let mut result = SanitizeResult::unmodified(input);
    let mut all_details = Vec::new();

    for sanitizer in sanitizers {
        let current_result = sanitizer(result.sanitized);

        result.sanitized = current_result.sanitized;

        if current_result.was_modified {
            result.was_modified = true;
            if let Some(details) = current_result.details {
                all_details.push(details);
            }
        }
    }

    if !all_details.is_empty() {
        result.details = Some(all_details.join("; "));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drop_hash(s: String) -> SanitizeResult<String> {
        if s.contains('#') {
            SanitizeResult::modified(s.replace('#', ""), Some("Removed #".to_string()))
        } else {
            SanitizeResult::unmodified(s)
        }
    }

    fn lowercase(s: String) -> SanitizeResult<String> {
        let lower = s.to_lowercase();
        if lower == s {
            SanitizeResult::unmodified(s)
        } else {
            SanitizeResult::modified(lower, Some("Lowercased".to_string()))
        }
    }

    #[test]
    fn test_sanitize_result() {
        let unmodified = SanitizeResult::unmodified("test");
        assert!(!unmodified.was_modified);
        assert_eq!(unmodified.details, None);

        let modified = SanitizeResult::modified("test", Some("removed unsafe chars".to_string()));
        assert!(modified.was_modified);
        assert_eq!(modified.details.as_deref(), Some("removed unsafe chars"));
    }

    #[test]
    fn test_chain_sanitizers() {
        let result = chain_sanitizers("No #Heat".to_string(), &[drop_hash, lowercase]);
        assert!(result.was_modified);
        assert_eq!(result.sanitized, "no heat");
        assert_eq!(result.details.as_deref(), Some("Removed #; Lowercased"));

        let clean = chain_sanitizers("no heat".to_string(), &[drop_hash, lowercase]);
        assert!(!clean.was_modified);
        assert_eq!(clean.details, None);
    }
}
