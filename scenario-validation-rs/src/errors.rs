//! Error handling for scenario validation
//!
//! Validation is fail-fast: the first offending field ends the walk, and the
//! error records where in the document it was found.

use thiserror::Error;

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// User-facing message for a response that is not JSON at all
pub const DECODE_FAILURE_MESSAGE: &str = "Invalid JSON response from AI";

/// User-facing message for a response that is JSON but not a scenario
pub const SCHEMA_FAILURE_MESSAGE: &str = "AI response does not match expected format";

/// Reasons a JSON value can fail the scenario schema.
///
/// Every variant carries the JSON path of the offending field, e.g.
/// `steps[1].incorrect_options[0].severity`. An empty path means the root.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is absent
    #[error("Missing required field: {path}")]
    MissingField { path: String },

    /// A field holds the wrong JSON type
    #[error("Invalid type at {path}: expected {expected}, got {found}")]
    InvalidType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A required string is empty
    #[error("Empty string at {path}")]
    EmptyString { path: String },

    /// A number that must be an integer is fractional or out of range
    #[error("Expected integer at {path}, got {value}")]
    NotAnInteger { path: String, value: String },

    /// A severity outside the closed set
    #[error("Invalid severity at {path}: {value:?} is not one of low, medium, high")]
    InvalidSeverity { path: String, value: String },

    /// An array with the wrong number of elements
    #[error("Invalid length at {path}: expected {expected} entries, got {found}")]
    InvalidLength {
        path: String,
        expected: usize,
        found: usize,
    },
}

impl ValidationError {
    /// JSON path of the field that failed
    pub fn path(&self) -> &str {
        match self {
            ValidationError::MissingField { path }
            | ValidationError::InvalidType { path, .. }
            | ValidationError::EmptyString { path }
            | ValidationError::NotAnInteger { path, .. }
            | ValidationError::InvalidSeverity { path, .. }
            | ValidationError::InvalidLength { path, .. } => path,
        }
    }
}

/// Failure modes of turning raw model text into a scenario
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The text is not syntactically valid JSON
    #[error("Invalid JSON response from AI: {0}")]
    Decode(String),

    /// The JSON decoded but does not match the scenario schema
    #[error("AI response does not match expected format: {0}")]
    Schema(#[from] ValidationError),
}

impl ParseError {
    /// Fixed message suitable for an end user, without diagnostic detail
    pub fn public_message(&self) -> &'static str {
        match self {
            ParseError::Decode(_) => DECODE_FAILURE_MESSAGE,
            ParseError::Schema(_) => SCHEMA_FAILURE_MESSAGE,
        }
    }

    /// Diagnostic detail for logs and error envelopes
    pub fn detail(&self) -> String {
        match self {
            ParseError::Decode(msg) => msg.clone(),
            ParseError::Schema(err) => err.to_string(),
        }
    }
}

/// Human-readable name of a JSON value's type
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
