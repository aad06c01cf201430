//! # Scenario Validation Library
//!
//! Turns untrusted text from a generative model into a strongly typed HVAC
//! troubleshooting scenario, or rejects it whole.
//!
//! ## Features
//!
//! - Query normalization before a query is embedded in a prompt
//! - Fail-fast structural validation of scenario JSON with field paths
//! - Raw-response parsing that separates decode failures from schema failures
//! - Step chain consistency checks
//! - Extraction of numbered step lists from plain text
//!
//! All operations are pure and synchronous.

mod chain;
mod errors;
mod parser;
mod schema;
mod steps;
mod validator;
pub mod sanitizers;

pub use chain::{verify_step_chain, ChainError};
pub use errors::{
    ParseError, ValidationError, ValidationResult, DECODE_FAILURE_MESSAGE, SCHEMA_FAILURE_MESSAGE,
};
pub use parser::{parse_scenario, ScenarioResponseParser};
pub use sanitizers::{normalize_query, sanitize_query, SanitizeResult};
pub use schema::{IncorrectOption, RecommendedScenario, Scenario, Severity, Step};
pub use steps::{extract_steps, step_lines};
pub use validator::{
    integral_i64, validate_scenario, SchemaOptions, ScenarioValidator, DEFAULT_RECOMMENDATION_COUNT,
};

/// Re-export commonly used items for convenience
pub mod prelude {
    pub use crate::errors::{ParseError, ValidationError, ValidationResult};
    pub use crate::parser::ScenarioResponseParser;
    pub use crate::sanitizers::normalize_query;
    pub use crate::schema::{Scenario, Severity, Step};
    pub use crate::validator::{SchemaOptions, ScenarioValidator};
}

/// Version of the validation library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_to_typed_scenario() {
        let query = normalize_query("  Heat pump blowing cold in heat mode ");
        assert_eq!(query, "Heat pump blowing cold in heat mode?");

        let raw = json!({
            "scenario": query,
            "root_cause_analysis": "Reversing valve solenoid coil open",
            "steps": [
                {
                    "id": 1,
                    "prompt": "Thermostat calls for heat. First check?",
                    "correct_next": 2,
                    "correct_action": "Confirm O/B terminal voltage at the outdoor unit",
                    "incorrect_options": [
                        {"choice": "Add refrigerant", "feedback": "Charge is not the symptom", "severity": "medium"},
                        {"choice": "Hit the valve with a hammer", "feedback": "Can crack the valve body", "severity": "high"}
                    ]
                },
                {
                    "id": 2,
                    "prompt": "24V present at O/B. Next?",
                    "correct_next": null,
                    "correct_action": "Ohm the solenoid coil with power off",
                    "incorrect_options": [
                        {"choice": "Replace the compressor", "feedback": "Compressor is running normally", "severity": "high"},
                        {"choice": "Swap thermostat", "feedback": "Signal already verified", "severity": "low"}
                    ]
                }
            ],
            "recommended_scenarios": [
                {"title": "Heat pump will not leave defrost"},
                {"title": "Auxiliary heat runs constantly"}
            ]
        })
        .to_string();

        let scenario = ScenarioResponseParser::default().parse(&raw).unwrap();
        assert_eq!(scenario.steps.len(), 2);
        assert!(verify_step_chain(&scenario).is_ok());
        assert_eq!(
            scenario.recommended_titles().collect::<Vec<_>>(),
            vec!["Heat pump will not leave defrost", "Auxiliary heat runs constantly"]
        );
    }
}
