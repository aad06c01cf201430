//! Raw model text to typed scenario
//!
//! The model is asked for bare JSON. Anything that does not decode is a
//! [`ParseError::Decode`]; anything that decodes but fails the schema is a
//! [`ParseError::Schema`]. Both paths log the offending payload. There is no
//! retry here: callers that want another attempt must make a fresh model call.

use serde_json::Value;

use crate::errors::ParseError;
use crate::schema::Scenario;
use crate::validator::{SchemaOptions, ScenarioValidator};

/// Longest payload excerpt written to the log
const LOG_EXCERPT_CHARS: usize = 2_000;

#[derive(Debug, Clone, Default)]
pub struct ScenarioResponseParser {
    validator: ScenarioValidator,
}

impl ScenarioResponseParser {
    pub fn new(options: SchemaOptions) -> Self {
        Self {
            validator: ScenarioValidator::new(options),
        }
    }

    pub fn validator(&self) -> &ScenarioValidator {
        &self.validator
    }

    /// Decode and validate one model response
    pub fn parse(&self, raw_text: &str) -> Result<Scenario, ParseError> {
        let value: Value = serde_json::from_str(raw_text).map_err(|e| {
            log::error!(
                "JSON parse error: {}; payload: {}",
                e,
                excerpt(raw_text)
            );
            ParseError::Decode(e.to_string())
        })?;

        let scenario = self.validator.validate(&value).map_err(|e| {
            log::error!(
                "Invalid scenario format at '{}': {}; payload: {}",
                e.path(),
                e,
                excerpt(&value.to_string())
            );
            ParseError::Schema(e)
        })?;

        log::debug!(
            "Validated scenario with {} steps and {} recommendations",
            scenario.steps.len(),
            scenario.recommended_scenarios.len()
        );
        Ok(scenario)
    }
}

/// Parse with the default schema
pub fn parse_scenario(raw_text: &str) -> Result<Scenario, ParseError> {
    ScenarioResponseParser::default().parse(raw_text)
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= LOG_EXCERPT_CHARS {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(LOG_EXCERPT_CHARS).collect();
        cut.push_str("...");
        cut
    }
}
