//! Structural validation of untyped JSON against the scenario schema
//!
//! The walk is depth-first and stops at the first problem. Nothing partial is
//! ever returned: a single bad field anywhere in a nested array rejects the
//! whole document.

use serde_json::{Map, Number, Value};

use crate::errors::{json_type_name, ValidationError, ValidationResult};
use crate::schema::{IncorrectOption, RecommendedScenario, Scenario, Severity, Step};

/// Number of follow-up scenarios the current schema asks the model for
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 2;

/// Schema variant switches
///
/// The model prompt has changed over time; older responses carry no
/// `recommended_scenarios` at all. Turning `require_recommendations` off accepts
/// those while still checking the field whenever it is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Require `recommended_scenarios` with exactly `recommendation_count` entries
    pub require_recommendations: bool,
    /// Required length of `recommended_scenarios`
    pub recommendation_count: usize,
    /// Reject required string fields that are present but empty
    pub reject_empty_strings: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            require_recommendations: true,
            recommendation_count: DEFAULT_RECOMMENDATION_COUNT,
            reject_empty_strings: true,
        }
    }
}

impl SchemaOptions {
    /// Schema variant without follow-up recommendations
    pub fn without_recommendations() -> Self {
        Self {
            require_recommendations: false,
            ..Self::default()
        }
    }
}

/// Validator for model-generated scenarios
#[derive(Debug, Clone, Default)]
pub struct ScenarioValidator {
    options: SchemaOptions,
}

impl ScenarioValidator {
    pub fn new(options: SchemaOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Validate a JSON value and build the typed scenario from it
    pub fn validate(&self, value: &Value) -> ValidationResult<Scenario> {
        let root = require_object(value, "")?;

        let scenario = self.require_string(root, "scenario", "")?;
        let root_cause_analysis = self.require_string(root, "root_cause_analysis", "")?;

        let steps = require_array(root, "steps", "")?
            .iter()
            .enumerate()
            .map(|(idx, item)| self.validate_step(item, &index_path("steps", idx)))
            .collect::<ValidationResult<Vec<_>>>()?;

        let recommended_scenarios = self.validate_recommendations(root)?;

        Ok(Scenario {
            scenario,
            root_cause_analysis,
            steps,
            recommended_scenarios,
        })
    }

    fn validate_step(&self, value: &Value, path: &str) -> ValidationResult<Step> {
        let obj = require_object(value, path)?;

        let id = require_integer(obj, "id", path)?;
        let prompt = self.require_string(obj, "prompt", path)?;
        let correct_next = require_nullable_integer(obj, "correct_next", path)?;
        let correct_action = self.require_string(obj, "correct_action", path)?;

        let options_path = field_path(path, "incorrect_options");
        let incorrect_options = require_array(obj, "incorrect_options", path)?
            .iter()
            .enumerate()
            .map(|(idx, item)| self.validate_incorrect_option(item, &index_path(&options_path, idx)))
            .collect::<ValidationResult<Vec<_>>>()?;

        Ok(Step {
            id,
            prompt,
            correct_next,
            correct_action,
            incorrect_options,
        })
    }

    fn validate_incorrect_option(&self, value: &Value, path: &str) -> ValidationResult<IncorrectOption> {
        let obj = require_object(value, path)?;

        let choice = self.require_string(obj, "choice", path)?;
        let feedback = self.require_string(obj, "feedback", path)?;

        let severity_path = field_path(path, "severity");
        let raw = match obj.get("severity") {
            None => return Err(ValidationError::MissingField { path: severity_path }),
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(ValidationError::InvalidType {
                    path: severity_path,
                    expected: "string",
                    found: json_type_name(other),
                })
            }
        };
        let severity = raw.parse::<Severity>().map_err(|_| ValidationError::InvalidSeverity {
            path: severity_path,
            value: raw.clone(),
        })?;

        Ok(IncorrectOption {
            choice,
            feedback,
            severity,
        })
    }

    fn validate_recommendations(&self, root: &Map<String, Value>) -> ValidationResult<Vec<RecommendedScenario>> {
        if !self.options.require_recommendations && !root.contains_key("recommended_scenarios") {
            return Ok(Vec::new());
        }

        let items = require_array(root, "recommended_scenarios", "")?;

        if self.options.require_recommendations && items.len() != self.options.recommendation_count {
            return Err(ValidationError::InvalidLength {
                path: "recommended_scenarios".to_string(),
                expected: self.options.recommendation_count,
                found: items.len(),
            });
        }

        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let path = index_path("recommended_scenarios", idx);
                let obj = require_object(item, &path)?;
                Ok(RecommendedScenario {
                    title: self.require_string(obj, "title", &path)?,
                })
            })
            .collect()
    }

    fn require_string(&self, obj: &Map<String, Value>, field: &str, parent: &str) -> ValidationResult<String> {
        let path = field_path(parent, field);
        match obj.get(field) {
            None => Err(ValidationError::MissingField { path }),
            Some(Value::String(s)) if s.is_empty() && self.options.reject_empty_strings => {
                Err(ValidationError::EmptyString { path })
            }
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(ValidationError::InvalidType {
                path,
                expected: "string",
                found: json_type_name(other),
            }),
        }
    }
}

/// Validate with the default (recommendations required) schema
pub fn validate_scenario(value: &Value) -> ValidationResult<Scenario> {
    ScenarioValidator::default().validate(value)
}

fn require_object<'a>(value: &'a Value, path: &str) -> ValidationResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| ValidationError::InvalidType {
        path: path.to_string(),
        expected: "object",
        found: json_type_name(value),
    })
}

fn require_array<'a>(obj: &'a Map<String, Value>, field: &str, parent: &str) -> ValidationResult<&'a Vec<Value>> {
    let path = field_path(parent, field);
    match obj.get(field) {
        None => Err(ValidationError::MissingField { path }),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ValidationError::InvalidType {
            path,
            expected: "array",
            found: json_type_name(other),
        }),
    }
}

fn require_integer(obj: &Map<String, Value>, field: &str, parent: &str) -> ValidationResult<i64> {
    let path = field_path(parent, field);
    match obj.get(field) {
        None => Err(ValidationError::MissingField { path }),
        Some(Value::Number(n)) => number_to_i64(n, path),
        Some(other) => Err(ValidationError::InvalidType {
            path,
            expected: "number",
            found: json_type_name(other),
        }),
    }
}

/// Like [`require_integer`], but an explicit `null` is accepted. The key itself
/// must still be present.
fn require_nullable_integer(obj: &Map<String, Value>, field: &str, parent: &str) -> ValidationResult<Option<i64>> {
    let path = field_path(parent, field);
    match obj.get(field) {
        None => Err(ValidationError::MissingField { path }),
        Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => number_to_i64(n, path).map(Some),
        Some(other) => Err(ValidationError::InvalidType {
            path,
            expected: "number or null",
            found: json_type_name(other),
        }),
    }
}

/// The integral value of a JSON number, accepting whole floats such as `2.0`
pub fn integral_i64(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    match n.as_f64() {
        // the bounds keep the cast exact
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}

fn number_to_i64(n: &Number, path: String) -> ValidationResult<i64> {
    integral_i64(n).ok_or_else(|| ValidationError::NotAnInteger {
        path,
        value: n.to_string(),
    })
}

fn field_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", parent, field)
    }
}

fn index_path(parent: &str, idx: usize) -> String {
    format!("{}[{}]", parent, idx)
}
