//! Typed troubleshooting scenario model
//!
//! These types are only ever built by [`crate::ScenarioValidator`] from untrusted
//! model output (or deserialized from storage that was validated on write). They
//! serialize back to exactly the JSON shape the validator accepts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A complete troubleshooting exercise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Problem statement
    pub scenario: String,
    /// Diagnosis of what actually went wrong
    pub root_cause_analysis: String,
    /// Diagnostic procedure; order is by position, not by step id
    pub steps: Vec<Step>,
    /// Follow-up exercises
    #[serde(default)]
    pub recommended_scenarios: Vec<RecommendedScenario>,
}

/// One decision point in a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: i64,
    pub prompt: String,
    /// Id of the next step, `None` on the terminal step
    pub correct_next: Option<i64>,
    pub correct_action: String,
    pub incorrect_options: Vec<IncorrectOption>,
}

/// A wrong choice offered at a step, with the explanation shown to the learner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncorrectOption {
    pub choice: String,
    pub feedback: String,
    pub severity: Severity,
}

/// Qualitative risk of an incorrect choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Title of a follow-up scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedScenario {
    pub title: String,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ();

    /// Only the exact lowercase literals are accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(()),
        }
    }
}

impl Scenario {
    /// The step the exercise starts on
    pub fn first_step(&self) -> Option<&Step> {
        self.steps.first()
    }

    /// Recommended follow-up titles, in order
    pub fn recommended_titles(&self) -> impl Iterator<Item = &str> {
        self.recommended_scenarios.iter().map(|r| r.title.as_str())
    }
}

impl Step {
    pub fn is_terminal(&self) -> bool {
        self.correct_next.is_none()
    }

    /// Highest severity among this step's incorrect options
    pub fn worst_severity(&self) -> Option<Severity> {
        self.incorrect_options.iter().map(|o| o.severity).max_by_key(|s| *s as u8)
    }
}
