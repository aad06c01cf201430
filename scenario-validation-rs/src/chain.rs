//! Step graph consistency
//!
//! Schema validation is structural only: it does not look at what
//! `correct_next` points to. This check is run separately, by callers that
//! need to know the procedure can actually be walked from start to finish.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::schema::Scenario;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Two steps share an id
    #[error("Duplicate step id {0}")]
    DuplicateId(i64),

    /// A `correct_next` names an id no step has
    #[error("Step {from} points to missing step {to}")]
    DanglingReference { from: i64, to: i64 },

    /// Following `correct_next` from the first step revisits a step
    #[error("Step chain loops back to step {at}")]
    Cycle { at: i64 },
}

/// Verify that step ids are unique, every `correct_next` resolves, and the
/// chain starting at the first step ends on a terminal step.
///
/// An empty step list is trivially consistent.
pub fn verify_step_chain(scenario: &Scenario) -> Result<(), ChainError> {
    let mut next_by_id: HashMap<i64, Option<i64>> = HashMap::with_capacity(scenario.steps.len());
    for step in &scenario.steps {
        if next_by_id.insert(step.id, step.correct_next).is_some() {
            return Err(ChainError::DuplicateId(step.id));
        }
    }

    for step in &scenario.steps {
        if let Some(to) = step.correct_next {
            if !next_by_id.contains_key(&to) {
                return Err(ChainError::DanglingReference { from: step.id, to });
            }
        }
    }

    let Some(first) = scenario.first_step() else {
        return Ok(());
    };

    let mut visited = HashSet::new();
    let mut current = Some(first.id);
    while let Some(id) = current {
        if !visited.insert(id) {
            return Err(ChainError::Cycle { at: id });
        }
        current = next_by_id.get(&id).copied().flatten();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Step;

    fn step(id: i64, next: Option<i64>) -> Step {
        Step {
            id,
            prompt: format!("Step {}", id),
            correct_next: next,
            correct_action: "Measure".to_string(),
            incorrect_options: Vec::new(),
        }
    }

    fn scenario(steps: Vec<Step>) -> Scenario {
        Scenario {
            scenario: "Heat pump stuck in defrost".to_string(),
            root_cause_analysis: "Failed defrost sensor".to_string(),
            steps,
            recommended_scenarios: Vec::new(),
        }
    }

    #[test]
    fn test_linear_chain() {
        let s = scenario(vec![step(1, Some(2)), step(2, Some(3)), step(3, None)]);
        assert_eq!(verify_step_chain(&s), Ok(()));
    }

    #[test]
    fn test_chain_follows_ids_not_positions() {
        let s = scenario(vec![step(10, Some(30)), step(20, None), step(30, Some(20))]);
        assert_eq!(verify_step_chain(&s), Ok(()));
    }

    #[test]
    fn test_empty_steps() {
        assert_eq!(verify_step_chain(&scenario(Vec::new())), Ok(()));
    }

    #[test]
    fn test_duplicate_id() {
        let s = scenario(vec![step(1, Some(2)), step(2, None), step(2, None)]);
        assert_eq!(verify_step_chain(&s), Err(ChainError::DuplicateId(2)));
    }

    #[test]
    fn test_dangling_reference() {
        let s = scenario(vec![step(1, Some(2)), step(2, Some(9))]);
        assert_eq!(
            verify_step_chain(&s),
            Err(ChainError::DanglingReference { from: 2, to: 9 })
        );
    }

    #[test]
    fn test_cycle() {
        let s = scenario(vec![step(1, Some(2)), step(2, Some(3)), step(3, Some(1))]);
        assert_eq!(verify_step_chain(&s), Err(ChainError::Cycle { at: 1 }));
    }

    #[test]
    fn test_self_loop() {
        let s = scenario(vec![step(1, Some(1))]);
        assert_eq!(verify_step_chain(&s), Err(ChainError::Cycle { at: 1 }));
    }
}
