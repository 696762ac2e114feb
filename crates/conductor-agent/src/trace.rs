use chrono::{DateTime, Utc};
use conductor_core::{ConductorError, ConductorResult};
use serde::{Deserialize, Serialize};

/// Phase label attached to each thought entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Planning,
    Execution,
}

/// One entry of an agent's append-only thought trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtEntry {
    pub phase: Phase,
    pub details: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Failed,
}

/// A step an agent executed, with its structured result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    pub result: serde_json::Value,
    pub status: StepStatus,
}

/// Step counter with an immutable maximum.
#[derive(Debug, Clone)]
pub struct StepBudget {
    used: u32,
    max: u32,
}

impl StepBudget {
    pub fn new(max: u32) -> Self {
        Self { used: 0, max }
    }

    /// Count one step. The increment that crosses the maximum fails, leaving
    /// the counter at `max + 1`.
    pub fn consume(&mut self, agent: &str) -> ConductorResult<u32> {
        self.used += 1;
        if self.used > self.max {
            return Err(ConductorError::StepBudgetExceeded {
                agent: agent.to_string(),
                limit: self.max,
            });
        }
        Ok(self.used)
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }
}

/// Mutable state owned by a single agent: identity, step budget, history, and
/// thought trace. History and thoughts only grow until [`AgentState::reset`].
#[derive(Debug, Clone)]
pub struct AgentState {
    name: String,
    budget: StepBudget,
    history: Vec<StepRecord>,
    thoughts: Vec<ThoughtEntry>,
}

impl AgentState {
    pub fn new(name: impl Into<String>, max_steps: u32) -> Self {
        Self {
            name: name.into(),
            budget: StepBudget::new(max_steps),
            history: Vec::new(),
            thoughts: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps_taken(&self) -> u32 {
        self.budget.used()
    }

    pub fn max_steps(&self) -> u32 {
        self.budget.max()
    }

    /// Must be called before every unit of work.
    pub fn consume_step(&mut self) -> ConductorResult<u32> {
        self.budget.consume(&self.name)
    }

    pub fn record_step(
        &mut self,
        step: impl Into<String>,
        result: serde_json::Value,
        status: StepStatus,
    ) {
        self.history.push(StepRecord {
            step: step.into(),
            result,
            status,
        });
    }

    pub fn complete_step(&mut self, step: impl Into<String>, result: serde_json::Value) {
        self.record_step(step, result, StepStatus::Completed);
    }

    /// Record `step` as failed with `error` as its result.
    pub fn fail_step(&mut self, step: impl Into<String>, error: &ConductorError) {
        let result = serde_json::json!({"error": error.to_string()});
        self.record_step(step, result, StepStatus::Failed);
    }

    pub fn think(&mut self, phase: Phase, details: serde_json::Value) {
        self.thoughts.push(ThoughtEntry {
            phase,
            details,
            recorded_at: Utc::now(),
        });
    }

    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }

    pub fn thoughts(&self) -> &[ThoughtEntry] {
        &self.thoughts
    }

    pub(crate) fn restart_budget(&mut self) {
        self.budget.reset();
    }

    /// Drop history, thoughts, and step count.
    pub fn reset(&mut self) {
        self.budget.reset();
        self.history.clear();
        self.thoughts.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_budget_fails_on_the_increment_past_max() {
        for max in [0u32, 1, 4, 10] {
            let mut budget = StepBudget::new(max);
            for expected in 1..=max {
                assert_eq!(budget.consume("auto").unwrap(), expected);
            }
            match budget.consume("auto").unwrap_err() {
                ConductorError::StepBudgetExceeded { agent, limit } => {
                    assert_eq!(agent, "auto");
                    assert_eq!(limit, max);
                }
                other => panic!("expected budget error, got {other:?}"),
            }
            assert_eq!(budget.used(), max + 1);
        }
    }

    #[test]
    fn test_state_accumulates_until_reset() {
        let mut state = AgentState::new("rag", 5);
        state.consume_step().unwrap();
        state.complete_step("retrieve", json!({"docs": 2}));
        state.fail_step("answer", &ConductorError::Internal("boom".to_string()));
        state.think(Phase::Execution, json!("looked things up"));

        assert_eq!(state.steps_taken(), 1);
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.history()[1].status, StepStatus::Failed);
        assert_eq!(state.history()[1].result["error"], "Internal error: boom");
        assert_eq!(state.thoughts()[0].phase, Phase::Execution);

        state.restart_budget();
        assert_eq!(state.steps_taken(), 0);
        assert_eq!(state.history().len(), 2);

        state.reset();
        assert!(state.history().is_empty());
        assert!(state.thoughts().is_empty());
        assert_eq!(state.max_steps(), 5);
    }

    #[test]
    fn test_step_status_serialization() {
        let json = serde_json::to_string(&StepStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
