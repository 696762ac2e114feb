use crate::types::{AgentMetrics, AgentStatus, WorkerStatus};
use conductor_agent::ExecutionResult;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Tracks status and cumulative metrics for every registered agent.
#[derive(Default)]
pub struct AgentMonitor {
    states: RwLock<HashMap<String, AgentStatus>>,
}

impl AgentMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `name` from a clean slate.
    pub fn register(&self, name: &str) {
        self.states.write().insert(
            name.to_string(),
            AgentStatus {
                name: name.to_string(),
                status: WorkerStatus::Idle,
                metrics: AgentMetrics::default(),
            },
        );
    }

    /// Mark an agent as working on a run.
    pub fn start(&self, name: &str) {
        if let Some(state) = self.states.write().get_mut(name) {
            state.status = WorkerStatus::Working;
        }
    }

    /// Fold a finished run into the agent's metrics.
    pub fn finish(&self, name: &str, result: &ExecutionResult) {
        if let Some(state) = self.states.write().get_mut(name) {
            state.metrics.runs += 1;
            state.metrics.steps += u64::from(result.steps_taken);
            state.metrics.duration_ms += result.duration_ms;
            if result.is_success() {
                state.status = WorkerStatus::Idle;
            } else {
                state.metrics.errors += 1;
                state.status = WorkerStatus::Error;
            }
        }
    }

    /// All agents, sorted by name.
    pub fn snapshot(&self) -> Vec<AgentStatus> {
        let mut states: Vec<AgentStatus> = self.states.read().values().cloned().collect();
        states.sort_by(|a, b| a.name.cmp(&b.name));
        states
    }

    pub fn get(&self, name: &str) -> Option<AgentStatus> {
        self.states.read().get(name).cloned()
    }

    pub fn aggregate_metrics(&self) -> AgentMetrics {
        self.states
            .read()
            .values()
            .fold(AgentMetrics::default(), |mut total, state| {
                total.runs += state.metrics.runs;
                total.errors += state.metrics.errors;
                total.steps += state.metrics.steps;
                total.duration_ms += state.metrics.duration_ms;
                total
            })
    }

    /// JSON view for the HTTP layer.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "agents": self.snapshot(),
            "aggregate": self.aggregate_metrics(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use conductor_core::{AgentFailure, ErrorKind};

    fn finished(agent: &str, steps: u32, failed: bool) -> ExecutionResult {
        let mut result = ExecutionResult::failed(
            agent,
            "task",
            AgentFailure::new(ErrorKind::Downstream, "boom"),
        );
        result.steps_taken = steps;
        result.duration_ms = 40;
        if !failed {
            result.error = None;
        }
        result
    }

    #[test]
    fn test_registered_agents_start_idle() {
        let monitor = AgentMonitor::new();
        monitor.register("rag");
        monitor.register("auto");

        let names: Vec<String> = monitor.snapshot().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["auto", "rag"]);
        assert_eq!(monitor.get("rag").unwrap().status, WorkerStatus::Idle);
    }

    #[test]
    fn test_run_lifecycle_updates_status_and_metrics() {
        let monitor = AgentMonitor::new();
        monitor.register("auto");

        monitor.start("auto");
        assert_eq!(monitor.get("auto").unwrap().status, WorkerStatus::Working);

        monitor.finish("auto", &finished("auto", 3, false));
        monitor.finish("auto", &finished("auto", 2, true));

        let state = monitor.get("auto").unwrap();
        assert_eq!(state.status, WorkerStatus::Error);
        assert_eq!(
            state.metrics,
            AgentMetrics {
                runs: 2,
                errors: 1,
                steps: 5,
                duration_ms: 80,
            }
        );
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let monitor = AgentMonitor::new();
        monitor.start("ghost");
        monitor.finish("ghost", &finished("ghost", 1, false));
        assert!(monitor.snapshot().is_empty());
    }

    #[test]
    fn test_aggregate_and_json() {
        let monitor = AgentMonitor::new();
        monitor.register("a");
        monitor.register("b");
        monitor.finish("a", &finished("a", 2, false));
        monitor.finish("b", &finished("b", 4, true));

        let total = monitor.aggregate_metrics();
        assert_eq!(total.runs, 2);
        assert_eq!(total.steps, 6);

        let json = monitor.to_json();
        assert_eq!(json["agents"].as_array().unwrap().len(), 2);
        assert_eq!(json["aggregate"]["errors"], 1);
    }
}
