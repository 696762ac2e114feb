use crate::trace::{AgentState, Phase, StepRecord, ThoughtEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conductor_core::types::{AgentFailure, CompletionOptions};
use conductor_core::{ConductorResult, ModelCompletion, RunContext};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Everything the registry hands to an agent factory.
///
/// The completion capability is injected here rather than looked up globally,
/// so tests can register agents backed by fakes.
#[derive(Clone)]
pub struct AgentInit {
    pub name: String,
    pub completion: Arc<dyn ModelCompletion>,
    pub options: CompletionOptions,
    pub max_steps: u32,
}

impl AgentInit {
    pub fn new(name: impl Into<String>, completion: Arc<dyn ModelCompletion>) -> Self {
        Self {
            name: name.into(),
            completion,
            options: CompletionOptions::default(),
            max_steps: 10,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }
}

/// Outcome of one agent run.
///
/// A present `error` is authoritative: the run failed, and the remaining
/// fields hold whatever was produced before the failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub run_id: Uuid,
    pub agent: String,
    pub task: String,
    pub plan: Vec<String>,
    /// Steps executed during this run only.
    pub steps: Vec<StepRecord>,
    /// Agent-specific payload.
    pub output: serde_json::Value,
    /// Full thought trace of the agent, including earlier runs.
    pub thoughts: Vec<ThoughtEntry>,
    pub steps_taken: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AgentFailure>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// A result for a run that ended without the agent producing one, such
    /// as a panic inside the agent.
    pub fn failed(
        agent: impl Into<String>,
        task: impl Into<String>,
        failure: AgentFailure,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            agent: agent.into(),
            task: task.into(),
            plan: Vec::new(),
            steps: Vec::new(),
            output: serde_json::Value::Null,
            thoughts: Vec::new(),
            steps_taken: 0,
            error: Some(failure),
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }
}

/// A named unit that plans a task and executes the plan under a step budget.
///
/// Implementors provide [`Agent::plan`] and [`Agent::execute_plan`];
/// [`Agent::execute`] and [`Agent::run`] are shared. Callers should only use
/// `run`, which never returns an error.
#[async_trait]
pub trait Agent: Send {
    fn state(&self) -> &AgentState;

    fn state_mut(&mut self) -> &mut AgentState;

    fn name(&self) -> &str {
        self.state().name()
    }

    /// Produce the ordered steps for `task`.
    async fn plan(&mut self, task: &str, ctx: &RunContext) -> ConductorResult<Vec<String>>;

    /// Carry out `plan`, consuming a step before each unit of work and
    /// recording history. Returns the agent-specific output payload.
    async fn execute_plan(
        &mut self,
        task: &str,
        plan: &[String],
        ctx: &RunContext,
    ) -> ConductorResult<serde_json::Value>;

    /// Plan and execute without resetting the step counter.
    async fn execute(&mut self, task: &str, ctx: &RunContext) -> ConductorResult<ExecutionResult> {
        let recorder = RunRecorder::start(self.state());
        let mut plan = Vec::new();
        let output = plan_and_execute(self, task, ctx, &mut plan).await?;
        Ok(recorder.finish(self.state(), task, plan, output, None))
    }

    /// Error boundary for a single agent: resets the step counter, plans,
    /// executes, and converts any failure into a structured result.
    async fn run(&mut self, task: &str, ctx: &RunContext) -> ExecutionResult {
        self.state_mut().restart_budget();
        let recorder = RunRecorder::start(self.state());
        let mut plan = Vec::new();

        match plan_and_execute(self, task, ctx, &mut plan).await {
            Ok(output) => {
                info!(
                    agent = %self.name(),
                    steps = self.state().steps_taken(),
                    "Agent run completed"
                );
                recorder.finish(self.state(), task, plan, output, None)
            }
            Err(e) => {
                error!(
                    agent = %self.name(),
                    kind = %e.kind(),
                    error = %e,
                    steps = self.state().steps_taken(),
                    "Agent run failed"
                );
                let failure = AgentFailure::from(&e);
                recorder.finish(
                    self.state(),
                    task,
                    plan,
                    serde_json::Value::Null,
                    Some(failure),
                )
            }
        }
    }

    /// Drop accumulated history, thoughts, and step count.
    fn reset(&mut self) {
        self.state_mut().reset();
    }
}

async fn plan_and_execute<A: Agent + ?Sized>(
    agent: &mut A,
    task: &str,
    ctx: &RunContext,
    plan: &mut Vec<String>,
) -> ConductorResult<serde_json::Value> {
    agent.state_mut().consume_step()?;
    *plan = agent.plan(task, ctx).await?;
    debug!(agent = %agent.name(), steps = plan.len(), "Plan created");
    agent
        .state_mut()
        .think(Phase::Planning, serde_json::json!(plan));

    agent.execute_plan(task, plan.as_slice(), ctx).await
}

struct RunRecorder {
    run_id: Uuid,
    first_step: usize,
    started_at: DateTime<Utc>,
    clock: Instant,
}

impl RunRecorder {
    fn start(state: &AgentState) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            first_step: state.history().len(),
            started_at: Utc::now(),
            clock: Instant::now(),
        }
    }

    fn finish(
        self,
        state: &AgentState,
        task: &str,
        plan: Vec<String>,
        output: serde_json::Value,
        error: Option<AgentFailure>,
    ) -> ExecutionResult {
        ExecutionResult {
            run_id: self.run_id,
            agent: state.name().to_string(),
            task: task.to_string(),
            plan,
            steps: state
                .history()
                .get(self.first_step..)
                .map(<[StepRecord]>::to_vec)
                .unwrap_or_default(),
            output,
            thoughts: state.thoughts().to_vec(),
            steps_taken: state.steps_taken(),
            error,
            started_at: self.started_at,
            duration_ms: self.clock.elapsed().as_millis() as u64,
        }
    }
}
