use conductor_agent::{ExecutionResult, ThoughtEntry};
use conductor_core::AgentFailure;
use serde::{Deserialize, Serialize};

/// Plan steps mentioning any of these get a code review.
pub const CODE_KEYWORDS: &[&str] = &["code", "function", "class", "implement"];

/// Plan steps mentioning any of these trigger the automation agent.
pub const AUTOMATION_KEYWORDS: &[&str] = &["workflow", "automation", "trigger", "webhook"];

/// Case-insensitive substring match against a keyword set.
pub fn mentions_any(step: &str, keywords: &[&str]) -> bool {
    let step = step.to_lowercase();
    keywords.iter().any(|keyword| step.contains(keyword))
}

/// Agent names that fill each stage of the composite workflow.
///
/// `None` disables an optional stage. In config files, where there is no
/// null, an empty name does the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRoles {
    #[serde(default = "default_planner")]
    pub planner: String,
    #[serde(default = "default_retrieval")]
    pub retrieval: String,
    #[serde(default = "default_code_review", deserialize_with = "optional_role")]
    pub code_review: Option<String>,
    #[serde(default = "default_automation", deserialize_with = "optional_role")]
    pub automation: Option<String>,
}

fn default_planner() -> String {
    "auto".to_string()
}

fn default_retrieval() -> String {
    "rag".to_string()
}

fn default_code_review() -> Option<String> {
    Some("code_review".to_string())
}

fn default_automation() -> Option<String> {
    Some("n8n".to_string())
}

fn optional_role<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.filter(|name| !name.trim().is_empty()))
}

impl Default for WorkflowRoles {
    fn default() -> Self {
        Self {
            planner: default_planner(),
            retrieval: default_retrieval(),
            code_review: default_code_review(),
            automation: default_automation(),
        }
    }
}

impl WorkflowRoles {
    /// Every agent name the workflow may dispatch to.
    pub fn names(&self) -> Vec<&str> {
        let mut names = vec![self.planner.as_str(), self.retrieval.as_str()];
        names.extend(self.code_review.as_deref());
        names.extend(self.automation.as_deref());
        names
    }
}

/// Outcome of one plan step in the composite workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: String,
    /// Retrieval run for this step.
    pub context: ExecutionResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_review: Option<ExecutionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<ExecutionResult>,
}

impl StepResult {
    /// Failures across this step's stages.
    pub fn failures(&self) -> Vec<&AgentFailure> {
        [Some(&self.context), self.code_review.as_ref(), self.workflow.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|result| result.error.as_ref())
            .collect()
    }
}

/// Outcome of [`crate::AgentOrchestrator::run_workflow`].
///
/// `error` is set only when the workflow stopped early: the planner failed or
/// the run was interrupted. Per-stage failures live inside `steps`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub task: String,
    pub plan: Vec<String>,
    pub steps: Vec<StepResult>,
    /// The planner's thought trace.
    pub thoughts: Vec<ThoughtEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AgentFailure>,
}

impl WorkflowResult {
    /// True when the workflow ran to completion and no stage failed.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.steps.iter().all(|s| s.failures().is_empty())
    }
}

/// Current activity of a registered agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Idle,
    Working,
    /// The last run failed.
    Error,
}

/// Cumulative counters for one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub runs: u64,
    pub errors: u64,
    pub steps: u64,
    pub duration_ms: u64,
}

/// Monitor snapshot for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    pub name: String,
    pub status: WorkerStatus,
    pub metrics: AgentMetrics,
}
