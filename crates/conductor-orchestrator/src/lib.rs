//! Multi-agent orchestration for Conductor.
//!
//! Owns a registry of named agents and offers three ways to invoke them: a
//! single run, a concurrent fan-out with per-agent failure isolation, and the
//! composite workflow (plan, then per step retrieve context, review code, and
//! trigger automation as the step text calls for).
//!
//! # Main types
//!
//! - [`AgentOrchestrator`]: registry and dispatch.
//! - [`WorkflowResult`] / [`StepResult`]: composite workflow output.
//! - [`WorkflowRoles`]: which agents fill each workflow stage.
//! - [`AgentMonitor`]: per-agent status and run metrics.

/// Agent status and metrics tracking.
pub mod monitor;
/// Registry, dispatch, and the composite workflow.
pub mod orchestrator;
/// Workflow results, roles, and monitor types.
pub mod types;

pub use monitor::AgentMonitor;
pub use orchestrator::{AgentHandle, AgentOrchestrator, OrchestratorSettings};
pub use types::{
    mentions_any, AgentMetrics, AgentStatus, StepResult, WorkerStatus, WorkflowResult,
    WorkflowRoles, AUTOMATION_KEYWORDS, CODE_KEYWORDS,
};
