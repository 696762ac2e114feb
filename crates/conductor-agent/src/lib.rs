//! Agents for the Conductor orchestrator.
//!
//! An [`Agent`] plans a task, executes the plan under a step budget, and keeps
//! a history and thought trace across runs. Four variants are provided:
//!
//! - [`AutoAgent`]: step-by-step reasoning over a model-produced plan.
//! - [`RagAgent`]: retrieval-augmented answering from two merged sources.
//! - [`AutomationAgent`]: dispatches a model-built payload to an n8n webhook.
//! - [`CodeReviewAgent`]: summarises findings from an external review API.
//!
//! The [`backends`] and [`integrations`] modules hold HTTP implementations of
//! the `conductor-core` ports.

pub mod agent;
pub mod agents;
pub mod backends;
pub mod config;
pub mod integrations;
pub mod parse;
pub mod trace;

#[cfg(test)]
mod testing;

pub use agent::{Agent, AgentInit, ExecutionResult};
pub use agents::{
    ready_retriever, AutoAgent, AutomationAgent, AutomationSettings, CodeReviewAgent, RagAgent,
    RetrievedContext, RetrieverFactory,
};
pub use backends::{completion_from_config, OpenAiCompletion};
pub use config::{AgentSettings, LlmProvider, ModelConfig};
pub use integrations::{HttpAutomationTrigger, HttpCodeReviewer, HttpRetriever};
pub use parse::{parse_tagged, THOUGHT_TAGS, WORKFLOW_TAGS};
pub use trace::{AgentState, Phase, StepBudget, StepRecord, StepStatus, ThoughtEntry};
