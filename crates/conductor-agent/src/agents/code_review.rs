use crate::agent::{Agent, AgentInit};
use crate::trace::AgentState;
use async_trait::async_trait;
use conductor_core::types::CompletionOptions;
use conductor_core::{CodeReviewer, ConductorResult, ModelCompletion, RunContext};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const PLAN: [&str; 4] = [
    "Extract code context and metadata",
    "Send code to the review service for analysis",
    "Process review feedback",
    "Generate comprehensive review",
];

/// Delegates analysis to an external review service and asks the model to
/// turn the raw findings into a readable summary.
pub struct CodeReviewAgent {
    state: AgentState,
    completion: Arc<dyn ModelCompletion>,
    options: CompletionOptions,
    reviewer: Arc<dyn CodeReviewer>,
}

impl CodeReviewAgent {
    pub fn new(init: AgentInit, reviewer: Arc<dyn CodeReviewer>) -> Self {
        Self {
            state: AgentState::new(init.name, init.max_steps),
            completion: init.completion,
            options: init.options,
            reviewer,
        }
    }
}

fn review_prompt(task: &str, findings: &str) -> String {
    format!(
        "You are a code review expert. \
         Your task is to review code and provide detailed feedback.\n\n\
         Task: {task}\n\n\
         Code Context:\n{findings}\n\n\
         Please analyze the code and provide:\n\
         1. Overall assessment\n\
         2. Potential issues or bugs\n\
         3. Suggestions for improvement\n\
         4. Best practices that should be followed\n\n\
         Response:"
    )
}

#[async_trait]
impl Agent for CodeReviewAgent {
    fn state(&self) -> &AgentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }

    async fn plan(&mut self, _task: &str, _ctx: &RunContext) -> ConductorResult<Vec<String>> {
        Ok(PLAN.iter().map(|s| (*s).to_string()).collect())
    }

    async fn execute_plan(
        &mut self,
        task: &str,
        plan: &[String],
        ctx: &RunContext,
    ) -> ConductorResult<serde_json::Value> {
        let label = |i: usize| plan.get(i).map_or(PLAN[i], String::as_str).to_string();

        // The task text is the code under review.
        self.state.consume_step()?;
        let code = task;
        self.state.complete_step(label(0), json!({"characters": code.len()}));

        self.state.consume_step()?;
        let analysis = match ctx.guard(self.reviewer.analyze(code)).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(agent = %self.state.name(), error = %e, "Review service call failed");
                self.state.fail_step(label(1), &e);
                return Err(e);
            }
        };
        self.state.complete_step(label(1), analysis.clone());

        self.state.consume_step()?;
        let prompt = review_prompt(task, &serde_json::to_string_pretty(&analysis)?);
        let review_summary = ctx
            .guard(self.completion.complete(&prompt, &self.options))
            .await?;
        self.state.complete_step(label(2), json!({"summary": review_summary}));

        self.state.consume_step()?;
        self.state.complete_step(label(3), json!({"ready": true}));
        info!(agent = %self.state.name(), "Code review completed");

        Ok(json!({
            "analysis": analysis,
            "review_summary": review_summary,
        }))
    }
}
