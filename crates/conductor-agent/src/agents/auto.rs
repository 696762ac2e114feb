use crate::agent::{Agent, AgentInit};
use crate::parse::{parse_tagged, THOUGHT_TAGS};
use crate::trace::{AgentState, Phase};
use async_trait::async_trait;
use conductor_core::{
    CompletionOptions, ConductorError, ConductorResult, ModelCompletion, RunContext,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Generic step-by-step reasoning agent.
///
/// Plans by asking the model to break the task into lines, then walks the plan
/// one step at a time, feeding the accumulated thought trace and history back
/// into each prompt and parsing `THOUGHT/REASONING/ACTION/NEXT` replies.
pub struct AutoAgent {
    state: AgentState,
    completion: Arc<dyn ModelCompletion>,
    options: CompletionOptions,
}

impl AutoAgent {
    pub fn new(init: AgentInit) -> Self {
        Self {
            state: AgentState::new(init.name, init.max_steps),
            completion: init.completion,
            options: init.options,
        }
    }

    fn step_prompt(&self, step: &str) -> ConductorResult<String> {
        let thought_process = serde_json::to_string_pretty(self.state.thoughts())?;
        let task_history = serde_json::to_string_pretty(self.state.history())?;
        Ok(format!(
            "You are an autonomous agent capable of breaking down complex tasks \
             and executing them step by step.\n\
             Your goal is to complete tasks by thinking carefully about each step \
             and its consequences.\n\n\
             Task: {step}\n\n\
             Previous Steps and Outcomes:\n{task_history}\n\n\
             Current Thought Process:\n{thought_process}\n\n\
             Please:\n\
             1. Analyze the current situation\n\
             2. Consider possible actions and their outcomes\n\
             3. Choose the most effective next step\n\
             4. Explain your reasoning\n\n\
             Response format:\n\
             THOUGHT: Your analysis of the situation\n\
             REASONING: Why you chose this approach\n\
             ACTION: The specific action to take\n\
             NEXT: What you expect to do after this step\n\n\
             Response:"
        ))
    }
}

fn planning_prompt(task: &str) -> String {
    format!(
        "Break down this task into logical steps:\n\
         Task: {task}\n\n\
         Consider:\n\
         1. Dependencies between steps\n\
         2. Potential failure points\n\
         3. Required resources\n\
         4. Success criteria\n\n\
         Steps:"
    )
}

/// Every non-blank trimmed line is one step. A single paragraph is a one-step
/// plan; output with no content at all is unusable.
pub fn split_plan(output: &str) -> ConductorResult<Vec<String>> {
    let steps: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if steps.is_empty() {
        return Err(ConductorError::Planning(
            "model returned an empty plan".to_string(),
        ));
    }
    Ok(steps)
}

#[async_trait]
impl Agent for AutoAgent {
    fn state(&self) -> &AgentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }

    async fn plan(&mut self, task: &str, ctx: &RunContext) -> ConductorResult<Vec<String>> {
        let prompt = planning_prompt(task);
        let output = ctx
            .guard(self.completion.complete(&prompt, &self.options))
            .await
            .map_err(|e| match e {
                e if e.is_interruption() => e,
                e => ConductorError::Planning(e.to_string()),
            })?;
        split_plan(&output)
    }

    async fn execute_plan(
        &mut self,
        _task: &str,
        plan: &[String],
        ctx: &RunContext,
    ) -> ConductorResult<serde_json::Value> {
        for step in plan {
            self.state.consume_step()?;
            let prompt = self.step_prompt(step)?;

            let reply = match ctx
                .guard(self.completion.complete(&prompt, &self.options))
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(agent = %self.state.name(), step = %step, error = %e, "Step failed");
                    self.state.fail_step(step, &e);
                    return Err(e);
                }
            };

            let thought = json!(parse_tagged(&reply, THOUGHT_TAGS));
            if thought.as_object().map_or(true, |fields| fields.is_empty()) {
                debug!(agent = %self.state.name(), step = %step, "Reply had no tags");
            }

            self.state.complete_step(step, thought.clone());
            self.state.think(Phase::Execution, thought);
        }

        Ok(json!({"task_history": self.state.history()}))
    }
}
