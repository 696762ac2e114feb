use crate::monitor::AgentMonitor;
use crate::types::{
    mentions_any, StepResult, WorkflowResult, WorkflowRoles, AUTOMATION_KEYWORDS, CODE_KEYWORDS,
};
use conductor_agent::{Agent, AgentInit, ExecutionResult};
use conductor_core::{
    AgentFailure, CompletionOptions, ConductorError, ConductorResult, ErrorKind, ModelCompletion,
    RunContext,
};
use futures_util::future::join_all;
use futures_util::FutureExt;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// A registered agent. Runs on one agent are serialized by the lock.
pub type AgentHandle = Arc<Mutex<Box<dyn Agent>>>;

/// Defaults applied to every agent the orchestrator builds.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub max_steps: u32,
    pub options: CompletionOptions,
    /// Deadline applied by the `run_*` methods that take no explicit context.
    pub run_timeout: Option<Duration>,
    pub roles: WorkflowRoles,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_steps: 10,
            options: CompletionOptions::default(),
            run_timeout: None,
            roles: WorkflowRoles::default(),
        }
    }
}

/// Registry of named agents with single, concurrent, and composite dispatch.
///
/// Registration takes `&mut self`, so the set of agents is fixed before any
/// dispatch starts; dispatch itself only needs `&self`.
pub struct AgentOrchestrator {
    completion: Arc<dyn ModelCompletion>,
    settings: OrchestratorSettings,
    agents: HashMap<String, AgentHandle>,
    monitor: Arc<AgentMonitor>,
}

impl AgentOrchestrator {
    pub fn new(completion: Arc<dyn ModelCompletion>, settings: OrchestratorSettings) -> Self {
        Self {
            completion,
            settings,
            agents: HashMap::new(),
            monitor: Arc::new(AgentMonitor::new()),
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn monitor(&self) -> &Arc<AgentMonitor> {
        &self.monitor
    }

    /// Build an agent with the shared completion capability and store it under
    /// `name`, replacing any earlier agent of that name. Construction errors
    /// are returned as-is.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> ConductorResult<()>
    where
        F: FnOnce(AgentInit) -> ConductorResult<Box<dyn Agent>>,
    {
        let name = name.into();
        let init = AgentInit::new(name.clone(), self.completion.clone())
            .with_max_steps(self.settings.max_steps)
            .with_options(self.settings.options);
        let agent = factory(init)?;

        if self
            .agents
            .insert(name.clone(), Arc::new(Mutex::new(agent)))
            .is_some()
        {
            warn!(agent = %name, "Replacing registered agent");
        }
        self.monitor.register(&name);
        info!(agent = %name, "Registered agent");
        Ok(())
    }

    /// Registered agent names, sorted.
    pub fn list_agents(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    /// Context used by the methods without a `_with` suffix.
    pub fn default_context(&self) -> RunContext {
        match self.settings.run_timeout {
            Some(timeout) => RunContext::new().with_timeout(timeout),
            None => RunContext::new(),
        }
    }

    pub async fn run_one(&self, name: &str, task: &str) -> ConductorResult<ExecutionResult> {
        self.run_one_with(name, task, &self.default_context()).await
    }

    /// Run one agent. Only an unknown name is an error; run failures come back
    /// inside the result.
    pub async fn run_one_with(
        &self,
        name: &str,
        task: &str,
        ctx: &RunContext,
    ) -> ConductorResult<ExecutionResult> {
        let handle = self
            .agents
            .get(name)
            .cloned()
            .ok_or_else(|| ConductorError::UnknownAgent(vec![name.to_string()]))?;
        let monitor = self.monitor.clone();
        let run = dispatch(handle, monitor, task.to_string(), ctx.clone());
        Ok(run.await)
    }

    pub async fn run_many(
        &self,
        tasks: HashMap<String, String>,
    ) -> ConductorResult<BTreeMap<String, ExecutionResult>> {
        self.run_many_with(tasks, &self.default_context()).await
    }

    /// Run several agents concurrently, one task each.
    ///
    /// Every name is checked before anything starts; all unknown names are
    /// reported together. Each run gets its own slot in the result, so one
    /// failure (even a panic) never hides another agent's success.
    pub async fn run_many_with(
        &self,
        tasks: HashMap<String, String>,
        ctx: &RunContext,
    ) -> ConductorResult<BTreeMap<String, ExecutionResult>> {
        self.ensure_registered(tasks.keys().map(String::as_str))?;
        info!(agents = tasks.len(), "Dispatching concurrent runs");

        let mut names = Vec::with_capacity(tasks.len());
        let mut handles = Vec::with_capacity(tasks.len());
        for (name, task) in tasks {
            let agent = self.agents[&name].clone();
            let monitor = self.monitor.clone();
            let ctx = ctx.clone();
            handles.push(tokio::spawn(dispatch(agent, monitor, task.clone(), ctx)));
            names.push((name, task));
        }

        let mut results = BTreeMap::new();
        for ((name, task), joined) in names.into_iter().zip(join_all(handles).await) {
            let result = joined.unwrap_or_else(|e| {
                error!(agent = %name, error = %e, "Agent task aborted");
                let failed = ExecutionResult::failed(
                    name.clone(),
                    task,
                    AgentFailure::new(ErrorKind::Internal, format!("agent task aborted: {e}")),
                );
                self.monitor.finish(&name, &failed);
                failed
            });
            results.insert(name, result);
        }
        Ok(results)
    }

    pub async fn run_workflow(&self, task: &str) -> ConductorResult<WorkflowResult> {
        self.run_workflow_with(task, &self.default_context()).await
    }

    /// The composite pipeline: plan with the planner, then for each plan step
    /// in order run retrieval, plus code review and automation when the step
    /// mentions their keywords.
    ///
    /// Fails only when a configured role is not registered. A failed planner
    /// run or an interruption ends the workflow early with `error` set.
    pub async fn run_workflow_with(
        &self,
        task: &str,
        ctx: &RunContext,
    ) -> ConductorResult<WorkflowResult> {
        let roles = &self.settings.roles;
        self.ensure_registered(roles.names())?;
        info!(task = %task, "Workflow started");

        let planned = self.run_one_with(&roles.planner, task, ctx).await?;
        let mut workflow = WorkflowResult {
            task: task.to_string(),
            plan: planned.plan.clone(),
            steps: Vec::with_capacity(planned.plan.len()),
            thoughts: planned.thoughts.clone(),
            error: None,
        };
        if let Some(failure) = planned.error {
            warn!(agent = %roles.planner, error = %failure, "Planner failed, workflow stopped");
            workflow.error = Some(failure);
            return Ok(workflow);
        }

        for step in planned.plan {
            if let Err(e) = ctx.check() {
                warn!(task = %task, completed = workflow.steps.len(), error = %e, "Workflow interrupted");
                workflow.error = Some(AgentFailure::from(&e));
                break;
            }

            let context = self.run_one_with(&roles.retrieval, &step, ctx).await?;

            let code_review = match &roles.code_review {
                Some(name) if mentions_any(&step, CODE_KEYWORDS) => {
                    Some(self.run_one_with(name, &step, ctx).await?)
                }
                _ => None,
            };

            let automation = match &roles.automation {
                Some(name) if mentions_any(&step, AUTOMATION_KEYWORDS) => {
                    Some(self.run_one_with(name, &step, ctx).await?)
                }
                _ => None,
            };

            let result = StepResult {
                step,
                context,
                code_review,
                workflow: automation,
            };
            for failure in result.failures() {
                warn!(step = %result.step, kind = %failure.kind, error = %failure.message, "Workflow stage failed");
            }
            workflow.steps.push(result);
        }

        info!(
            task = %task,
            steps = workflow.steps.len(),
            success = workflow.is_success(),
            "Workflow finished"
        );
        Ok(workflow)
    }

    /// Clear an agent's history, thoughts, and step count.
    pub async fn reset_agent(&self, name: &str) -> ConductorResult<()> {
        let handle = self
            .agents
            .get(name)
            .ok_or_else(|| ConductorError::UnknownAgent(vec![name.to_string()]))?;
        handle.lock().await.reset();
        info!(agent = %name, "Agent reset");
        Ok(())
    }

    fn ensure_registered<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> ConductorResult<()> {
        let mut unknown: Vec<String> = names
            .into_iter()
            .filter(|name| !self.agents.contains_key(*name))
            .map(str::to_string)
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort();
        unknown.dedup();
        Err(ConductorError::UnknownAgent(unknown))
    }
}

/// Run one agent under its lock. A panic inside the agent is caught and
/// reported as an `Internal` failure, like any other run error.
async fn dispatch(
    handle: AgentHandle,
    monitor: Arc<AgentMonitor>,
    task: String,
    ctx: RunContext,
) -> ExecutionResult {
    let mut agent = handle.lock().await;
    let name = agent.name().to_string();
    monitor.start(&name);
    let run = AssertUnwindSafe(agent.run(&task, &ctx));
    let result = match run.catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            error!(agent = %name, error = %reason, "Agent panicked");
            let message = format!("agent panicked: {reason}");
            let failure = AgentFailure::new(ErrorKind::Internal, message);
            ExecutionResult::failed(name.clone(), task.clone(), failure)
        }
    };
    monitor.finish(&name, &result);
    result
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
