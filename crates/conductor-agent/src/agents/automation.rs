use crate::agent::{Agent, AgentInit};
use crate::parse::{parse_tagged, WORKFLOW_TAGS};
use crate::trace::AgentState;
use async_trait::async_trait;
use conductor_core::{
    AutomationTrigger, CompletionOptions, ConductorError, ConductorResult, ModelCompletion,
    RunContext,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

/// Webhook coordinates of the automation service (n8n).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutomationSettings {
    pub webhook_url: Option<String>,
    pub webhook_id: Option<String>,
    pub cloud_url: Option<String>,
}

#[derive(Debug, Clone)]
struct Endpoints {
    webhook_url: String,
    webhook_id: String,
    cloud_url: String,
}

impl AutomationSettings {
    /// Names of the settings that are absent or blank.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("webhook_url", &self.webhook_url),
            ("webhook_id", &self.webhook_id),
            ("cloud_url", &self.cloud_url),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    fn resolve(&self) -> ConductorResult<Endpoints> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(ConductorError::Config(format!(
                "Missing required n8n settings: {}",
                missing.join(", ")
            )));
        }

        Ok(Endpoints {
            webhook_url: trimmed(&self.webhook_url),
            webhook_id: trimmed(&self.webhook_id),
            cloud_url: trimmed(&self.cloud_url),
        })
    }
}

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().trim().to_string()
}

const PLAN: [&str; 4] = [
    "Validate n8n connection and webhook configuration",
    "Prepare workflow parameters and payload",
    "Execute workflow through webhook",
    "Monitor execution and handle responses",
];

/// External-integration agent that turns a task into an n8n webhook call.
///
/// The service's health endpoint is checked before first use; a failed check
/// aborts the run and is retried on the next run.
pub struct AutomationAgent {
    state: AgentState,
    completion: Arc<dyn ModelCompletion>,
    options: CompletionOptions,
    trigger: Arc<dyn AutomationTrigger>,
    endpoints: Endpoints,
    validated: bool,
}

impl AutomationAgent {
    /// Fails with a config error naming every missing setting.
    pub fn new(
        init: AgentInit,
        settings: &AutomationSettings,
        trigger: Arc<dyn AutomationTrigger>,
    ) -> ConductorResult<Self> {
        let endpoints = settings.resolve()?;
        Ok(Self {
            state: AgentState::new(init.name, init.max_steps),
            completion: init.completion,
            options: init.options,
            trigger,
            endpoints,
            validated: false,
        })
    }

    fn workflow_prompt(&self, task: &str) -> ConductorResult<String> {
        let workflow_context = serde_json::to_string_pretty(&json!({
            "webhook_url": self.endpoints.webhook_url,
            "webhook_id": self.endpoints.webhook_id,
            "cloud_url": self.endpoints.cloud_url,
        }))?;
        Ok(format!(
            "You are an n8n workflow orchestrator. \
             Your task is to manage and execute n8n workflows.\n\n\
             Task: {task}\n\n\
             Workflow Context:\n{workflow_context}\n\n\
             Webhook Data:\n{{}}\n\n\
             Please provide:\n\
             1. Workflow execution plan\n\
             2. Required webhook parameters\n\
             3. Expected workflow outcomes\n\
             4. Error handling considerations\n\n\
             Response format:\n\
             WORKFLOW: Name and purpose of the workflow\n\
             PARAMETERS: Required webhook parameters\n\
             EXECUTION: Steps to execute\n\
             VALIDATION: How to validate success\n\n\
             Response:"
        ))
    }
}

const PAYLOAD_FIELDS: [&str; 3] = ["workflow", "parameters", "execution"];

/// Webhook payload built from the parsed reply. Every payload field must have
/// been tagged in the reply, otherwise nothing is sent.
pub fn workflow_payload(config: &BTreeMap<String, String>) -> ConductorResult<serde_json::Value> {
    let missing: Vec<&str> = PAYLOAD_FIELDS
        .into_iter()
        .filter(|key| !config.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(ConductorError::Parse(format!(
            "Workflow reply is missing required fields: {}",
            missing.join(", ")
        )));
    }

    let payload: serde_json::Map<String, serde_json::Value> = PAYLOAD_FIELDS
        .into_iter()
        .map(|key| (key.to_string(), json!(config[key])))
        .collect();
    Ok(serde_json::Value::Object(payload))
}

#[async_trait]
impl Agent for AutomationAgent {
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

        self.state.consume_step()?;
        if !self.validated {
            if let Err(e) = ctx
                .guard(self.trigger.check_health(&self.endpoints.cloud_url))
                .await
            {
                error!(agent = %self.state.name(), error = %e, "n8n connection validation failed");
                self.state.fail_step(label(0), &e);
                return Err(e);
            }
            info!(agent = %self.state.name(), "n8n connection validated successfully");
            self.validated = true;
        }
        self.state.complete_step(label(0), json!({"validated": true}));

        self.state.consume_step()?;
        let prompt = self.workflow_prompt(task)?;
        let reply = ctx
            .guard(self.completion.complete(&prompt, &self.options))
            .await?;
        let workflow_config = parse_tagged(&reply, WORKFLOW_TAGS);
        self.state.complete_step(label(1), json!(workflow_config));

        self.state.consume_step()?;
        let payload = match workflow_payload(&workflow_config) {
            Ok(payload) => payload,
            Err(e) => {
                error!(agent = %self.state.name(), error = %e, "Unusable workflow reply");
                self.state.fail_step(label(2), &e);
                return Err(e);
            }
        };
        let response = ctx
            .guard(self.trigger.invoke(&self.endpoints.webhook_url, &payload))
            .await?;
        if response.is_failure() {
            let e = ConductorError::Downstream(format!(
                "Workflow execution failed ({}): {}",
                response.status, response.body
            ));
            error!(agent = %self.state.name(), status = response.status, "Workflow failed");
            self.state.fail_step(label(2), &e);
            return Err(e);
        }
        self.state.complete_step(label(2), json!({"status": response.status}));

        self.state.consume_step()?;
        self.state.complete_step(label(3), response.body.clone());

        Ok(json!({
            "task": task,
            "workflow_config": workflow_config,
            "execution_result": response.body,
            "webhook_url": self.endpoints.webhook_url,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{RecordingTrigger, ScriptedCompletion};
    use crate::trace::StepStatus;
    use conductor_core::ErrorKind;
    use std::sync::atomic::Ordering;

    const REPLY: &str = "WORKFLOW: deploy\n\
                         PARAMETERS: branch=main\n\
                         EXECUTION: run pipeline\n\
                         VALIDATION: check status";

    fn settings() -> AutomationSettings {
        AutomationSettings {
            webhook_url: Some("https://n8n.example/webhook/abc".to_string()),
            webhook_id: Some("abc".to_string()),
            cloud_url: Some("https://n8n.example".to_string()),
        }
    }

    fn agent(trigger: Arc<RecordingTrigger>) -> AutomationAgent {
        agent_replying(REPLY, trigger)
    }

    fn agent_replying(reply: &str, trigger: Arc<RecordingTrigger>) -> AutomationAgent {
        let completion = Arc::new(ScriptedCompletion::new(&[reply]));
        AutomationAgent::new(AgentInit::new("n8n", completion), &settings(), trigger).unwrap()
    }

    #[test]
    fn test_missing_settings_rejected_at_construction() {
        let completion = Arc::new(ScriptedCompletion::new(&[]));
        let partial = AutomationSettings {
            webhook_url: Some("https://n8n.example/webhook".to_string()),
            webhook_id: Some("  ".to_string()),
            cloud_url: None,
        };
        let err = AutomationAgent::new(
            AgentInit::new("n8n", completion),
            &partial,
            Arc::new(RecordingTrigger::new(true, 200)),
        )
        .err()
        .unwrap();
        match err {
            ConductorError::Config(message) => assert!(message.contains("webhook_id, cloud_url")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_payload_requires_tagged_fields() {
        let mut config = BTreeMap::new();
        config.insert("workflow".to_string(), "deploy".to_string());
        let err = workflow_payload(&config).unwrap_err();
        assert!(
            matches!(err, ConductorError::Parse(ref m) if m.ends_with("parameters, execution")),
            "{err:?}"
        );

        config.insert("parameters".to_string(), String::new());
        config.insert("execution".to_string(), "run".to_string());
        assert_eq!(
            workflow_payload(&config).unwrap(),
            json!({"workflow": "deploy", "parameters": "", "execution": "run"})
        );
    }

    #[tokio::test]
    async fn test_untagged_reply_never_invokes_webhook() {
        let trigger = Arc::new(RecordingTrigger::new(true, 200));
        let mut n8n = agent_replying("Sorry, I cannot help with that.", trigger.clone());

        let ctx = RunContext::new();
        let result = n8n.run("trigger the deployment webhook", &ctx).await;

        let failure = result.error.unwrap();
        assert_eq!(failure.kind, ErrorKind::Parse);
        assert!(failure.message.contains("workflow, parameters, execution"));
        assert_eq!(result.steps.last().unwrap().status, StepStatus::Failed);
        assert!(trigger.payloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatches_parsed_payload() {
        let trigger = Arc::new(RecordingTrigger::new(true, 200));
        let mut n8n = agent(trigger.clone());

        let ctx = RunContext::new();
        let result = n8n.run("trigger the deployment webhook", &ctx).await;

        assert!(result.is_success(), "{:?}", result.error);
        assert_eq!(result.steps_taken, 5);
        assert_eq!(result.output["workflow_config"]["validation"], "check status");
        assert_eq!(result.output["execution_result"]["executionId"], "42");

        let payloads = trigger.payloads.lock().unwrap();
        assert_eq!(payloads[0].0, "https://n8n.example/webhook/abc");
        assert_eq!(
            payloads[0].1,
            json!({"workflow": "deploy", "parameters": "branch=main", "execution": "run pipeline"})
        );
    }

    #[tokio::test]
    async fn test_health_checked_once_per_agent() {
        let trigger = Arc::new(RecordingTrigger::new(true, 200));
        let mut n8n = agent(trigger.clone());

        n8n.run("first", &RunContext::new()).await;
        n8n.run("second", &RunContext::new()).await;

        assert_eq!(trigger.health_checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_fast() {
        let trigger = Arc::new(RecordingTrigger::new(false, 200));
        let mut n8n = agent(trigger.clone());

        let result = n8n.run("trigger", &RunContext::new()).await;

        assert_eq!(result.error.unwrap().kind, ErrorKind::Downstream);
        assert_eq!(result.steps_taken, 2);
        assert!(trigger.payloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_downstream_failure() {
        let trigger = Arc::new(RecordingTrigger::new(true, 500));
        let mut n8n = agent(trigger);

        let result = n8n.run("trigger", &RunContext::new()).await;

        let failure = result.error.unwrap();
        assert_eq!(failure.kind, ErrorKind::Downstream);
        assert!(failure.message.contains("500"));
        assert_eq!(result.steps.last().unwrap().status, StepStatus::Failed);
    }
}
