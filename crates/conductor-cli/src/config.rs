use anyhow::Context;
use conductor_agent::integrations::DEFAULT_REVIEW_URL;
use conductor_agent::{AgentSettings, AutomationSettings, ModelConfig};
use conductor_orchestrator::WorkflowRoles;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Contents of `conductor.toml`, after environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct ConductorConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub agents: AgentSettings,
    #[serde(default)]
    pub workflow: WorkflowRoles,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub code_review: ReviewConfig,
    #[serde(default)]
    pub n8n: AutomationSettings,
    /// Deadline for a single command, in seconds.
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrievalConfig {
    /// External retrieval service used as the vector source.
    #[serde(default)]
    pub url: Option<String>,
    /// Directory of text files for the in-process keyword index.
    #[serde(default)]
    pub index_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConfig {
    #[serde(default = "default_review_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_review_url() -> String {
    DEFAULT_REVIEW_URL.to_string()
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            url: default_review_url(),
            api_key: None,
        }
    }
}

impl ConductorConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        Self::parse(&text)
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in the binary.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parsed(&lookup, "AGENT_MAX_STEPS")? {
            self.agents.max_steps = v;
        }
        if let Some(v) = parsed(&lookup, "AGENT_TEMPERATURE")? {
            self.model.temperature = v;
        }
        if let Some(v) = parsed(&lookup, "MODEL_MAX_TOKENS")? {
            self.model.max_tokens = v;
        }
        if let Some(v) = lookup("MODEL_NAME") {
            self.model.model_id = v;
        }
        if let Some(v) = lookup("MODEL_API_KEY") {
            self.model.api_key = v;
        }
        if let Some(v) = lookup("CODERABBIT_API_KEY") {
            self.code_review.api_key = Some(v);
        }
        if let Some(v) = lookup("CODERABBIT_URL") {
            self.code_review.url = v;
        }
        if let Some(v) = lookup("N8N_WEBHOOK_URL") {
            self.n8n.webhook_url = Some(v);
        }
        if let Some(v) = lookup("N8N_WEBHOOK_ID") {
            self.n8n.webhook_id = Some(v);
        }
        if let Some(v) = lookup("N8N_CLOUD_URL") {
            self.n8n.cloud_url = Some(v);
        }
        if let Some(v) = lookup("RETRIEVAL_URL") {
            self.retrieval.url = Some(v);
        }
        Ok(())
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {key}: {raw:?}"))
        })
        .transpose()
}
