use crate::config::{LlmProvider, ModelConfig};
use async_trait::async_trait;
use conductor_core::{CompletionOptions, ConductorError, ConductorResult, ModelCompletion};
use std::time::Duration;
use tracing::debug;

/// OpenAI-compatible chat completions backend.
///
/// Works with OpenAI, OpenRouter, Groq, Ollama, and any other provider
/// that implements the OpenAI chat completions API. Each prompt is sent as a
/// single user message.
pub struct OpenAiCompletion {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiCompletion {
    pub fn new(config: ModelConfig) -> ConductorResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConductorError::Http(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        // Local Ollama servers run without a key
        let request = if self.config.api_key.is_empty() {
            request
        } else {
            request.header("Authorization", format!("Bearer {}", self.config.api_key))
        };

        // OpenRouter requires extra headers
        if matches!(self.config.provider, LlmProvider::OpenRouter) {
            request
                .header("HTTP-Referer", "https://github.com/conductor-rs/conductor")
                .header("X-Title", "Conductor")
        } else {
            request
        }
    }
}

#[async_trait]
impl ModelCompletion for OpenAiCompletion {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> ConductorResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());
        let body = serde_json::json!({
            "model": self.config.model_id,
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });

        debug!(provider = %self.config.provider, model = %self.config.model_id, "Requesting completion");

        let resp = self
            .add_provider_headers(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ConductorError::Http(e.to_string()))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ConductorError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(ConductorError::Downstream(format!(
                "{} API error {}: {}",
                self.config.provider, status, resp_body
            )));
        }

        parse_completion_response(&resp_body)
    }
}

/// Extract the first choice's message text.
pub fn parse_completion_response(body: &serde_json::Value) -> ConductorResult<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            ConductorError::Downstream(format!("completion response carried no content: {body}"))
        })
}
