use async_trait::async_trait;
use conductor_core::{AutomationTrigger, ConductorError, ConductorResult, TriggerResponse};
use tracing::{debug, warn};

/// n8n webhook client.
pub struct HttpAutomationTrigger {
    webhook_id: Option<String>,
    http: reqwest::Client,
}

impl HttpAutomationTrigger {
    /// `webhook_id` is sent as `X-N8N-Webhook-ID` on every invocation.
    pub fn new(webhook_id: Option<String>) -> Self {
        Self {
            webhook_id,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AutomationTrigger for HttpAutomationTrigger {
    async fn check_health(&self, base_url: &str) -> ConductorResult<()> {
        let url = format!("{}/healthz", base_url.trim_end_matches('/'));
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ConductorError::Http(e.to_string()))?;

        if resp.status() != reqwest::StatusCode::OK {
            return Err(ConductorError::Downstream(format!(
                "n8n health check failed: {}",
                resp.status().as_u16()
            )));
        }
        debug!(url = %url, "n8n health check passed");
        Ok(())
    }

    async fn invoke(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> ConductorResult<TriggerResponse> {
        let mut request = self
            .http
            .post(endpoint)
            .header("Accept", "application/json")
            .json(payload);
        if let Some(id) = &self.webhook_id {
            request = request.header("X-N8N-Webhook-ID", id);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ConductorError::Http(e.to_string()))?;
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| ConductorError::Http(e.to_string()))?;

        // Webhooks may answer with plain text
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
        if status >= 400 {
            warn!(endpoint = %endpoint, status, "Webhook returned an error status");
        }
        Ok(TriggerResponse { status, body })
    }
}
