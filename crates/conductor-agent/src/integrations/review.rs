use async_trait::async_trait;
use conductor_core::{CodeReviewer, ConductorError, ConductorResult};

pub const DEFAULT_REVIEW_URL: &str = "https://api.coderabbit.ai/v1";

/// CodeRabbit-style review API client.
pub struct HttpCodeReviewer {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl HttpCodeReviewer {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CodeReviewer for HttpCodeReviewer {
    async fn analyze(&self, code: &str) -> ConductorResult<serde_json::Value> {
        let url = format!("{}/analyze", self.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({"code": code}))
            .send()
            .await
            .map_err(|e| ConductorError::Http(e.to_string()))?;

        if resp.status() != reqwest::StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            return Err(ConductorError::Downstream(format!(
                "CodeRabbit API error: {text}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| ConductorError::Parse(e.to_string()))
    }
}
