//! Narrow contracts for the collaborators the core calls but does not implement.
//!
//! Adapters live in `conductor-agent` (HTTP) and `conductor-memory` (local
//! keyword index); tests substitute hand-written fakes.

use crate::error::ConductorResult;
use crate::types::{CompletionOptions, Document, TriggerResponse};
use async_trait::async_trait;

/// A language-model completion call.
///
/// Implementations must not retry internally beyond their own policy; the
/// core never retries.
#[async_trait]
pub trait ModelCompletion: Send + Sync {
    /// Complete `prompt` and return the generated text.
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> ConductorResult<String>;
}

/// A document retrieval backend. Results are already ranked.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return at most `top_k` documents relevant to `query`.
    async fn retrieve(&self, query: &str, top_k: usize) -> ConductorResult<Vec<Document>>;
}

/// An external automation service reachable over webhooks.
#[async_trait]
pub trait AutomationTrigger: Send + Sync {
    /// Check that the service at `base_url` is reachable and healthy.
    async fn check_health(&self, base_url: &str) -> ConductorResult<()>;

    /// Deliver `payload` to `endpoint`. Status interpretation is left to the caller.
    async fn invoke(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> ConductorResult<TriggerResponse>;
}

/// An external code-review service.
#[async_trait]
pub trait CodeReviewer: Send + Sync {
    /// Analyze `code` and return the raw structured findings.
    async fn analyze(&self, code: &str) -> ConductorResult<serde_json::Value>;
}
