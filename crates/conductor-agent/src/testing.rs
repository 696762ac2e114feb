//! Fakes for the collaborator ports, shared by unit tests in this crate.
#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use conductor_core::{
    AutomationTrigger, CodeReviewer, CompletionOptions, ConductorError, ConductorResult, Document,
    ModelCompletion, Retriever, TriggerResponse,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Replays canned completions in order; the last one repeats once the queue drains.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| (*r).to_string()).collect()),
            last: Mutex::new(String::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelCompletion for ScriptedCompletion {
    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> ConductorResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.replies.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }
}

pub struct FailingCompletion;

#[async_trait]
impl ModelCompletion for FailingCompletion {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> ConductorResult<String> {
        Err(ConductorError::Downstream("model unavailable".to_string()))
    }
}

pub struct StaticRetriever {
    pub docs: Vec<Document>,
    pub calls: AtomicUsize,
}

impl StaticRetriever {
    pub fn new(contents: &[&str]) -> Self {
        Self {
            docs: contents.iter().map(|c| Document::new(*c)).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _query: &str, top_k: usize) -> ConductorResult<Vec<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.docs.iter().take(top_k).cloned().collect())
    }
}

pub struct RecordingTrigger {
    pub healthy: bool,
    pub status: u16,
    pub health_checks: AtomicUsize,
    pub payloads: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingTrigger {
    pub fn new(healthy: bool, status: u16) -> Self {
        Self {
            healthy,
            status,
            health_checks: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AutomationTrigger for RecordingTrigger {
    async fn check_health(&self, _base_url: &str) -> ConductorResult<()> {
        self.health_checks.fetch_add(1, Ordering::SeqCst);
        if self.healthy {
            Ok(())
        } else {
            Err(ConductorError::Downstream("n8n health check failed: 503".to_string()))
        }
    }

    async fn invoke(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> ConductorResult<TriggerResponse> {
        self.payloads
            .lock()
            .unwrap()
            .push((endpoint.to_string(), payload.clone()));
        Ok(TriggerResponse {
            status: self.status,
            body: serde_json::json!({"executionId": "42"}),
        })
    }
}

pub struct CannedReviewer {
    pub findings: Option<serde_json::Value>,
}

#[async_trait]
impl CodeReviewer for CannedReviewer {
    async fn analyze(&self, _code: &str) -> ConductorResult<serde_json::Value> {
        self.findings
            .clone()
            .ok_or_else(|| ConductorError::Downstream("CodeRabbit API error: 401".to_string()))
    }
}
