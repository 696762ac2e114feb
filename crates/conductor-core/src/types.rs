use crate::error::{ConductorError, ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sampling options passed with every completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

/// A ranked document returned by a retrieval backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Text content of the document or chunk.
    pub content: String,
    /// Backend-defined metadata (source path, score, ...).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Raw response of an automation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Response body, parsed as JSON when possible.
    pub body: serde_json::Value,
}

impl TriggerResponse {
    /// Any status of 400 or above counts as a failed invocation.
    pub fn is_failure(&self) -> bool {
        self.status >= 400
    }
}

/// Typed error value embedded in structured results instead of a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFailure {
    /// Classification callers can branch on.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl AgentFailure {
    /// Build a failure record from its parts.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&ConductorError> for AgentFailure {
    fn from(err: &ConductorError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl std::fmt::Display for AgentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
