use serde::{Deserialize, Serialize};

/// Top-level error type for the Conductor orchestrator.
///
/// Each variant corresponds to one failure mode an agent run, a collaborator
/// call, or the registry can produce. [`ConductorError::kind`] maps a value
/// onto the stable [`ErrorKind`] that travels inside structured results.
#[derive(Debug, thiserror::Error)]
pub enum ConductorError {
    /// The model call failed or returned unusable output while planning.
    #[error("Planning error: {0}")]
    Planning(String),

    /// An agent attempted more steps than its configured budget allows.
    #[error("Agent {agent} exceeded maximum steps ({limit})")]
    StepBudgetExceeded {
        /// Name of the offending agent.
        agent: String,
        /// The configured step limit.
        limit: u32,
    },

    /// One or more agent names are not registered.
    #[error("Unknown agent(s): {}", .0.join(", "))]
    UnknownAgent(Vec<String>),

    /// A collaborator (model, retrieval, automation, review) reported failure.
    #[error("Downstream service error: {0}")]
    Downstream(String),

    /// Structured text could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The caller cancelled the run.
    #[error("Run cancelled")]
    Cancelled,

    /// The run's deadline passed before it finished.
    #[error("Run deadline exceeded")]
    DeadlineExceeded,

    /// Invalid or missing configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// Transport-level failure on an outbound HTTP request.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An invariant inside the orchestrator broke (e.g. a worker task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A convenience `Result` alias using [`ConductorError`].
pub type ConductorResult<T> = Result<T, ConductorError>;

/// Stable classification of a [`ConductorError`], suitable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`ConductorError::Planning`].
    Planning,
    /// See [`ConductorError::StepBudgetExceeded`].
    StepBudgetExceeded,
    /// See [`ConductorError::UnknownAgent`].
    UnknownAgent,
    /// Collaborator failures, including transport errors.
    Downstream,
    /// See [`ConductorError::Parse`].
    Parse,
    /// See [`ConductorError::Cancelled`].
    Cancelled,
    /// See [`ConductorError::DeadlineExceeded`].
    DeadlineExceeded,
    /// See [`ConductorError::Config`].
    Config,
    /// JSON, IO, and internal failures.
    Internal,
}

impl ConductorError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConductorError::Planning(_) => ErrorKind::Planning,
            ConductorError::StepBudgetExceeded { .. } => ErrorKind::StepBudgetExceeded,
            ConductorError::UnknownAgent(_) => ErrorKind::UnknownAgent,
            ConductorError::Downstream(_) | ConductorError::Http(_) => ErrorKind::Downstream,
            ConductorError::Parse(_) => ErrorKind::Parse,
            ConductorError::Cancelled => ErrorKind::Cancelled,
            ConductorError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            ConductorError::Config(_) => ErrorKind::Config,
            ConductorError::Json(_) | ConductorError::Io(_) | ConductorError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether the run stopped because of cancellation or a deadline.
    pub fn is_interruption(&self) -> bool {
        matches!(
            self,
            ConductorError::Cancelled | ConductorError::DeadlineExceeded
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Planning => "planning",
            ErrorKind::StepBudgetExceeded => "step_budget_exceeded",
            ErrorKind::UnknownAgent => "unknown_agent",
            ErrorKind::Downstream => "downstream",
            ErrorKind::Parse => "parse",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        };
        f.write_str(label)
    }
}
