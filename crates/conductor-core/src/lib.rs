//! Core types and error definitions for the Conductor orchestrator.
//!
//! This crate provides the foundational types shared across all Conductor
//! crates: the error taxonomy, the capability ports agents call through, and
//! the run context that carries cancellation and deadlines.
//!
//! # Main types
//!
//! - [`ConductorError`]: Unified error enum for all Conductor subsystems.
//! - [`ConductorResult`]: Convenience alias for `Result<T, ConductorError>`.
//! - [`ErrorKind`] / [`AgentFailure`]: Typed error values embedded in results.
//! - [`ModelCompletion`], [`Retriever`], [`AutomationTrigger`], [`CodeReviewer`]: Ports.
//! - [`RunContext`]: Cancellation token plus optional deadline for a run.

/// Run context: cancellation and deadlines.
pub mod context;
/// Error taxonomy.
pub mod error;
/// Collaborator ports.
pub mod ports;
/// Shared data types.
pub mod types;

pub use context::RunContext;
pub use error::{ConductorError, ConductorResult, ErrorKind};
pub use ports::{AutomationTrigger, CodeReviewer, ModelCompletion, Retriever};
pub use tokio_util::sync::CancellationToken;
pub use types::{AgentFailure, CompletionOptions, Document, TriggerResponse};
