use crate::error::{ConductorError, ConductorResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline carried through one agent or workflow run.
///
/// Every suspension point (model call, network call) goes through
/// [`RunContext::guard`], so no new I/O starts after cancellation is observed
/// and an in-flight call is abandoned as soon as the token fires or the
/// deadline passes.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RunContext {
    /// A context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a caller-owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Fail the run once `timeout` has elapsed from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Fail the run at `deadline`. An earlier existing deadline wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// The token observed by this context.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Return an error if the run has been cancelled or is past its deadline.
    pub fn check(&self) -> ConductorResult<()> {
        if self.cancel.is_cancelled() {
            return Err(ConductorError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(ConductorError::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Run `fut` unless the context is already interrupted, racing it against
    /// cancellation and the deadline.
    pub async fn guard<T, F>(&self, fut: F) -> ConductorResult<T>
    where
        F: Future<Output = ConductorResult<T>>,
    {
        self.check()?;
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Err(ConductorError::Cancelled),
                    _ = tokio::time::sleep_until(deadline) => Err(ConductorError::DeadlineExceeded),
                    result = fut => result,
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Err(ConductorError::Cancelled),
                    result = fut => result,
                }
            }
        }
    }
}
