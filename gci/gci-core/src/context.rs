use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::{GciError, GciResult};

/// Per-request execution context.
///
/// Carries the request id used in logs, an optional deadline and a
/// cancellation token. Every outbound collaborator call is expected to go
/// through [`ExecutionContext::run`] so that the inbound request's deadline
/// and cancellation reach it.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    request_id: String,
    deadline: Option<Instant>,
    cancellation: CancellationToken,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            deadline: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when no deadline is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns a guard that cancels this context when dropped.
    ///
    /// Handlers hold it for the lifetime of the request so that a dropped
    /// request future (client went away) cancels in-flight calls.
    pub fn drop_guard(&self) -> DropGuard {
        self.cancellation.clone().drop_guard()
    }

    /// Runs `fut` unless the context is cancelled or its deadline passes first.
    pub async fn run<T, F>(&self, operation: &'static str, fut: F) -> GciResult<T>
    where
        F: Future<Output = GciResult<T>>,
    {
        if self.is_cancelled() {
            return Err(GciError::Cancelled(operation));
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(GciError::Cancelled(operation)),
            _ = deadline => Err(GciError::DeadlineExceeded(operation)),
            res = fut => res,
        }
    }
}
