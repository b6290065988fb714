//! Retry policies for remote provisioning operations.
//!
//! Transient errors are absorbed by the retry wrapper closest to the
//! operation; everything else propagates up through the stage fan-out and
//! aborts the topology build. The production default retries forever with a
//! fixed delay — a run is expected to eventually succeed or be manually
//! aborted. Tests substitute a bounded policy.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{CloudError, DeployConfig, ShellError};

/// Fixed-delay retry with an optional attempt ceiling.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    delay: Duration,
    limit: Option<u32>,
}

impl RetryPolicy {
    /// Retry forever with `delay` between attempts.
    #[must_use]
    pub const fn fixed(delay: Duration) -> Self {
        Self { delay, limit: None }
    }

    /// Give up after `attempts` total attempts.
    #[must_use]
    pub const fn bounded(delay: Duration, attempts: u32) -> Self {
        Self {
            delay,
            limit: Some(attempts),
        }
    }

    /// Run `op` until it succeeds. Errors matching `retryable` are absorbed
    /// with a fixed delay until the attempt limit (if any) is exhausted;
    /// every other error propagates immediately.
    pub async fn run<T, F, Fut>(&self, retryable: impl Fn(&anyhow::Error) -> bool, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if retryable(&err) => {
                    if let Some(limit) = self.limit
                        && attempt >= limit
                    {
                        return Err(err);
                    }
                    tracing::debug!(attempt, error = %err, "transient failure, retrying");
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// The two retry layers of the remote execution channel.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicies {
    /// Session establishment (node running but sshd not yet up).
    pub connect: RetryPolicy,
    /// The whole upload-and-execute sequence.
    pub execute: RetryPolicy,
}

impl RetryPolicies {
    #[must_use]
    pub fn from_config(cfg: &DeployConfig) -> Self {
        let policy = match cfg.retry_limit {
            Some(attempts) => RetryPolicy::bounded(cfg.retry_delay, attempts),
            None => RetryPolicy::fixed(cfg.retry_delay),
        };
        Self {
            connect: policy,
            execute: policy,
        }
    }
}

// ── Retryable-error predicates ────────────────────────────────────────────────

/// Session could not be established.
pub fn transient_connect(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ShellError>()
        .is_some_and(ShellError::is_connect)
}

/// Remote transfer or command failed; safe to re-run because every
/// provisioning script is idempotent.
pub fn transient_execution(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ShellError>()
        .is_some_and(ShellError::is_execution)
}

/// Teardown contention: the resource is still referenced by something that
/// is itself being torn down.
pub fn cleanup_contention(err: &anyhow::Error) -> bool {
    err.downcast_ref::<CloudError>()
        .is_some_and(CloudError::is_contention)
}
