//! Operation status reads with bounded exponential backoff

use crate::error::{CoreError, Result, TransportError};
use crate::operation::Operation;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, warn};

/// Remote source of operation status envelopes.
///
/// Implementations perform exactly one read per call and never retry;
/// retrying is [`fetch_status`]'s job.
#[async_trait]
pub trait OperationApi: Send + Sync {
    async fn get_operation(&self, operation_id: &str) -> std::result::Result<Operation, TransportError>;
}

/// Retry ceiling and backoff base for status reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each further failure
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt `attempt` (1-indexed): `base * 2^(attempt-1)`
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Read the current status of an operation, retrying transient failures.
///
/// Fails with [`CoreError::Transport`] carrying the last underlying error once
/// `policy.max_attempts` reads have failed.
pub async fn fetch_status<A>(api: &A, operation_id: &str, policy: &RetryPolicy) -> Result<Operation>
where
    A: OperationApi + ?Sized,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        match api.get_operation(operation_id).await {
            Ok(operation) => return Ok(operation),
            Err(err) if attempt >= max_attempts => {
                error!(
                    operation_id = %operation_id,
                    attempts = attempt,
                    "Failed to fetch operation status: {}",
                    err
                );
                return Err(CoreError::Transport {
                    operation_id: operation_id.to_string(),
                    attempts: attempt,
                    source: err,
                });
            }
            Err(err) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    operation_id = %operation_id,
                    "Fetch status retry {}/{} in {:?} due to error: {}",
                    attempt,
                    max_attempts,
                    delay,
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
