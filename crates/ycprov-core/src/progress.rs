//! Progress tracking and polling for a single long-running operation
//!
//! Control-plane calls return an operation id which must be polled until the
//! operation reports completion. This module provides that polling with an
//! explicit deadline and optional progress callbacks for UI updates.

use crate::error::{CoreError, Result};
use crate::fetcher::{OperationApi, RetryPolicy, fetch_status};
use crate::operation::{Outcome, classify};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Progress events emitted while waiting on an operation
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Polling has started
    Started { operation_id: String },
    /// One status read came back still running
    Polling {
        operation_id: String,
        elapsed: Duration,
    },
    /// Operation finished successfully
    Completed {
        operation_id: String,
        resource_id: Option<String>,
    },
    /// Operation failed or timed out
    Failed { operation_id: String, error: String },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive a spinner; batch workflows pass `None`.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Cadence and deadline for [`wait_for_operation`]
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Retry policy for each status read
    pub retry: RetryPolicy,
    /// Sleep between reads that come back still running
    pub interval: Duration,
    /// Maximum time to wait before giving up
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(3600),
        }
    }
}

/// Poll an operation until it reaches a terminal state
///
/// # Arguments
///
/// * `api` - Source of status envelopes
/// * `operation_id` - The operation to poll
/// * `description` - Human-readable label used in logs and errors
/// * `options` - Retry policy, poll interval and deadline
/// * `on_progress` - Optional callback for progress updates
///
/// # Returns
///
/// The operation's `response` payload, [`CoreError::OperationFailed`] if the
/// remote side reported an error, [`CoreError::TimedOut`] once `options.timeout`
/// has passed, or the status fetcher's [`CoreError::Transport`] unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use ycprov_core::{wait_for_operation, ProgressEvent, WaitOptions};
///
/// let handle = client.start_folder_creation(&cloud_id, "alice-baggins", None).await?;
/// let response = wait_for_operation(
///     &client,
///     handle.operation_id(),
///     handle.description(),
///     &WaitOptions::default(),
///     Some(Box::new(|event| {
///         if let ProgressEvent::Polling { elapsed, .. } = event {
///             println!("still running ({:.0}s)", elapsed.as_secs_f64());
///         }
///     })),
/// )
/// .await?;
/// ```
pub async fn wait_for_operation<A>(
    api: &A,
    operation_id: &str,
    description: &str,
    options: &WaitOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Value>
where
    A: OperationApi + ?Sized,
{
    let start = Instant::now();
    info!(operation_id = %operation_id, "Starting polling for {}", description);

    emit(
        &on_progress,
        ProgressEvent::Started {
            operation_id: operation_id.to_string(),
        },
    );

    loop {
        let elapsed = start.elapsed();
        if elapsed > options.timeout {
            error!(
                operation_id = %operation_id,
                "Operation {} timed out after {:.2}s",
                description,
                elapsed.as_secs_f64()
            );
            emit(
                &on_progress,
                ProgressEvent::Failed {
                    operation_id: operation_id.to_string(),
                    error: format!("timed out after {:?}", elapsed),
                },
            );
            return Err(CoreError::TimedOut {
                description: description.to_string(),
                operation_id: operation_id.to_string(),
                elapsed,
            });
        }

        let operation = match fetch_status(api, operation_id, &options.retry).await {
            Ok(operation) => operation,
            Err(err) => {
                emit(
                    &on_progress,
                    ProgressEvent::Failed {
                        operation_id: operation_id.to_string(),
                        error: err.to_string(),
                    },
                );
                return Err(err);
            }
        };

        match classify(&operation) {
            Outcome::Running => {
                debug!(operation_id = %operation_id, "Operation {} still in progress", description);
                emit(
                    &on_progress,
                    ProgressEvent::Polling {
                        operation_id: operation_id.to_string(),
                        elapsed: start.elapsed(),
                    },
                );
                tokio::time::sleep(options.interval).await;
            }
            Outcome::Succeeded(response) => {
                let elapsed = start.elapsed();
                info!(
                    operation_id = %operation_id,
                    "Operation {} completed successfully in {:.2}s",
                    description,
                    elapsed.as_secs_f64()
                );
                emit(
                    &on_progress,
                    ProgressEvent::Completed {
                        operation_id: operation_id.to_string(),
                        resource_id: operation.resource_id().map(str::to_string),
                    },
                );
                return Ok(response);
            }
            Outcome::Failed { error: status, done } => {
                let elapsed = start.elapsed();
                if done {
                    error!(
                        operation_id = %operation_id,
                        "Operation {} failed after {:.2}s: {}",
                        description,
                        elapsed.as_secs_f64(),
                        status
                    );
                } else {
                    warn!(
                        operation_id = %operation_id,
                        "Operation {} has failures during execution after {:.2}s: {}",
                        description,
                        elapsed.as_secs_f64(),
                        status
                    );
                }
                emit(
                    &on_progress,
                    ProgressEvent::Failed {
                        operation_id: operation_id.to_string(),
                        error: status.message.clone(),
                    },
                );
                return Err(CoreError::OperationFailed {
                    description: description.to_string(),
                    operation_id: operation_id.to_string(),
                    code: status.code,
                    message: status.message,
                    details: status.details,
                    elapsed,
                    done,
                });
            }
        }
    }
}

/// Helper to emit progress events
fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
