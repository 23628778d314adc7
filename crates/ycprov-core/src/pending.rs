//! Bounded pending-set polling
//!
//! A batch workflow owns a [`PendingSet`] of in-flight operations and calls
//! [`sweep`] whenever it needs room or wants to drain. Each sweep reads every
//! handle's status exactly once, drops terminal handles and never fails: a
//! broken item is logged and dropped so it cannot stall the rest of the batch.

use crate::error::CoreError;
use crate::fetcher::{OperationApi, RetryPolicy, fetch_status};
use crate::operation::{OperationHandle, OperationStatus, Outcome, classify};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

/// Ordered collection of in-flight operations, owned by one batch workflow
#[derive(Debug, Default)]
pub struct PendingSet {
    handles: Vec<OperationHandle>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: OperationHandle) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationHandle> {
        self.handles.iter()
    }
}

/// Per-sweep knobs
#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    /// Retry policy for each status read
    pub retry: RetryPolicy,
    /// Sleep before returning when handles are still running
    pub pacing: Duration,
    /// Handles still running after this long are dropped as timed out
    pub max_age: Option<Duration>,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            pacing: Duration::from_secs(2),
            max_age: Some(Duration::from_secs(7200)),
        }
    }
}

/// A handle that finished successfully during a sweep
#[derive(Debug, Clone)]
pub struct CompletedOperation {
    pub handle: OperationHandle,
    pub response: Value,
}

/// Why a handle left the pending set without succeeding
#[derive(Debug, Clone)]
pub enum DropReason {
    /// The remote side reported an error
    Failed(OperationStatus),
    /// Status reads kept failing until the retry ceiling
    Unreachable(String),
    /// Still running past the configured maximum age
    TimedOut(Duration),
}

/// A handle removed from the pending set without succeeding
#[derive(Debug, Clone)]
pub struct DroppedOperation {
    pub handle: OperationHandle,
    pub reason: DropReason,
}

/// What one sweep observed
#[derive(Debug, Default)]
pub struct SweepReport {
    pub completed: Vec<CompletedOperation>,
    pub dropped: Vec<DroppedOperation>,
}

impl SweepReport {
    /// Number of operations that succeeded during this sweep
    pub fn succeeded(&self) -> usize {
        self.completed.len()
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r, DropReason::Failed(_)))
    }

    pub fn unreachable(&self) -> usize {
        self.count(|r| matches!(r, DropReason::Unreachable(_)))
    }

    pub fn timed_out(&self) -> usize {
        self.count(|r| matches!(r, DropReason::TimedOut(_)))
    }

    fn count(&self, pred: impl Fn(&DropReason) -> bool) -> usize {
        self.dropped.iter().filter(|d| pred(&d.reason)).count()
    }
}

/// Poll every handle in `pending` once and drop the terminal ones.
///
/// `kind` labels the operations in log lines (e.g. "database creation").
/// Still-running handles stay in place, in their original order. When any
/// remain, the sweep sleeps `options.pacing` before returning so a caller's
/// busy loop does not hammer the status endpoint.
pub async fn sweep<A>(
    api: &A,
    pending: &mut PendingSet,
    kind: &str,
    options: &SweepOptions,
) -> SweepReport
where
    A: OperationApi + ?Sized,
{
    let mut report = SweepReport::default();
    if pending.is_empty() {
        return report;
    }

    let mut still_pending = Vec::with_capacity(pending.len());

    for handle in std::mem::take(&mut pending.handles) {
        let op_id = handle.operation_id().to_string();

        let operation = match fetch_status(api, &op_id, &options.retry).await {
            Ok(operation) => operation,
            Err(err) => {
                error!(
                    operation_id = %op_id,
                    "Polling error for {} {} ({}): {}",
                    kind,
                    op_id,
                    handle.description(),
                    err
                );
                let detail = match err {
                    CoreError::Transport { source, .. } => source.message,
                    other => other.to_string(),
                };
                report.dropped.push(DroppedOperation {
                    handle,
                    reason: DropReason::Unreachable(detail),
                });
                continue;
            }
        };

        match classify(&operation) {
            Outcome::Running => match options.max_age {
                Some(max_age) if handle.elapsed() > max_age => {
                    let elapsed = handle.elapsed();
                    error!(
                        operation_id = %op_id,
                        "{} {} for {} still running after {:.1}s, giving up",
                        kind,
                        op_id,
                        handle.description(),
                        elapsed.as_secs_f64()
                    );
                    report.dropped.push(DroppedOperation {
                        handle,
                        reason: DropReason::TimedOut(elapsed),
                    });
                }
                _ => still_pending.push(handle),
            },
            Outcome::Succeeded(response) => {
                info!(
                    operation_id = %op_id,
                    "{} {} for {} completed successfully in {:.1}s",
                    kind,
                    op_id,
                    handle.description(),
                    handle.elapsed().as_secs_f64()
                );
                report.completed.push(CompletedOperation { handle, response });
            }
            Outcome::Failed { error: status, done } => {
                let action = if done { "failed" } else { "has failures" };
                error!(
                    operation_id = %op_id,
                    code = status.code,
                    "{} {} for {} {}: {}",
                    kind,
                    op_id,
                    handle.description(),
                    action,
                    status
                );
                report.dropped.push(DroppedOperation {
                    handle,
                    reason: DropReason::Failed(status),
                });
            }
        }
    }

    pending.handles = still_pending;

    // Gentle pacing between poll cycles
    if !pending.is_empty() {
        tokio::time::sleep(options.pacing).await;
    }

    report
}
