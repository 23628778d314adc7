//! Admission control for batches of long-running operations
//!
//! [`BatchRunner`] keeps at most `ceiling` operations in flight: before each
//! start it sweeps until the pending set has room (check, then append), and
//! [`BatchRunner::finish`] drains whatever is left.
//!
//! # Example
//!
//! ```rust,ignore
//! use ycprov_core::{BatchRunner, SweepOptions};
//!
//! let mut runner = BatchRunner::new(&client, "database creation", 15, SweepOptions::default());
//! for folder in folders {
//!     if let Err(e) = runner.start(|| client.start_database_creation(&spec_for(&folder))).await {
//!         tracing::error!("Failed to start database for {}: {}", folder.name, e);
//!     }
//! }
//! let summary = runner.finish().await;
//! println!("created {} of {}", summary.succeeded, summary.started);
//! ```

use crate::error::Result;
use crate::fetcher::OperationApi;
use crate::operation::OperationHandle;
use crate::pending::{CompletedOperation, DroppedOperation, PendingSet, SweepOptions, SweepReport, sweep};
use std::future::Future;
use tracing::{debug, info};

/// Totals for one batch workflow
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Operations admitted into the pending set
    pub started: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub unreachable: usize,
    pub timed_out: usize,
    /// Start calls that failed before an operation id was obtained
    pub start_failures: usize,
    pub completed: Vec<CompletedOperation>,
    pub dropped: Vec<DroppedOperation>,
}

impl BatchSummary {
    /// Admitted operations that did not succeed, for any reason
    pub fn not_succeeded(&self) -> usize {
        self.started - self.succeeded
    }

    fn absorb(&mut self, report: SweepReport) {
        self.succeeded += report.succeeded();
        self.failed += report.failed();
        self.unreachable += report.unreachable();
        self.timed_out += report.timed_out();
        self.completed.extend(report.completed);
        self.dropped.extend(report.dropped);
    }
}

/// Bounded-concurrency driver for a batch of operations
pub struct BatchRunner<'a, A: OperationApi + ?Sized> {
    api: &'a A,
    kind: String,
    ceiling: usize,
    options: SweepOptions,
    pending: PendingSet,
    summary: BatchSummary,
}

impl<'a, A: OperationApi + ?Sized> BatchRunner<'a, A> {
    /// A ceiling of 0 is treated as 1 so the runner can always make progress.
    pub fn new(api: &'a A, kind: impl Into<String>, ceiling: usize, options: SweepOptions) -> Self {
        Self {
            api,
            kind: kind.into(),
            ceiling: ceiling.max(1),
            options,
            pending: PendingSet::new(),
            summary: BatchSummary::default(),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Sweep until the pending set is below the ceiling.
    pub async fn make_room(&mut self) {
        while self.pending.len() >= self.ceiling {
            debug!(
                in_flight = self.pending.len(),
                ceiling = self.ceiling,
                "Pending set full, polling {}",
                self.kind
            );
            self.poll_once().await;
        }
    }

    /// Wait for room, then run `start` and track the operation it returns.
    ///
    /// A failed start call is counted in [`BatchSummary::start_failures`] and
    /// returned to the caller; nothing is added to the pending set.
    pub async fn start<F, Fut>(&mut self, start: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<OperationHandle>>,
    {
        self.make_room().await;
        match start().await {
            Ok(handle) => {
                debug!(operation_id = %handle.operation_id(), "Tracking {}", handle.description());
                self.pending.push(handle);
                self.summary.started += 1;
                Ok(())
            }
            Err(err) => {
                self.summary.start_failures += 1;
                Err(err)
            }
        }
    }

    /// Track an operation started elsewhere, after waiting for room.
    pub async fn admit(&mut self, handle: OperationHandle) {
        self.make_room().await;
        debug!(operation_id = %handle.operation_id(), "Tracking {}", handle.description());
        self.pending.push(handle);
        self.summary.started += 1;
    }

    /// One sweep over the pending set; returns how many succeeded in it.
    pub async fn poll_once(&mut self) -> usize {
        let report = sweep(self.api, &mut self.pending, &self.kind, &self.options).await;
        let succeeded = report.succeeded();
        self.summary.absorb(report);
        succeeded
    }

    /// Drain all remaining operations and return the batch totals.
    pub async fn finish(mut self) -> BatchSummary {
        while !self.pending.is_empty() {
            self.poll_once().await;
        }
        info!(
            started = self.summary.started,
            succeeded = self.summary.succeeded,
            failed = self.summary.failed,
            unreachable = self.summary.unreachable,
            timed_out = self.summary.timed_out,
            "Finished {} batch",
            self.kind
        );
        self.summary
    }
}
