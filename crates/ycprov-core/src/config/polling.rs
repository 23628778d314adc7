//! Polling, retry and concurrency settings
//!
//! The `[polling]` table of the config file. Every field has a serde default
//! so a partial table (or none at all) is valid.

use crate::fetcher::RetryPolicy;
use crate::pending::SweepOptions;
use crate::progress::WaitOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cadence, deadlines and limits for operation polling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Attempts per status read, including the first
    #[serde(default = "default_status_retry_attempts")]
    pub status_retry_attempts: u32,

    /// Backoff after the first failed read, doubled after each further failure
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Sleep between reads while waiting on a single operation
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Sleep at the end of a sweep that left operations running
    #[serde(default = "default_sweep_pacing_secs")]
    pub sweep_pacing_secs: u64,

    /// Deadline for waiting on a single operation
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Operations still running after this long are dropped from a batch.
    /// Zero disables the limit.
    #[serde(default = "default_max_operation_age_secs")]
    pub max_operation_age_secs: u64,

    /// Ceiling on in-flight operations in batch workflows
    #[serde(default = "default_max_concurrent_operations")]
    pub max_concurrent_operations: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_retry_attempts: default_status_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            poll_interval_secs: default_poll_interval_secs(),
            sweep_pacing_secs: default_sweep_pacing_secs(),
            wait_timeout_secs: default_wait_timeout_secs(),
            max_operation_age_secs: default_max_operation_age_secs(),
            max_concurrent_operations: default_max_concurrent_operations(),
        }
    }
}

impl PollingConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.status_retry_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            retry: self.retry_policy(),
            interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Duration::from_secs(self.wait_timeout_secs),
        }
    }

    pub fn sweep_options(&self) -> SweepOptions {
        SweepOptions {
            retry: self.retry_policy(),
            pacing: Duration::from_secs(self.sweep_pacing_secs),
            max_age: (self.max_operation_age_secs > 0)
                .then(|| Duration::from_secs(self.max_operation_age_secs)),
        }
    }
}

fn default_status_retry_attempts() -> u32 {
    5
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_sweep_pacing_secs() -> u64 {
    2
}

fn default_wait_timeout_secs() -> u64 {
    3600
}

fn default_max_operation_age_secs() -> u64 {
    7200
}

fn default_max_concurrent_operations() -> usize {
    15
}
