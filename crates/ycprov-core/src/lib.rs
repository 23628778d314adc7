//! # ycprov-core
//!
//! Engine for provisioning users, folders, networks and YDB databases through
//! the Yandex Cloud control plane, and for driving the long-running operations
//! those calls start.
//!
//! ## Layers
//!
//! - **Operations** ([`operation`]) - the status envelope and its classification
//!   into running / succeeded / failed
//! - **Status fetcher** ([`fetcher`]) - one status read with bounded exponential
//!   backoff, behind the [`OperationApi`] seam
//! - **Waiter** ([`progress`]) - block on a single operation with a deadline and
//!   optional progress callbacks
//! - **Pending set** ([`pending`]) - sweep a bounded set of in-flight operations
//!   once, dropping terminal ones
//! - **Admission control** ([`batch`]) - keep at most N operations in flight
//!   across a batch workflow
//! - **Control plane** ([`cloud`]) - HTTP client, payloads and start-and-wait
//!   workflows
//! - **Config** ([`config`]) - TOML settings, IAM token resolution
//!
//! ## Example
//!
//! ```rust,ignore
//! use ycprov_core::{CloudClient, Config, wait_for_operation};
//!
//! let config = Config::load()?;
//! let client = CloudClient::new(config.resolve_iam_token()?, config.endpoints.clone())?;
//! let handle = client.start_database_deletion("etn0123").await?;
//! wait_for_operation(
//!     &client,
//!     handle.operation_id(),
//!     handle.description(),
//!     &config.polling.wait_options(),
//!     None,
//! )
//! .await?;
//! ```

pub mod batch;
pub mod cloud;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod operation;
pub mod pending;
pub mod progress;

#[cfg(test)]
mod test_support;

pub use batch::{BatchRunner, BatchSummary};
pub use cloud::CloudClient;
pub use config::{Config, ConfigError, PollingConfig};
pub use error::{CoreError, Result, TransportError};
pub use fetcher::{OperationApi, RetryPolicy, fetch_status};
pub use operation::{Operation, OperationHandle, OperationStatus, Outcome, classify};
pub use pending::{
    CompletedOperation, DropReason, DroppedOperation, PendingSet, SweepOptions, SweepReport, sweep,
};
pub use progress::{ProgressCallback, ProgressEvent, WaitOptions, wait_for_operation};
