//! Unified error handling for ycprov-core
//!
//! Transport problems, remote operation failures and local deadlines all surface
//! through [`CoreError`] with helper predicates for callers that need to branch.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use ycprov_core::CoreError;
//!
//! let err = CoreError::TimedOut {
//!     description: "YDB database creation for ydb-foo".to_string(),
//!     operation_id: "op-1".to_string(),
//!     elapsed: Duration::from_secs(3600),
//! };
//! assert!(err.is_timeout());
//! assert!(!err.is_operation_failure());
//! ```

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// A single failed exchange with the remote API, before any retry decision.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct TransportError {
    /// Human-readable cause
    pub message: String,
    /// HTTP status, when the server answered at all
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Returns true if the server answered with a 5xx status
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.status, Some(s) if (500..600).contains(&s))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

/// Core error type for operation orchestration and control-plane calls
#[derive(Error, Debug)]
pub enum CoreError {
    /// Status reads for an operation kept failing until the retry ceiling was hit
    #[error("Failed to fetch status of operation {operation_id} after {attempts} attempts: {source}")]
    Transport {
        operation_id: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The remote system reported a failure for a tracked operation
    #[error("Operation {description} failed (code {code}): {message}")]
    OperationFailed {
        description: String,
        operation_id: String,
        code: i32,
        message: String,
        details: Vec<Value>,
        elapsed: Duration,
        /// False when the error arrived while the operation was still running
        done: bool,
    },

    /// The operation did not reach a terminal state within the allowed time
    #[error("Operation {description} ({operation_id}) timed out after {elapsed:?}")]
    TimedOut {
        description: String,
        operation_id: String,
        elapsed: Duration,
    },

    /// A start or list call could not be completed
    #[error("{context}: {source}")]
    Request {
        context: String,
        #[source]
        source: TransportError,
    },

    /// A start call was answered with an inline error instead of an operation
    #[error("{context} rejected (code {code}): {message}")]
    Rejected {
        context: String,
        code: i32,
        message: String,
    },

    /// A response did not contain a field the caller depends on
    #[error("{context}: response has no '{field}'")]
    MissingField { context: String, field: String },

    /// Input rejected before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns true if this is a local deadline error
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CoreError::TimedOut { .. })
    }

    /// Returns true if the remote side reported the operation itself as failed
    #[must_use]
    pub fn is_operation_failure(&self) -> bool {
        matches!(self, CoreError::OperationFailed { .. })
    }

    /// Returns true if repeating the same call later might succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Transport { .. } => true,
            CoreError::Request { source, .. } => source.status.is_none() || source.is_server_error(),
            CoreError::TimedOut { .. } => true,
            _ => false,
        }
    }

    /// Remote error code, if the remote side supplied one
    #[must_use]
    pub fn remote_code(&self) -> Option<i32> {
        match self {
            CoreError::OperationFailed { code, .. } | CoreError::Rejected { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }
}

impl From<crate::config::ConfigError> for CoreError {
    fn from(err: crate::config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}
