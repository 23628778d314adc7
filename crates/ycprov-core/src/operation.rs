//! Long-running operation model and outcome classification
//!
//! Every mutating control-plane call answers with an [`Operation`] envelope that
//! must be re-read until it reports completion. [`classify`] turns one envelope
//! into an explicit [`Outcome`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::time::Instant;

/// Status envelope of a remote long-running operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation id assigned by the remote system
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    /// False while the operation is still running
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationStatus>,
    /// Success payload, opaque to the orchestrator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

/// Structured failure carried by an operation envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<Value>,
}

impl OperationStatus {
    /// An `"error": {}` object carries no information and counts as absent.
    /// So does `{"code": 0}` with no message or details, even though the key is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code == 0 && self.message.is_empty() && self.details.is_empty()
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "status={}, message={}, details={}",
            self.code,
            self.message,
            Value::Array(self.details.clone())
        )
    }
}

impl Operation {
    /// The error object, if one is meaningfully populated
    #[must_use]
    pub fn failure(&self) -> Option<&OperationStatus> {
        self.error.as_ref().filter(|e| !e.is_empty())
    }

    /// Id of the created or modified resource, taken from `response.id`
    #[must_use]
    pub fn resource_id(&self) -> Option<&str> {
        self.response
            .as_ref()
            .and_then(|r| r.get("id"))
            .and_then(Value::as_str)
    }
}

/// Result of classifying one status envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Still in progress, poll again later
    Running,
    /// Finished without error; carries the `response` payload
    Succeeded(Value),
    /// Finished with an error, or running while already reporting one
    Failed {
        error: OperationStatus,
        /// False for the "running but already failing" case
        done: bool,
    },
}

impl Outcome {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Running)
    }
}

/// Classify an envelope into running / succeeded / failed.
///
/// An error object on a not-yet-done operation is final: the remote side never
/// clears it afterwards, so waiting for `done` would only hide the failure.
#[must_use]
pub fn classify(operation: &Operation) -> Outcome {
    match (operation.done, operation.failure()) {
        (false, None) => Outcome::Running,
        (done, Some(error)) => Outcome::Failed {
            error: error.clone(),
            done,
        },
        (true, None) => Outcome::Succeeded(
            operation
                .response
                .clone()
                .unwrap_or_else(|| Value::Object(Map::new())),
        ),
    }
}

/// One in-flight remote operation tracked by the orchestrator
#[derive(Debug, Clone)]
pub struct OperationHandle {
    operation_id: String,
    description: String,
    started_at: Instant,
}

impl OperationHandle {
    /// Create a handle the moment a start call returned an operation id
    pub fn new(operation_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            description: description.into(),
            started_at: Instant::now(),
        }
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
