//! Run types: identifiers, lifecycle state and wait outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use uuid::Uuid;

/// Error code recorded when a collaborator fails without a more specific code
pub const INTERNAL_ERROR_CODE: u16 = 500;

/// Error code recorded when a run is cancelled before it finishes
pub const CANCELLED_CODE: u16 = 499;

/// Opaque, process-unique identifier of a run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Generate a fresh identifier backed by a random UUID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RunId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RunId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Externally visible status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// The collaborator has not reported an outcome yet
    Pending,

    /// The collaborator returned a result
    Success,

    /// The collaborator failed, panicked or the run was cancelled
    Error,
}

impl RunStatus {
    /// Terminal statuses never change again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Pending)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Success => write!(f, "success"),
            RunStatus::Error => write!(f, "error"),
        }
    }
}

/// Normalized error payload stored on a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    /// Numeric error code, HTTP-like
    pub code: u16,
    /// Human-readable message
    pub message: String,
}

impl RunFailure {
    /// Create a failure with an explicit code
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a failure with the generic internal error code
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR_CODE, message)
    }

    /// Failure recorded for a cancelled run
    pub fn cancelled() -> Self {
        Self::new(CANCELLED_CODE, "Run cancelled")
    }
}

/// Lifecycle state of a run.
///
/// A response exists exactly when the state is terminal, so a pending run
/// cannot carry one.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Pending,
    Success(Value),
    Error(RunFailure),
}

impl RunState {
    pub fn status(&self) -> RunStatus {
        match self {
            RunState::Pending => RunStatus::Pending,
            RunState::Success(_) => RunStatus::Success,
            RunState::Error(_) => RunStatus::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// The stored response payload, `None` while pending
    pub fn response(&self) -> Option<Value> {
        match self {
            RunState::Pending => None,
            RunState::Success(value) => Some(value.clone()),
            RunState::Error(failure) => Some(serde_json::json!({
                "code": failure.code,
                "message": failure.message,
            })),
        }
    }
}

/// Snapshot of a run record
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub run_id: RunId,
    pub agent_id: String,
    /// The create-run payload, passed through untouched
    pub request: Value,
    pub state: RunState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Run {
    pub fn status(&self) -> RunStatus {
        self.state.status()
    }

    pub fn response(&self) -> Option<Value> {
        self.state.response()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// What a waiting caller observes once a run leaves `pending`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WaitOutcome {
    /// The run succeeded
    Result { result: Value },

    /// The run failed; `error` carries the failure code
    Error { error: u16, message: String },
}

impl WaitOutcome {
    /// Build the outcome for a terminal state, `None` while pending
    pub fn from_state(state: &RunState) -> Option<Self> {
        match state {
            RunState::Pending => None,
            RunState::Success(result) => Some(WaitOutcome::Result {
                result: result.clone(),
            }),
            RunState::Error(failure) => Some(WaitOutcome::Error {
                error: failure.code,
                message: failure.message.clone(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, WaitOutcome::Error { .. })
    }
}
