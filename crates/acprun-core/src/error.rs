//! Run Error Types
//!
//! This module defines the errors raised by the run store and processor, the
//! failure type collaborators report, and the JSON error body sent to clients.

use crate::types::{INTERNAL_ERROR_CODE, RunFailure, RunStatus};
use thiserror::Error;

/// Result type for run operations
pub type RunResult<T> = Result<T, RunError>;

/// Errors that can occur in run operations
#[derive(Debug, Error)]
pub enum RunError {
    /// Run not found
    #[error("Run not found: {run_id}")]
    NotFound { run_id: String },

    /// Agent not registered
    #[error("Agent not found: {agent_id}")]
    AgentNotFound { agent_id: String },

    /// A terminal write was attempted on a run that already left `pending`
    #[error("Invalid state for run {run_id}: already {status}")]
    InvalidState { run_id: String, status: RunStatus },

    /// Bounded wait elapsed while the run was still pending
    #[error("Run {run_id} still pending after {timeout_ms}ms")]
    Timeout { run_id: String, timeout_ms: u64 },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RunError {
    /// Create a run not found error
    pub fn not_found(run_id: impl Into<String>) -> Self {
        Self::NotFound {
            run_id: run_id.into(),
        }
    }

    /// Create an agent not found error
    pub fn agent_not_found(agent_id: impl Into<String>) -> Self {
        Self::AgentNotFound {
            agent_id: agent_id.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(run_id: impl Into<String>, status: RunStatus) -> Self {
        Self::InvalidState {
            run_id: run_id.into(),
            status,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// A timed out wait may be retried; the run is left untouched.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RunError::Timeout { .. })
    }

    /// HTTP-like status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            RunError::NotFound { .. } | RunError::AgentNotFound { .. } => 404,
            RunError::InvalidState { .. } => 409,
            RunError::Timeout { .. } => 408,
            RunError::Internal { .. } => 500,
        }
    }
}

/// Failure reported by a collaborator
///
/// Captured by the processor and stored on the run, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub code: u16,
    pub message: String,
}

impl CollaboratorError {
    /// Create a failure with the generic internal error code
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_code(INTERNAL_ERROR_CODE, message)
    }

    /// Create a failure with an explicit code
    pub fn with_code(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<CollaboratorError> for RunFailure {
    fn from(err: CollaboratorError) -> Self {
        RunFailure::new(err.code, err.message)
    }
}

/// JSON error body returned to HTTP clients
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: u16,
    /// Error message
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<RunError> for ErrorResponse {
    fn from(err: RunError) -> Self {
        ErrorResponse::new(err.status_code(), err.to_string())
    }
}
