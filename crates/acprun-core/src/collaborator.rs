//! Collaborator interface
//!
//! A collaborator is the agent or tool logic a run invokes. The core never
//! looks inside request or result payloads; it only routes them.

use crate::error::CollaboratorError;
use crate::types::{AgentDescriptor, RunId};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Trait for implementing the logic behind an agent id
///
/// # Example
///
/// ```rust
/// use acprun_core::{AgentDescriptor, Collaborator, CollaboratorError, RunContext};
/// use async_trait::async_trait;
/// use serde_json::{Value, json};
///
/// struct Shout;
///
/// #[async_trait]
/// impl Collaborator for Shout {
///     fn descriptor(&self) -> AgentDescriptor {
///         AgentDescriptor::new("shout", "Shout", "0.1.0")
///     }
///
///     async fn invoke(&self, _ctx: RunContext, request: Value) -> Result<Value, CollaboratorError> {
///         let text = request["input"]["text"]
///             .as_str()
///             .ok_or_else(|| CollaboratorError::with_code(422, "input.text is required"))?;
///         Ok(json!({ "text": text.to_uppercase() }))
///     }
/// }
/// ```
#[async_trait]
pub trait Collaborator: Send + Sync + 'static {
    /// Descriptor served by the discovery endpoints
    fn descriptor(&self) -> AgentDescriptor;

    /// Execute one run
    ///
    /// `request` is the payload the run was created with. A returned error is
    /// stored on the run; it is never retried.
    async fn invoke(&self, ctx: RunContext, request: Value) -> Result<Value, CollaboratorError>;
}

/// Per-run context handed to a collaborator
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: RunId,
    pub agent_id: String,
    /// Triggered when the run is cancelled; long-running collaborators should
    /// check it cooperatively.
    pub cancellation: CancellationToken,
}

impl RunContext {
    pub fn new(run_id: RunId, agent_id: impl Into<String>) -> Self {
        Self {
            run_id,
            agent_id: agent_id.into(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Context whose token is derived from a caller-owned parent
    pub fn with_cancellation(
        run_id: RunId,
        agent_id: impl Into<String>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            run_id,
            agent_id: agent_id.into(),
            cancellation,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
