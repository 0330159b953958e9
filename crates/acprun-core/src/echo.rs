//! Built-in echo collaborator

use crate::collaborator::{Collaborator, RunContext};
use crate::error::CollaboratorError;
use crate::types::AgentDescriptor;
use async_trait::async_trait;
use serde_json::Value;

/// Agent that returns the `input` field of its run request unchanged
#[derive(Debug, Clone)]
pub struct EchoAgent {
    id: String,
}

impl Default for EchoAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl EchoAgent {
    pub fn new() -> Self {
        Self::with_id("echo")
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Collaborator for EchoAgent {
    fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor::new(&self.id, "Echo Agent", env!("CARGO_PKG_VERSION"))
            .with_description("Returns the run input unchanged")
    }

    async fn invoke(&self, _ctx: RunContext, request: Value) -> Result<Value, CollaboratorError> {
        match request.get("input") {
            Some(input) => Ok(input.clone()),
            None => Err(CollaboratorError::with_code(422, "missing field: input")),
        }
    }
}
