//! Request and response bodies of the ACP run endpoints
//!
//! Shared by the server handlers and the client.

use acprun_core::{AgentDescriptor, AgentMetadata, Run, RunId, RunStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /runs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRunRequest {
    pub agent_id: String,

    #[serde(default)]
    pub input: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl CreateRunRequest {
    pub fn new(agent_id: impl Into<String>, input: Value) -> Self {
        Self {
            agent_id: agent_id.into(),
            input,
            config: None,
            metadata: None,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }
}

/// Response of `POST /runs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunCreated {
    pub id: RunId,
    pub agent_id: String,
    pub status: RunStatus,
}

/// Response of `GET /runs/{run_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunView {
    pub id: RunId,
    pub agent_id: String,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Run> for RunView {
    fn from(run: Run) -> Self {
        Self {
            status: run.status(),
            id: run.run_id,
            agent_id: run.agent_id,
            created_at: run.created_at,
            updated_at: run.updated_at,
        }
    }
}

/// Query parameters of `GET /runs/{run_id}/wait`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaitQuery {
    /// Requested wait bound, clamped to the server maximum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// One entry of an agent search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: String,
    pub metadata: AgentMetadata,
}

impl From<AgentDescriptor> for AgentSummary {
    fn from(descriptor: AgentDescriptor) -> Self {
        Self {
            id: descriptor.id,
            metadata: descriptor.metadata,
        }
    }
}

/// Response of `POST /agents/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSearchResponse {
    pub agents: Vec<AgentSummary>,
}

/// Response of `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub agents: Vec<String>,
    pub runs: usize,
}
