//! Agent descriptor types served by the discovery endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Descriptor document describing an agent's identity and schemas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Identifier used in `agent_id` fields of run requests
    pub id: String,

    pub metadata: AgentMetadata,

    #[serde(default)]
    pub specs: AgentSpecs,
}

impl AgentDescriptor {
    /// Create a descriptor with required fields
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: AgentMetadata {
                reference: AgentRef {
                    name: name.into(),
                    version: version.into(),
                    url: None,
                },
                description: None,
            },
            specs: AgentSpecs::default(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    /// Set the URL the agent is reachable at
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.metadata.reference.url = Some(url.into());
        self
    }

    /// Set the JSON schema of the run input
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.specs.input = schema;
        self
    }

    /// Set the JSON schema of the run output
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.specs.output = schema;
        self
    }

    /// Set the JSON schema of the run config
    pub fn with_config_schema(mut self, schema: Value) -> Self {
        self.specs.config = schema;
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.reference.name
    }

    pub fn version(&self) -> &str {
        &self.metadata.reference.version
    }
}

/// Descriptor metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    #[serde(rename = "ref")]
    pub reference: AgentRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Name and version reference of an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRef {
    pub name: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Input, output and config schemas plus capability flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpecs {
    #[serde(default)]
    pub capabilities: AgentCapabilities,

    #[serde(default = "any_object_schema")]
    pub input: Value,

    #[serde(default = "any_object_schema")]
    pub output: Value,

    #[serde(default = "any_object_schema")]
    pub config: Value,
}

impl Default for AgentSpecs {
    fn default() -> Self {
        Self {
            capabilities: AgentCapabilities::default(),
            input: any_object_schema(),
            output: any_object_schema(),
            config: any_object_schema(),
        }
    }
}

fn any_object_schema() -> Value {
    serde_json::json!({ "type": "object" })
}

/// Capability flags advertised in the descriptor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentCapabilities {
    #[serde(default)]
    pub threads: bool,
    #[serde(default)]
    pub interrupts: bool,
    #[serde(default)]
    pub callbacks: bool,
    #[serde(default)]
    pub streaming: bool,
}

/// Filter for agent search
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentSearchQuery {
    /// Case-insensitive substring of the agent name or id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Exact version match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl AgentSearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check whether a descriptor satisfies the name and version filters
    pub fn matches(&self, descriptor: &AgentDescriptor) -> bool {
        let name_ok = self.name.as_deref().is_none_or(|needle| {
            let needle = needle.to_lowercase();
            descriptor.name().to_lowercase().contains(&needle)
                || descriptor.id.to_lowercase().contains(&needle)
        });
        let version_ok = self
            .version
            .as_deref()
            .is_none_or(|version| descriptor.version() == version);
        name_ok && version_ok
    }
}
