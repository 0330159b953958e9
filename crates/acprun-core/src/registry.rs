//! Agent registry
//!
//! Maps agent ids to collaborators. The registry is assembled before the
//! server starts and is read-only afterwards.

use crate::collaborator::Collaborator;
use crate::types::{AgentDescriptor, AgentSearchQuery};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Read-only map of agent id to collaborator
#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<dyn Collaborator>>,
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collaborator under the id from its descriptor
    ///
    /// A later registration with the same id replaces the earlier one.
    pub fn with_agent(mut self, collaborator: impl Collaborator) -> Self {
        self.register(Arc::new(collaborator));
        self
    }

    /// Register a shared collaborator
    pub fn register(&mut self, collaborator: Arc<dyn Collaborator>) {
        let id = collaborator.descriptor().id;
        debug!(agent_id = %id, "Registering agent");
        if self.agents.insert(id.clone(), collaborator).is_some() {
            warn!(agent_id = %id, "Replaced previously registered agent");
        }
    }

    pub fn get(&self, agent_id: &str) -> Option<Arc<dyn Collaborator>> {
        self.agents.get(agent_id).cloned()
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.agents.contains_key(agent_id)
    }

    pub fn descriptor(&self, agent_id: &str) -> Option<AgentDescriptor> {
        self.agents.get(agent_id).map(|agent| agent.descriptor())
    }

    /// Registered ids in sorted order
    pub fn ids(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Descriptors matching `query`, sorted by id, paginated by offset/limit
    pub fn search(&self, query: &AgentSearchQuery) -> Vec<AgentDescriptor> {
        self.agents
            .values()
            .map(|agent| agent.descriptor())
            .filter(|descriptor| query.matches(descriptor))
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect()
    }
}
