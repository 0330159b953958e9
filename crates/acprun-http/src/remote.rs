//! Remote agent collaborator
//!
//! Forwards each run to an agent hosted on another ACP server and reports
//! that run's outcome as its own.

use crate::client::{AcpClient, ClientError, ClientResult};
use acprun_core::{
    AgentDescriptor, CANCELLED_CODE, Collaborator, CollaboratorError, RunContext, WaitOutcome,
};
use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Upper bound on how long a forwarded run is awaited
const DEFAULT_WAIT_BUDGET: Duration = Duration::from_secs(600);

/// Collaborator backed by an agent on a remote ACP server
#[derive(Debug, Clone)]
pub struct RemoteAgent {
    descriptor: AgentDescriptor,
    remote_id: String,
    client: AcpClient,
    wait_budget: Duration,
}

impl RemoteAgent {
    /// Wrap a remote agent whose descriptor is already known
    ///
    /// The descriptor's id is the id registered locally and forwarded as is.
    pub fn new(client: AcpClient, descriptor: AgentDescriptor) -> Self {
        Self {
            remote_id: descriptor.id.clone(),
            descriptor,
            client,
            wait_budget: DEFAULT_WAIT_BUDGET,
        }
    }

    /// Fetch the descriptor of `agent_id` from the server at `base_url`
    pub async fn connect(agent_id: &str, base_url: &str) -> ClientResult<Self> {
        let client = AcpClient::new(base_url)?;
        let descriptor = client.get_descriptor(agent_id).await?.with_url(base_url);
        Ok(Self::new(client, descriptor))
    }

    #[must_use]
    pub fn with_wait_budget(mut self, budget: Duration) -> Self {
        self.wait_budget = budget;
        self
    }

    pub fn client(&self) -> &AcpClient {
        &self.client
    }
}

#[async_trait]
impl Collaborator for RemoteAgent {
    fn descriptor(&self) -> AgentDescriptor {
        self.descriptor.clone()
    }

    async fn invoke(&self, ctx: RunContext, request: Value) -> Result<Value, CollaboratorError> {
        let input = request.get("input").cloned().unwrap_or(Value::Null);
        let config = request.get("config").cloned().filter(|c| !c.is_null());

        let created = self
            .client
            .create_run(&self.remote_id, input, config)
            .await
            .map_err(remote_failure)?;
        let remote_run = created.id.as_str();
        debug!(run_id = %ctx.run_id, remote_run_id = %remote_run, "Forwarded run to remote agent");

        let start = Instant::now();
        loop {
            tokio::select! {
                _ = ctx.cancellation.cancelled() => {
                    if let Err(e) = self.client.cancel_run(remote_run).await {
                        warn!(remote_run_id = %remote_run, error = %e, "Failed to cancel remote run");
                    }
                    return Err(CollaboratorError::with_code(CANCELLED_CODE, "Run cancelled"));
                }
                waited = self.client.wait_run(remote_run, None) => match waited {
                    Ok(WaitOutcome::Result { result }) => return Ok(result),
                    Ok(WaitOutcome::Error { error, message }) => {
                        return Err(CollaboratorError::with_code(error, message));
                    }
                    Err(ClientError::Timeout { .. }) if start.elapsed() < self.wait_budget => {}
                    Err(ClientError::Timeout { .. }) => {
                        return Err(CollaboratorError::with_code(
                            504,
                            format!(
                                "Remote run {remote_run} did not finish within {}s",
                                self.wait_budget.as_secs()
                            ),
                        ));
                    }
                    Err(e) => return Err(remote_failure(e)),
                },
            }
        }
    }
}

/// Map a client failure onto the code stored with the local run
fn remote_failure(err: ClientError) -> CollaboratorError {
    match err {
        ClientError::Status { status, message } => CollaboratorError::with_code(status, message),
        ClientError::Timeout { run_id } => {
            CollaboratorError::with_code(504, format!("Remote run {run_id} is still pending"))
        }
        other => CollaboratorError::with_code(502, format!("Remote agent unreachable: {other}")),
    }
}
