//! Run processor
//!
//! Schedules one tokio task per run. That task is the only writer of the
//! run's terminal state: it records the collaborator's result, its failure,
//! a panic, or a cancellation, and exactly one of them.

use crate::collaborator::{Collaborator, RunContext};
use crate::error::{RunError, RunResult};
use crate::registry::AgentRegistry;
use crate::store::RunStore;
use crate::types::{RunFailure, RunId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long a cancelled collaborator may keep running before it is aborted
const CANCEL_GRACE: Duration = Duration::from_secs(5);

type InflightRuns = Arc<Mutex<HashMap<RunId, CancellationToken>>>;

/// Drives runs from `pending` to a terminal state
#[derive(Debug, Clone)]
pub struct RunProcessor {
    store: Arc<RunStore>,
    agents: Arc<AgentRegistry>,
    inflight: InflightRuns,
    /// Parent of every run token; cancelled on shutdown
    root: CancellationToken,
}

impl RunProcessor {
    pub fn new(store: Arc<RunStore>, agents: Arc<AgentRegistry>) -> Self {
        Self {
            store,
            agents,
            inflight: Arc::new(Mutex::new(HashMap::new())),
            root: CancellationToken::new(),
        }
    }

    pub fn store(&self) -> &Arc<RunStore> {
        &self.store
    }

    pub fn agents(&self) -> &Arc<AgentRegistry> {
        &self.agents
    }

    /// Create a run for `agent_id` and schedule it
    ///
    /// Returns as soon as the run is recorded; the collaborator runs in its
    /// own task. An unknown agent fails with `AgentNotFound` and stores
    /// nothing.
    pub async fn submit(&self, agent_id: &str, request: Value) -> RunResult<RunId> {
        let collaborator = self
            .agents
            .get(agent_id)
            .ok_or_else(|| RunError::agent_not_found(agent_id))?;

        // Derived before the run exists, so a concurrent shutdown cannot miss it
        let run_token = self.root.child_token();
        let run_id = self.store.create(agent_id, request.clone()).await;
        self.inflight
            .lock()
            .await
            .insert(run_id.clone(), run_token.clone());

        // The collaborator holds a child: cancelling it does not cancel the run
        let ctx = RunContext::with_cancellation(run_id.clone(), agent_id, run_token.child_token());
        tokio::spawn(drive(
            Arc::clone(&self.store),
            Arc::clone(&self.inflight),
            collaborator,
            ctx,
            run_token,
            request,
        ));

        info!(run_id = %run_id, agent_id = %agent_id, "Run scheduled");
        Ok(run_id)
    }

    /// Request cancellation of a pending run
    ///
    /// The processor task records the cancellation, so the run may still be
    /// `pending` for a moment after this returns.
    pub async fn cancel(&self, run_id: &str) -> RunResult<()> {
        let run = self.store.get(run_id).await?;
        if run.is_terminal() {
            return Err(RunError::invalid_state(run_id, run.status()));
        }

        let token = self.inflight.lock().await.get(run_id).cloned();
        match token {
            Some(token) => {
                token.cancel();
                info!(run_id = %run_id, "Run cancellation requested");
                Ok(())
            }
            None => {
                // Finished between the status check and the lookup
                let run = self.store.get(run_id).await?;
                if run.is_terminal() {
                    Err(RunError::invalid_state(run_id, run.status()))
                } else {
                    Err(RunError::internal(format!(
                        "run {run_id} has no processor attached"
                    )))
                }
            }
        }
    }

    /// Number of runs whose processor task has not finished
    pub async fn inflight_count(&self) -> usize {
        self.inflight.lock().await.len()
    }

    /// Cancel every in-flight run
    ///
    /// Runs submitted afterwards are recorded as cancelled.
    pub async fn shutdown(&self) {
        let count = self.inflight.lock().await.len();
        if count > 0 {
            warn!(count, "Cancelling in-flight runs");
        }
        self.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }
}

async fn drive(
    store: Arc<RunStore>,
    inflight: InflightRuns,
    collaborator: Arc<dyn Collaborator>,
    ctx: RunContext,
    run_token: CancellationToken,
    request: Value,
) {
    let run_id = ctx.run_id.clone();

    let written = match execute(collaborator, ctx, request, run_token).await {
        Ok(result) => store.complete(run_id.as_str(), result).await,
        Err(failure) => store.fail(run_id.as_str(), failure).await,
    };
    if let Err(e) = written {
        error!(run_id = %run_id, error = %e, "Failed to record run outcome");
    }

    inflight.lock().await.remove(&run_id);
}

/// Invoke a collaborator and normalize every way it can end
///
/// The invocation runs in a nested task so a panic surfaces as a failure
/// instead of tearing down the processor. Only `cancellation`, the run's
/// own token, ends the run as cancelled.
pub async fn execute(
    collaborator: Arc<dyn Collaborator>,
    ctx: RunContext,
    request: Value,
    cancellation: CancellationToken,
) -> Result<Value, RunFailure> {
    let run_id = ctx.run_id.clone();
    let mut invocation = tokio::spawn(async move { collaborator.invoke(ctx, request).await });

    tokio::select! {
        joined = &mut invocation => match joined {
            Ok(Ok(result)) => {
                debug!(run_id = %run_id, "Collaborator returned");
                Ok(result)
            }
            Ok(Err(e)) => {
                warn!(run_id = %run_id, code = e.code, error = %e, "Collaborator failed");
                Err(e.into())
            }
            Err(join_error) => {
                error!(run_id = %run_id, error = %join_error, "Collaborator panicked");
                Err(RunFailure::internal(format!("collaborator panicked: {join_error}")))
            }
        },
        _ = cancellation.cancelled() => {
            // Let a cooperative collaborator release its resources, then abort.
            tokio::spawn(async move {
                if tokio::time::timeout(CANCEL_GRACE, &mut invocation).await.is_err() {
                    invocation.abort();
                }
            });
            info!(run_id = %run_id, "Run cancelled");
            Err(RunFailure::cancelled())
        }
    }
}
