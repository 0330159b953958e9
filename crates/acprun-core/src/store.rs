//! In-memory run store
//!
//! Every run owns a `watch` channel holding its lifecycle state. Terminal
//! writes check-and-set through `send_if_modified`, which serializes writers
//! on the channel lock, and waiters suspend on the same channel instead of
//! polling.

use crate::error::{RunError, RunResult};
use crate::types::{Run, RunFailure, RunId, RunState, WaitOutcome};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::{debug, error, info};

/// Configuration for the run store
#[derive(Debug, Clone)]
pub struct RunStoreConfig {
    /// How long a terminal run is kept after its last update (default: 1 hour)
    pub run_ttl: Duration,
    /// How often the cleanup task runs (default: 5 minutes)
    pub cleanup_interval: Duration,
}

impl Default for RunStoreConfig {
    fn default() -> Self {
        Self {
            run_ttl: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
struct StateCell {
    state: RunState,
    updated_at: DateTime<Utc>,
}

#[derive(Debug)]
struct RunSlot {
    agent_id: String,
    request: Value,
    created_at: DateTime<Utc>,
    state: watch::Sender<StateCell>,
}

impl RunSlot {
    fn snapshot(&self, run_id: &RunId) -> Run {
        let cell = self.state.borrow().clone();
        Run {
            run_id: run_id.clone(),
            agent_id: self.agent_id.clone(),
            request: self.request.clone(),
            state: cell.state,
            created_at: self.created_at,
            updated_at: cell.updated_at,
        }
    }
}

/// Concurrency-safe registry of runs
#[derive(Debug)]
pub struct RunStore {
    runs: RwLock<HashMap<RunId, Arc<RunSlot>>>,
    config: RunStoreConfig,
}

impl Default for RunStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStore {
    pub fn new() -> Self {
        Self::with_config(RunStoreConfig::default())
    }

    pub fn with_config(config: RunStoreConfig) -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RunStoreConfig {
        &self.config
    }

    /// Insert a new pending run and return its identifier
    pub async fn create(&self, agent_id: impl Into<String>, request: Value) -> RunId {
        let agent_id = agent_id.into();
        let now = Utc::now();
        let (state, _) = watch::channel(StateCell {
            state: RunState::Pending,
            updated_at: now,
        });
        let slot = Arc::new(RunSlot {
            agent_id,
            request,
            created_at: now,
            state,
        });

        let mut runs = self.runs.write().await;
        let mut run_id = RunId::generate();
        while runs.contains_key(&run_id) {
            run_id = RunId::generate();
        }
        debug!(run_id = %run_id, agent_id = %slot.agent_id, "Run created");
        runs.insert(run_id.clone(), slot);
        run_id
    }

    async fn slot(&self, run_id: &str) -> RunResult<(RunId, Arc<RunSlot>)> {
        let runs = self.runs.read().await;
        runs.get_key_value(run_id)
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .ok_or_else(|| RunError::not_found(run_id))
    }

    /// Snapshot of the current record
    pub async fn get(&self, run_id: &str) -> RunResult<Run> {
        let (id, slot) = self.slot(run_id).await?;
        Ok(slot.snapshot(&id))
    }

    /// Transition `pending -> success`
    pub async fn complete(&self, run_id: &str, response: Value) -> RunResult<()> {
        self.finish(run_id, RunState::Success(response)).await
    }

    /// Transition `pending -> error`
    pub async fn fail(&self, run_id: &str, failure: RunFailure) -> RunResult<()> {
        self.finish(run_id, RunState::Error(failure)).await
    }

    async fn finish(&self, run_id: &str, next: RunState) -> RunResult<()> {
        let (_, slot) = self.slot(run_id).await?;
        let next_status = next.status();

        let mut existing = None;
        let written = slot.state.send_if_modified(|cell| {
            if cell.state.is_terminal() {
                existing = Some(cell.state.status());
                return false;
            }
            cell.state = next;
            cell.updated_at = Utc::now();
            true
        });

        match existing {
            Some(status) if !written => {
                error!(
                    run_id = %run_id,
                    current = %status,
                    attempted = %next_status,
                    "Rejected second terminal write"
                );
                Err(RunError::invalid_state(run_id, status))
            }
            _ => {
                debug!(run_id = %run_id, status = %next_status, "Run finished");
                Ok(())
            }
        }
    }

    /// Wait until the run leaves `pending`, bounded by `timeout`
    ///
    /// On timeout the run is left untouched and `RunError::Timeout` is
    /// returned; callers may wait again.
    pub async fn wait(&self, run_id: &str, timeout: Duration) -> RunResult<WaitOutcome> {
        let (_, slot) = self.slot(run_id).await?;
        let mut rx = slot.state.subscribe();

        match tokio::time::timeout(timeout, rx.wait_for(|cell| cell.state.is_terminal())).await {
            Ok(Ok(cell)) => WaitOutcome::from_state(&cell.state)
                .ok_or_else(|| RunError::internal("terminal run without outcome")),
            Ok(Err(_)) => Err(RunError::internal("run state channel closed")),
            Err(_) => {
                debug!(run_id = %run_id, timeout_ms = timeout.as_millis() as u64, "Wait timed out");
                Err(RunError::Timeout {
                    run_id: run_id.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Number of runs currently held
    pub async fn len(&self) -> usize {
        self.runs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.runs.read().await.is_empty()
    }

    /// Evict terminal runs older than the configured TTL
    ///
    /// Pending runs are never evicted.
    pub async fn cleanup_expired(&self) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(self.config.run_ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };
        let mut runs = self.runs.write().await;
        let before = runs.len();

        runs.retain(|run_id, slot| {
            let cell = slot.state.borrow();
            let expired = cell.state.is_terminal() && cell.updated_at < cutoff;
            if expired {
                debug!(run_id = %run_id, "Cleaned up expired run");
            }
            !expired
        });

        let count = before - runs.len();
        if count > 0 {
            info!(count, "Cleaned up expired runs");
        }
        count
    }

    /// Start a background task that periodically evicts expired runs
    ///
    /// Returns a handle that can be used to abort the cleanup task.
    pub fn start_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        let period = store.config.cleanup_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                store.cleanup_expired().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RunStatus;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_starts_pending() {
        let store = RunStore::new();
        let run_id = store.create("echo", json!({"input": {"text": "hi"}})).await;

        let run = store.get(run_id.as_str()).await.unwrap();
        assert_eq!(run.status(), RunStatus::Pending);
        assert_eq!(run.response(), None);
        assert_eq!(run.agent_id, "echo");
        assert_eq!(run.request, json!({"input": {"text": "hi"}}));
    }

    #[tokio::test]
    async fn test_complete_then_get() {
        let store = RunStore::new();
        let run_id = store.create("echo", json!({})).await;

        store
            .complete(run_id.as_str(), json!({"text": "hi"}))
            .await
            .unwrap();

        let run = store.get(run_id.as_str()).await.unwrap();
        assert_eq!(run.status(), RunStatus::Success);
        assert_eq!(run.response(), Some(json!({"text": "hi"})));
        assert!(run.updated_at >= run.created_at);
    }

    #[tokio::test]
    async fn test_second_terminal_write_is_invalid() {
        let store = RunStore::new();
        let run_id = store.create("echo", json!({})).await;

        store.complete(run_id.as_str(), json!(1)).await.unwrap();
        let err = store.complete(run_id.as_str(), json!(2)).await.unwrap_err();
        assert!(matches!(
            err,
            RunError::InvalidState {
                status: RunStatus::Success,
                ..
            }
        ));

        let err = store
            .fail(run_id.as_str(), RunFailure::internal("late"))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::InvalidState { .. }));

        // First write wins
        let run = store.get(run_id.as_str()).await.unwrap();
        assert_eq!(run.response(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_fail_twice_is_invalid() {
        let store = RunStore::new();
        let run_id = store.create("echo", json!({})).await;

        store
            .fail(run_id.as_str(), RunFailure::internal("first"))
            .await
            .unwrap();
        let err = store
            .fail(run_id.as_str(), RunFailure::internal("second"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RunError::InvalidState {
                status: RunStatus::Error,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unknown_run_not_found() {
        let store = RunStore::new();

        assert!(matches!(
            store.get("missing").await,
            Err(RunError::NotFound { .. })
        ));
        assert!(matches!(
            store.complete("missing", json!({})).await,
            Err(RunError::NotFound { .. })
        ));
        assert!(matches!(
            store.wait("missing", Duration::from_millis(1)).await,
            Err(RunError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_wait_observes_completion() {
        let store = Arc::new(RunStore::new());
        let run_id = store.create("echo", json!({})).await;

        let writer = Arc::clone(&store);
        let id = run_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.complete(id.as_str(), json!("done")).await.unwrap();
        });

        let outcome = store
            .wait(run_id.as_str(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WaitOutcome::Result {
                result: json!("done")
            }
        );
    }

    #[tokio::test]
    async fn test_wait_on_terminal_run_returns_immediately() {
        let store = RunStore::new();
        let run_id = store.create("echo", json!({})).await;
        store
            .fail(run_id.as_str(), RunFailure::new(422, "bad input"))
            .await
            .unwrap();

        let outcome = store.wait(run_id.as_str(), Duration::ZERO).await.unwrap();
        assert_eq!(
            outcome,
            WaitOutcome::Error {
                error: 422,
                message: "bad input".into()
            }
        );
    }

    #[tokio::test]
    async fn test_wait_timeout_leaves_run_pending() {
        let store = RunStore::new();
        let run_id = store.create("slow", json!({})).await;

        let err = store
            .wait(run_id.as_str(), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Timeout { .. }));

        let run = store.get(run_id.as_str()).await.unwrap();
        assert_eq!(run.status(), RunStatus::Pending);

        // Still completable after a timed out wait
        store.complete(run_id.as_str(), json!(true)).await.unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_only_evicts_expired_terminal_runs() {
        let store = RunStore::with_config(RunStoreConfig {
            run_ttl: Duration::ZERO,
            cleanup_interval: Duration::from_secs(60),
        });
        let pending = store.create("echo", json!({})).await;
        let done = store.create("echo", json!({})).await;
        store.complete(done.as_str(), json!({})).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let removed = store.cleanup_expired().await;

        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get(pending.as_str()).await.is_ok());
        assert!(matches!(
            store.get(done.as_str()).await,
            Err(RunError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_runs() {
        let store = RunStore::new();
        let run_id = store.create("echo", json!({})).await;
        store.complete(run_id.as_str(), json!({})).await.unwrap();

        assert_eq!(store.cleanup_expired().await, 0);
        assert!(!store.is_empty().await);
    }
}
