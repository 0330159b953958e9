//! Integration tests for the run lifecycle
//!
//! These tests drive the processor and store together the way the HTTP
//! facade does: submit, then wait or poll.

use acprun_core::{
    AgentDescriptor, AgentRegistry, Collaborator, CollaboratorError, EchoAgent, RunContext,
    RunError, RunProcessor, RunStatus, RunStore, WaitOutcome,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// =============================================================================
// Test Collaborators
// =============================================================================

/// Rejects every request the way a validating agent would
struct ValidatingAgent;

#[async_trait]
impl Collaborator for ValidatingAgent {
    fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor::new("validating", "Validating Agent", "0.1.0")
    }

    async fn invoke(&self, _ctx: RunContext, _request: Value) -> Result<Value, CollaboratorError> {
        Err(CollaboratorError::new("bad input"))
    }
}

/// Never returns
struct HangingAgent;

#[async_trait]
impl Collaborator for HangingAgent {
    fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor::new("hanging", "Hanging Agent", "0.1.0")
    }

    async fn invoke(&self, _ctx: RunContext, _request: Value) -> Result<Value, CollaboratorError> {
        std::future::pending().await
    }
}

/// Counts invocations and sleeps for the requested number of milliseconds
struct SleepyAgent {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Collaborator for SleepyAgent {
    fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor::new("sleepy", "Sleepy Agent", "0.1.0")
    }

    async fn invoke(&self, ctx: RunContext, request: Value) -> Result<Value, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let millis = request["input"]["sleep_ms"].as_u64().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok(json!({ "run_id": ctx.run_id.as_str(), "slept_ms": millis }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn processor_with(calls: Arc<AtomicUsize>) -> RunProcessor {
    let agents = AgentRegistry::new()
        .with_agent(EchoAgent::new())
        .with_agent(ValidatingAgent)
        .with_agent(HangingAgent)
        .with_agent(SleepyAgent { calls });
    RunProcessor::new(Arc::new(RunStore::new()), Arc::new(agents))
}

fn processor() -> RunProcessor {
    processor_with(Arc::new(AtomicUsize::new(0)))
}

// =============================================================================
// Tests: Scenarios
// =============================================================================

#[tokio::test]
async fn test_echo_scenario() {
    let processor = processor();
    let run_id = processor
        .submit("echo", json!({"agent_id": "echo", "input": {"text": "hi"}}))
        .await
        .unwrap();

    let outcome = processor
        .store()
        .wait(run_id.as_str(), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"type": "result", "result": {"text": "hi"}})
    );
}

#[tokio::test]
async fn test_collaborator_failure_scenario() {
    let processor = processor();
    let run_id = processor
        .submit("validating", json!({"input": {}}))
        .await
        .unwrap();

    let outcome = processor
        .store()
        .wait(run_id.as_str(), Duration::from_secs(5))
        .await
        .unwrap();
    let wire = serde_json::to_value(&outcome).unwrap();

    assert_eq!(wire["type"], "error");
    assert_eq!(wire["message"], "bad input");

    let run = processor.store().get(run_id.as_str()).await.unwrap();
    assert_eq!(run.status(), RunStatus::Error);
}

#[tokio::test]
async fn test_tiny_timeout_scenario() {
    let processor = processor();
    let run_id = processor.submit("hanging", json!({})).await.unwrap();

    let err = processor
        .store()
        .wait(run_id.as_str(), Duration::from_millis(5))
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Timeout { .. }));

    let run = processor.store().get(run_id.as_str()).await.unwrap();
    assert_eq!(run.status(), RunStatus::Pending);
    assert_eq!(run.response(), None);
}

// =============================================================================
// Tests: Invariants
// =============================================================================

#[tokio::test]
async fn test_terminal_state_never_changes() {
    let processor = processor();
    let run_id = processor
        .submit("echo", json!({"input": "once"}))
        .await
        .unwrap();
    processor
        .store()
        .wait(run_id.as_str(), Duration::from_secs(5))
        .await
        .unwrap();

    let store = processor.store();
    assert!(store.complete(run_id.as_str(), json!("twice")).await.is_err());
    assert!(
        store
            .fail(run_id.as_str(), acprun_core::RunFailure::internal("late"))
            .await
            .is_err()
    );

    let run = store.get(run_id.as_str()).await.unwrap();
    assert_eq!(run.status(), RunStatus::Success);
    assert_eq!(run.response(), Some(json!("once")));
}

#[tokio::test]
async fn test_each_run_invokes_collaborator_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let processor = processor_with(Arc::clone(&calls));

    let mut ids = Vec::new();
    for _ in 0..10 {
        ids.push(
            processor
                .submit("sleepy", json!({"input": {"sleep_ms": 5}}))
                .await
                .unwrap(),
        );
    }
    for run_id in &ids {
        processor
            .store()
            .wait(run_id.as_str(), Duration::from_secs(5))
            .await
            .unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_runs_complete_independently() {
    let processor = processor();
    let slow = processor
        .submit("sleepy", json!({"input": {"sleep_ms": 200}}))
        .await
        .unwrap();
    let fast = processor
        .submit("sleepy", json!({"input": {"sleep_ms": 0}}))
        .await
        .unwrap();

    processor
        .store()
        .wait(fast.as_str(), Duration::from_secs(5))
        .await
        .unwrap();

    let slow_run = processor.store().get(slow.as_str()).await.unwrap();
    assert_eq!(slow_run.status(), RunStatus::Pending);
}

#[tokio::test]
async fn test_concurrent_creates_are_unique() {
    let store = Arc::new(RunStore::new());
    let mut handles = Vec::new();
    for i in 0..200 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.create("echo", json!({ "n": i })).await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }

    assert_eq!(ids.len(), 200);
    for run_id in &ids {
        assert!(store.get(run_id.as_str()).await.is_ok());
    }
}

#[tokio::test]
async fn test_many_waiters_see_same_outcome() {
    let processor = processor();
    let run_id = processor
        .submit("sleepy", json!({"input": {"sleep_ms": 30}}))
        .await
        .unwrap();

    let mut waiters = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(processor.store());
        let id = run_id.clone();
        waiters.push(tokio::spawn(async move {
            store.wait(id.as_str(), Duration::from_secs(5)).await
        }));
    }

    let mut outcomes = Vec::new();
    for waiter in waiters {
        outcomes.push(waiter.await.unwrap().unwrap());
    }
    assert!(outcomes.windows(2).all(|pair| pair[0] == pair[1]));
    assert!(matches!(outcomes[0], WaitOutcome::Result { .. }));
}
