//! # acprun core - asynchronous run lifecycle
//!
//! This crate holds the state machine behind the Agent Connect Protocol run
//! endpoints: a store of runs, the processor that executes them, and the
//! collaborator interface agent logic plugs into.
//!
//! ## Features
//!
//! - **RunStore**: concurrency-safe registry of runs with bounded waits
//! - **RunProcessor**: one task per run, exactly one terminal write
//! - **Collaborator**: trait implemented by agent or tool logic
//! - **AgentRegistry**: id to collaborator lookup and descriptor search
//!
//! ## Lifecycle
//!
//! A run starts `pending` and moves once to `success` or `error`. Waiting
//! on a run suspends until that transition or until a timeout, which leaves
//! the run untouched.
//!
//! ## Example
//!
//! ```rust
//! use acprun_core::{AgentRegistry, EchoAgent, RunProcessor, RunStore, WaitOutcome};
//! use serde_json::json;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let agents = Arc::new(AgentRegistry::new().with_agent(EchoAgent::new()));
//! let processor = RunProcessor::new(Arc::new(RunStore::new()), agents);
//!
//! let run_id = processor
//!     .submit("echo", json!({"agent_id": "echo", "input": {"text": "hi"}}))
//!     .await
//!     .unwrap();
//!
//! let outcome = processor
//!     .store()
//!     .wait(run_id.as_str(), Duration::from_secs(5))
//!     .await
//!     .unwrap();
//! assert_eq!(outcome, WaitOutcome::Result { result: json!({"text": "hi"}) });
//! # }
//! ```

pub mod collaborator;
pub mod echo;
pub mod error;
pub mod processor;
pub mod registry;
pub mod store;
pub mod types;

pub use collaborator::{Collaborator, RunContext};
pub use echo::EchoAgent;
pub use error::{CollaboratorError, ErrorResponse, RunError, RunResult};
pub use processor::RunProcessor;
pub use registry::AgentRegistry;
pub use store::{RunStore, RunStoreConfig};
pub use types::{
    AgentCapabilities, AgentDescriptor, AgentMetadata, AgentRef, AgentSearchQuery, AgentSpecs,
    CANCELLED_CODE, INTERNAL_ERROR_CODE, Run, RunFailure, RunId, RunState, RunStatus, WaitOutcome,
};
