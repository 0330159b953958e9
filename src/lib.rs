//! # acprun
//!
//! Asynchronous run lifecycle behind Agent Connect Protocol endpoints.
//!
//! This crate re-exports the workspace members:
//!
//! - [`core`]: run store, processor, collaborator interface
//! - [`http`]: axum server, reqwest client, remote agent collaborator

pub use acprun_core as core;
pub use acprun_http as http;

pub use acprun_core::{
    AgentDescriptor, AgentRegistry, Collaborator, CollaboratorError, EchoAgent, Run, RunContext,
    RunError, RunId, RunProcessor, RunResult, RunStatus, RunStore, WaitOutcome,
};
pub use acprun_http::{AcpClient, AcpServer, RemoteAgent, ServerConfig, ServerConfigBuilder};
