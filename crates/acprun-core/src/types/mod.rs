//! Core Types
//!
//! ## Module Structure
//!
//! - [`run`] - Run identifiers, lifecycle state and wait outcomes
//! - [`agent`] - Agent descriptors and search queries

mod agent;
mod run;

pub use agent::{
    AgentCapabilities, AgentDescriptor, AgentMetadata, AgentRef, AgentSearchQuery, AgentSpecs,
};
pub use run::{
    CANCELLED_CODE, INTERNAL_ERROR_CODE, Run, RunFailure, RunId, RunState, RunStatus, WaitOutcome,
};
