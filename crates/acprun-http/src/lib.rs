//! # acprun HTTP - Agent Connect Protocol facade
//!
//! Exposes the run lifecycle of `acprun-core` over HTTP and provides a
//! client for the same endpoints.
//!
//! ## Features
//!
//! - **AcpServer**: axum router for discovery and run endpoints (requires `server` feature)
//! - **AcpClient**: reqwest client for any ACP run server (requires `client` feature)
//! - **RemoteAgent**: collaborator forwarding runs to another server (requires `client` feature)
//! - **ServerConfig**: environment-driven configuration
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | Server information |
//! | GET | `/health` | Liveness, agent ids and run count |
//! | POST | `/agents/search` | Filter agents by name, version, limit, offset |
//! | GET | `/agents/{agent_id}/descriptor` | Agent descriptor |
//! | POST | `/runs` | Create a run |
//! | GET | `/runs/{run_id}` | Run status |
//! | GET | `/runs/{run_id}/wait` | Block until terminal; 408 when the bound passes |
//! | POST | `/runs/{run_id}/cancel` | Cancel a pending run |

pub mod config;
pub mod types;

#[cfg(feature = "server")]
pub mod server;
#[cfg(feature = "server")]
pub mod shutdown;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "client")]
pub mod remote;

pub use config::{
    ConfigError, MAX_WAIT_TIMEOUT_SECS, RemoteAgentSpec, ServerConfig, ServerConfigBuilder,
};
pub use types::{
    AgentSearchResponse, AgentSummary, CreateRunRequest, HealthResponse, RunCreated, RunView,
    ServerInfo, WaitQuery,
};

#[cfg(feature = "server")]
pub use server::{AcpServer, ServerError};
#[cfg(feature = "server")]
pub use shutdown::{shutdown_signal, shutdown_with_cleanup};

#[cfg(feature = "client")]
pub use client::{AcpClient, ClientError, ClientResult};
#[cfg(feature = "client")]
pub use remote::RemoteAgent;
