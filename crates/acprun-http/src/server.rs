//! ACP run server
//!
//! Exposes a [`RunProcessor`] over the Agent Connect Protocol run endpoints.
//!
//! # Example
//!
//! ```rust,no_run
//! use acprun_core::{AgentRegistry, EchoAgent};
//! use acprun_http::AcpServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let agents = AgentRegistry::new().with_agent(EchoAgent::new());
//!     let server = AcpServer::new(agents);
//!     server.serve().await.unwrap();
//! }
//! ```

use crate::config::ServerConfig;
use crate::shutdown::{shutdown_signal, shutdown_with_cleanup};
use crate::types::{
    AgentSearchResponse, AgentSummary, CreateRunRequest, HealthResponse, RunCreated, RunView,
    ServerInfo, WaitQuery,
};
use acprun_core::{
    AgentDescriptor, AgentRegistry, AgentSearchQuery, ErrorResponse, RunError, RunProcessor,
    RunStatus, RunStore, WaitOutcome,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Errors raised while starting or running the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared state for the route handlers
#[derive(Clone)]
struct AppState {
    processor: RunProcessor,
    wait_timeout: Duration,
}

/// HTTP server for ACP runs
pub struct AcpServer {
    processor: RunProcessor,
    config: ServerConfig,
}

impl AcpServer {
    /// Create a server with the default configuration
    pub fn new(agents: AgentRegistry) -> Self {
        Self::with_config(agents, ServerConfig::default())
    }

    /// Create a server with a custom configuration
    pub fn with_config(agents: AgentRegistry, config: ServerConfig) -> Self {
        let store = Arc::new(RunStore::with_config(config.store.clone()));
        Self {
            processor: RunProcessor::new(store, Arc::new(agents)),
            config,
        }
    }

    pub fn processor(&self) -> &RunProcessor {
        &self.processor
    }

    pub fn store(&self) -> &Arc<RunStore> {
        self.processor.store()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router for this server
    pub fn router(&self) -> Router {
        let state = AppState {
            processor: self.processor.clone(),
            wait_timeout: self.config.wait_timeout,
        };

        let routes = Router::new()
            .route("/", get(server_info))
            .route("/health", get(health))
            // Agent discovery
            .route("/agents/search", post(search_agents))
            .route("/agents/{agent_id}/descriptor", get(get_descriptor))
            // Run lifecycle
            .route("/runs", post(create_run))
            .route("/runs/{run_id}", get(get_run))
            .route("/runs/{run_id}/wait", get(wait_run))
            .route("/runs/{run_id}/cancel", post(cancel_run))
            .with_state(state);

        let mut router = if self.config.api_prefix.is_empty() {
            routes
        } else {
            Router::new().nest(&self.config.api_prefix, routes)
        };

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// Serve on the configured address until SIGINT or SIGTERM
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        self.serve_with_shutdown(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `signal` completes
    ///
    /// Expired runs are swept in the background while serving. On shutdown
    /// every in-flight run is cancelled before connections drain.
    pub async fn serve_with_shutdown<S>(
        self,
        listener: TcpListener,
        signal: S,
    ) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        info!(
            address = %local_addr,
            agents = ?self.processor.agents().ids(),
            prefix = %self.config.api_prefix,
            "ACP run server starting"
        );

        let cleanup = self.store().start_cleanup_task();
        let router = self.router();
        let processor = self.processor.clone();

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_with_cleanup(signal, move || async move {
                processor.shutdown().await;
            }))
            .await;

        cleanup.abort();
        info!("ACP run server stopped");
        result.map_err(ServerError::from)
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET / - Server information
async fn server_info() -> Json<ServerInfo> {
    Json(ServerInfo {
        name: "acprun".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Agent Connect Protocol run server".to_string(),
    })
}

/// GET /health - Liveness and inventory
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        agents: state.processor.agents().ids(),
        runs: state.processor.store().len().await,
    })
}

/// POST /agents/search - Filter the registered agents
async fn search_agents(
    State(state): State<AppState>,
    Json(query): Json<AgentSearchQuery>,
) -> Json<AgentSearchResponse> {
    debug!(query = ?query, "Searching agents");

    let agents = state
        .processor
        .agents()
        .search(&query)
        .into_iter()
        .map(AgentSummary::from)
        .collect();

    Json(AgentSearchResponse { agents })
}

/// GET /agents/{agent_id}/descriptor - Full agent descriptor
async fn get_descriptor(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<AgentDescriptor>, ApiError> {
    state
        .processor
        .agents()
        .descriptor(&agent_id)
        .map(Json)
        .ok_or_else(|| RunError::agent_not_found(&agent_id).into())
}

/// POST /runs - Create a run and schedule it
async fn create_run(
    State(state): State<AppState>,
    Json(request): Json<CreateRunRequest>,
) -> Result<Json<RunCreated>, ApiError> {
    let agent_id = request.agent_id.clone();
    let payload = serde_json::to_value(&request)
        .map_err(|e| RunError::internal(format!("Failed to encode run request: {e}")))?;

    let run_id = state.processor.submit(&agent_id, payload).await?;
    info!(run_id = %run_id, agent_id = %agent_id, "Run created");

    Ok(Json(RunCreated {
        id: run_id,
        agent_id,
        status: RunStatus::Pending,
    }))
}

/// GET /runs/{run_id} - Current run status
async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunView>, ApiError> {
    debug!(run_id = %run_id, "Getting run");

    let run = state.processor.store().get(&run_id).await?;
    Ok(Json(RunView::from(run)))
}

/// GET /runs/{run_id}/wait - Block until the run is terminal or the bound passes
async fn wait_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(query): Query<WaitQuery>,
) -> Result<Json<WaitOutcome>, ApiError> {
    let bound = query.timeout_secs.map_or(state.wait_timeout, |secs| {
        Duration::from_secs(secs).min(state.wait_timeout)
    });
    debug!(run_id = %run_id, bound_ms = bound.as_millis() as u64, "Waiting for run");

    let outcome = state.processor.store().wait(&run_id, bound).await?;
    Ok(Json(outcome))
}

/// POST /runs/{run_id}/cancel - Request cancellation of a pending run
async fn cancel_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<(StatusCode, Json<RunView>), ApiError> {
    state.processor.cancel(&run_id).await?;
    info!(run_id = %run_id, "Run cancellation requested");

    let run = state.processor.store().get(&run_id).await?;
    Ok((StatusCode::ACCEPTED, Json(RunView::from(run))))
}

// =============================================================================
// Error Response
// =============================================================================

/// Wrapper to implement IntoResponse for RunError
#[derive(Debug)]
struct ApiError(RunError);

impl From<RunError> for ApiError {
    fn from(err: RunError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response: ErrorResponse = self.0.into();
        let status = match error_response.code {
            404 => StatusCode::NOT_FOUND,
            408 => StatusCode::REQUEST_TIMEOUT,
            409 => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(error_response)).into_response()
    }
}
