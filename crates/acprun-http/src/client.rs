//! ACP Run Client
//!
//! HTTP client for servers speaking the Agent Connect Protocol run
//! endpoints, including [`AcpServer`](crate::AcpServer) itself.
//!
//! # Timeouts
//!
//! | Operation | Default Timeout | Notes |
//! |-----------|-----------------|-------|
//! | Regular requests | 30 seconds | Search, descriptor, create, get, cancel |
//! | Wait requests | 5 minutes | The server holds the request open up to its own bound |
//!
//! A wait that the server ends with 408 surfaces as [`ClientError::Timeout`];
//! the run is still pending and the wait may be repeated.
//!
//! # Example
//!
//! ```rust,no_run
//! use acprun_http::AcpClient;
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AcpClient::new("http://localhost:8000")?;
//!
//!     let outcome = client
//!         .run_and_wait("echo", json!({"text": "hi"}), None, Duration::from_secs(60))
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&outcome)?);
//!
//!     Ok(())
//! }
//! ```

use crate::types::{
    AgentSearchResponse, AgentSummary, CreateRunRequest, RunCreated, RunView, WaitQuery,
};
use acprun_core::{AgentDescriptor, AgentSearchQuery, ErrorResponse, WaitOutcome};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Default timeout for HTTP requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for long-poll wait requests
const WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by [`AcpClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Run {run_id} is still pending")]
    Timeout { run_id: String },
}

impl ClientError {
    /// Whether the server reported the resource as unknown
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status: 404, .. })
    }

    /// Timeouts and transport failures may succeed when repeated
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Timeout { .. } => true,
            ClientError::Http(e) => e.is_timeout() || e.is_connect(),
            ClientError::Status { status, .. } => matches!(status, 502..=504),
            ClientError::Url(_) => false,
        }
    }
}

/// Client for an ACP run server
#[derive(Clone)]
pub struct AcpClient {
    /// Base URL, always ending in `/`
    base_url: Url,
    http: Client,
}

impl std::fmt::Debug for AcpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcpClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl AcpClient {
    /// Create a client for the server at `base_url`
    ///
    /// The URL may carry a path prefix such as `http://host/api/v1`.
    pub fn new(base_url: impl AsRef<str>) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(format!("acprun/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Self::with_http_client(base_url, http)
    }

    /// Create a client with a custom HTTP client
    pub fn with_http_client(base_url: impl AsRef<str>, http: Client) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a URL for an endpoint relative to the base URL
    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // =========================================================================
    // Agent Discovery
    // =========================================================================

    /// Search the agents offered by the server
    pub async fn search_agents(&self, query: &AgentSearchQuery) -> ClientResult<Vec<AgentSummary>> {
        let url = self.endpoint("agents/search")?;
        debug!(url = %url, "Searching agents");

        let response = self.http.post(url).json(query).send().await?;
        let body: AgentSearchResponse = Self::parse(response).await?;

        Ok(body.agents)
    }

    /// Fetch the full descriptor of one agent
    pub async fn get_descriptor(&self, agent_id: &str) -> ClientResult<AgentDescriptor> {
        let url = self.endpoint(&format!("agents/{agent_id}/descriptor"))?;
        debug!(agent_id = %agent_id, "Fetching agent descriptor");

        let response = self.http.get(url).send().await?;
        Self::parse(response).await
    }

    // =========================================================================
    // Runs
    // =========================================================================

    /// Create a run; the server answers before the run finishes
    pub async fn create_run(
        &self,
        agent_id: &str,
        input: Value,
        config: Option<Value>,
    ) -> ClientResult<RunCreated> {
        let mut request = CreateRunRequest::new(agent_id, input);
        request.config = config;
        self.create_run_with(&request).await
    }

    /// Create a run from a complete request body
    pub async fn create_run_with(&self, request: &CreateRunRequest) -> ClientResult<RunCreated> {
        let url = self.endpoint("runs")?;

        let response = self.http.post(url).json(request).send().await?;
        let created: RunCreated = Self::parse(response).await?;

        info!(run_id = %created.id, agent_id = %created.agent_id, "Run created");
        Ok(created)
    }

    /// Fetch the current status of a run
    pub async fn get_run(&self, run_id: &str) -> ClientResult<RunView> {
        let url = self.endpoint(&format!("runs/{run_id}"))?;

        let response = self.http.get(url).send().await?;
        Self::parse(response).await
    }

    /// Wait once for a run to finish
    ///
    /// `timeout_secs` asks the server for a shorter bound than its default.
    /// Returns `ClientError::Timeout` when the bound passes first.
    pub async fn wait_run(&self, run_id: &str, timeout_secs: Option<u64>) -> ClientResult<WaitOutcome> {
        let url = self.endpoint(&format!("runs/{run_id}/wait"))?;
        debug!(run_id = %run_id, "Waiting for run");

        let response = self
            .http
            .get(url)
            .query(&WaitQuery { timeout_secs })
            .timeout(WAIT_TIMEOUT)
            .send()
            .await?;

        if response.status() == StatusCode::REQUEST_TIMEOUT {
            return Err(ClientError::Timeout {
                run_id: run_id.to_string(),
            });
        }

        Self::parse(response).await
    }

    /// Ask the server to cancel a pending run
    pub async fn cancel_run(&self, run_id: &str) -> ClientResult<RunView> {
        let url = self.endpoint(&format!("runs/{run_id}/cancel"))?;

        let response = self.http.post(url).send().await?;
        let run: RunView = Self::parse(response).await?;

        info!(run_id = %run_id, "Run cancellation requested");
        Ok(run)
    }

    /// Create a run and keep waiting until it finishes or `deadline` passes
    pub async fn run_and_wait(
        &self,
        agent_id: &str,
        input: Value,
        config: Option<Value>,
        deadline: Duration,
    ) -> ClientResult<WaitOutcome> {
        let created = self.create_run(agent_id, input, config).await?;
        let run_id = created.id.as_str();
        let start = Instant::now();

        loop {
            match self.wait_run(run_id, None).await {
                Err(ClientError::Timeout { .. }) if start.elapsed() < deadline => {
                    debug!(run_id = %run_id, "Run still pending, waiting again");
                }
                other => return other,
            }
        }
    }

    /// Decode a success body or turn the response into a `ClientError`
    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|body| body.message)
            .unwrap_or(text);

        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
