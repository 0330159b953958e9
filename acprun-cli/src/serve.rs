//! `acprun serve`

use crate::CliError;
use acprun_core::{AgentRegistry, EchoAgent};
use acprun_http::{AcpServer, RemoteAgent, ServerConfig, ServerConfigBuilder};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Flags override the `ACPRUN_*` environment variables
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bind host
    #[arg(long)]
    host: Option<String>,
    /// Bind port
    #[arg(long)]
    port: Option<u16>,
    /// Route prefix, e.g. /api/v1
    #[arg(long)]
    api_prefix: Option<String>,
    /// Upper bound of a single wait request in seconds
    #[arg(long)]
    wait_timeout_secs: Option<u64>,
    /// Forward an agent to another server, as id=url (repeatable)
    #[arg(long = "remote-agent")]
    remote_agents: Vec<String>,
}

impl ServeArgs {
    fn into_config(self) -> Result<ServerConfig, CliError> {
        let mut builder = ServerConfigBuilder::from_env()?;

        if let Some(host) = self.host {
            builder = builder.host(host);
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(prefix) = self.api_prefix {
            builder = builder.api_prefix(prefix);
        }
        if let Some(secs) = self.wait_timeout_secs {
            builder = builder.wait_timeout(Duration::from_secs(secs));
        }
        for entry in &self.remote_agents {
            builder = builder.remote_agent(entry.parse()?);
        }

        Ok(builder.build()?)
    }
}

pub async fn run_serve_command(args: ServeArgs) -> Result<(), CliError> {
    let config = args.into_config()?;

    let mut agents = AgentRegistry::new().with_agent(EchoAgent::new());
    for spec in &config.remote_agents {
        let remote = RemoteAgent::connect(&spec.id, &spec.url)
            .await
            .map_err(|source| CliError::RemoteAgent {
                id: spec.id.clone(),
                source,
            })?;
        info!(agent_id = %spec.id, url = %spec.url, "Registered remote agent");
        agents.register(Arc::new(remote));
    }

    AcpServer::with_config(agents, config).serve().await?;
    Ok(())
}
