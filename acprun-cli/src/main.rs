use clap::{Parser, Subcommand};

mod client;
mod serve;

use client::{run_agents_command, run_run_command};
use serve::{ServeArgs, run_serve_command};

#[derive(Parser, Debug)]
#[command(name = "acprun", version)]
#[command(about = "acprun - Agent Connect Protocol run server and client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the echo agent and any configured remote agents
    Serve(ServeArgs),
    /// Search the agents of a server
    Agents {
        /// Server base URL
        #[arg(long, env = "ACPRUN_URL", default_value = "http://localhost:8000")]
        url: String,
        /// Name substring to filter by
        #[arg(long)]
        name: Option<String>,
        /// Exact version to filter by
        #[arg(long)]
        version: Option<String>,
        /// Maximum number of agents to list
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Create a run on a server and wait for its outcome
    Run {
        /// Server base URL
        #[arg(long, env = "ACPRUN_URL", default_value = "http://localhost:8000")]
        url: String,
        /// Agent to run
        #[arg(long)]
        agent: String,
        /// Run input as JSON
        #[arg(long, default_value = "{}")]
        input: String,
        /// Run config as JSON
        #[arg(long)]
        config: Option<String>,
        /// Give up waiting after this many seconds
        #[arg(long, default_value_t = 120)]
        deadline_secs: u64,
    },
}

/// Errors surfaced by CLI commands
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] acprun_http::ConfigError),

    #[error(transparent)]
    Server(#[from] acprun_http::ServerError),

    #[error(transparent)]
    Client(#[from] acprun_http::ClientError),

    #[error("Failed to connect remote agent '{id}': {source}")]
    RemoteAgent {
        id: String,
        #[source]
        source: acprun_http::ClientError,
    },

    #[error("Invalid JSON in --{flag}: {source}")]
    InvalidJson {
        flag: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize JSON logging once.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .try_init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => run_serve_command(args).await,
        Commands::Agents {
            url,
            name,
            version,
            limit,
        } => run_agents_command(&url, name, version, limit).await,
        Commands::Run {
            url,
            agent,
            input,
            config,
            deadline_secs,
        } => run_run_command(&url, &agent, &input, config.as_deref(), deadline_secs).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        std::process::exit(1);
    }
}
