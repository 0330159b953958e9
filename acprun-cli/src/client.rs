//! `acprun agents` and `acprun run`

use crate::CliError;
use acprun_core::AgentSearchQuery;
use acprun_http::AcpClient;
use serde_json::Value;
use std::time::Duration;

pub async fn run_agents_command(
    url: &str,
    name: Option<String>,
    version: Option<String>,
    limit: Option<usize>,
) -> Result<(), CliError> {
    let client = AcpClient::new(url)?;
    let query = AgentSearchQuery {
        name,
        version,
        limit,
        offset: None,
    };

    let agents = client.search_agents(&query).await?;
    println!("{}", serde_json::to_string_pretty(&agents)?);
    Ok(())
}

pub async fn run_run_command(
    url: &str,
    agent: &str,
    input: &str,
    config: Option<&str>,
    deadline_secs: u64,
) -> Result<(), CliError> {
    let input = parse_json("input", input)?;
    let config = config.map(|c| parse_json("config", c)).transpose()?;

    let client = AcpClient::new(url)?;
    let outcome = client
        .run_and_wait(agent, input, config, Duration::from_secs(deadline_secs))
        .await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn parse_json(flag: &'static str, raw: &str) -> Result<Value, CliError> {
    serde_json::from_str(raw).map_err(|source| CliError::InvalidJson { flag, source })
}
