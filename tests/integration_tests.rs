//! End-to-end tests across the workspace crates
//!
//! Walks the discover, create, poll, wait flow a client follows against a
//! server holding the echo agent.

use acprun::core::AgentSearchQuery;
use acprun::{AcpClient, AcpServer, AgentRegistry, EchoAgent, RunStatus, ServerConfigBuilder, WaitOutcome};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[tokio::test]
async fn test_client_walkthrough() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/acp", listener.local_addr().unwrap());

    let config = ServerConfigBuilder::new()
        .api_prefix("/acp")
        .wait_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let server = AcpServer::with_config(AgentRegistry::new().with_agent(EchoAgent::new()), config);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_with_shutdown(listener, async move {
        let _ = shutdown_rx.await;
    }));

    let client = AcpClient::new(&url).unwrap();

    // Discover
    let agents = client
        .search_agents(&AgentSearchQuery::new().with_name("echo"))
        .await
        .unwrap();
    assert_eq!(agents.len(), 1);
    let agent_id = agents[0].id.clone();

    // Create, then poll until terminal
    let created = client
        .create_run(&agent_id, json!({"text": "hello"}), None)
        .await
        .unwrap();
    let mut status = created.status;
    for _ in 0..50 {
        status = client.get_run(created.id.as_str()).await.unwrap().status;
        if status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, RunStatus::Success);

    // Wait on a terminal run returns immediately
    let outcome = client.wait_run(created.id.as_str(), None).await.unwrap();
    assert_eq!(
        outcome,
        WaitOutcome::Result {
            result: json!({"text": "hello"})
        }
    );

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
