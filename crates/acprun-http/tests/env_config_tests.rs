//! Tests for environment-driven server configuration
//!
//! These mutate process environment variables and therefore run serially.

use acprun_http::{ConfigError, RemoteAgentSpec, ServerConfigBuilder};
use serial_test::serial;
use std::time::Duration;

const VARS: &[&str] = &[
    "ACPRUN_HOST",
    "ACPRUN_PORT",
    "ACPRUN_API_PREFIX",
    "ACPRUN_WAIT_TIMEOUT_SECS",
    "ACPRUN_RUN_TTL_SECS",
    "ACPRUN_CLEANUP_INTERVAL_SECS",
    "ACPRUN_ENABLE_CORS",
    "ACPRUN_REMOTE_AGENTS",
];

fn clear_env() {
    for var in VARS {
        // SAFETY: tests marked #[serial] do not touch the environment concurrently
        unsafe { std::env::remove_var(var) };
    }
}

fn set_env(key: &str, value: &str) {
    // SAFETY: tests marked #[serial] do not touch the environment concurrently
    unsafe { std::env::set_var(key, value) };
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();

    let config = ServerConfigBuilder::from_env().unwrap().build().unwrap();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 8000);
    assert_eq!(config.wait_timeout, Duration::from_secs(30));
    assert!(config.remote_agents.is_empty());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    set_env("ACPRUN_HOST", "127.0.0.1");
    set_env("ACPRUN_PORT", "9090");
    set_env("ACPRUN_API_PREFIX", "/acp/");
    set_env("ACPRUN_WAIT_TIMEOUT_SECS", "10");
    set_env("ACPRUN_RUN_TTL_SECS", "60");
    set_env("ACPRUN_CLEANUP_INTERVAL_SECS", "5");
    set_env("ACPRUN_ENABLE_CORS", "off");
    set_env(
        "ACPRUN_REMOTE_AGENTS",
        "mailcomposer=http://localhost:8123, weather=http://localhost:8124",
    );

    let config = ServerConfigBuilder::from_env().unwrap().build().unwrap();
    clear_env();

    assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    assert_eq!(config.api_prefix, "/acp");
    assert_eq!(config.wait_timeout, Duration::from_secs(10));
    assert_eq!(config.store.run_ttl, Duration::from_secs(60));
    assert_eq!(config.store.cleanup_interval, Duration::from_secs(5));
    assert!(!config.enable_cors);
    assert_eq!(
        config.remote_agents,
        vec![
            RemoteAgentSpec {
                id: "mailcomposer".to_string(),
                url: "http://localhost:8123".to_string(),
            },
            RemoteAgentSpec {
                id: "weather".to_string(),
                url: "http://localhost:8124".to_string(),
            },
        ]
    );
}

#[test]
#[serial]
fn test_from_env_invalid_values() {
    clear_env();
    set_env("ACPRUN_PORT", "not-a-port");
    let err = ServerConfigBuilder::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref key, .. } if key == "ACPRUN_PORT"));

    clear_env();
    set_env("ACPRUN_ENABLE_CORS", "maybe");
    assert!(ServerConfigBuilder::from_env().is_err());

    clear_env();
    set_env("ACPRUN_REMOTE_AGENTS", "broken");
    let err = ServerConfigBuilder::from_env().unwrap_err();
    assert!(
        matches!(err, ConfigError::InvalidEnvVar { ref key, .. } if key == "ACPRUN_REMOTE_AGENTS")
    );

    clear_env();
}

#[test]
#[serial]
fn test_from_env_out_of_range_wait_timeout() {
    clear_env();
    set_env("ACPRUN_WAIT_TIMEOUT_SECS", "301");

    let result = ServerConfigBuilder::from_env().unwrap().build();
    clear_env();

    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}
