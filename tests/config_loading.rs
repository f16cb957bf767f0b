//! Layered configuration loading through the public API

use pretty_assertions::assert_eq;
use sentra_risk_monitor::config::{ConfigLoader, ConfigValidator};
use sentra_risk_monitor::core::types::ScoreMethod;
use sentra_risk_monitor::utils::CliArgs;
use std::fs;
use tempfile::TempDir;

const EXAMPLE_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/config.example.toml");

#[tokio::test]
async fn example_config_loads_and_validates() {
    let config = ConfigLoader::new()
        .without_env()
        .with_config_path(EXAMPLE_CONFIG)
        .load()
        .await
        .unwrap();

    assert_eq!(config.solana.rpc_url, "https://api.devnet.solana.com");
    assert_eq!(config.assets.len(), 4);
    assert_eq!(config.asset("USDC").and_then(|a| a.fallback_price), Some(1.0));

    let result = ConfigValidator::new().validate(&config).unwrap();
    assert!(result.is_valid, "{:?}", result.errors);
}

#[tokio::test]
async fn yaml_overlay_overrides_toml_base() {
    let dir = TempDir::new().unwrap();
    let overlay = dir.path().join("production.yaml");
    fs::write(
        &overlay,
        "environment:\n  name: production\nengine:\n  score_method: hhi\n  risk_alert_threshold: 40.0\n  record_on_chain: false\n",
    )
    .unwrap();

    let config = ConfigLoader::new()
        .without_env()
        .with_config_path(EXAMPLE_CONFIG)
        .with_additional_file(&overlay)
        .load()
        .await
        .unwrap();

    assert!(config.is_production());
    assert_eq!(config.engine.score_method, ScoreMethod::Hhi);
    assert_eq!(config.engine.risk_alert_threshold, 40.0);
    assert!(!config.engine.record_on_chain);
    // untouched keys keep the base file's values
    assert_eq!(config.engine.monitor_interval_secs, 60);
    assert_eq!(config.server.port, 4000);
}

#[tokio::test]
async fn cli_overrides_win_over_files() {
    let dir = TempDir::new().unwrap();
    let overlay = dir.path().join("local.toml");
    fs::write(&overlay, "[server]\nport = 5000\n").unwrap();

    let args = CliArgs {
        config_path: Some(EXAMPLE_CONFIG.to_string()),
        overlays: vec![overlay.display().to_string()],
        port: Some(6000),
        log_level: Some("debug".to_string()),
        ..CliArgs::default()
    };

    let config = ConfigLoader::new()
        .without_env()
        .with_cli_args(args)
        .load()
        .await
        .unwrap();

    assert_eq!(config.server.port, 6000);
    assert_eq!(config.environment.log_level, "debug");
}

#[tokio::test]
async fn malformed_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[engine\nmonitor_interval_secs = ").unwrap();

    let err = ConfigLoader::new()
        .without_env()
        .with_config_path(&path)
        .load()
        .await
        .unwrap_err();

    assert_eq!(err.kind().as_str(), "configuration");
}
