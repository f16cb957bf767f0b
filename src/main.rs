//! Sentra - Solana portfolio risk monitor
//!
//! Polls a wallet's balances, scores portfolio risk from live and historical
//! prices, alerts over Telegram, records scores on chain, and serves the
//! latest state over HTTP.
//!
//! Besides the long-running `run` mode, one-shot subcommands manage the
//! wallet's on-chain risk preferences and print recorded snapshots.

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use serde_json::json;
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use sentra_risk_monitor::{
    application::{Application, TickOutcome},
    config::{load_config_with_args, AppConfig, CliArgs},
    core::{ports::SnapshotStore, validation::parse_pubkey},
    utils::{telemetry, Command},
};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("Failed to install color-eyre: {}", e);
        process::exit(1);
    }

    if let Err(e) = run().await {
        error!("Fatal application error: {:?}", e);

        eprintln!("\n❌ sentra failed:");
        eprintln!("   {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("   Caused by: {}", cause);
        }

        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // A missing .env is normal outside development
    let _ = dotenvy::dotenv();

    let cli_args = CliArgs::parse();
    let command = cli_args.command();

    let config = load_config_with_args(cli_args)
        .await
        .wrap_err("Configuration loading failed")?;

    let _log_guard = telemetry::init(
        &config.environment.log_level,
        &config.environment.log_format,
        config.monitoring.log_directory.as_deref(),
    )
    .map_err(|e| eyre!("Failed to initialize telemetry system: {:#}", e))?;

    if command == Command::Run {
        display_startup_banner(&config);
        if config.is_production() {
            info!("🔒 Running in PRODUCTION mode");
        } else {
            warn!("⚠️  Running in {} mode", config.environment.name);
        }
    }

    let app = Application::build(config).wrap_err("Application initialization failed")?;

    match command {
        Command::Run => run_with_graceful_shutdown(app).await,
        Command::Assess => assess_once(&app).await,
        Command::InitPreferences { threshold } => {
            let signature = app
                .services()
                .solana
                .initialize_preferences(threshold)
                .await
                .wrap_err("Failed to initialize risk preferences")?;
            println!("{}", json!({ "threshold": threshold, "signature": signature }));
            Ok(())
        }
        Command::UpdateThreshold { threshold } => {
            let signature = app
                .services()
                .solana
                .update_threshold(threshold)
                .await
                .wrap_err("Failed to update risk threshold")?;
            println!("{}", json!({ "threshold": threshold, "signature": signature }));
            Ok(())
        }
        Command::Snapshots { wallet } => print_snapshots(&app, wallet).await,
    }
}

fn display_startup_banner(config: &AppConfig) {
    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║                 SENTRA RISK MONITOR v{:<8}            ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("📊 Configuration Summary:");
    info!("   Environment: {}", config.environment.name);
    info!("   RPC: {}", config.solana.rpc_url);
    info!("   Program: {}", config.solana.program_id);
    info!(
        "   Assets: {}",
        config
            .assets
            .iter()
            .map(|a| a.symbol.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!("   Interval: {}s", config.engine.monitor_interval_secs);
    info!("   Score method: {}", config.engine.score_method);
    info!("   Alert threshold: {}", config.engine.risk_alert_threshold);
    info!("   Record on chain: {}", config.engine.record_on_chain);
    info!("   Telegram: {}", if config.telegram.is_enabled() { "enabled" } else { "disabled" });
    info!("   Metrics Enabled: {}", config.monitoring.enable_metrics);
}

/// Run until SIGINT or SIGTERM
#[instrument(skip(app))]
async fn run_with_graceful_shutdown(app: Application) -> Result<()> {
    let shutdown = CancellationToken::new();

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("🔄 Initiating graceful shutdown...");
        trigger.cancel();
    });

    app.run(shutdown).await.wrap_err("Application runtime error")
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => warn!("🛑 Received SIGTERM signal"),
                    _ = tokio::signal::ctrl_c() => warn!("🛑 Received SIGINT signal (Ctrl+C)"),
                }
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("🛑 Received SIGINT signal (Ctrl+C)");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Received Ctrl+C signal");
        }
    }
}

async fn assess_once(app: &Application) -> Result<()> {
    let mut engine = app.engine();
    engine.invalidate_history();

    match engine.tick().await.wrap_err("Risk assessment failed")? {
        TickOutcome::Assessed(assessment) => {
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }
        TickOutcome::Skipped(reason) => {
            println!("{}", json!({ "skipped": reason.to_string() }));
        }
    }
    Ok(())
}

async fn print_snapshots(app: &Application, wallet: Option<String>) -> Result<()> {
    let solana = &app.services().solana;

    let owner = match wallet {
        Some(address) => parse_pubkey(&address, "wallet")?,
        None => solana
            .wallet()
            .ok_or_else(|| eyre!("No --wallet given and no keypair configured"))?,
    };

    let preference = solana
        .fetch_preference(&owner)
        .await
        .wrap_err("Failed to fetch risk preference")?;
    let snapshots = solana
        .snapshots(&owner)
        .await
        .wrap_err("Failed to fetch snapshots")?;

    let output = json!({
        "wallet": owner.to_string(),
        "preference": preference,
        "snapshots": snapshots,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
