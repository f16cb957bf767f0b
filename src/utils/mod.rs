//! Utility functions and helpers used throughout the application
//!
//! Tracing setup, command-line definition, and time formatting.

pub mod time;

pub use time::*;

/// Telemetry and observability utilities
pub mod telemetry {
    use anyhow::Result;
    use tracing_appender::non_blocking::WorkerGuard;
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
    };

    /// File name prefix of rolled log files
    const LOG_FILE_PREFIX: &str = "sentra.log";

    /// Initialize global tracing with the specified log level and format
    ///
    /// `RUST_LOG` takes precedence over `log_level`. With a log directory, a
    /// daily rolling file receives the same events; keep the returned guard
    /// alive for the life of the process so buffered lines are flushed.
    pub fn init(
        log_level: &str,
        log_format: &str,
        log_directory: Option<&str>,
    ) -> Result<Option<WorkerGuard>> {
        let env_filter =
            EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;

        let stdout = match log_format {
            "json" => fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            "compact" => fmt::layer()
                .compact()
                .with_target(false)
                .with_thread_ids(false)
                .boxed(),
            _ => fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        };

        let (file, guard) = match log_directory {
            Some(dir) => {
                let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .boxed();
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        Registry::default()
            .with(env_filter)
            .with(stdout)
            .with(file)
            .try_init()?;

        Ok(guard)
    }
}

/// Command-line interface
pub mod cli {
    use clap::{Parser, Subcommand};

    /// Command line arguments for the application
    #[derive(Parser, Debug, Clone, Default)]
    #[command(
        name = "sentra",
        about = "Solana portfolio risk monitor: VaR/HHI scoring, Telegram alerts, on-chain score history",
        version = env!("CARGO_PKG_VERSION")
    )]
    pub struct CliArgs {
        /// Path to configuration file
        #[arg(short, long = "config", env = "CONFIG_PATH", global = true)]
        pub config_path: Option<String>,

        /// Overlay configuration files applied after the base file
        #[arg(long = "overlay", global = true)]
        pub overlays: Vec<String>,

        /// Logging level (trace, debug, info, warn, error)
        #[arg(short, long, env = "LOG_LEVEL", global = true)]
        pub log_level: Option<String>,

        /// Log format (json, pretty, compact)
        #[arg(long, env = "LOG_FORMAT", global = true)]
        pub log_format: Option<String>,

        /// Environment (development, staging, production)
        #[arg(short, long, env = "ENVIRONMENT", global = true)]
        pub environment: Option<String>,

        /// Solana RPC endpoint
        #[arg(long, global = true)]
        pub rpc_url: Option<String>,

        /// HTTP status API port
        #[arg(short, long, env = "PORT", global = true)]
        pub port: Option<u16>,

        #[command(subcommand)]
        pub command: Option<Command>,
    }

    /// Subcommands; `run` when omitted
    #[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
    pub enum Command {
        /// Run the engine and the status API until interrupted
        Run,
        /// Run one assessment and print it as JSON
        Assess,
        /// Create the wallet's on-chain risk preference account
        InitPreferences {
            /// Alert threshold (0-100)
            #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u8).range(0..=100))]
            threshold: u8,
        },
        /// Change the wallet's on-chain alert threshold
        UpdateThreshold {
            /// New alert threshold (0-100)
            #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
            threshold: u8,
        },
        /// Print recorded risk snapshots
        Snapshots {
            /// Wallet to query; defaults to the configured keypair
            #[arg(long)]
            wallet: Option<String>,
        },
    }

    impl CliArgs {
        /// Selected subcommand
        pub fn command(&self) -> Command {
            self.command.clone().unwrap_or(Command::Run)
        }
    }
}

// Re-export CLI utilities
pub use cli::{CliArgs, Command};

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_command_is_run() {
        let args = CliArgs::parse_from(["sentra"]);
        assert_eq!(args.command(), Command::Run);
        assert!(args.overlays.is_empty());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::parse_from([
            "sentra",
            "update-threshold",
            "--threshold",
            "75",
            "--overlay",
            "a.toml",
            "--overlay",
            "b.yaml",
            "--rpc-url",
            "http://localhost:8899",
        ]);

        assert_eq!(args.command(), Command::UpdateThreshold { threshold: 75 });
        assert_eq!(args.overlays, vec!["a.toml", "b.yaml"]);
        assert_eq!(args.rpc_url.as_deref(), Some("http://localhost:8899"));
    }

    #[test]
    fn test_threshold_range_is_enforced() {
        assert!(CliArgs::try_parse_from(["sentra", "init-preferences", "--threshold", "101"]).is_err());

        let args = CliArgs::parse_from(["sentra", "init-preferences"]);
        assert_eq!(args.command(), Command::InitPreferences { threshold: 60 });
    }
}
