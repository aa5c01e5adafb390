//! CLI interface and argument parsing
//!
//! This module provides the command-line interface using clap.

pub mod commands;

use crate::config::{load_config, EmsConfig, LoggingConfig};
use clap::{Parser, Subcommand};

/// EMS mission metrics pipeline
#[derive(Parser, Debug)]
#[command(name = "ems-metrics")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "ems-metrics.toml", env = "EMS_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "EMS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load one metric table and print it as JSON lines
    Load(commands::load::LoadArgs),

    /// Check transport destinations against hospital capabilities
    Eligibility(commands::eligibility::EligibilityArgs),

    /// List registered metrics
    Metrics(commands::metrics::MetricsArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),
}

impl Cli {
    /// Log level and logging section to start the subscriber with
    ///
    /// An unreadable config falls back to console-only defaults; the
    /// command itself reports the config error afterwards.
    pub fn logging_settings(&self) -> (String, LoggingConfig) {
        let config = load_config(&self.config).ok();
        resolve_logging(self.log_level.as_deref(), config.as_ref())
    }
}

/// Merges `--log-level` with the `[application]` and `[logging]` sections
///
/// The command-line level wins over `application.log_level`.
pub fn resolve_logging(
    cli_level: Option<&str>,
    config: Option<&EmsConfig>,
) -> (String, LoggingConfig) {
    let level = match (cli_level, config) {
        (Some(level), _) => level.to_string(),
        (None, Some(config)) => config.application.log_level.clone(),
        (None, None) => "info".to_string(),
    };
    let logging = config.map(|c| c.logging.clone()).unwrap_or_default();
    (level, logging)
}
