// EMS Metrics - Mission record normalization and metric pipeline
// Copyright (c) 2025 EMS Metrics Contributors
// Licensed under the MIT License

use clap::Parser;
use ems_metrics::cli::{Cli, Commands};
use ems_metrics::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let (log_level, logging_config) = cli.logging_settings();
    let _guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "ems-metrics starting");

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5 // Fatal error exit code
        }
    };

    drop(_guard);
    process::exit(exit_code);
}

async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Load(args) => args.execute(&cli.config).await,
        Commands::Eligibility(args) => args.execute(&cli.config).await,
        Commands::Metrics(args) => args.execute().await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
    }
}
