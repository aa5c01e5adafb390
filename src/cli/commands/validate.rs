//! Validate config command implementation
//!
//! Loads the configuration with substitutions and overrides applied, runs
//! validation and prints a summary without secrets.

use super::{EXIT_CONFIG, EXIT_OK};
use crate::config::{load_config, EmsConfig, StoreTarget};
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

/// Connection string with credentials removed
fn redact_connection_string(conn: &str) -> String {
    match (conn.split_once("://"), conn.rsplit_once('@')) {
        (Some((scheme, _)), Some((_, host))) => format!("{scheme}://***@{host}"),
        _ => conn.to_string(),
    }
}

fn summary(config: &EmsConfig) -> Vec<String> {
    let mut lines = vec![format!("  Log Level: {}", config.application.log_level)];
    match config.store.target {
        StoreTarget::MongoDb => {
            lines.push("  Store Target: MongoDB".to_string());
            if let Some(conn) = &config.store.connection_string {
                lines.push(format!(
                    "  Connection: {}",
                    redact_connection_string(conn.expose_secret().as_ref())
                ));
            }
        }
        StoreTarget::Fixture => {
            lines.push("  Store Target: fixture".to_string());
            lines.push(format!(
                "  Fixture Path: {}",
                config.store.fixture_path.as_deref().unwrap_or("-")
            ));
        }
    }
    lines.push(format!("  Database: {}", config.store.database_name));
    lines.push(format!("  Default Row Limit: {}", config.query.default_row_limit));
    lines.push(format!(
        "  Cache: ttl {}s, max {} entries",
        config.cache.ttl_seconds, config.cache.max_entries
    ));
    lines.push(format!(
        "  Hospital Table: {}",
        config.reference.hospital_table
    ));
    if config.logging.local_enabled {
        lines.push(format!(
            "  File Logging: {} ({})",
            config.logging.local_path, config.logging.local_rotation
        ));
    }
    lines
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        match load_config(config_path) {
            Ok(config) => {
                println!("Configuration is valid");
                println!();
                println!("Configuration Summary:");
                for line in summary(&config) {
                    println!("{line}");
                }
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("Configuration validation failed");
                println!("   Error: {e}");
                Ok(EXIT_CONFIG)
            }
        }
    }
}
