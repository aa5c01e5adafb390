//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::EmsConfig;
use super::secret::secret_string;
use crate::domain::errors::EmsError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into EmsConfig
/// 4. Applies environment variable overrides (EMS_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`EmsError::Configuration`] if the file is missing or unreadable,
/// a referenced variable is unset, parsing fails, an override is malformed,
/// or validation fails.
///
/// # Examples
///
/// ```no_run
/// use ems_metrics::config::loader::load_config;
///
/// let config = load_config("ems-metrics.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<EmsConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(EmsError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        EmsError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Same as [`load_config`] for configuration text already in memory
pub fn load_config_from_str(contents: &str) -> Result<EmsConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: EmsConfig = toml::from_str(&contents)
        .map_err(|e| EmsError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        EmsError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| EmsError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&cap[0], &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(EmsError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Reads and parses an override variable, if set
fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| EmsError::Configuration(format!("Invalid value for {name}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using the EMS_* prefix
///
/// Variables follow the pattern EMS_<SECTION>_<KEY>, for example
/// EMS_STORE_CONNECTION_STRING or EMS_CACHE_TTL_SECONDS.
fn apply_env_overrides(config: &mut EmsConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("EMS_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Store overrides
    if let Some(target) = env_parse("EMS_STORE_TARGET")? {
        config.store.target = target;
    }
    if let Ok(val) = std::env::var("EMS_STORE_CONNECTION_STRING") {
        config.store.connection_string = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("EMS_STORE_DATABASE_NAME") {
        config.store.database_name = val;
    }
    if let Ok(val) = std::env::var("EMS_STORE_FIXTURE_PATH") {
        config.store.fixture_path = Some(val);
    }
    if let Some(timeout) = env_parse("EMS_STORE_TIMEOUT_SECONDS")? {
        config.store.timeout_seconds = timeout;
    }

    // Query overrides
    if let Some(limit) = env_parse("EMS_QUERY_DEFAULT_ROW_LIMIT")? {
        config.query.default_row_limit = limit;
    }

    // Cache overrides
    if let Some(ttl) = env_parse("EMS_CACHE_TTL_SECONDS")? {
        config.cache.ttl_seconds = ttl;
    }
    if let Some(max) = env_parse("EMS_CACHE_MAX_ENTRIES")? {
        config.cache.max_entries = max;
    }

    // Reference data overrides
    if let Ok(val) = std::env::var("EMS_REFERENCE_HOSPITAL_TABLE") {
        config.reference.hospital_table = val;
    }

    // Logging overrides
    if let Some(enabled) = env_parse("EMS_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("EMS_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("EMS_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
