//! Load command implementation
//!
//! Dispatches one metric and writes its rows to stdout as JSON lines,
//! columns in schema order.

use super::{close_quietly, connect_or_report, load_or_report, EXIT_CONFIG, EXIT_OK};
use crate::core::registry::{Dispatcher, MetricRequest};
use crate::domain::{parse_protocol_id_list, EmsError, YearRange};
use clap::builder::RangedU64ValueParser;
use clap::Args;
use std::io::Write;

/// Arguments for the load command
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Metric name as listed by `metrics`
    pub metric: String,

    /// Maximum documents per store query (defaults to query.default_row_limit)
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub limit: Option<usize>,

    /// Medication name substring (Medikamente only)
    #[arg(long)]
    pub medication: Option<String>,

    /// Mission year or inclusive range, e.g. 2024 or 2023-2024
    #[arg(long)]
    pub years: Option<YearRange>,

    /// Comma-separated protocol ids to restrict the result to
    #[arg(long)]
    pub protocol_ids: Option<String>,
}

impl LoadArgs {
    pub fn to_request(&self) -> MetricRequest {
        let mut request = MetricRequest::new(self.metric.clone());
        if let Some(limit) = self.limit {
            request = request.with_limit(limit);
        }
        if let Some(name) = &self.medication {
            request = request.with_medication(name.clone());
        }
        if let Some(years) = self.years {
            request = request.with_years(years);
        }
        if let Some(ids) = &self.protocol_ids {
            request = request.with_protocol_ids(parse_protocol_id_list(ids));
        }
        request
    }

    /// Execute the load command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(metric = %self.metric, "Starting load command");

        let config = match load_or_report(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        let store = match connect_or_report(&config).await {
            Ok(store) => store,
            Err(code) => return Ok(code),
        };

        let dispatcher = Dispatcher::from_config(store.clone(), &config);
        let result = dispatcher.dispatch(&self.to_request()).await;
        close_quietly(store.as_ref()).await;

        let table = match result {
            Ok(table) => table,
            Err(e @ EmsError::UnknownMetric(_)) => {
                crate::log_error_with_context!(&e, "Metric lookup failed");
                eprintln!("{e}. Run `ems-metrics metrics` for the registered names.");
                return Ok(EXIT_CONFIG);
            }
            Err(e @ EmsError::Validation(_)) => {
                crate::log_error_with_context!(&e, "Invalid load request");
                eprintln!("{e}");
                return Ok(EXIT_CONFIG);
            }
            Err(e) => return Err(e.into()),
        };
        crate::log_table_loaded!(self.metric.as_str(), table);

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for line in table.to_json_lines()? {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(EXIT_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_request_carries_filters() {
        let args = LoadArgs {
            metric: "Medikamente".to_string(),
            limit: Some(25),
            medication: Some("ASS".to_string()),
            years: Some(YearRange::single(2024).unwrap()),
            protocol_ids: Some("P-2, P-1".to_string()),
        };
        let request = args.to_request();
        assert_eq!(request.limit, Some(25));
        assert_eq!(request.medication.as_deref(), Some("ASS"));
        assert_eq!(request.protocol_ids.map(|ids| ids.len()), Some(2));
    }

    #[tokio::test]
    async fn test_missing_config_is_exit_2() {
        let args = LoadArgs {
            metric: "GCS".to_string(),
            limit: None,
            medication: None,
            years: None,
            protocol_ids: None,
        };
        let code = args.execute("/nonexistent/ems-metrics.toml").await.unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
