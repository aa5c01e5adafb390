//! Eligibility command implementation
//!
//! Loads the mission index, classifies every mission against the hospital
//! reference table and prints per-category totals. Resuscitation missions
//! are additionally checked through their `rea_status`.

use super::{close_quietly, connect_or_report, load_or_report, EXIT_CONFIG, EXIT_OK};
use crate::core::eligibility::{
    annotate, annotate_reanimation, summarize, CategorySummary, HospitalTable, CATEGORY_COLUMN,
    ELIGIBLE_COLUMN,
};
use crate::core::registry::{Dispatcher, MetricRequest};
use crate::domain::{MetricTable, TracerCategory, YearRange, PROTOCOL_ID};
use clap::builder::RangedU64ValueParser;
use clap::Args;
use serde_json::Value;

/// Arguments for the eligibility command
#[derive(Args, Debug)]
pub struct EligibilityArgs {
    /// Maximum documents per store query (defaults to query.default_row_limit)
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub limit: Option<usize>,

    /// Mission year or inclusive range, e.g. 2024 or 2023-2024
    #[arg(long)]
    pub years: Option<YearRange>,

    /// Print one JSON line per classified mission
    #[arg(long)]
    pub details: bool,
}

impl EligibilityArgs {
    fn request(&self, metric: &str) -> MetricRequest {
        let mut request = MetricRequest::new(metric);
        if let Some(limit) = self.limit {
            request = request.with_limit(limit);
        }
        if let Some(years) = self.years {
            request = request.with_years(years);
        }
        request
    }

    /// Execute the eligibility command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting eligibility command");

        let config = match load_or_report(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        let hospitals = match HospitalTable::from_path(&config.reference.hospital_table) {
            Ok(table) => table,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to load hospital reference table");
                eprintln!("{e}");
                return Ok(EXIT_CONFIG);
            }
        };
        let store = match connect_or_report(&config).await {
            Ok(store) => store,
            Err(code) => return Ok(code),
        };

        let dispatcher = Dispatcher::from_config(store.clone(), &config);
        let index = dispatcher.dispatch(&self.request("Index")).await;
        let reanimation = dispatcher
            .dispatch(&self.request("Reanimation_mit_targetDestination"))
            .await;
        close_quietly(store.as_ref()).await;

        let mut missions = MetricTable::clone(&*index?);
        annotate(&mut missions, &hospitals);
        let mut resuscitations = MetricTable::clone(&*reanimation?);
        annotate_reanimation(&mut resuscitations, &hospitals);

        if self.details {
            print_details(&missions)?;
        }
        for line in report_lines(&missions, &resuscitations) {
            println!("{line}");
        }
        Ok(EXIT_OK)
    }
}

fn print_details(missions: &MetricTable) -> anyhow::Result<()> {
    let columns = [
        PROTOCOL_ID,
        "targetDestination",
        "leadingDiagnosis",
        CATEGORY_COLUMN,
        ELIGIBLE_COLUMN,
    ];
    let view = MetricTable::project(missions.rows().to_vec(), &columns);
    for line in view.to_json_lines()? {
        println!("{line}");
    }
    Ok(())
}

fn format_summary(label: &str, summary: CategorySummary) -> String {
    format!(
        "{label:<24} cases: {:>6}  eligible: {:>6}  ({:.1}%)",
        summary.total,
        summary.eligible,
        summary.percentage()
    )
}

/// Human-readable report, one line per category
pub fn report_lines(missions: &MetricTable, resuscitations: &MetricTable) -> Vec<String> {
    let mut lines: Vec<String> = summarize(missions)
        .into_iter()
        .map(|(category, summary)| format_summary(category.column_name(), summary))
        .collect();

    let mut rea = CategorySummary::default();
    for row in resuscitations.rows() {
        if row.get("rea_status") == Some(&Value::Bool(true)) {
            rea.total += 1;
            if row.get(ELIGIBLE_COLUMN) == Some(&Value::Bool(true)) {
                rea.eligible += 1;
            }
        }
    }
    lines.push(format_summary(
        &format!("{} (rea_status)", TracerCategory::Reanimation.column_name()),
        rea,
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(rows: Vec<Value>) -> MetricTable {
        MetricTable::from_rows(rows.into_iter().filter_map(|v| v.as_object().cloned()).collect())
    }

    #[test]
    fn test_report_lines() {
        let missions = table(vec![
            json!({"tracer_category": "TIA / Schlaganfall", "hospital_eligible": true}),
            json!({"tracer_category": "TIA / Schlaganfall", "hospital_eligible": false}),
        ]);
        let rea = table(vec![
            json!({"rea_status": true, "hospital_eligible": true}),
            json!({"rea_status": false, "hospital_eligible": false}),
        ]);
        let lines = report_lines(&missions, &rea);
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("TIA / Schlaganfall"));
        assert!(lines[0].contains("cases:      2"));
        assert!(lines[0].contains("(50.0%)"));
        assert!(lines[4].contains("eligible:      1"));
    }

    #[tokio::test]
    async fn test_missing_config_is_exit_2() {
        let args = EligibilityArgs {
            limit: None,
            years: None,
            details: false,
        };
        let code = args.execute("/nonexistent/ems-metrics.toml").await.unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
