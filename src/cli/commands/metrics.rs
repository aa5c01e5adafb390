//! Metrics command implementation
//!
//! Lists every registered metric with the arguments its loader accepts.

use crate::core::registry::MetricRegistry;
use clap::Args;

/// Arguments for the metrics command
#[derive(Args, Debug)]
pub struct MetricsArgs {
    /// Also print each metric's guaranteed columns
    #[arg(long)]
    pub columns: bool,
}

impl MetricsArgs {
    pub fn render(&self, registry: &MetricRegistry) -> Vec<String> {
        registry
            .specs()
            .iter()
            .map(|spec| {
                let mut args = vec!["--limit"];
                if spec.mission_scoped {
                    args.extend(["--years", "--protocol-ids"]);
                }
                if spec.accepts.medication {
                    args.push("--medication");
                }
                let mut line = format!("{:<36} {}", spec.name, args.join(" "));
                if self.columns {
                    line.push_str(&format!("\n    columns: {}", spec.schema.join(", ")));
                }
                line
            })
            .collect()
    }

    /// Execute the metrics command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let registry = MetricRegistry::standard();
        for line in self.render(&registry) {
            println!("{line}");
        }
        Ok(super::EXIT_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_every_metric() {
        let registry = MetricRegistry::standard();
        let lines = MetricsArgs { columns: false }.render(&registry);
        assert_eq!(lines.len(), registry.len());
        let medication = lines.iter().find(|l| l.starts_with("Medikamente")).unwrap();
        assert!(medication.contains("--medication"));
        let gcs = lines.iter().find(|l| l.starts_with("GCS")).unwrap();
        assert!(!gcs.contains("--medication"));
        let etu = lines.iter().find(|l| l.starts_with("ETU")).unwrap();
        assert!(etu.contains("--limit"));
        assert!(!etu.contains("--years"));
    }

    #[test]
    fn test_render_with_columns() {
        let registry = MetricRegistry::standard();
        let lines = MetricsArgs { columns: true }.render(&registry);
        let puls = lines.iter().find(|l| l.starts_with("puls")).unwrap();
        assert!(puls.contains("value_num"));
    }
}
