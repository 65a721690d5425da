//! `combine` command implementation

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::cli::args::CombineArgs;
use crate::cluster::ClusterProperties;
use crate::report::{ReportFormat, TuningReport};
use crate::summary::AppSummary;
use crate::tuning::combine;

/// Execute the combine command
pub async fn run_combine_command(args: CombineArgs) -> Result<String> {
    let app = AppSummary::load(&args.summary).with_context(|| {
        format!("Failed to read application summary {}", args.summary.display())
    })?;
    let report = TuningReport::load(&args.recommendations).with_context(|| {
        format!(
            "Failed to read recommendation report {}",
            args.recommendations.display()
        )
    })?;

    let mut source = app.properties;
    if let Some(path) = &args.cluster {
        let cluster = ClusterProperties::load(path)
            .await
            .with_context(|| format!("Failed to read cluster description {}", path.display()))?
            .unwrap_or_default();
        source.extend(cluster.software_properties);
    }

    let merged = combine(&source, &report.properties);
    render(&merged, args.format)
}

fn render(merged: &BTreeMap<String, String>, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(merged)?),
        ReportFormat::Text => {
            let mut out = String::from("\nCombined Spark Properties:\n");
            for (key, value) in merged {
                let _ = writeln!(out, "--conf {key}={value}");
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_combine_files() {
        let dir = TempDir::new().unwrap();
        let summary = write(
            dir.path(),
            "app.json",
            r#"{"app_id": "app-1", "properties": {"spark.app.id": "app-1", "spark.executor.cores": "4", "spark.sql.shuffle.partitions": "200"}}"#,
        );
        let report = write(
            dir.path(),
            "recs.json",
            r#"{"platform": "onprem", "tool": "qualification", "properties": {"spark.executor.cores": "16"}, "comments": []}"#,
        );

        let output = run_combine_command(CombineArgs {
            summary,
            recommendations: report,
            cluster: None,
            format: ReportFormat::Text,
        })
        .await
        .unwrap();

        assert!(output.contains("--conf spark.executor.cores=16"));
        assert!(output.contains("--conf spark.sql.shuffle.partitions=200"));
        assert!(!output.contains("spark.app.id"));
    }

    #[tokio::test]
    async fn test_missing_report_is_error() {
        let dir = TempDir::new().unwrap();
        let summary = write(dir.path(), "app.json", "{}");
        let result = run_combine_command(CombineArgs {
            summary,
            recommendations: dir.path().join("absent.json"),
            cluster: None,
            format: ReportFormat::Json,
        })
        .await;
        assert!(result.is_err());
    }
}
