//! Application summary inputs
//!
//! The tuner never reads event logs itself. It consumes an already-profiled
//! summary through [`AppSummaryProvider`] and unsupported-operator reasons
//! through [`DriverLogProvider`]. [`AppSummary`] is the JSON-backed
//! implementation used by the command line.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::Result;

/// Aggregated statistics of one profiled application
pub trait AppSummaryProvider {
    /// False when no profile could be produced for the application
    fn is_info_available(&self) -> bool;

    fn app_id(&self) -> Option<&str>;

    fn spark_version(&self) -> Option<&str>;

    fn mean_input_bytes(&self) -> f64;

    fn max_input_bytes(&self) -> f64;

    fn mean_shuffle_read_bytes(&self) -> f64;

    fn shuffle_stages_with_spill(&self) -> &BTreeSet<u64>;

    fn shuffle_skew_stages(&self) -> &BTreeSet<u64>;

    fn scan_stages_with_gpu_oom(&self) -> &BTreeSet<u64>;

    fn shuffle_stages_with_task_oom(&self) -> &BTreeSet<u64>;

    /// Fraction of task time spent in JVM GC, one value per task
    fn jvm_gc_fractions(&self) -> &[f64];

    fn redundant_read_bytes(&self) -> u64;

    /// Share of distinct read locations among all reads, in percent
    fn distinct_location_pct(&self) -> f64;

    fn system_property(&self, key: &str) -> Option<&str>;

    /// Classpath entries that may hold the accelerator plugin
    fn rapids_jars(&self) -> &[String];

    /// Spark properties the application ran with
    fn properties(&self) -> &BTreeMap<String, String>;
}

/// Unsupported-operator diagnostics extracted from a driver log
pub trait DriverLogProvider {
    fn unsupported_operator_reasons(&self) -> Vec<String>;
}

/// Summary of a profiled application, loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSummary {
    pub app_id: Option<String>,
    pub spark_version: Option<String>,
    pub is_info_available: bool,
    pub mean_input_bytes: f64,
    pub max_input_bytes: f64,
    pub mean_shuffle_read_bytes: f64,
    pub shuffle_stages_with_spill: BTreeSet<u64>,
    pub shuffle_skew_stages: BTreeSet<u64>,
    pub scan_stages_with_gpu_oom: BTreeSet<u64>,
    pub shuffle_stages_with_task_oom: BTreeSet<u64>,
    pub jvm_gc_fractions: Vec<f64>,
    pub redundant_read_bytes: u64,
    pub distinct_location_pct: f64,
    pub system_properties: BTreeMap<String, String>,
    pub rapids_jars: Vec<String>,
    pub properties: BTreeMap<String, String>,
}

impl Default for AppSummary {
    fn default() -> Self {
        Self {
            app_id: None,
            spark_version: None,
            is_info_available: true,
            mean_input_bytes: 0.0,
            max_input_bytes: 0.0,
            mean_shuffle_read_bytes: 0.0,
            shuffle_stages_with_spill: BTreeSet::new(),
            shuffle_skew_stages: BTreeSet::new(),
            scan_stages_with_gpu_oom: BTreeSet::new(),
            shuffle_stages_with_task_oom: BTreeSet::new(),
            jvm_gc_fractions: Vec::new(),
            redundant_read_bytes: 0,
            // No reads observed means every location was distinct
            distinct_location_pct: 100.0,
            system_properties: BTreeMap::new(),
            rapids_jars: Vec::new(),
            properties: BTreeMap::new(),
        }
    }
}

impl AppSummary {
    /// Summary standing in for an application that could not be profiled
    pub fn unavailable() -> Self {
        Self {
            is_info_available: false,
            ..Self::default()
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

impl AppSummaryProvider for AppSummary {
    fn is_info_available(&self) -> bool {
        self.is_info_available
    }

    fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    fn spark_version(&self) -> Option<&str> {
        self.spark_version.as_deref()
    }

    fn mean_input_bytes(&self) -> f64 {
        self.mean_input_bytes
    }

    fn max_input_bytes(&self) -> f64 {
        self.max_input_bytes
    }

    fn mean_shuffle_read_bytes(&self) -> f64 {
        self.mean_shuffle_read_bytes
    }

    fn shuffle_stages_with_spill(&self) -> &BTreeSet<u64> {
        &self.shuffle_stages_with_spill
    }

    fn shuffle_skew_stages(&self) -> &BTreeSet<u64> {
        &self.shuffle_skew_stages
    }

    fn scan_stages_with_gpu_oom(&self) -> &BTreeSet<u64> {
        &self.scan_stages_with_gpu_oom
    }

    fn shuffle_stages_with_task_oom(&self) -> &BTreeSet<u64> {
        &self.shuffle_stages_with_task_oom
    }

    fn jvm_gc_fractions(&self) -> &[f64] {
        &self.jvm_gc_fractions
    }

    fn redundant_read_bytes(&self) -> u64 {
        self.redundant_read_bytes
    }

    fn distinct_location_pct(&self) -> f64 {
        self.distinct_location_pct
    }

    fn system_property(&self, key: &str) -> Option<&str> {
        self.system_properties.get(key).map(String::as_str)
    }

    fn rapids_jars(&self) -> &[String] {
        &self.rapids_jars
    }

    fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

/// Driver-log reasons read from a plain list, one reason per line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverLogReasons {
    reasons: Vec<String>,
}

impl DriverLogReasons {
    pub fn new(reasons: Vec<String>) -> Self {
        Self { reasons }
    }

    pub fn from_lines(content: &str) -> Self {
        let reasons = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { reasons }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_lines(&content))
    }
}

impl DriverLogProvider for DriverLogReasons {
    fn unsupported_operator_reasons(&self) -> Vec<String> {
        self.reasons.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_json_defaults() {
        let summary = AppSummary::from_json_str(
            r#"{
                "app_id": "app-1",
                "spark_version": "3.3.0",
                "mean_input_bytes": 1024.0,
                "shuffle_stages_with_spill": [3, 5],
                "properties": {"spark.executor.cores": "8"}
            }"#,
        )
        .unwrap();

        assert!(summary.is_info_available());
        assert_eq!(summary.app_id(), Some("app-1"));
        assert_eq!(summary.spark_version(), Some("3.3.0"));
        assert!(summary.shuffle_stages_with_spill().contains(&5));
        assert!(summary.shuffle_skew_stages().is_empty());
        assert_eq!(summary.distinct_location_pct(), 100.0);
        assert_eq!(
            summary.properties().get("spark.executor.cores"),
            Some(&"8".to_string())
        );
    }

    #[test]
    fn test_malformed_summary_is_error() {
        assert!(AppSummary::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_unavailable_summary() {
        assert!(!AppSummary::unavailable().is_info_available());
    }

    #[test]
    fn test_driver_log_reasons_from_lines() {
        let logs = DriverLogReasons::from_lines("first reason\n\n  second reason  \n");
        assert_eq!(
            logs.unsupported_operator_reasons(),
            vec!["first reason".to_string(), "second reason".to_string()]
        );
    }
}
