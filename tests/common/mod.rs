//! Common test utilities and helpers

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use rapids_autotuner::platform::Platform;
use rapids_autotuner::summary::AppSummary;
use rapids_autotuner::tuning::{AutoTuner, Recommendations};

/// 16 cores / 32 GiB workers with no GPU section
pub const CPU_ONLY_CLUSTER: &str = r#"
system:
  numCores: 16
  memory: 32768MiB
  numWorkers: 4
"#;

/// Four workers with two L4 GPUs each
pub const GPU_CLUSTER: &str = r#"
system:
  numCores: 32
  memory: 122880MiB
  numWorkers: 4
gpu:
  count: 2
  memory: 24576MiB
  name: L4
"#;

/// One 8-core, 64 GiB worker with one GPU
pub const SMALL_GPU_CLUSTER: &str = r#"
system:
  numCores: 8
  memory: 65536MiB
  numWorkers: 1
gpu:
  count: 1
  memory: 24576MiB
  name: L4
"#;

pub fn app_summary(spark_version: &str) -> AppSummary {
    AppSummary {
        app_id: Some("app-20240101000000-0001".to_string()),
        spark_version: Some(spark_version.to_string()),
        ..AppSummary::default()
    }
}

pub fn with_properties(mut app: AppSummary, pairs: &[(&str, &str)]) -> AppSummary {
    for (key, value) in pairs {
        app.properties.insert(key.to_string(), value.to_string());
    }
    app
}

/// Build and run a tuner, panicking on construction errors
pub fn recommend(
    app: AppSummary,
    platform: Platform,
    cluster: &str,
    target: Option<&str>,
) -> Recommendations {
    let mut builder = AutoTuner::builder(app).platform(platform).cluster_yaml(cluster);
    if let Some(target) = target {
        builder = builder.target_yaml(target);
    }
    builder
        .build()
        .expect("tuner should build")
        .into_tuner()
        .recommend()
}

/// Temporary directory holding input files for CLI runs
pub struct TestInputs {
    temp_dir: TempDir,
}

impl TestInputs {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn write_summary(&self, app: &AppSummary) -> Result<PathBuf> {
        self.write("summary.json", &serde_json::to_string_pretty(app)?)
    }
}
