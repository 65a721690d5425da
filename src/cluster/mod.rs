//! Cluster descriptions
//!
//! - `ClusterProperties`: the source cluster as a human-authored YAML document,
//!   any part of which may be missing
//! - [`target`]: the optional target cluster and its user-enforced properties
//! - [`shape`]: resolution of both into the concrete [`shape::ClusterShape`]

pub mod shape;
pub mod target;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::platform::{GpuDevice, PlatformCatalog};
use crate::tuning::units::memory_to_mib;

pub use shape::{
    resolve_shape, ClusterShape, ConstantGpuCount, ConstantTotalCores, SizingStrategy,
    SizingStrategyKind,
};
pub use target::{TargetCluster, TargetWorker, WorkerInfo};

pub const DEFAULT_WORKER_COUNT: u32 = 1;
pub const DEFAULT_GPU_COUNT: u32 = 1;

/// Source cluster as written in the cluster description file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProperties {
    #[serde(default)]
    pub system: Option<SystemProperties>,
    #[serde(default)]
    pub gpu: Option<GpuProperties>,
    #[serde(default, deserialize_with = "string_map")]
    pub software_properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemProperties {
    #[serde(default)]
    pub num_cores: Option<u32>,
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub num_workers: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuProperties {
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ClusterProperties {
    /// Parse a cluster description; malformed content is an error, never "absent"
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let props: ClusterProperties = serde_yaml::from_str(content)?;
        Ok(props)
    }

    /// Load a description file, `Ok(None)` when the file does not exist
    ///
    /// Read failures surface as [`TunerError::Io`](crate::error::TunerError::Io)
    /// and malformed content as a YAML error.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        if !tokio::fs::try_exists(path).await? {
            debug!("No cluster description at {}", path.display());
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_yaml_str(&content).map(Some)
    }

    /// True when neither system nor GPU information was given
    pub fn is_empty(&self) -> bool {
        self.system.is_none() && self.gpu.is_none()
    }
}

/// Accept scalar values of any YAML type and keep them as strings
pub(crate) fn string_map<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: BTreeMap<String, serde_yaml::Value> = BTreeMap::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "property '{key}' must be a scalar, got {other:?}"
                    )))
                }
            };
            Ok((key, text))
        })
        .collect()
}

/// Source cluster with every inferable field filled in
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCluster {
    pub cores_per_worker: Option<u32>,
    pub memory_per_worker_mib: Option<u64>,
    pub num_workers: u32,
    pub gpus_per_worker: u32,
    pub gpu_name: String,
    pub gpu_memory_mib: u64,
    /// The description carried no system or GPU section at all
    pub missing_info: bool,
}

/// Pure: Fill the gaps in a raw cluster description with platform defaults
///
/// Returns the resolved record together with one comment per defaulted field.
pub fn resolve_defaults(
    raw: &ClusterProperties,
    catalog: &dyn PlatformCatalog,
) -> (ResolvedCluster, Vec<String>) {
    let mut comments = Vec::new();
    let system = raw.system.clone().unwrap_or_default();
    let gpu = raw.gpu.clone().unwrap_or_default();

    let num_workers = match system.num_workers {
        Some(n) if n > 0 => n,
        _ => {
            comments.push(format!(
                "Number of workers is missing. Setting default to {DEFAULT_WORKER_COUNT}."
            ));
            DEFAULT_WORKER_COUNT
        }
    };

    let cores_per_worker = system.num_cores.filter(|c| *c > 0);
    if cores_per_worker.is_none() {
        comments.push(
            "Number of cores per worker is missing. Executor sizing cannot be computed."
                .to_string(),
        );
    }

    let memory_per_worker_mib = system.memory.as_deref().and_then(memory_to_mib);
    if memory_per_worker_mib.is_none() {
        comments.push(
            "Worker memory is missing. Executor memory cannot be computed.".to_string(),
        );
    }

    let device = match gpu.name.as_deref().map(str::parse::<GpuDevice>) {
        Some(Ok(device)) => Some(device),
        Some(Err(_)) => None,
        None => {
            let device = catalog.default_gpu();
            comments.push(format!(
                "GPU device is missing. Setting default to {device}."
            ));
            Some(device)
        }
    };
    let gpu_name = gpu
        .name
        .clone()
        .unwrap_or_else(|| catalog.default_gpu().to_string());

    let gpus_per_worker = match gpu.count {
        Some(n) if n > 0 => n,
        _ => {
            comments.push(format!(
                "GPU count is missing. Setting default to {DEFAULT_GPU_COUNT}."
            ));
            DEFAULT_GPU_COUNT
        }
    };

    let gpu_memory_mib = match gpu.memory.as_deref().and_then(memory_to_mib) {
        Some(mib) => mib,
        None => {
            let mib = device.unwrap_or_else(|| catalog.default_gpu()).memory_mib();
            comments.push(format!(
                "GPU memory is missing. Setting default to {mib}m."
            ));
            mib
        }
    };

    let resolved = ResolvedCluster {
        cores_per_worker,
        memory_per_worker_mib,
        num_workers,
        gpus_per_worker,
        gpu_name,
        gpu_memory_mib,
        missing_info: raw.is_empty(),
    };
    (resolved, comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{BuiltinCatalog, Platform};

    const FULL: &str = r#"
system:
  numCores: 32
  memory: 212992MiB
  numWorkers: 5
gpu:
  memory: 15109MiB
  count: 4
  name: T4
softwareProperties:
  spark.executor.cores: '8'
  spark.executor.memory: 47222m
"#;

    #[test]
    fn test_full_description_needs_no_defaults() {
        let props = ClusterProperties::from_yaml_str(FULL).unwrap();
        assert_eq!(
            props.software_properties.get("spark.executor.cores"),
            Some(&"8".to_string())
        );

        let catalog = BuiltinCatalog::new(Platform::Dataproc);
        let (resolved, comments) = resolve_defaults(&props, &catalog);
        assert!(comments.is_empty(), "unexpected comments: {comments:?}");
        assert_eq!(resolved.cores_per_worker, Some(32));
        assert_eq!(resolved.memory_per_worker_mib, Some(212992));
        assert_eq!(resolved.num_workers, 5);
        assert_eq!(resolved.gpus_per_worker, 4);
        assert_eq!(resolved.gpu_name, "T4");
        assert_eq!(resolved.gpu_memory_mib, 15109);
        assert!(!resolved.missing_info);
    }

    #[test]
    fn test_missing_gpu_uses_platform_default() {
        let props = ClusterProperties::from_yaml_str(
            "system:\n  numCores: 16\n  memory: 32g\n",
        )
        .unwrap();
        let catalog = BuiltinCatalog::new(Platform::Emr);
        let (resolved, comments) = resolve_defaults(&props, &catalog);

        assert_eq!(resolved.gpu_name, "A10G");
        assert_eq!(resolved.gpus_per_worker, 1);
        assert_eq!(resolved.gpu_memory_mib, 24576);
        assert_eq!(resolved.num_workers, 1);
        assert!(comments.contains(&"GPU device is missing. Setting default to A10G.".to_string()));
        assert!(comments.contains(&"GPU count is missing. Setting default to 1.".to_string()));
        assert!(comments.contains(&"GPU memory is missing. Setting default to 24576m.".to_string()));
        assert!(comments
            .contains(&"Number of workers is missing. Setting default to 1.".to_string()));
    }

    #[test]
    fn test_empty_description_is_missing_info() {
        let props = ClusterProperties::from_yaml_str("").unwrap();
        let catalog = BuiltinCatalog::new(Platform::OnPrem);
        let (resolved, _) = resolve_defaults(&props, &catalog);
        assert!(resolved.missing_info);
        assert_eq!(resolved.cores_per_worker, None);
    }

    #[test]
    fn test_numeric_software_properties_become_strings() {
        let props = ClusterProperties::from_yaml_str(
            "softwareProperties:\n  spark.executor.cores: 8\n  spark.sql.adaptive.enabled: true\n",
        )
        .unwrap();
        assert_eq!(
            props.software_properties.get("spark.executor.cores"),
            Some(&"8".to_string())
        );
        assert_eq!(
            props.software_properties.get("spark.sql.adaptive.enabled"),
            Some(&"true".to_string())
        );
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        assert!(ClusterProperties::from_yaml_str("system: [numCores: ").is_err());
        assert!(ClusterProperties::from_yaml_str("system:\n  numCores: many\n").is_err());
    }

    #[tokio::test]
    async fn test_load_absent_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ClusterProperties::load(&dir.path().join("worker_info.yaml"))
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_yaml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worker_info.yaml");
        std::fs::write(&path, "system: [numCores: ").unwrap();
        let err = ClusterProperties::load(&path).await.unwrap_err();
        assert!(matches!(err, crate::error::TunerError::Yaml(_)));
    }
}
