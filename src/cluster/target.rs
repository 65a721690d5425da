//! Target cluster description
//!
//! A target worker is described either by a named instance type or by explicit
//! resources, never both. Explicit resources must name the GPU.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, TunerError};
use crate::platform::{GpuDevice, InstanceShape, PlatformCatalog};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCluster {
    #[serde(default)]
    pub worker_info: Option<WorkerInfo>,
    #[serde(default)]
    pub spark_properties: SparkPropertiesSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerInfo {
    #[serde(default)]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub cpu_cores: Option<u32>,
    #[serde(default, rename = "memoryGB")]
    pub memory_gb: Option<f64>,
    #[serde(default)]
    pub gpu: Option<TargetGpu>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetGpu {
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparkPropertiesSection {
    /// Values that win over every computed recommendation
    #[serde(default, deserialize_with = "super::string_map")]
    pub enforced: BTreeMap<String, String>,
}

/// Validated target worker
#[derive(Debug, Clone, PartialEq)]
pub enum TargetWorker {
    Instance {
        name: String,
        shape: InstanceShape,
    },
    Explicit {
        cores: Option<u32>,
        memory_mib: Option<u64>,
        gpu_count: u32,
        gpu: GpuDevice,
    },
}

impl TargetWorker {
    pub fn cores(&self) -> Option<u32> {
        match self {
            TargetWorker::Instance { shape, .. } => Some(shape.cores),
            TargetWorker::Explicit { cores, .. } => *cores,
        }
    }

    pub fn memory_mib(&self) -> Option<u64> {
        match self {
            TargetWorker::Instance { shape, .. } => Some(shape.memory_mib),
            TargetWorker::Explicit { memory_mib, .. } => *memory_mib,
        }
    }

    pub fn gpu_count(&self) -> u32 {
        match self {
            TargetWorker::Instance { shape, .. } => shape.gpu_count,
            TargetWorker::Explicit { gpu_count, .. } => *gpu_count,
        }
    }

    pub fn gpu(&self) -> GpuDevice {
        match self {
            TargetWorker::Instance { shape, .. } => shape.gpu,
            TargetWorker::Explicit { gpu, .. } => *gpu,
        }
    }

    pub fn is_instance_type(&self) -> bool {
        matches!(self, TargetWorker::Instance { .. })
    }
}

impl TargetCluster {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_yaml_str(&content)
    }

    pub fn enforced(&self) -> &BTreeMap<String, String> {
        &self.spark_properties.enforced
    }

    /// Validate the worker description against the platform catalog
    ///
    /// `Ok(None)` means the target leaves the worker shape to the source cluster.
    pub fn worker(&self, catalog: &dyn PlatformCatalog) -> Result<Option<TargetWorker>> {
        let Some(info) = &self.worker_info else {
            return Ok(None);
        };

        let has_explicit =
            info.cpu_cores.is_some() || info.memory_gb.is_some() || info.gpu.is_some();

        if let Some(instance) = &info.instance_type {
            if has_explicit {
                return Err(TunerError::InputContradiction(format!(
                    "Target worker specifies instance type '{instance}' together with explicit \
                     cpuCores/memoryGB/gpu. Use one or the other."
                )));
            }
            let shape = catalog.instance_shape(instance).ok_or_else(|| {
                TunerError::Validation(format!(
                    "Instance type '{instance}' is not known for platform '{}'",
                    catalog.platform()
                ))
            })?;
            return Ok(Some(TargetWorker::Instance {
                name: instance.clone(),
                shape,
            }));
        }

        if !has_explicit {
            return Ok(None);
        }

        let Some(gpu) = &info.gpu else {
            return Err(TunerError::InputContradiction(
                "Target worker specifies cpuCores/memoryGB without a gpu section. \
                 GPU information is required for the target cluster."
                    .to_string(),
            ));
        };

        let device = match &gpu.name {
            Some(name) => name
                .parse::<GpuDevice>()
                .map_err(TunerError::Validation)?,
            None => catalog.default_gpu(),
        };
        let memory_mib = info.memory_gb.map(|gb| (gb * 1024.0) as u64);

        Ok(Some(TargetWorker::Explicit {
            cores: info.cpu_cores.filter(|c| *c > 0),
            memory_mib,
            gpu_count: gpu.count.filter(|c| *c > 0).unwrap_or(super::DEFAULT_GPU_COUNT),
            gpu: device,
        }))
    }
}
