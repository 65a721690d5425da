//! Platform catalog
//!
//! Everything the tuner needs to know about where the target cluster runs:
//! default GPU, instance shapes, usable memory fraction, shuffle-manager builds
//! and platform-specific property overrides.

pub mod gpu;
pub mod instances;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tuning::version::EngineVersion;

pub use gpu::GpuDevice;
pub use instances::InstanceShape;

/// Property carrying the Databricks runtime version, e.g. `12.2.x-gpu-ml-scala2.12`
pub const DATABRICKS_RUNTIME_KEY: &str = "spark.databricks.clusterUsageTags.sparkVersion";

const SHUFFLE_MANAGER_TEMPLATE_PREFIX: &str = "com.nvidia.spark.rapids.spark";
const SHUFFLE_MANAGER_TEMPLATE_SUFFIX: &str = ".RapidsShuffleManager";

/// Apache Spark releases with a RAPIDS shuffle manager build
const SUPPORTED_SPARK_SHIMS: &[&str] = &[
    "320", "321", "322", "323", "324", "330", "331", "332", "333", "334", "340", "341", "342",
    "343", "350", "351", "352",
];

/// Databricks runtimes with a RAPIDS shuffle manager build
const DATABRICKS_SHIMS: &[(&str, &str)] = &[("11.3", "330db"), ("12.2", "332db"), ("13.3", "341db")];

const DATABRICKS_INCLUDES: &[(&str, &str)] =
    &[("spark.databricks.optimizer.dynamicFilePruning", "false")];

const DATABRICKS_EXCLUDES: &[&str] = &[
    "spark.executor.cores",
    "spark.executor.instances",
    "spark.executor.memory",
    "spark.executor.memoryOverhead",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    #[serde(rename = "onprem")]
    OnPrem,
    Dataproc,
    Emr,
    DatabricksAws,
    DatabricksAzure,
}

impl Default for Platform {
    fn default() -> Self {
        Self::OnPrem
    }
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::OnPrem => "onprem",
            Platform::Dataproc => "dataproc",
            Platform::Emr => "emr",
            Platform::DatabricksAws => "databricks-aws",
            Platform::DatabricksAzure => "databricks-azure",
        }
    }

    pub fn is_databricks(self) -> bool {
        matches!(self, Platform::DatabricksAws | Platform::DatabricksAzure)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onprem" | "on-prem" => Ok(Platform::OnPrem),
            "dataproc" => Ok(Platform::Dataproc),
            "emr" => Ok(Platform::Emr),
            "databricks-aws" => Ok(Platform::DatabricksAws),
            "databricks-azure" => Ok(Platform::DatabricksAzure),
            other => Err(format!("Unknown platform: {other}")),
        }
    }
}

/// Outcome of looking up a shuffle manager for the detected engine version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShuffleManagerLookup {
    Supported(String),
    Unsupported(String),
    Undetermined,
}

/// Lookup service describing one platform
pub trait PlatformCatalog: Send + Sync {
    fn platform(&self) -> Platform;

    fn default_gpu(&self) -> GpuDevice;

    /// Whether the platform is a cloud service provider
    fn is_csp(&self) -> bool;

    /// Fraction of worker memory the resource manager hands to executors
    fn executor_memory_fraction(&self) -> f64;

    fn instance_shape(&self, instance_type: &str) -> Option<InstanceShape>;

    fn shuffle_manager(
        &self,
        spark_version: Option<&EngineVersion>,
        runtime_version: Option<&str>,
    ) -> ShuffleManagerLookup;

    /// Properties the platform always wants set when the source left them unset
    fn forced_recommendations(&self) -> &'static [(&'static str, &'static str)];

    /// Properties the platform does not allow users to set
    fn excluded_keys(&self) -> &'static [&'static str];
}

/// Catalog backed by the built-in tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinCatalog {
    platform: Platform,
}

impl BuiltinCatalog {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

fn shuffle_manager_class(tag: &str) -> String {
    format!("{SHUFFLE_MANAGER_TEMPLATE_PREFIX}{tag}{SHUFFLE_MANAGER_TEMPLATE_SUFFIX}")
}

impl PlatformCatalog for BuiltinCatalog {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn default_gpu(&self) -> GpuDevice {
        match self.platform {
            Platform::OnPrem | Platform::Dataproc => GpuDevice::L4,
            Platform::Emr | Platform::DatabricksAws => GpuDevice::A10G,
            Platform::DatabricksAzure => GpuDevice::T4,
        }
    }

    fn is_csp(&self) -> bool {
        self.platform != Platform::OnPrem
    }

    fn executor_memory_fraction(&self) -> f64 {
        if self.platform.is_databricks() {
            0.9
        } else {
            0.8
        }
    }

    fn instance_shape(&self, instance_type: &str) -> Option<InstanceShape> {
        instances::lookup(self.platform, instance_type)
    }

    fn shuffle_manager(
        &self,
        spark_version: Option<&EngineVersion>,
        runtime_version: Option<&str>,
    ) -> ShuffleManagerLookup {
        if self.platform.is_databricks() {
            let Some(runtime) = runtime_version else {
                return ShuffleManagerLookup::Undetermined;
            };
            return DATABRICKS_SHIMS
                .iter()
                .find(|(prefix, _)| runtime.starts_with(prefix))
                .map(|(_, tag)| ShuffleManagerLookup::Supported(shuffle_manager_class(tag)))
                .unwrap_or_else(|| ShuffleManagerLookup::Unsupported(runtime.to_string()));
        }

        match spark_version {
            None => ShuffleManagerLookup::Undetermined,
            Some(version) => {
                let tag = version.shim_tag();
                if SUPPORTED_SPARK_SHIMS.contains(&tag.as_str()) {
                    ShuffleManagerLookup::Supported(shuffle_manager_class(&tag))
                } else {
                    ShuffleManagerLookup::Unsupported(version.raw().to_string())
                }
            }
        }
    }

    fn forced_recommendations(&self) -> &'static [(&'static str, &'static str)] {
        if self.platform.is_databricks() {
            DATABRICKS_INCLUDES
        } else {
            &[]
        }
    }

    fn excluded_keys(&self) -> &'static [&'static str] {
        if self.platform.is_databricks() {
            DATABRICKS_EXCLUDES
        } else {
            &[]
        }
    }
}
