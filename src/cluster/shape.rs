//! Cluster shape resolution
//!
//! Combines the defaulted source cluster with the optional target worker into
//! the executor layout the recommendations are computed for. How the number of
//! target workers is derived from the source is a pluggable [`SizingStrategy`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::target::TargetWorker;
use super::ResolvedCluster;
use crate::platform::PlatformCatalog;

/// Upper bound on cores per executor when derived from a CSP instance type
pub const MAX_CSP_CORES_PER_EXECUTOR: u32 = 16;

/// Executor layout of the target cluster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterShape {
    pub cores_per_executor: u32,
    pub num_executors: u32,
    pub num_workers: u32,
    /// GPUs per worker; each GPU backs one executor
    pub gpu_count: u32,
    pub gpu_memory_mib: u64,
    pub gpu_name: String,
    pub memory_per_worker_mib: Option<u64>,
    pub is_csp: bool,
}

impl ClusterShape {
    pub fn executors_per_worker(&self) -> u32 {
        self.gpu_count.max(1)
    }

    /// Worker memory available to one executor, before the platform fraction
    pub fn memory_per_executor_mib(&self) -> Option<f64> {
        self.memory_per_worker_mib
            .map(|mem| mem as f64 / self.executors_per_worker() as f64)
    }
}

/// Worker layout being sized, shared by source and target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerLayout {
    pub cores: u32,
    pub gpus: u32,
}

/// Policy for carrying the source cluster's capacity over to the target
pub trait SizingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Number of target workers for a source of `source_workers` workers
    fn target_workers(
        &self,
        source_workers: u32,
        source: WorkerLayout,
        target: WorkerLayout,
    ) -> u32;
}

/// Keep the total number of GPUs constant
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantGpuCount;

impl SizingStrategy for ConstantGpuCount {
    fn name(&self) -> &'static str {
        "constant-gpus"
    }

    fn target_workers(
        &self,
        source_workers: u32,
        source: WorkerLayout,
        target: WorkerLayout,
    ) -> u32 {
        let total_gpus = source_workers.saturating_mul(source.gpus.max(1));
        total_gpus.div_ceil(target.gpus.max(1)).max(1)
    }
}

/// Keep the total number of CPU cores constant
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantTotalCores;

impl SizingStrategy for ConstantTotalCores {
    fn name(&self) -> &'static str {
        "constant-cores"
    }

    fn target_workers(
        &self,
        source_workers: u32,
        source: WorkerLayout,
        target: WorkerLayout,
    ) -> u32 {
        if target.cores == 0 {
            return source_workers.max(1);
        }
        let total_cores = source_workers.saturating_mul(source.cores);
        total_cores.div_ceil(target.cores).max(1)
    }
}

/// Strategy selector used by configuration files and the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizingStrategyKind {
    #[default]
    #[serde(rename = "constant-gpus")]
    ConstantGpus,
    #[serde(rename = "constant-cores")]
    ConstantCores,
}

impl SizingStrategyKind {
    pub fn strategy(self) -> Box<dyn SizingStrategy> {
        match self {
            SizingStrategyKind::ConstantGpus => Box::new(ConstantGpuCount),
            SizingStrategyKind::ConstantCores => Box::new(ConstantTotalCores),
        }
    }
}

impl fmt::Display for SizingStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.strategy().name())
    }
}

impl FromStr for SizingStrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "constant-gpus" => Ok(Self::ConstantGpus),
            "constant-cores" => Ok(Self::ConstantCores),
            other => Err(format!("Unknown sizing strategy: {other}")),
        }
    }
}

/// Pure: Resolve the executor layout to recommend for
///
/// Returns `None` when no core count is known for either the source or the
/// target worker; callers fall back to default-only recommendations.
pub fn resolve_shape(
    source: &ResolvedCluster,
    target: Option<&TargetWorker>,
    strategy: &dyn SizingStrategy,
    catalog: &dyn PlatformCatalog,
) -> Option<ClusterShape> {
    let is_csp = catalog.is_csp();

    let shape = match target {
        None => {
            let cores = source.cores_per_worker?;
            let gpus = source.gpus_per_worker.max(1);
            ClusterShape {
                cores_per_executor: (cores / gpus).max(1),
                num_executors: source.num_workers.saturating_mul(gpus),
                num_workers: source.num_workers,
                gpu_count: gpus,
                gpu_memory_mib: source.gpu_memory_mib,
                gpu_name: source.gpu_name.clone(),
                memory_per_worker_mib: source.memory_per_worker_mib,
                is_csp,
            }
        }
        Some(worker) => {
            let cores = worker.cores().or(source.cores_per_worker)?;
            let gpus = worker.gpu_count().max(1);
            let source_layout = WorkerLayout {
                cores: source.cores_per_worker.unwrap_or(cores),
                gpus: source.gpus_per_worker,
            };
            let target_layout = WorkerLayout { cores, gpus };
            let workers =
                strategy.target_workers(source.num_workers, source_layout, target_layout);

            let mut cores_per_executor = (cores / gpus).max(1);
            if is_csp && worker.is_instance_type() {
                cores_per_executor = cores_per_executor.min(MAX_CSP_CORES_PER_EXECUTOR);
            }

            ClusterShape {
                cores_per_executor,
                num_executors: workers.saturating_mul(gpus),
                num_workers: workers,
                gpu_count: gpus,
                gpu_memory_mib: worker.gpu().memory_mib(),
                gpu_name: worker.gpu().to_string(),
                memory_per_worker_mib: worker.memory_mib().or(source.memory_per_worker_mib),
                is_csp,
            }
        }
    };

    debug!(
        "Resolved cluster shape with {} strategy: {} executors x {} cores",
        strategy.name(),
        shape.num_executors,
        shape.cores_per_executor
    );
    Some(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{BuiltinCatalog, GpuDevice, Platform};

    fn source(cores: Option<u32>, workers: u32, gpus: u32) -> ResolvedCluster {
        ResolvedCluster {
            cores_per_worker: cores,
            memory_per_worker_mib: Some(65536),
            num_workers: workers,
            gpus_per_worker: gpus,
            gpu_name: "T4".to_string(),
            gpu_memory_mib: 15109,
            missing_info: false,
        }
    }

    #[test]
    fn test_shape_from_source_only() {
        let catalog = BuiltinCatalog::new(Platform::OnPrem);
        let shape = resolve_shape(&source(Some(32), 2, 4), None, &ConstantGpuCount, &catalog)
            .unwrap();
        assert_eq!(shape.cores_per_executor, 8);
        assert_eq!(shape.num_executors, 8);
        assert_eq!(shape.num_workers, 2);
        assert_eq!(shape.memory_per_executor_mib(), Some(16384.0));
        assert!(!shape.is_csp);
    }

    #[test]
    fn test_no_cores_means_no_shape() {
        let catalog = BuiltinCatalog::new(Platform::OnPrem);
        assert!(resolve_shape(&source(None, 2, 1), None, &ConstantGpuCount, &catalog).is_none());
    }

    #[test]
    fn test_constant_gpu_strategy_with_instance_target() {
        let catalog = BuiltinCatalog::new(Platform::Dataproc);
        let worker = TargetWorker::Instance {
            name: "g2-standard-24".to_string(),
            shape: catalog.instance_shape("g2-standard-24").unwrap(),
        };
        // 4 workers x 1 GPU = 4 GPUs -> 2 workers x 2 GPUs
        let shape = resolve_shape(
            &source(Some(16), 4, 1),
            Some(&worker),
            &ConstantGpuCount,
            &catalog,
        )
        .unwrap();
        assert_eq!(shape.num_workers, 2);
        assert_eq!(shape.num_executors, 4);
        assert_eq!(shape.cores_per_executor, 12);
        assert_eq!(shape.gpu_name, "L4");
        assert!(shape.is_csp);
    }

    #[test]
    fn test_constant_cores_strategy() {
        let catalog = BuiltinCatalog::new(Platform::OnPrem);
        let worker = TargetWorker::Explicit {
            cores: Some(8),
            memory_mib: Some(32768),
            gpu_count: 1,
            gpu: GpuDevice::A100,
        };
        // 3 workers x 16 cores = 48 cores -> 6 workers of 8 cores
        let shape = resolve_shape(
            &source(Some(16), 3, 1),
            Some(&worker),
            &ConstantTotalCores,
            &catalog,
        )
        .unwrap();
        assert_eq!(shape.num_workers, 6);
        assert_eq!(shape.cores_per_executor, 8);
        assert_eq!(shape.gpu_memory_mib, 40960);
        assert_eq!(shape.memory_per_worker_mib, Some(32768));
    }

    #[test]
    fn test_csp_instance_caps_cores_per_executor() {
        let catalog = BuiltinCatalog::new(Platform::Dataproc);
        let worker = TargetWorker::Instance {
            name: "g2-standard-32".to_string(),
            shape: catalog.instance_shape("g2-standard-32").unwrap(),
        };
        let shape = resolve_shape(
            &source(Some(32), 1, 1),
            Some(&worker),
            &ConstantGpuCount,
            &catalog,
        )
        .unwrap();
        assert_eq!(shape.cores_per_executor, MAX_CSP_CORES_PER_EXECUTOR);
    }

    #[test]
    fn test_extreme_counts_saturate() {
        let catalog = BuiltinCatalog::new(Platform::OnPrem);
        let shape = resolve_shape(
            &source(Some(u32::MAX), u32::MAX, 8),
            None,
            &ConstantGpuCount,
            &catalog,
        )
        .unwrap();
        assert_eq!(shape.num_executors, u32::MAX);

        let huge = WorkerLayout {
            cores: u32::MAX,
            gpus: u32::MAX,
        };
        let small = WorkerLayout { cores: 1, gpus: 1 };
        assert_eq!(ConstantGpuCount.target_workers(u32::MAX, huge, small), u32::MAX);
        assert_eq!(ConstantTotalCores.target_workers(u32::MAX, huge, small), u32::MAX);
    }

    #[test]
    fn test_strategy_kind_parsing() {
        assert_eq!(
            "constant-cores".parse::<SizingStrategyKind>().unwrap(),
            SizingStrategyKind::ConstantCores
        );
        assert_eq!(SizingStrategyKind::default().to_string(), "constant-gpus");
        assert!("random".parse::<SizingStrategyKind>().is_err());
    }
}
