//! Tool-specific adjustments of the base heuristics
//!
//! Qualification runs on CPU event logs and uses the base heuristics as they
//! are. Profiling runs on GPU event logs and also reacts to out-of-memory
//! failures observed on the GPU.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::summary::AppSummaryProvider;

/// Multiplier applied to shuffle partitions after task OOMs in shuffle stages
pub const OOM_SHUFFLE_PARTITION_MULTIPLIER: u64 = 4;

/// Adjusted value and the comment explaining the adjustment
pub type Adjustment = (u64, Option<String>);

pub trait ToolProfile: Send + Sync {
    fn name(&self) -> &'static str;

    /// Final max partition size in MiB given the input-size based value
    fn max_partition_bytes_mib(
        &self,
        _app: &dyn AppSummaryProvider,
        _current_mib: u64,
        input_based_mib: u64,
    ) -> Adjustment {
        (input_based_mib, None)
    }

    /// Final shuffle partition count given the spill based value
    fn shuffle_partitions(
        &self,
        _app: &dyn AppSummaryProvider,
        _current: u64,
        spill_based: u64,
    ) -> Adjustment {
        (spill_based, None)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QualificationTool;

impl ToolProfile for QualificationTool {
    fn name(&self) -> &'static str {
        "qualification"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfilingTool;

impl ToolProfile for ProfilingTool {
    fn name(&self) -> &'static str {
        "profiling"
    }

    fn max_partition_bytes_mib(
        &self,
        app: &dyn AppSummaryProvider,
        current_mib: u64,
        input_based_mib: u64,
    ) -> Adjustment {
        if app.scan_stages_with_gpu_oom().is_empty() {
            return (input_based_mib, None);
        }
        let halved = (current_mib / 2).max(1);
        (
            halved.min(input_based_mib),
            Some(
                "'spark.sql.files.maxPartitionBytes' should be decreased since GPU out of memory \
                 errors occurred in scan stages."
                    .to_string(),
            ),
        )
    }

    fn shuffle_partitions(
        &self,
        app: &dyn AppSummaryProvider,
        current: u64,
        spill_based: u64,
    ) -> Adjustment {
        if app.shuffle_stages_with_task_oom().is_empty() {
            return (spill_based, None);
        }
        (
            spill_based.max(current.saturating_mul(OOM_SHUFFLE_PARTITION_MULTIPLIER)),
            Some(
                "'spark.sql.shuffle.partitions' should be increased since task out of memory \
                 errors occurred in shuffle stages."
                    .to_string(),
            ),
        )
    }
}

/// Tool selector used by configuration files and the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Qualification,
    Profiling,
}

impl ToolKind {
    pub fn profile(self) -> Box<dyn ToolProfile> {
        match self {
            ToolKind::Qualification => Box::new(QualificationTool),
            ToolKind::Profiling => Box::new(ProfilingTool),
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qualification" => Ok(Self::Qualification),
            "profiling" => Ok(Self::Profiling),
            other => Err(format!("Unknown tool: {other}")),
        }
    }
}
