//! Read-only inputs shared by every rule of one run

use std::collections::BTreeMap;

use super::definitions::keys;
use super::ledger::Ledger;
use super::memory::{MemoryPlan, MemoryShortfall};
use super::properties::PropertyStore;
use super::tool::ToolProfile;
use super::version::{AqeBand, EngineVersion};
use crate::cluster::{ClusterShape, ResolvedCluster};
use crate::platform::PlatformCatalog;
use crate::release::LatestRelease;
use crate::summary::{AppSummaryProvider, DriverLogProvider};

/// Executor cores assumed when neither the properties nor the shape know better
pub const DEFAULT_EXECUTOR_CORES: u32 = 16;

pub struct TuningContext<'a> {
    pub store: PropertyStore,
    pub app: &'a dyn AppSummaryProvider,
    pub driver_logs: Option<&'a dyn DriverLogProvider>,
    pub catalog: &'a dyn PlatformCatalog,
    pub tool: &'a dyn ToolProfile,
    pub source: ResolvedCluster,
    /// Comments produced while defaulting the source cluster
    pub cluster_comments: Vec<String>,
    pub enforced: &'a BTreeMap<String, String>,
    pub shape: Option<ClusterShape>,
    pub spark_version: Option<EngineVersion>,
    pub aqe_band: Option<AqeBand>,
    pub latest_release: &'a LatestRelease,
    /// Set by the executor rule; `None` when no budget could be attempted
    pub memory: Option<Result<MemoryPlan, MemoryShortfall>>,
}

impl TuningContext<'_> {
    /// Current value of a key: ledger, then source properties
    pub fn get(&self, ledger: &Ledger, key: &str) -> Option<String> {
        self.store.get(ledger, key)
    }

    /// Current value of a key, falling back to its definition default
    pub fn get_or_default(&self, ledger: &Ledger, key: &str) -> Option<String> {
        self.store.get_or_default(ledger, key)
    }

    /// Cores per executor the remaining rules size for
    pub fn executor_cores(&self, ledger: &Ledger) -> u32 {
        self.get(ledger, keys::EXECUTOR_CORES)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|c| *c > 0)
            .or(self.shape.as_ref().map(|s| s.cores_per_executor))
            .unwrap_or(DEFAULT_EXECUTOR_CORES)
    }

    pub fn memory_plan(&self) -> Option<&MemoryPlan> {
        self.memory.as_ref().and_then(|m| m.as_ref().ok())
    }
}
