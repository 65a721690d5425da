//! AutoTuner facade
//!
//! [`AutoTunerBuilder`] validates the inputs once. Contradictory target
//! descriptions are hard errors; unparseable cluster descriptions produce a
//! [`TunerBuild::Degraded`] tuner that runs on defaults and explains why.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::context::TuningContext;
use super::ledger::{KeyPolicy, Ledger, Recommendations};
use super::properties::PropertyStore;
use super::rules::pipeline;
use super::tool::{ToolKind, ToolProfile};
use super::version::{AqeBand, EngineVersion};
use crate::cluster::{
    resolve_defaults, resolve_shape, ClusterProperties, SizingStrategyKind, TargetCluster,
    TargetWorker,
};
use crate::error::{Result, TunerError};
use crate::platform::{BuiltinCatalog, Platform, PlatformCatalog};
use crate::release::LatestRelease;
use crate::summary::{AppSummaryProvider, DriverLogProvider};

/// Raw or parsed description handed to the builder
enum Description<T> {
    Parsed(T),
    Text(String),
    /// A loader failed to parse the description
    Failed(String),
}

impl<T> Description<T> {
    fn resolve(self, parse: impl FnOnce(&str) -> Result<T>) -> std::result::Result<T, String> {
        match self {
            Description::Parsed(value) => Ok(value),
            Description::Text(text) => parse(&text).map_err(|e| e.to_string()),
            Description::Failed(message) => Err(message),
        }
    }
}

impl<T> From<Result<T>> for Description<T> {
    fn from(loaded: Result<T>) -> Self {
        match loaded {
            Ok(value) => Description::Parsed(value),
            Err(e) => Description::Failed(e.to_string()),
        }
    }
}

pub struct AutoTunerBuilder {
    app: Box<dyn AppSummaryProvider>,
    driver_logs: Option<Box<dyn DriverLogProvider>>,
    catalog: Box<dyn PlatformCatalog>,
    tool: ToolKind,
    strategy: SizingStrategyKind,
    cluster: Option<Description<ClusterProperties>>,
    target: Option<Description<TargetCluster>>,
    policy: KeyPolicy,
    latest_release: LatestRelease,
}

impl AutoTunerBuilder {
    pub fn new(app: impl AppSummaryProvider + 'static) -> Self {
        Self {
            app: Box::new(app),
            driver_logs: None,
            catalog: Box::new(BuiltinCatalog::new(Platform::default())),
            tool: ToolKind::default(),
            strategy: SizingStrategyKind::default(),
            cluster: None,
            target: None,
            policy: KeyPolicy::default(),
            latest_release: LatestRelease::NotChecked,
        }
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.catalog = Box::new(BuiltinCatalog::new(platform));
        self
    }

    pub fn catalog(mut self, catalog: impl PlatformCatalog + 'static) -> Self {
        self.catalog = Box::new(catalog);
        self
    }

    pub fn tool(mut self, tool: ToolKind) -> Self {
        self.tool = tool;
        self
    }

    pub fn sizing_strategy(mut self, strategy: SizingStrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn driver_logs(mut self, driver_logs: impl DriverLogProvider + 'static) -> Self {
        self.driver_logs = Some(Box::new(driver_logs));
        self
    }

    pub fn cluster(mut self, cluster: ClusterProperties) -> Self {
        self.cluster = Some(Description::Parsed(cluster));
        self
    }

    /// Cluster description as YAML text, parsed at build time
    pub fn cluster_yaml(mut self, content: impl Into<String>) -> Self {
        self.cluster = Some(Description::Text(content.into()));
        self
    }

    /// Outcome of [`ClusterProperties::load`]; a failure degrades the tuner
    pub fn loaded_cluster(mut self, loaded: Result<ClusterProperties>) -> Self {
        self.cluster = Some(loaded.into());
        self
    }

    /// Outcome of [`TargetCluster::load`]; a failure degrades the tuner
    pub fn loaded_target(mut self, loaded: Result<TargetCluster>) -> Self {
        self.target = Some(loaded.into());
        self
    }

    pub fn target(mut self, target: TargetCluster) -> Self {
        self.target = Some(Description::Parsed(target));
        self
    }

    /// Target cluster as YAML text, parsed at build time
    pub fn target_yaml(mut self, content: impl Into<String>) -> Self {
        self.target = Some(Description::Text(content.into()));
        self
    }

    pub fn skip_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.skip.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn limited_logic_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.limited.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn latest_release(mut self, latest: LatestRelease) -> Self {
        self.latest_release = latest;
        self
    }

    /// Validate the inputs
    ///
    /// Only a contradictory target worker is an `Err`. Descriptions that do not
    /// parse are replaced by empty ones and reported on the degraded tuner.
    pub fn build(self) -> Result<TunerBuild> {
        let mut diagnostics = Vec::new();

        let cluster = match self.cluster.map(|d| d.resolve(ClusterProperties::from_yaml_str)) {
            None => ClusterProperties::default(),
            Some(Ok(c)) => c,
            Some(Err(e)) => {
                warn!("Cluster description could not be parsed: {}", e);
                diagnostics.push(format!(
                    "Exception reading the cluster description, using defaults: {e}"
                ));
                ClusterProperties::default()
            }
        };

        let target = match self.target.map(|d| d.resolve(TargetCluster::from_yaml_str)) {
            None => None,
            Some(Ok(t)) => Some(t),
            Some(Err(e)) => {
                warn!("Target cluster description could not be parsed: {}", e);
                diagnostics.push(format!(
                    "Exception reading the target cluster description, using defaults: {e}"
                ));
                None
            }
        };

        let target_worker = match &target {
            Some(t) => match t.worker(self.catalog.as_ref()) {
                Ok(worker) => worker,
                Err(e @ TunerError::InputContradiction(_)) => return Err(e),
                Err(e) => {
                    warn!("Target worker ignored: {}", e);
                    diagnostics.push(format!("Target worker ignored: {e}"));
                    None
                }
            },
            None => None,
        };

        let mut policy = self.policy;
        policy
            .skip
            .extend(self.catalog.excluded_keys().iter().map(|k| k.to_string()));

        let tuner = AutoTuner {
            app: self.app,
            driver_logs: self.driver_logs,
            catalog: self.catalog,
            tool: self.tool.profile(),
            strategy: self.strategy,
            cluster,
            target_worker,
            enforced: target.map(|t| t.spark_properties.enforced).unwrap_or_default(),
            policy,
            latest_release: self.latest_release,
            diagnostics,
        };

        if tuner.diagnostics.is_empty() {
            Ok(TunerBuild::Ready(tuner))
        } else {
            Ok(TunerBuild::Degraded(tuner))
        }
    }
}

/// Outcome of [`AutoTunerBuilder::build`]
pub enum TunerBuild {
    Ready(AutoTuner),
    /// Inputs were partly unusable; the tuner runs on defaults
    Degraded(AutoTuner),
}

impl TunerBuild {
    pub fn is_degraded(&self) -> bool {
        matches!(self, TunerBuild::Degraded(_))
    }

    pub fn into_tuner(self) -> AutoTuner {
        match self {
            TunerBuild::Ready(tuner) | TunerBuild::Degraded(tuner) => tuner,
        }
    }
}

/// Recommendation engine for one application
pub struct AutoTuner {
    app: Box<dyn AppSummaryProvider>,
    driver_logs: Option<Box<dyn DriverLogProvider>>,
    catalog: Box<dyn PlatformCatalog>,
    tool: Box<dyn ToolProfile>,
    strategy: SizingStrategyKind,
    cluster: ClusterProperties,
    target_worker: Option<TargetWorker>,
    enforced: BTreeMap<String, String>,
    policy: KeyPolicy,
    latest_release: LatestRelease,
    diagnostics: Vec<String>,
}

impl AutoTuner {
    pub fn builder(app: impl AppSummaryProvider + 'static) -> AutoTunerBuilder {
        AutoTunerBuilder::new(app)
    }

    /// Comments explaining why the tuner is degraded
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn platform(&self) -> Platform {
        self.catalog.platform()
    }

    /// Run every rule and return the finalized recommendations
    ///
    /// Each call starts from a fresh ledger, so repeated calls give identical
    /// results.
    pub fn recommend(&self) -> Recommendations {
        let (source, cluster_comments) = resolve_defaults(&self.cluster, self.catalog.as_ref());
        let strategy = self.strategy.strategy();
        let shape = resolve_shape(
            &source,
            self.target_worker.as_ref(),
            strategy.as_ref(),
            self.catalog.as_ref(),
        );
        let spark_version = self.app.spark_version().and_then(EngineVersion::parse);
        if spark_version.is_none() {
            debug!("Spark version unknown, version-gated rules are skipped");
        }

        let store = PropertyStore::new(self.app.properties(), &self.cluster.software_properties);
        let mut ledger = Ledger::new(&store, self.policy.clone());
        for diagnostic in &self.diagnostics {
            ledger.add_comment_once(diagnostic.clone());
        }

        let mut ctx = TuningContext {
            store,
            app: self.app.as_ref(),
            driver_logs: self.driver_logs.as_deref(),
            catalog: self.catalog.as_ref(),
            tool: self.tool.as_ref(),
            source,
            cluster_comments,
            enforced: &self.enforced,
            shape,
            aqe_band: spark_version.as_ref().map(AqeBand::for_version),
            spark_version,
            latest_release: &self.latest_release,
            memory: None,
        };

        for rule in pipeline() {
            debug!("Applying rule {}", rule.name());
            rule.apply(&mut ctx, &mut ledger);
        }

        let recommendations = ledger.finalize();
        info!(
            "Generated {} properties and {} comments with the {} tool",
            recommendations.entries().len(),
            recommendations.comments().len(),
            self.tool.name()
        );
        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::AppSummary;
    use crate::tuning::definitions::keys;
    use crate::tuning::ledger::OutputFilter;
    use crate::tuning::rules::NO_SHAPE_COMMENT;

    const CLUSTER: &str = r#"
system:
  numCores: 32
  memory: 122880MiB
  numWorkers: 4
gpu:
  count: 2
  memory: 24576MiB
  name: L4
"#;

    fn app() -> AppSummary {
        AppSummary {
            spark_version: Some("3.4.1".to_string()),
            ..AppSummary::default()
        }
    }

    #[test]
    fn test_full_run() {
        let tuner = AutoTuner::builder(app())
            .platform(Platform::Dataproc)
            .cluster_yaml(CLUSTER)
            .build()
            .unwrap();
        assert!(!tuner.is_degraded());
        let recs = tuner.into_tuner().recommend();

        assert_eq!(recs.value(keys::EXECUTOR_CORES), Some("16".to_string()));
        assert_eq!(recs.value(keys::EXECUTOR_INSTANCES), Some("8".to_string()));
        assert_eq!(recs.value(keys::SQL_ENABLED), Some("true".to_string()));
        assert_eq!(
            recs.value(keys::SHUFFLE_MANAGER),
            Some("com.nvidia.spark.rapids.spark341.RapidsShuffleManager".to_string())
        );
        assert!(!recs.comments().contains(&NO_SHAPE_COMMENT.to_string()));
    }

    #[test]
    fn test_malformed_cluster_is_degraded() {
        let build = AutoTuner::builder(app())
            .cluster_yaml("system: [numCores: ")
            .build()
            .unwrap();
        assert!(build.is_degraded());
        let recs = build.into_tuner().recommend();
        assert!(recs
            .comments()
            .iter()
            .any(|c| c.starts_with("Exception reading the cluster description")));
        assert!(recs.comments().contains(&NO_SHAPE_COMMENT.to_string()));
    }

    #[test]
    fn test_failed_cluster_load_is_degraded() {
        let build = AutoTuner::builder(app())
            .loaded_cluster(ClusterProperties::from_yaml_str("gpu: {count: ["))
            .loaded_target(TargetCluster::from_yaml_str(
                "sparkProperties:\n  enforced:\n    spark.sql.shuffle.partitions: 400\n",
            ))
            .build()
            .unwrap();
        assert!(build.is_degraded());
        let recs = build.into_tuner().recommend();
        assert!(recs
            .comments()
            .iter()
            .any(|c| c.starts_with("Exception reading the cluster description")));
        assert_eq!(
            recs.value(keys::SHUFFLE_PARTITIONS),
            Some("400".to_string())
        );
    }

    #[test]
    fn test_contradictory_target_is_error() {
        let result = AutoTuner::builder(app())
            .platform(Platform::Dataproc)
            .target_yaml(
                "workerInfo:\n  instanceType: g2-standard-8\n  cpuCores: 8\n  memoryGB: 32\n  \
                 gpu:\n    count: 1\n    name: l4\n",
            )
            .build();
        assert!(matches!(result, Err(TunerError::InputContradiction(_))));
    }

    #[test]
    fn test_recommend_is_idempotent() {
        let tuner = AutoTuner::builder(app())
            .cluster_yaml(CLUSTER)
            .target_yaml("sparkProperties:\n  enforced:\n    spark.sql.shuffle.partitions: 400\n")
            .build()
            .unwrap()
            .into_tuner();
        let first = tuner.recommend();
        let second = tuner.recommend();
        assert_eq!(first, second);
        assert_eq!(
            first.value(keys::SHUFFLE_PARTITIONS),
            Some("400".to_string())
        );
    }

    #[test]
    fn test_databricks_excludes_executor_keys() {
        let recs = AutoTuner::builder(app())
            .platform(Platform::DatabricksAws)
            .cluster_yaml(CLUSTER)
            .build()
            .unwrap()
            .into_tuner()
            .recommend();
        let props = recs.properties(OutputFilter::All);
        assert!(!props.iter().any(|(k, _)| k == keys::EXECUTOR_CORES));
        assert!(!props.iter().any(|(k, _)| k == keys::EXECUTOR_MEMORY));
        assert!(props
            .iter()
            .any(|(k, v)| k == "spark.databricks.optimizer.dynamicFilePruning" && v == "false"));
    }

    #[test]
    fn test_skip_keys_suppress_recommendations() {
        let recs = AutoTuner::builder(app())
            .cluster_yaml(CLUSTER)
            .skip_keys([keys::SQL_ENABLED])
            .build()
            .unwrap()
            .into_tuner()
            .recommend();
        assert_eq!(recs.value(keys::SQL_ENABLED), None);
    }
}
