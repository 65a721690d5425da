//! `recommend` command implementation

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::cli::args::RecommendArgs;
use crate::cluster::{ClusterProperties, TargetCluster};
use crate::error::TunerError;
use crate::config::{ConfigValidator, TunerConfig};
use crate::release::{resolve_latest_release, LatestRelease, MavenReleaseLookup};
use crate::report::TuningReport;
use crate::summary::{AppSummary, DriverLogReasons};
use crate::tuning::{AutoTuner, OutputFilter};

/// Execute the recommend command
pub async fn run_recommend_command(args: RecommendArgs, config: TunerConfig) -> Result<String> {
    let config = apply_overrides(config, &args)?;
    let platform = config.platform()?;
    let strategy = config.sizing_strategy()?;

    let app = match &args.summary {
        Some(path) => AppSummary::load(path)
            .with_context(|| format!("Failed to read application summary {}", path.display()))?,
        None => {
            info!("No application summary given, recommending defaults only");
            AppSummary::unavailable()
        }
    };
    let app_id = app.app_id.clone();

    let latest = if config.check_latest_release && !app.rapids_jars.is_empty() {
        lookup_latest_release(&config).await
    } else {
        debug!("Skipping latest release lookup");
        LatestRelease::NotChecked
    };

    let mut builder = AutoTuner::builder(app)
        .platform(platform)
        .tool(args.tool)
        .sizing_strategy(strategy)
        .skip_keys(config.skip_keys.iter().cloned())
        .limited_logic_keys(config.limited_logic_keys.iter().cloned())
        .latest_release(latest);

    if let Some(path) = &args.cluster {
        let loaded = match ClusterProperties::load(path).await {
            Ok(Some(cluster)) => Ok(cluster),
            Ok(None) => {
                return Err(anyhow!(
                    "Failed to read cluster description {}: file not found",
                    path.display()
                ))
            }
            Err(e) => Err(unreadable(e, path, "cluster description")?),
        };
        builder = builder.loaded_cluster(loaded);
    }
    if let Some(path) = &args.target {
        let loaded = match TargetCluster::load(path).await {
            Ok(target) => Ok(target),
            Err(e) => Err(unreadable(e, path, "target cluster description")?),
        };
        builder = builder.loaded_target(loaded);
    }
    if let Some(path) = &args.driver_log_reasons {
        let reasons = DriverLogReasons::load(path)
            .with_context(|| format!("Failed to read driver log reasons {}", path.display()))?;
        builder = builder.driver_logs(reasons);
    }

    let build = builder.build().context("Invalid cluster description")?;
    if build.is_degraded() {
        warn!("Recommendations are based on defaults, see the report comments");
    }
    let tuner = build.into_tuner();

    let filter = if config.show_only_changed {
        OutputFilter::ChangedOnly
    } else {
        OutputFilter::All
    };
    let recommendations = tuner.recommend();
    let report = TuningReport::new(&recommendations, filter, platform, args.tool, app_id);
    Ok(report.render(args.format)?)
}

/// Pure: Apply command-line flags on top of the loaded configuration
pub fn apply_overrides(mut config: TunerConfig, args: &RecommendArgs) -> Result<TunerConfig> {
    if let Some(platform) = args.platform {
        config.platform = platform.to_string();
    }
    if let Some(strategy) = args.sizing_strategy {
        config.sizing_strategy = strategy.to_string();
    }
    if args.all {
        config.show_only_changed = false;
    }
    if args.no_release_check {
        config.check_latest_release = false;
    }
    for key in &args.skip_keys {
        if !config.skip_keys.contains(key) {
            config.skip_keys.push(key.clone());
        }
    }
    for key in &args.limited_keys {
        if !config.limited_logic_keys.contains(key) {
            config.limited_logic_keys.push(key.clone());
        }
    }
    ConfigValidator::validate_config(&config)?;
    Ok(config)
}

async fn lookup_latest_release(config: &TunerConfig) -> LatestRelease {
    match MavenReleaseLookup::new(&config.release_metadata_url, config.release_lookup_timeout) {
        Ok(lookup) => resolve_latest_release(&lookup).await,
        Err(e) => {
            warn!("Could not create release lookup client: {}", e);
            LatestRelease::Unavailable
        }
    }
}

/// I/O failures stop the command; parse failures are handed to the tuner
fn unreadable(error: TunerError, path: &Path, what: &str) -> Result<TunerError> {
    match error {
        TunerError::Io(e) => {
            Err(e).with_context(|| format!("Failed to read {what} {}", path.display()))
        }
        other => Ok(other),
    }
}
