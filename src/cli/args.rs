//! CLI argument structures

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::cluster::SizingStrategyKind;
use crate::platform::Platform;
use crate::report::ReportFormat;
use crate::tuning::ToolKind;

/// Recommend GPU-accelerated Spark settings for a profiled application
#[derive(Parser)]
#[command(name = "rapids-autotuner")]
#[command(about = "rapids-autotuner - Recommend RAPIDS Accelerator settings for a Spark application", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate recommendations for one application
    #[command(name = "recommend")]
    Recommend(RecommendArgs),

    /// Merge an application's properties with a JSON recommendation report
    #[command(name = "combine")]
    Combine(CombineArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RecommendArgs {
    /// Application summary (JSON); without it only defaults are recommended
    #[arg(short = 's', long)]
    pub summary: Option<PathBuf>,

    /// Source cluster description (YAML)
    #[arg(long)]
    pub cluster: Option<PathBuf>,

    /// Target cluster description (YAML)
    #[arg(long)]
    pub target: Option<PathBuf>,

    /// Unsupported-operator reasons from the driver log, one per line
    #[arg(long, value_name = "FILE")]
    pub driver_log_reasons: Option<PathBuf>,

    /// Platform the application runs on
    #[arg(long)]
    pub platform: Option<Platform>,

    /// How target workers are derived from the source cluster
    #[arg(long, value_name = "STRATEGY")]
    pub sizing_strategy: Option<SizingStrategyKind>,

    /// Tool flavour of the heuristics
    #[arg(long, default_value = "qualification")]
    pub tool: ToolKind,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,

    /// List unchanged properties too
    #[arg(long)]
    pub all: bool,

    /// Properties never to recommend (repeatable)
    #[arg(long = "skip-key", value_name = "KEY")]
    pub skip_keys: Vec<String>,

    /// Properties that only receive their static default (repeatable)
    #[arg(long = "limited-key", value_name = "KEY")]
    pub limited_keys: Vec<String>,

    /// Do not look up the latest plugin release
    #[arg(long)]
    pub no_release_check: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CombineArgs {
    /// Application summary (JSON) holding the source properties
    #[arg(short = 's', long)]
    pub summary: PathBuf,

    /// Report written by `recommend --format json`
    #[arg(short = 'r', long)]
    pub recommendations: PathBuf,

    /// Source cluster description (YAML) whose software properties apply
    #[arg(long)]
    pub cluster: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,
}
