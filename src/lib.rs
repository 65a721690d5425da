//! # RAPIDS AutoTuner
//!
//! Recommends runtime settings for running a profiled Apache Spark application on
//! GPUs with the RAPIDS Accelerator.
//!
//! ## Usage
//!
//! ```bash
//! rapids-autotuner recommend --summary app.json --cluster cluster.yaml [--target target.yaml]
//! ```
//!
//! ## Modules
//!
//! - `app` - Process-level logging and fatal error handling
//! - `cli` - Argument parsing and command implementations
//! - `cluster` - Source and target cluster descriptions, executor layout sizing
//! - `config` - Tuner configuration file, environment overrides and validation
//! - `platform` - Platform catalog: GPUs, instance types, shuffle managers
//! - `release` - Latest plugin release lookup
//! - `report` - Text and JSON report rendering
//! - `summary` - Application summary and driver log inputs
//! - `tuning` - Property store, memory budget, recommendation ledger and rules
pub mod app;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod platform;
pub mod release;
pub mod report;
pub mod summary;
pub mod tuning;

pub use error::{Result, TunerError};
pub use tuning::{AutoTuner, AutoTunerBuilder, Recommendations, TunerBuild};
