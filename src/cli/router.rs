//! Command routing and execution

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli::args::Commands;
use crate::cli::commands::{run_combine_command, run_recommend_command};
use crate::config::ConfigLoader;

/// Execute a CLI command and return its rendered output
pub async fn execute_command(command: Commands, config_path: Option<PathBuf>) -> Result<String> {
    let config = ConfigLoader::new(config_path)
        .load()
        .await
        .context("Failed to load configuration")?;

    match command {
        Commands::Recommend(args) => run_recommend_command(args, config).await,
        Commands::Combine(args) => run_combine_command(args).await,
    }
}
