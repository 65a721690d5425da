use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::{get_config_dir, ConfigValidator, TunerConfig};
use crate::error::Result;

/// Builds the effective [`TunerConfig`]
///
/// Precedence: defaults, then the config file, then environment variables.
/// Command-line flags are applied by the caller on top.
pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self { explicit_path }
    }

    /// Path the loader reads, if any
    ///
    /// An explicit path is always returned; the user-level file only when it exists.
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.explicit_path {
            return Some(path.clone());
        }
        get_config_dir()
            .ok()
            .map(|dir| dir.join("config.toml"))
            .filter(|path| path.exists())
    }

    pub async fn load(&self) -> Result<TunerConfig> {
        let mut config = match self.config_path() {
            Some(path) => Self::load_file(&path).await?,
            None => {
                debug!("No configuration file found, using defaults");
                TunerConfig::new()
            }
        };
        config.merge_env_vars();
        ConfigValidator::validate_config(&config)?;
        Ok(config)
    }

    pub async fn load_file(path: &Path) -> Result<TunerConfig> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).await?;
        TunerConfig::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TunerError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tuner.toml");
        std::fs::write(&path, "sizing_strategy = \"constant-cores\"\n").unwrap();

        let config = ConfigLoader::load_file(&path).await.unwrap();
        assert_eq!(config.sizing_strategy, "constant-cores");
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(Some(dir.path().join("absent.toml")));
        assert!(matches!(loader.load().await, Err(TunerError::Io(_))));
    }

    #[tokio::test]
    async fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tuner.toml");
        std::fs::write(&path, "platform = [").unwrap();
        assert!(matches!(
            ConfigLoader::load_file(&path).await,
            Err(TunerError::Toml(_))
        ));
    }
}
