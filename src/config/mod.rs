use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod loader;
pub mod validator;

pub use loader::ConfigLoader;
pub use validator::ConfigValidator;

use crate::cluster::SizingStrategyKind;
use crate::error::{Result, TunerError};
use crate::platform::Platform;
use crate::release::DEFAULT_RELEASE_METADATA_URL;

pub const ENV_PLATFORM: &str = "RAPIDS_TUNER_PLATFORM";
pub const ENV_CHECK_RELEASE: &str = "RAPIDS_TUNER_CHECK_RELEASE";
pub const ENV_SKIP_KEYS: &str = "RAPIDS_TUNER_SKIP_KEYS";

/// Directory holding the user-level `config.toml`
pub fn get_config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "nvidia", "rapids-autotuner")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| TunerError::Config("Could not determine home directory".to_string()))
}

/// Settings read from `config.toml` and the environment
///
/// Platform and strategy stay strings until validation so that a bad value is
/// reported as a configuration error naming the offending setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    pub platform: String,
    pub sizing_strategy: String,
    pub skip_keys: Vec<String>,
    pub limited_logic_keys: Vec<String>,
    pub check_latest_release: bool,
    #[serde(with = "humantime_serde")]
    pub release_lookup_timeout: Duration,
    pub release_metadata_url: String,
    pub show_only_changed: bool,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            platform: Platform::default().to_string(),
            sizing_strategy: SizingStrategyKind::default().to_string(),
            skip_keys: Vec::new(),
            limited_logic_keys: Vec::new(),
            check_latest_release: true,
            release_lookup_timeout: Duration::from_secs(5),
            release_metadata_url: DEFAULT_RELEASE_METADATA_URL.to_string(),
            show_only_changed: true,
        }
    }
}

impl TunerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_env_from(|name| std::env::var(name).ok());
    }

    /// Overlay values from an environment lookup
    pub fn merge_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(platform) = lookup(ENV_PLATFORM) {
            self.platform = platform;
        }

        if let Some(check) = lookup(ENV_CHECK_RELEASE) {
            if let Ok(value) = check.trim().parse::<bool>() {
                self.check_latest_release = value;
            }
        }

        if let Some(keys) = lookup(ENV_SKIP_KEYS) {
            for key in keys.split(',').map(str::trim).filter(|k| !k.is_empty()) {
                if !self.skip_keys.iter().any(|k| k == key) {
                    self.skip_keys.push(key.to_string());
                }
            }
        }
    }

    pub fn platform(&self) -> Result<Platform> {
        self.platform
            .parse()
            .map_err(|e: String| TunerError::Config(e))
    }

    pub fn sizing_strategy(&self) -> Result<SizingStrategyKind> {
        self.sizing_strategy
            .parse()
            .map_err(|e: String| TunerError::Config(e))
    }
}
