use super::TunerConfig;
use crate::error::{Result, TunerError};

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_config(config: &TunerConfig) -> Result<()> {
        config.platform()?;
        config.sizing_strategy()?;

        if config.release_lookup_timeout.is_zero() {
            return Err(TunerError::Config(
                "release_lookup_timeout must be greater than 0".to_string(),
            ));
        }

        if config.check_latest_release {
            Self::validate_url(&config.release_metadata_url)?;
        }

        Self::validate_keys("skip_keys", &config.skip_keys)?;
        Self::validate_keys("limited_logic_keys", &config.limited_logic_keys)?;

        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(TunerError::Config(format!(
                "release_metadata_url must be an http(s) URL: {url}"
            )));
        }
        Ok(())
    }

    /// Property keys must be non-empty and contain no whitespace
    pub fn validate_keys(field: &str, keys: &[String]) -> Result<()> {
        for key in keys {
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(TunerError::Config(format!(
                    "Invalid property key in {field}: '{key}'"
                )));
            }
        }
        Ok(())
    }
}
