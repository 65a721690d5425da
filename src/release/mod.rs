//! Latest plugin release lookup
//!
//! The classpath rule compares the plugin jar found in the application against
//! the newest published release. The lookup is the only network call of a run.
//! It happens before the rule engine starts and never fails the run: any error
//! becomes [`LatestRelease::Unavailable`].

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Result, TunerError};
use crate::tuning::version::PluginVersion;

pub const DEFAULT_RELEASE_METADATA_URL: &str =
    "https://repo1.maven.org/maven2/com/nvidia/rapids-4-spark_2.12/maven-metadata.xml";

static RELEASE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<release>\s*([^<\s]+)\s*</release>").expect("Valid regex pattern"));

/// Outcome of the release lookup as seen by the rule engine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LatestRelease {
    Known(PluginVersion),
    /// The lookup ran and failed
    Unavailable,
    /// The lookup was disabled
    #[default]
    NotChecked,
}

#[async_trait]
pub trait ReleaseLookup: Send + Sync {
    async fn latest_release(&self) -> Result<PluginVersion>;
}

/// Reads the `<release>` element of a Maven metadata document
pub struct MavenReleaseLookup {
    client: Client,
    metadata_url: String,
}

impl MavenReleaseLookup {
    pub fn new(metadata_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            metadata_url: metadata_url.into(),
        })
    }
}

/// Pure: Extract the release version from Maven metadata
pub fn parse_release(metadata: &str) -> Result<PluginVersion> {
    let raw = RELEASE_TAG
        .captures(metadata)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| TunerError::Parse("No <release> element in metadata".to_string()))?;
    PluginVersion::parse(raw)
        .ok_or_else(|| TunerError::Parse(format!("Invalid release version '{raw}'")))
}

#[async_trait]
impl ReleaseLookup for MavenReleaseLookup {
    async fn latest_release(&self) -> Result<PluginVersion> {
        debug!("Fetching release metadata from {}", self.metadata_url);

        let response = self
            .client
            .get(&self.metadata_url)
            .send()
            .await
            .map_err(|e| TunerError::Network(format!("Failed to fetch release metadata: {e}")))?;

        if !response.status().is_success() {
            return Err(TunerError::Network(format!(
                "Release metadata request failed with status: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        parse_release(&body)
    }
}

/// Run the lookup, turning every failure into [`LatestRelease::Unavailable`]
pub async fn resolve_latest_release(lookup: &dyn ReleaseLookup) -> LatestRelease {
    match lookup.latest_release().await {
        Ok(version) => {
            info!("Latest plugin release is {}", version);
            LatestRelease::Known(version)
        }
        Err(e) => {
            warn!("Could not determine the latest plugin release: {}", e);
            LatestRelease::Unavailable
        }
    }
}
