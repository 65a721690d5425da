//! Report rendering
//!
//! Text reports list `--conf` lines ready to paste into `spark-submit`; JSON
//! reports carry the same data for tooling and for the `combine` command.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, TunerError};
use crate::platform::Platform;
use crate::tuning::{OutputFilter, Recommendations, ToolKind};

pub const NOTHING_TO_RECOMMEND: &str = "Cannot recommend properties. See Comments.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = TunerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(TunerError::Parse(format!("Unknown report format '{other}'"))),
        }
    }
}

/// Serializable result of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    pub platform: Platform,
    pub tool: ToolKind,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub comments: Vec<String>,
}

impl TuningReport {
    pub fn new(
        recommendations: &Recommendations,
        filter: OutputFilter,
        platform: Platform,
        tool: ToolKind,
        app_id: Option<String>,
    ) -> Self {
        Self {
            app_id,
            platform,
            tool,
            properties: recommendations.properties(filter).into_iter().collect(),
            comments: recommendations.comments().to_vec(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render in the requested format
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// Pure: `--conf` lines followed by the comments
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("\nSpark Properties:\n");
        if self.properties.is_empty() {
            out.push_str(NOTHING_TO_RECOMMEND);
            out.push('\n');
        } else {
            for (key, value) in &self.properties {
                let _ = writeln!(out, "--conf {key}={value}");
            }
        }
        if !self.comments.is_empty() {
            out.push_str("\nComments:\n");
            for comment in &self.comments {
                let _ = writeln!(out, "- {comment}");
            }
        }
        out
    }
}
