//! Engine and plugin version handling
//!
//! Spark versions are resolved once into an [`EngineVersion`] and then into an
//! [`AqeBand`]; rules dispatch on the band instead of comparing strings.

use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use std::cmp::Ordering;
use std::fmt;

/// Jar names look like `rapids-4-spark_2.12-24.08.1.jar` or carry a classifier
static PLUGIN_JAR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"rapids-4-spark_\d+\.\d+-(\d{2}\.\d{2}\.\d+)(?:-[A-Za-z0-9_.]+)?\.jar$")
        .expect("Valid regex pattern")
});

static LEADING_VERSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?").expect("Valid regex pattern"));

/// A Spark version as reported by the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineVersion {
    raw: String,
    version: Version,
}

impl EngineVersion {
    /// Pure: Parse a Spark version, tolerating vendor suffixes such as `3.4.1-amzn-2`
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let version = Version::parse(trimmed).ok().or_else(|| {
            let caps = LEADING_VERSION_REGEX.captures(trimmed)?;
            let major = caps.get(1)?.as_str().parse().ok()?;
            let minor = caps.get(2)?.as_str().parse().ok()?;
            let patch = caps
                .get(3)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            Some(Version::new(major, minor, patch))
        })?;

        Some(Self {
            raw: trimmed.to_string(),
            version,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    /// Compare on the numeric triple only, ignoring vendor suffixes
    pub fn at_least(&self, major: u64, minor: u64, patch: u64) -> bool {
        (self.major(), self.minor(), self.patch()) >= (major, minor, patch)
    }

    /// Compact form used by shim package names, e.g. `3.3.0` -> `330`
    pub fn shim_tag(&self) -> String {
        format!("{}{}{}", self.major(), self.minor(), self.patch())
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Adaptive-execution configuration band
///
/// Spark 3.2.0 replaced `coalescePartitions.minPartitionNum` with
/// `coalescePartitions.minPartitionSize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqeBand {
    CoalesceByCount,
    CoalesceBySize,
}

impl AqeBand {
    pub fn for_version(version: &EngineVersion) -> Self {
        if version.at_least(3, 2, 0) {
            Self::CoalesceBySize
        } else {
            Self::CoalesceByCount
        }
    }
}

/// Version of the accelerator plugin, e.g. `24.08.1`
#[derive(Debug, Clone)]
pub struct PluginVersion {
    raw: String,
    parts: Vec<u32>,
}

impl PluginVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let parts = trimmed
            .split('.')
            .map(|p| p.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(Self {
            raw: trimmed.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for PluginVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PluginVersion {}

impl PartialOrd for PluginVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PluginVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| {
                let a = self.parts.get(i).copied().unwrap_or(0);
                let b = other.parts.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Pure: Whether a classpath entry is an accelerator plugin jar
pub fn is_plugin_jar(entry: &str) -> bool {
    PLUGIN_JAR_REGEX.is_match(entry.trim())
}

/// Pure: Extract the plugin version from a jar path
pub fn plugin_jar_version(entry: &str) -> Option<PluginVersion> {
    PLUGIN_JAR_REGEX
        .captures(entry.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| PluginVersion::parse(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version_vendor_suffix() {
        let v = EngineVersion::parse("3.4.1-amzn-2").unwrap();
        assert_eq!((v.major(), v.minor(), v.patch()), (3, 4, 1));
        assert_eq!(v.shim_tag(), "341");

        let short = EngineVersion::parse("3.3").unwrap();
        assert_eq!(short.shim_tag(), "330");

        assert!(EngineVersion::parse("unknown").is_none());
    }

    #[test]
    fn test_aqe_band_boundary() {
        let pre = EngineVersion::parse("3.1.2").unwrap();
        let post = EngineVersion::parse("3.2.0").unwrap();
        assert_eq!(AqeBand::for_version(&pre), AqeBand::CoalesceByCount);
        assert_eq!(AqeBand::for_version(&post), AqeBand::CoalesceBySize);
    }

    #[test]
    fn test_plugin_version_ordering() {
        let old = PluginVersion::parse("23.12.0").unwrap();
        let new = PluginVersion::parse("24.08.1").unwrap();
        assert!(old < new);
        assert_eq!(
            PluginVersion::parse("24.08").unwrap(),
            PluginVersion::parse("24.08.0").unwrap()
        );
        assert!(PluginVersion::parse("24.x").is_none());
    }

    #[test]
    fn test_plugin_jar_detection() {
        let jar = "/opt/jars/rapids-4-spark_2.12-24.08.1.jar";
        assert!(is_plugin_jar(jar));
        assert_eq!(plugin_jar_version(jar).unwrap().as_str(), "24.08.1");

        let cuda = "rapids-4-spark_2.13-24.06.0-cuda11.jar";
        assert_eq!(plugin_jar_version(cuda).unwrap().as_str(), "24.06.0");

        assert!(!is_plugin_jar("/opt/jars/cudf-24.08.0.jar"));
        assert!(!is_plugin_jar("rapids-4-spark-tools_2.12-24.08.1.jar"));
    }
}
