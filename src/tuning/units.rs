//! Size string handling for Spark-style memory and byte settings
//!
//! Spark accepts sizes such as `512m`, `4g`, `15109MiB` or a bare number. The
//! meaning of a bare number depends on the property: memory settings default to
//! MiB while byte-oriented settings default to bytes.

const KIB: f64 = 1024.0;

/// Unit assumed when a size string carries no suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Byte,
    KiB,
    MiB,
    GiB,
    TiB,
    PiB,
}

impl SizeUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        let normalized = suffix.trim().to_ascii_lowercase();
        let head = normalized
            .strip_suffix("ib")
            .or_else(|| normalized.strip_suffix('b').filter(|h| !h.is_empty()))
            .unwrap_or(&normalized);
        match head {
            "b" => Some(Self::Byte),
            "k" => Some(Self::KiB),
            "m" => Some(Self::MiB),
            "g" => Some(Self::GiB),
            "t" => Some(Self::TiB),
            "p" => Some(Self::PiB),
            _ => None,
        }
    }

    fn bytes(self) -> f64 {
        match self {
            Self::Byte => 1.0,
            Self::KiB => KIB,
            Self::MiB => KIB * KIB,
            Self::GiB => KIB * KIB * KIB,
            Self::TiB => KIB * KIB * KIB * KIB,
            Self::PiB => KIB * KIB * KIB * KIB * KIB,
        }
    }
}

/// Pure: Parse a size string into bytes, `None` when the text is not a size
pub fn parse_bytes(value: &str, default_unit: SizeUnit) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let split_at = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split_at);
    let number: f64 = number.parse().ok()?;

    let unit = if suffix.is_empty() {
        default_unit
    } else {
        SizeUnit::from_suffix(suffix)?
    };

    Some(number * unit.bytes())
}

/// Pure: Convert a size string to whole MiB, bare numbers read as `default_unit`
pub fn to_mib(value: &str, default_unit: SizeUnit) -> Option<u64> {
    parse_bytes(value, default_unit).map(|bytes| (bytes / SizeUnit::MiB.bytes()) as u64)
}

/// Pure: Convert a memory setting to MiB (bare numbers are MiB)
pub fn memory_to_mib(value: &str) -> Option<u64> {
    to_mib(value, SizeUnit::MiB)
}

/// Render a MiB quantity the way Spark memory settings are written
pub fn format_mib(mib: u64) -> String {
    format!("{mib}m")
}

/// Render a fractional value with up to four decimals, dropping trailing zeros
pub fn format_fraction(value: f64) -> String {
    let rendered = format!("{value:.4}");
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
