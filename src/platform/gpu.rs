//! GPU device catalog

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GPU models the tuner knows the memory capacity of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuDevice {
    T4,
    L4,
    A10,
    A10G,
    A100,
    H100,
    V100,
    P100,
    P4,
    K80,
}

impl GpuDevice {
    /// Device memory in MiB
    pub fn memory_mib(self) -> u64 {
        match self {
            GpuDevice::T4 => 15109,
            GpuDevice::L4 => 24576,
            GpuDevice::A10 | GpuDevice::A10G => 24576,
            GpuDevice::A100 => 40960,
            GpuDevice::H100 => 81920,
            GpuDevice::V100 | GpuDevice::P100 => 16384,
            GpuDevice::P4 => 8192,
            GpuDevice::K80 => 12288,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GpuDevice::T4 => "T4",
            GpuDevice::L4 => "L4",
            GpuDevice::A10 => "A10",
            GpuDevice::A10G => "A10G",
            GpuDevice::A100 => "A100",
            GpuDevice::H100 => "H100",
            GpuDevice::V100 => "V100",
            GpuDevice::P100 => "P100",
            GpuDevice::P4 => "P4",
            GpuDevice::K80 => "K80",
        }
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GpuDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Cloud consoles report names like "nvidia-tesla-t4" or "NVIDIA A10G"
        let normalized = s.trim().to_ascii_uppercase();
        let token = normalized
            .rsplit(|c: char| c == '-' || c == ' ' || c == '_')
            .next()
            .unwrap_or(&normalized);
        match token {
            "T4" => Ok(GpuDevice::T4),
            "L4" => Ok(GpuDevice::L4),
            "A10" => Ok(GpuDevice::A10),
            "A10G" => Ok(GpuDevice::A10G),
            "A100" => Ok(GpuDevice::A100),
            "H100" => Ok(GpuDevice::H100),
            "V100" => Ok(GpuDevice::V100),
            "P100" => Ok(GpuDevice::P100),
            "P4" => Ok(GpuDevice::P4),
            "K80" => Ok(GpuDevice::K80),
            _ => Err(format!("Unknown GPU device: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("l4".parse::<GpuDevice>().unwrap(), GpuDevice::L4);
        assert_eq!("A10G".parse::<GpuDevice>().unwrap(), GpuDevice::A10G);
        assert_eq!(
            "nvidia-tesla-t4".parse::<GpuDevice>().unwrap(),
            GpuDevice::T4
        );
        assert!("rtx9000".parse::<GpuDevice>().is_err());
    }

    #[test]
    fn test_memory_table() {
        assert_eq!(GpuDevice::T4.memory_mib(), 15109);
        assert_eq!(GpuDevice::A100.memory_mib(), 40960);
    }
}
