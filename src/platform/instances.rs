//! Instance type tables per platform

use super::gpu::GpuDevice;
use super::Platform;

/// Hardware of one worker node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceShape {
    pub cores: u32,
    pub memory_mib: u64,
    pub gpu_count: u32,
    pub gpu: GpuDevice,
}

const fn shape(cores: u32, memory_gib: u64, gpu_count: u32, gpu: GpuDevice) -> InstanceShape {
    InstanceShape {
        cores,
        memory_mib: memory_gib * 1024,
        gpu_count,
        gpu,
    }
}

const DATAPROC_INSTANCES: &[(&str, InstanceShape)] = &[
    ("g2-standard-4", shape(4, 16, 1, GpuDevice::L4)),
    ("g2-standard-8", shape(8, 32, 1, GpuDevice::L4)),
    ("g2-standard-12", shape(12, 48, 1, GpuDevice::L4)),
    ("g2-standard-16", shape(16, 64, 1, GpuDevice::L4)),
    ("g2-standard-24", shape(24, 96, 2, GpuDevice::L4)),
    ("g2-standard-32", shape(32, 128, 1, GpuDevice::L4)),
    ("g2-standard-48", shape(48, 192, 4, GpuDevice::L4)),
    ("g2-standard-96", shape(96, 384, 8, GpuDevice::L4)),
];

const AWS_INSTANCES: &[(&str, InstanceShape)] = &[
    ("g4dn.xlarge", shape(4, 16, 1, GpuDevice::T4)),
    ("g4dn.2xlarge", shape(8, 32, 1, GpuDevice::T4)),
    ("g4dn.4xlarge", shape(16, 64, 1, GpuDevice::T4)),
    ("g4dn.8xlarge", shape(32, 128, 1, GpuDevice::T4)),
    ("g4dn.12xlarge", shape(48, 192, 4, GpuDevice::T4)),
    ("g4dn.16xlarge", shape(64, 256, 1, GpuDevice::T4)),
    ("g5.xlarge", shape(4, 16, 1, GpuDevice::A10G)),
    ("g5.2xlarge", shape(8, 32, 1, GpuDevice::A10G)),
    ("g5.4xlarge", shape(16, 64, 1, GpuDevice::A10G)),
    ("g5.8xlarge", shape(32, 128, 1, GpuDevice::A10G)),
    ("g5.12xlarge", shape(48, 192, 4, GpuDevice::A10G)),
    ("g5.16xlarge", shape(64, 256, 1, GpuDevice::A10G)),
    ("g5.24xlarge", shape(96, 384, 4, GpuDevice::A10G)),
];

const AZURE_INSTANCES: &[(&str, InstanceShape)] = &[
    ("Standard_NC4as_T4_v3", shape(4, 28, 1, GpuDevice::T4)),
    ("Standard_NC8as_T4_v3", shape(8, 56, 1, GpuDevice::T4)),
    ("Standard_NC16as_T4_v3", shape(16, 110, 1, GpuDevice::T4)),
    ("Standard_NC64as_T4_v3", shape(64, 440, 4, GpuDevice::T4)),
];

pub(super) fn table_for(platform: Platform) -> &'static [(&'static str, InstanceShape)] {
    match platform {
        Platform::OnPrem => &[],
        Platform::Dataproc => DATAPROC_INSTANCES,
        Platform::Emr | Platform::DatabricksAws => AWS_INSTANCES,
        Platform::DatabricksAzure => AZURE_INSTANCES,
    }
}

/// Look an instance up by name, ignoring case
pub(super) fn lookup(platform: Platform, name: &str) -> Option<InstanceShape> {
    table_for(platform)
        .iter()
        .find(|(instance, _)| instance.eq_ignore_ascii_case(name.trim()))
        .map(|(_, shape)| *shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let shape = lookup(Platform::Dataproc, "G2-STANDARD-24").unwrap();
        assert_eq!(shape.cores, 24);
        assert_eq!(shape.gpu_count, 2);
        assert_eq!(shape.memory_mib, 96 * 1024);
    }

    #[test]
    fn test_onprem_has_no_instances() {
        assert!(lookup(Platform::OnPrem, "g4dn.xlarge").is_none());
        assert!(lookup(Platform::Emr, "g4dn.xlarge").is_some());
    }
}
