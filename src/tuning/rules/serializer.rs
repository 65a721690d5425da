//! Kryo serializer settings

use super::Rule;
use crate::tuning::context::TuningContext;
use crate::tuning::definitions::keys;
use crate::tuning::ledger::Ledger;
use crate::tuning::units::{format_mib, memory_to_mib};

pub const KRYO_SERIALIZER_CLASS: &str = "org.apache.spark.serializer.KryoSerializer";
pub const GPU_KRYO_REGISTRATOR: &str = "com.nvidia.spark.rapids.GpuKryoRegistrator";
pub const KRYO_BUFFER_FLOOR_MIB: u64 = 512;

/// Pure: Deduplicate a registrator list and append the GPU registrator once
pub fn merge_registrators(existing: &str) -> String {
    let mut merged: Vec<&str> = Vec::new();
    for name in existing.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !merged.contains(&name) {
            merged.push(name);
        }
    }
    if !merged.contains(&GPU_KRYO_REGISTRATOR) {
        merged.push(GPU_KRYO_REGISTRATOR);
    }
    merged.join(",")
}

/// Make Kryo serialization work with GPU data
pub struct KryoRule;

impl Rule for KryoRule {
    fn name(&self) -> &'static str {
        "kryo"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        let uses_kryo = ctx
            .get(ledger, keys::SERIALIZER)
            .is_some_and(|s| s.contains(KRYO_SERIALIZER_CLASS));
        if !uses_kryo {
            return;
        }

        let existing = ctx.get(ledger, keys::KRYO_REGISTRATOR).unwrap_or_default();
        ledger.append_recommendation(keys::KRYO_REGISTRATOR, merge_registrators(&existing));

        let buffer_mib = ctx
            .get_or_default(ledger, keys::KRYO_BUFFER_MAX)
            .as_deref()
            .and_then(memory_to_mib)
            .unwrap_or(0);
        if buffer_mib < KRYO_BUFFER_FLOOR_MIB {
            ledger.append_recommendation(keys::KRYO_BUFFER_MAX, format_mib(KRYO_BUFFER_FLOOR_MIB));
        }
    }
}
