//! Input partition size and shuffle partition count

use tracing::debug;

use super::{recommend_computed, Rule};
use crate::tuning::context::TuningContext;
use crate::tuning::definitions::keys;
use crate::tuning::ledger::Ledger;
use crate::tuning::units::{format_mib, to_mib, SizeUnit};

pub const MIN_PARTITION_BYTES_RANGE_MIB: f64 = 128.0;
pub const MAX_PARTITION_BYTES_RANGE_MIB: f64 = 256.0;
pub const MAX_PARTITION_BYTES_BOUND_MIB: u64 = 4096;
pub const DEFAULT_MAX_PARTITION_BYTES_MIB: u64 = 512;
pub const DEFAULT_SHUFFLE_PARTITIONS: u64 = 200;
pub const SPILL_PARTITION_MULTIPLIER: u64 = 2;

pub const SPILL_COMMENT: &str =
    "'spark.sql.shuffle.partitions' should be increased since spilling occurred in shuffle stages.";
pub const SKEW_COMMENT: &str = "Shuffle skew exists (when task's Shuffle Read Size > 3 * Avg \
     Stage-level size) in stages with spilling. Increasing shuffle partitions is not \
     recommended in this case since keys will still hash to the same task.";

/// Pure: Scale the partition size so mean task input lands in the target band
pub fn input_based_partition_mib(current_mib: u64, mean_input_mib: f64) -> u64 {
    if mean_input_mib <= 0.0 {
        return current_mib;
    }
    let current = current_mib as f64;
    let scaled = if mean_input_mib < MIN_PARTITION_BYTES_RANGE_MIB {
        current * (MIN_PARTITION_BYTES_RANGE_MIB / mean_input_mib)
    } else if mean_input_mib > MAX_PARTITION_BYTES_RANGE_MIB {
        current / (mean_input_mib / MAX_PARTITION_BYTES_RANGE_MIB)
    } else {
        current
    };
    (scaled as u64).clamp(1, MAX_PARTITION_BYTES_BOUND_MIB)
}

pub struct MaxPartitionBytesRule;

impl Rule for MaxPartitionBytesRule {
    fn name(&self) -> &'static str {
        "max-partition-bytes"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        let current_mib = ctx
            .get_or_default(ledger, keys::MAX_PARTITION_BYTES)
            .and_then(|v| to_mib(&v, SizeUnit::Byte))
            .filter(|mib| *mib > 0)
            .unwrap_or(DEFAULT_MAX_PARTITION_BYTES_MIB);
        let mean_input_mib = ctx.app.mean_input_bytes() / (1024.0 * 1024.0);

        let input_based = input_based_partition_mib(current_mib, mean_input_mib);
        let (target, comment) = ctx
            .tool
            .max_partition_bytes_mib(ctx.app, current_mib, input_based);
        if mean_input_mib <= 0.0 && comment.is_none() {
            debug!("No input statistics, keeping max partition bytes");
            return;
        }

        if recommend_computed(ctx, ledger, keys::MAX_PARTITION_BYTES, || {
            Some(format_mib(target))
        }) {
            if let Some(comment) = comment {
                ledger.append_optional_comment(keys::MAX_PARTITION_BYTES, comment);
            }
        }
    }
}

pub struct ShufflePartitionsRule;

impl Rule for ShufflePartitionsRule {
    fn name(&self) -> &'static str {
        "shuffle-partitions"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        if !ledger.is_calculation_enabled(keys::SHUFFLE_PARTITIONS) {
            recommend_computed(ctx, ledger, keys::SHUFFLE_PARTITIONS, || None);
            return;
        }
        let current = ctx
            .get_or_default(ledger, keys::SHUFFLE_PARTITIONS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SHUFFLE_PARTITIONS);

        let spill = ctx.app.shuffle_stages_with_spill();
        let skew = ctx.app.shuffle_skew_stages();
        let mut spill_based = current;
        let mut comments = Vec::new();
        if !spill.is_empty() {
            if spill.iter().any(|stage| skew.contains(stage)) {
                comments.push(SKEW_COMMENT.to_string());
            } else {
                spill_based = current.saturating_mul(SPILL_PARTITION_MULTIPLIER);
                comments.push(SPILL_COMMENT.to_string());
            }
        }

        let (target, tool_comment) = ctx.tool.shuffle_partitions(ctx.app, current, spill_based);
        comments.extend(tool_comment);

        if target != current {
            ledger.append_recommendation_count(keys::SHUFFLE_PARTITIONS, target as i64);
        }
        for comment in comments {
            ledger.append_optional_comment(keys::SHUFFLE_PARTITIONS, comment);
        }
    }
}
