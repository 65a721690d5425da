//! Adaptive query execution properties
//!
//! Partition coalescing is configured by size from Spark 3.2.0 on and by count
//! before that; the band is resolved once from the application's version.

use super::{recommend_computed, Rule};
use crate::tuning::context::TuningContext;
use crate::tuning::definitions::keys;
use crate::tuning::ledger::Ledger;
use crate::tuning::units::{to_mib, SizeUnit};
use crate::tuning::version::AqeBand;

pub const AQE_INPUT_THRESHOLD_BYTES: f64 = 35000.0;
pub const AQE_SHUFFLE_READ_THRESHOLD_BYTES: f64 = 50000.0;
pub const AQE_MIN_INITIAL_PARTITIONS: u64 = 200;
pub const AQE_INITIAL_PARTITIONS: u64 = 2000;
pub const AQE_MIN_PARTITION_SIZE: &str = "4m";
pub const AQE_ADVISORY_PARTITION_SIZE: &str = "128m";
pub const BROADCAST_THRESHOLD_MAX_MIB: u64 = 100;

pub struct AqeRule;

impl AqeRule {
    fn coalescing(&self, ctx: &TuningContext<'_>, ledger: &mut Ledger) {
        match ctx.aqe_band {
            Some(AqeBand::CoalesceBySize) => {
                if ctx.get(ledger, keys::AQE_MIN_PARTITION_SIZE).is_none() {
                    recommend_computed(ctx, ledger, keys::AQE_MIN_PARTITION_SIZE, || {
                        Some(AQE_MIN_PARTITION_SIZE.to_string())
                    });
                }
            }
            Some(AqeBand::CoalesceByCount) => {
                let Some(shape) = &ctx.shape else {
                    return;
                };
                let cores = ctx.executor_cores(ledger);
                let min_partitions = shape
                    .num_workers
                    .saturating_mul(shape.gpu_count)
                    .saturating_mul(cores);
                recommend_computed(ctx, ledger, keys::AQE_MIN_PARTITION_NUM, || {
                    Some(min_partitions.to_string())
                });
            }
            None => {}
        }
    }

    fn initial_partitions(&self, ctx: &TuningContext<'_>, ledger: &mut Ledger) {
        ledger.append_recommendation(keys::AQE_PARALLELISM_FIRST, "false");

        let current = ctx
            .get_or_default(ledger, keys::AQE_INITIAL_PARTITION_NUM)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(AQE_MIN_INITIAL_PARTITIONS);
        let shuffle_partitions = ledger
            .recommended(keys::SHUFFLE_PARTITIONS)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        if current <= AQE_MIN_INITIAL_PARTITIONS && shuffle_partitions < AQE_INITIAL_PARTITIONS {
            recommend_computed(ctx, ledger, keys::AQE_INITIAL_PARTITION_NUM, || {
                Some(AQE_INITIAL_PARTITIONS.to_string())
            });
        }
    }

    fn broadcast_threshold(&self, ctx: &TuningContext<'_>, ledger: &mut Ledger) {
        let key = keys::AQE_AUTO_BROADCAST_THRESHOLD;
        match ctx.get(ledger, key) {
            None => ledger.append_optional_comment(key, format!("'{key}' was not set.")),
            Some(value) => {
                let mib = to_mib(&value, SizeUnit::Byte).unwrap_or(0);
                if mib > BROADCAST_THRESHOLD_MAX_MIB {
                    ledger.append_optional_comment(
                        key,
                        format!(
                            "Setting '{key}' > {BROADCAST_THRESHOLD_MAX_MIB}m could lead to \
                             performance regression. Should be set to a lower number."
                        ),
                    );
                }
            }
        }
    }
}

impl Rule for AqeRule {
    fn name(&self) -> &'static str {
        "aqe"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        let enabled = ctx
            .get(ledger, keys::AQE_ENABLED)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
        if !enabled {
            ledger.append_recommendation(keys::AQE_ENABLED, "true");
        }

        if ctx.catalog.platform().is_databricks()
            && ctx
                .get(ledger, keys::DATABRICKS_AUTO_OPTIMIZE_SHUFFLE)
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
        {
            ledger.append_recommendation(keys::DATABRICKS_AUTO_OPTIMIZE_SHUFFLE, "false");
        }

        self.coalescing(ctx, ledger);

        if ctx.app.is_info_available() {
            let mean_input = ctx.app.mean_input_bytes();
            if mean_input < AQE_INPUT_THRESHOLD_BYTES
                && ctx.get(ledger, keys::AQE_ADVISORY_PARTITION_SIZE).is_none()
            {
                recommend_computed(ctx, ledger, keys::AQE_ADVISORY_PARTITION_SIZE, || {
                    Some(AQE_ADVISORY_PARTITION_SIZE.to_string())
                });
            }
            if mean_input > AQE_INPUT_THRESHOLD_BYTES
                && ctx.app.mean_shuffle_read_bytes() > AQE_SHUFFLE_READ_THRESHOLD_BYTES
            {
                self.initial_partitions(ctx, ledger);
            }
        }

        self.broadcast_threshold(ctx, ledger);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::tuning::rules::testing::Fixture;

    fn run(fixture: &Fixture) -> Ledger {
        let mut ctx = fixture.context();
        let mut ledger = fixture.ledger(&ctx);
        AqeRule.apply(&mut ctx, &mut ledger);
        ledger
    }

    #[test]
    fn test_post_boundary_uses_min_partition_size() {
        let mut fixture = Fixture::new(Platform::OnPrem);
        fixture.app.spark_version = Some("3.3.2".to_string());
        let ledger = run(&fixture);
        assert_eq!(ledger.recommended(keys::AQE_ENABLED), Some("true"));
        assert_eq!(ledger.recommended(keys::AQE_MIN_PARTITION_SIZE), Some("4m"));
        assert!(ledger.entry(keys::AQE_MIN_PARTITION_NUM).is_none());
        assert_eq!(ledger.recommended(keys::AQE_ADVISORY_PARTITION_SIZE), Some("128m"));
    }

    #[test]
    fn test_pre_boundary_uses_min_partition_num() {
        let mut fixture = Fixture::new(Platform::OnPrem).with_shape(8, 2, 4);
        fixture.app.spark_version = Some("3.1.2".to_string());
        let ledger = run(&fixture);
        assert_eq!(ledger.recommended(keys::AQE_MIN_PARTITION_NUM), Some("64"));
        assert!(ledger.entry(keys::AQE_MIN_PARTITION_SIZE).is_none());
    }

    #[test]
    fn test_large_workloads_raise_initial_partitions() {
        let mut fixture = Fixture::new(Platform::OnPrem);
        fixture.app.mean_input_bytes = 100000.0;
        fixture.app.mean_shuffle_read_bytes = 60000.0;
        let ledger = run(&fixture);
        assert_eq!(ledger.recommended(keys::AQE_INITIAL_PARTITION_NUM), Some("2000"));
        assert_eq!(ledger.recommended(keys::AQE_PARALLELISM_FIRST), Some("false"));
        assert!(ledger.entry(keys::AQE_ADVISORY_PARTITION_SIZE).is_none());
    }

    #[test]
    fn test_initial_partitions_skipped_after_large_shuffle_recommendation() {
        let mut fixture = Fixture::new(Platform::OnPrem);
        fixture.app.mean_input_bytes = 100000.0;
        fixture.app.mean_shuffle_read_bytes = 60000.0;
        let mut ctx = fixture.context();
        let mut ledger = fixture.ledger(&ctx);
        ledger.append_recommendation(keys::SHUFFLE_PARTITIONS, "2400");
        AqeRule.apply(&mut ctx, &mut ledger);
        assert!(ledger.recommended(keys::AQE_INITIAL_PARTITION_NUM).is_none());
    }

    #[test]
    fn test_broadcast_threshold_comments() {
        let fixture = Fixture::new(Platform::OnPrem);
        let ledger = run(&fixture);
        assert!(ledger
            .comments()
            .iter()
            .any(|c| c == "'spark.sql.adaptive.autoBroadcastJoinThreshold' was not set."));

        let fixture = Fixture::new(Platform::OnPrem)
            .with_property(keys::AQE_AUTO_BROADCAST_THRESHOLD, "200m");
        let ledger = run(&fixture);
        assert!(ledger.comments().iter().any(|c| c.contains("performance regression")));

        let fixture = Fixture::new(Platform::OnPrem)
            .with_property(keys::AQE_AUTO_BROADCAST_THRESHOLD, "10m");
        let ledger = run(&fixture);
        assert!(!ledger.comments().iter().any(|c| c.contains("autoBroadcastJoinThreshold")));
    }

    #[test]
    fn test_databricks_turns_off_auto_optimize_shuffle() {
        let fixture = Fixture::new(Platform::DatabricksAws)
            .with_property(keys::DATABRICKS_AUTO_OPTIMIZE_SHUFFLE, "true");
        let ledger = run(&fixture);
        assert_eq!(
            ledger.recommended(keys::DATABRICKS_AUTO_OPTIMIZE_SHUFFLE),
            Some("false")
        );
    }
}
