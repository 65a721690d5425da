//! Multi-threaded shuffle and reader thread pools

use super::{recommend_computed, Rule};
use crate::tuning::context::TuningContext;
use crate::tuning::definitions::keys;
use crate::tuning::ledger::Ledger;

pub const MIN_READ_THREADS: u32 = 20;
pub const MIN_CSP_READ_THREADS: u32 = 40;
/// Cores from which CSP readers get the larger thread pool
pub const CSP_LARGE_READER_CORES: u32 = 16;
/// Cores from which the combine size doubles
pub const LARGE_COMBINE_CORES: u32 = 20;
pub const COMBINE_SIZE: &str = "10m";
pub const LARGE_COMBINE_SIZE: &str = "20m";
pub const COMBINE_WAIT_TIME_MS: &str = "1000";
pub const MAX_BYTES_IN_FLIGHT: &str = "4g";

/// Pure: Multi-threaded read pool size for an executor
pub fn read_threads(cores: u32, is_csp: bool) -> u32 {
    if is_csp && cores >= CSP_LARGE_READER_CORES {
        MIN_CSP_READ_THREADS.max(cores.saturating_mul(2))
    } else {
        MIN_READ_THREADS.max(cores)
    }
}

pub struct ThreadsRule;

impl Rule for ThreadsRule {
    fn name(&self) -> &'static str {
        "threads"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        let cores = ctx.executor_cores(ledger);
        let is_csp = ctx.catalog.is_csp();

        for key in [keys::SHUFFLE_READER_THREADS, keys::SHUFFLE_WRITER_THREADS] {
            recommend_computed(ctx, ledger, key, || Some(cores.to_string()));
        }
        recommend_computed(ctx, ledger, keys::MULTITHREADED_READ_THREADS, || {
            Some(read_threads(cores, is_csp).to_string())
        });

        if is_csp && cores >= CSP_LARGE_READER_CORES {
            let combine = if cores >= LARGE_COMBINE_CORES {
                LARGE_COMBINE_SIZE
            } else {
                COMBINE_SIZE
            };
            recommend_computed(ctx, ledger, keys::READER_COMBINE_SIZE, || {
                Some(combine.to_string())
            });
            recommend_computed(ctx, ledger, keys::PARQUET_COMBINE_WAIT, || {
                Some(COMBINE_WAIT_TIME_MS.to_string())
            });
        }

        if ctx.memory_plan().is_some_and(|plan| plan.set_max_bytes_in_flight) {
            recommend_computed(ctx, ledger, keys::SHUFFLE_MAX_BYTES_IN_FLIGHT, || {
                Some(MAX_BYTES_IN_FLIGHT.to_string())
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::tuning::memory::MemoryPlan;
    use crate::tuning::rules::testing::Fixture;

    #[test]
    fn test_read_threads() {
        assert_eq!(read_threads(8, false), 20);
        assert_eq!(read_threads(32, false), 32);
        assert_eq!(read_threads(8, true), 20);
        assert_eq!(read_threads(16, true), 40);
        assert_eq!(read_threads(24, true), 48);
    }

    #[test]
    fn test_onprem_threads() {
        let fixture = Fixture::new(Platform::OnPrem).with_shape(8, 1, 1);
        let mut ctx = fixture.context();
        let mut ledger = fixture.ledger(&ctx);
        ThreadsRule.apply(&mut ctx, &mut ledger);

        assert_eq!(ledger.recommended(keys::SHUFFLE_READER_THREADS), Some("8"));
        assert_eq!(ledger.recommended(keys::SHUFFLE_WRITER_THREADS), Some("8"));
        assert_eq!(ledger.recommended(keys::MULTITHREADED_READ_THREADS), Some("20"));
        assert!(ledger.entry(keys::READER_COMBINE_SIZE).is_none());
        assert!(ledger.entry(keys::SHUFFLE_MAX_BYTES_IN_FLIGHT).is_none());
    }

    #[test]
    fn test_large_csp_executor() {
        let fixture = Fixture::new(Platform::Dataproc).with_shape(24, 1, 1);
        let mut ctx = fixture.context();
        ctx.memory = Some(Ok(MemoryPlan {
            heap_mib: 49152,
            overhead_mib: 17000,
            pinned_mib: 4096,
            spill_mib: 4096,
            set_max_bytes_in_flight: true,
        }));
        let mut ledger = fixture.ledger(&ctx);
        ThreadsRule.apply(&mut ctx, &mut ledger);

        assert_eq!(ledger.recommended(keys::MULTITHREADED_READ_THREADS), Some("48"));
        assert_eq!(ledger.recommended(keys::READER_COMBINE_SIZE), Some("20m"));
        assert_eq!(ledger.recommended(keys::PARQUET_COMBINE_WAIT), Some("1000"));
        assert_eq!(ledger.recommended(keys::SHUFFLE_MAX_BYTES_IN_FLIGHT), Some("4g"));
    }
}
