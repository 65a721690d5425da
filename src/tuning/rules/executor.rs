//! Executor layout and memory
//!
//! Emits the executor sizing keys for the resolved shape and runs the memory
//! budget. The budget outcome is stored on the context for the thread rule.

use tracing::{debug, warn};

use super::{recommend_computed, recommend_computed_value, Computed, Rule};
use crate::tuning::context::TuningContext;
use crate::tuning::definitions::keys;
use crate::tuning::ledger::Ledger;
use crate::tuning::memory::{plan_memory, MemoryRequest};
use crate::tuning::units::memory_to_mib;

pub const NO_SHAPE_COMMENT: &str =
    "Could not infer the cluster configuration, recommendations are generated using default values!";

/// Upper bound on concurrent GPU tasks per executor
pub const MAX_CONCURRENT_GPU_TASKS: u64 = 4;
/// GPU memory, in MiB, that justifies one more concurrent task
pub const GPU_MEMORY_PER_TASK_MIB: u64 = 7500;
pub const BATCH_SIZE_BYTES: &str = "2147483647";

/// Keys left as placeholders when the memory budget fails
const MEMORY_KEYS: [&str; 3] = [
    keys::EXECUTOR_MEMORY,
    keys::EXECUTOR_MEMORY_OVERHEAD,
    keys::PINNED_POOL,
];

pub struct ExecutorRule;

/// Pure: Concurrent GPU tasks for a GPU of `gpu_memory_mib`
pub fn concurrent_gpu_tasks(gpu_memory_mib: u64) -> u64 {
    (gpu_memory_mib / GPU_MEMORY_PER_TASK_MIB).clamp(1, MAX_CONCURRENT_GPU_TASKS)
}

fn enforced_mib(ctx: &TuningContext<'_>, ledger: &Ledger, key: &str) -> Option<u64> {
    if !ledger.is_enforced(key) {
        return None;
    }
    ctx.get(ledger, key).as_deref().and_then(memory_to_mib)
}

fn auxiliary_mib(ctx: &TuningContext<'_>, ledger: &Ledger) -> (u64, u64) {
    let off_heap = match ctx.get(ledger, keys::OFF_HEAP_ENABLED).as_deref() {
        Some(enabled) if enabled.trim().eq_ignore_ascii_case("true") => ctx
            .get(ledger, keys::OFF_HEAP_SIZE)
            .as_deref()
            .and_then(memory_to_mib)
            .unwrap_or(0),
        _ => 0,
    };
    let pyspark = ctx
        .get(ledger, keys::PYSPARK_MEMORY)
        .as_deref()
        .and_then(memory_to_mib)
        .unwrap_or(0);
    (off_heap, pyspark)
}

impl ExecutorRule {
    fn recommend_memory(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        let Some(shape) = ctx.shape.clone() else {
            return;
        };
        let Some(container_mib) = shape.memory_per_executor_mib() else {
            debug!("Worker memory unknown, skipping the memory budget");
            return;
        };

        let (off_heap_mib, pyspark_mib) = auxiliary_mib(ctx, ledger);
        let request = MemoryRequest {
            cores: ctx.executor_cores(ledger),
            container_mib,
            usable_fraction: ctx.catalog.executor_memory_fraction(),
            off_heap_mib,
            pyspark_mib,
            is_csp: shape.is_csp,
            enforced_heap_mib: enforced_mib(ctx, ledger, keys::EXECUTOR_MEMORY),
            enforced_overhead_mib: enforced_mib(ctx, ledger, keys::EXECUTOR_MEMORY_OVERHEAD),
            enforced_pinned_mib: enforced_mib(ctx, ledger, keys::PINNED_POOL),
            enforced_spill_mib: enforced_mib(ctx, ledger, keys::SPILL_STORAGE),
        };

        let outcome = plan_memory(&request);
        match &outcome {
            Ok(plan) => {
                let sizes = [
                    (keys::EXECUTOR_MEMORY, plan.heap_mib),
                    (keys::EXECUTOR_MEMORY_OVERHEAD, plan.overhead_mib),
                    (keys::PINNED_POOL, plan.pinned_mib),
                    (keys::SPILL_STORAGE, plan.spill_mib),
                ];
                for (key, mib) in sizes {
                    recommend_computed_value(ctx, ledger, key, || Some(Computed::Mib(mib as i64)));
                }
            }
            Err(shortfall) => {
                warn!("Executor memory does not fit: {:?}", shortfall);
                for key in MEMORY_KEYS {
                    ledger.mark_unresolved(key);
                }
                ledger.add_comment_once(shortfall.comment(shape.executors_per_worker()));
            }
        }
        ctx.memory = Some(outcome);
    }
}

impl Rule for ExecutorRule {
    fn name(&self) -> &'static str {
        "executor"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        let Some(shape) = ctx.shape.clone() else {
            ledger.add_comment_once(NO_SHAPE_COMMENT);
            return;
        };

        recommend_computed_value(ctx, ledger, keys::EXECUTOR_CORES, || {
            Some(Computed::Count(shape.cores_per_executor.into()))
        });
        recommend_computed_value(ctx, ledger, keys::EXECUTOR_INSTANCES, || {
            Some(Computed::Count(shape.num_executors.into()))
        });

        let cores = ctx.executor_cores(ledger);
        recommend_computed_value(ctx, ledger, keys::TASK_GPU_AMOUNT, || {
            Some(Computed::Fraction(1.0 / f64::from(cores)))
        });
        recommend_computed_value(ctx, ledger, keys::CONCURRENT_GPU_TASKS, || {
            Some(Computed::Count(concurrent_gpu_tasks(shape.gpu_memory_mib) as i64))
        });
        recommend_computed(ctx, ledger, keys::BATCH_SIZE_BYTES, || {
            Some(BATCH_SIZE_BYTES.to_string())
        });

        self.recommend_memory(ctx, ledger);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::tuning::entry::FILL_IN_VALUE;
    use crate::tuning::rules::testing::Fixture;
    use crate::tuning::rules::EnforceRule;

    #[test]
    fn test_concurrent_gpu_tasks_bounds() {
        assert_eq!(concurrent_gpu_tasks(8192), 1);
        assert_eq!(concurrent_gpu_tasks(15109), 2);
        assert_eq!(concurrent_gpu_tasks(24576), 3);
        assert_eq!(concurrent_gpu_tasks(81920), 4);
        assert_eq!(concurrent_gpu_tasks(0), 1);
    }

    #[test]
    fn test_no_shape_adds_default_comment() {
        let fixture = Fixture::new(Platform::OnPrem);
        let mut ctx = fixture.context();
        let mut ledger = fixture.ledger(&ctx);
        ExecutorRule.apply(&mut ctx, &mut ledger);
        assert_eq!(ledger.comments(), &[NO_SHAPE_COMMENT.to_string()]);
        assert!(ctx.memory.is_none());
    }

    #[test]
    fn test_shape_recommendations() {
        let fixture = Fixture::new(Platform::OnPrem).with_shape(8, 2, 3);
        let mut ctx = fixture.context();
        let mut ledger = fixture.ledger(&ctx);
        ExecutorRule.apply(&mut ctx, &mut ledger);

        assert_eq!(ledger.recommended(keys::EXECUTOR_CORES), Some("8"));
        assert_eq!(ledger.recommended(keys::EXECUTOR_INSTANCES), Some("6"));
        assert_eq!(ledger.recommended(keys::TASK_GPU_AMOUNT), Some("0.125"));
        assert_eq!(ledger.recommended(keys::CONCURRENT_GPU_TASKS), Some("3"));
        assert_eq!(ledger.recommended(keys::BATCH_SIZE_BYTES), Some(BATCH_SIZE_BYTES));
        assert_eq!(ledger.recommended(keys::EXECUTOR_MEMORY), Some("16384m"));
        assert!(ctx.memory_plan().is_some());
    }

    #[test]
    fn test_zero_executors_are_not_recommended() {
        let fixture = Fixture::new(Platform::OnPrem).with_shape(8, 2, 0);
        let mut ctx = fixture.context();
        let mut ledger = fixture.ledger(&ctx);
        ExecutorRule.apply(&mut ctx, &mut ledger);

        assert!(ledger.entry(keys::EXECUTOR_INSTANCES).is_none());
        assert_eq!(ledger.recommended(keys::EXECUTOR_CORES), Some("8"));
    }

    #[test]
    fn test_infeasible_enforced_memory_leaves_placeholders() {
        let mut fixture = Fixture::new(Platform::OnPrem).with_shape(8, 1, 1);
        fixture
            .enforced
            .insert(keys::EXECUTOR_MEMORY.to_string(), "40g".to_string());
        fixture
            .enforced
            .insert(keys::EXECUTOR_MEMORY_OVERHEAD.to_string(), "30g".to_string());
        let mut ctx = fixture.context();
        let mut ledger = fixture.ledger(&ctx);
        EnforceRule.apply(&mut ctx, &mut ledger);
        ExecutorRule.apply(&mut ctx, &mut ledger);

        let recs = ledger.finalize();
        for key in MEMORY_KEYS {
            assert_eq!(recs.value(key), Some(FILL_IN_VALUE.to_string()), "{key}");
        }
        let memory_comments: Vec<_> = recs
            .comments()
            .iter()
            .filter(|c| c.contains("at least 89600MB"))
            .collect();
        assert_eq!(memory_comments.len(), 1);
    }
}
