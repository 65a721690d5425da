//! Heuristic rules and their fixed execution order
//!
//! Later rules read recommendations made by earlier ones through the ledger,
//! so [`pipeline`] order is part of the contract. Rules never fail: problems
//! are written to the ledger as comments.

mod aqe;
mod classpath;
mod driver_logs;
mod executor;
mod file_cache;
mod gc;
mod partitions;
mod platform;
mod plugin;
mod seed;
mod serializer;
mod shuffle;
mod system;
mod threads;

use super::context::TuningContext;
use super::definitions::default_value;
use super::ledger::Ledger;

pub use aqe::AqeRule;
pub use classpath::{ClasspathRule, MISSING_JAR_COMMENT, UNVERIFIED_RELEASE_COMMENT};
pub use driver_logs::DriverLogRule;
pub use executor::{ExecutorRule, NO_SHAPE_COMMENT};
pub use file_cache::{FileCacheRule, FILE_CACHE_CAVEAT};
pub use gc::GcRule;
pub use partitions::{MaxPartitionBytesRule, ShufflePartitionsRule, SKEW_COMMENT, SPILL_COMMENT};
pub use platform::PlatformRule;
pub use plugin::PluginRule;
pub use seed::{ClusterDefaultsRule, EnforceRule, SeedRule};
pub use serializer::KryoRule;
pub use shuffle::ShuffleManagerRule;
pub use system::SystemPropertiesRule;
pub use threads::ThreadsRule;

pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger);
}

/// Every rule, in the order they must run
pub fn pipeline() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(SeedRule),
        Box::new(EnforceRule),
        Box::new(ExecutorRule),
        Box::new(ClusterDefaultsRule),
        Box::new(PluginRule),
        Box::new(ShuffleManagerRule),
        Box::new(FileCacheRule),
        Box::new(MaxPartitionBytesRule),
        Box::new(ShufflePartitionsRule),
        Box::new(KryoRule),
        Box::new(GcRule),
        Box::new(AqeRule),
        Box::new(ThreadsRule),
        Box::new(ClasspathRule),
        Box::new(SystemPropertiesRule),
        Box::new(DriverLogRule),
        Box::new(PlatformRule),
    ]
}

/// A value a rule computed, appended through the matching ledger overload
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Computed {
    Text(String),
    Mib(i64),
    Count(i64),
    Fraction(f64),
}

impl Computed {
    fn append(self, ledger: &mut Ledger, key: &str) -> bool {
        match self {
            Computed::Text(value) => ledger.append_recommendation(key, value),
            Computed::Mib(mib) => ledger.append_recommendation_mib(key, mib),
            Computed::Count(count) => ledger.append_recommendation_count(key, count),
            Computed::Fraction(value) => ledger.append_recommendation_fraction(key, value),
        }
    }
}

/// Recommend a computed string, or only the static default for limited keys
pub(crate) fn recommend_computed<F>(
    ctx: &TuningContext<'_>,
    ledger: &mut Ledger,
    key: &str,
    compute: F,
) -> bool
where
    F: FnOnce() -> Option<String>,
{
    recommend_computed_value(ctx, ledger, key, || compute().map(Computed::Text))
}

/// Recommend a computed value, or only the static default for limited keys
///
/// For a limited key the default is recommended when the source left the key
/// unset; `compute` is never called. Non-positive numbers are not recommended.
pub(crate) fn recommend_computed_value<F>(
    ctx: &TuningContext<'_>,
    ledger: &mut Ledger,
    key: &str,
    compute: F,
) -> bool
where
    F: FnOnce() -> Option<Computed>,
{
    if ledger.is_calculation_enabled(key) {
        return match compute() {
            Some(value) => value.append(ledger, key),
            None => false,
        };
    }
    match (ctx.store.source_value(key), default_value(key)) {
        (None, Some(default)) => ledger.append_recommendation(key, default),
        _ => false,
    }
}
