//! File cache for repeatedly read inputs

use super::Rule;
use crate::tuning::context::TuningContext;
use crate::tuning::definitions::keys;
use crate::tuning::ledger::Ledger;

/// Redundant reads, in bytes, above which caching pays off
pub const REDUNDANT_READ_THRESHOLD_BYTES: u64 = 100 * 1024 * 1024 * 1024;
/// Share of distinct read locations, in percent, below which caching pays off
pub const DISTINCT_LOCATION_PCT_THRESHOLD: f64 = 50.0;

pub const FILE_CACHE_CAVEAT: &str =
    "Enable file cache only if Spark local disks bandwidth is > 1 GB/s and you have sufficient \
     disk space available to fit both cache and normal Spark temporary data.";

/// Enable the file cache when the same files are read repeatedly
pub struct FileCacheRule;

impl Rule for FileCacheRule {
    fn name(&self) -> &'static str {
        "file-cache"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        if ctx.app.redundant_read_bytes() <= REDUNDANT_READ_THRESHOLD_BYTES
            || ctx.app.distinct_location_pct() >= DISTINCT_LOCATION_PCT_THRESHOLD
        {
            return;
        }
        ledger.register_persistent_comment(keys::FILE_CACHE_ENABLED, FILE_CACHE_CAVEAT);
        ledger.append_recommendation(keys::FILE_CACHE_ENABLED, "true");
    }
}
