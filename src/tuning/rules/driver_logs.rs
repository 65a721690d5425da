//! Fixes for unsupported operators found in driver logs

use tracing::debug;

use super::Rule;
use crate::tuning::context::TuningContext;
use crate::tuning::definitions::keys;
use crate::tuning::ledger::Ledger;

/// Reason fragment, forced key, forced value and explanation
type DriverLogFix = (&'static str, &'static str, &'static str, &'static str);

const DRIVER_LOG_FIXES: &[DriverLogFix] = &[(
    keys::INCOMPATIBLE_DATE_FORMATS,
    keys::INCOMPATIBLE_DATE_FORMATS,
    "true",
    "'spark.rapids.sql.incompatibleDateFormats.enabled' was set to true to allow unsupported \
     date formats on the GPU. This is an experimental configuration.",
)];

/// Force properties that fix unsupported operators reported in the driver log
pub struct DriverLogRule;

impl Rule for DriverLogRule {
    fn name(&self) -> &'static str {
        "driver-logs"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        let Some(driver_logs) = ctx.driver_logs else {
            return;
        };
        let reasons = driver_logs.unsupported_operator_reasons();
        for (fragment, key, value, comment) in DRIVER_LOG_FIXES {
            if reasons.iter().any(|r| r.contains(fragment)) {
                debug!("Driver log requires {}={}", key, value);
                ledger.register_persistent_comment(key, *comment);
                ledger.append_recommendation(key, *value);
            }
        }
    }
}
