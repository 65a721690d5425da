//! Platform-specific defaults

use super::Rule;
use crate::tuning::context::TuningContext;
use crate::tuning::ledger::Ledger;

/// Platform-wide recommendations for keys the application left unset
pub struct PlatformRule;

impl Rule for PlatformRule {
    fn name(&self) -> &'static str {
        "platform"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        for (key, value) in ctx.catalog.forced_recommendations() {
            if ctx.store.source_value(key).is_none() {
                ledger.append_recommendation(key, *value);
            }
        }
    }
}
