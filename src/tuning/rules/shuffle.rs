//! RAPIDS shuffle manager selection

use tracing::debug;

use super::Rule;
use crate::platform::{ShuffleManagerLookup, DATABRICKS_RUNTIME_KEY};
use crate::tuning::context::TuningContext;
use crate::tuning::definitions::keys;
use crate::tuning::ledger::Ledger;

/// Pick the RAPIDS shuffle manager built for the application's engine version
pub struct ShuffleManagerRule;

impl Rule for ShuffleManagerRule {
    fn name(&self) -> &'static str {
        "shuffle-manager"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        if !ledger.is_calculation_enabled(keys::SHUFFLE_MANAGER) {
            return;
        }
        let runtime = ctx.store.source_value(DATABRICKS_RUNTIME_KEY);
        match ctx.catalog.shuffle_manager(ctx.spark_version.as_ref(), runtime) {
            ShuffleManagerLookup::Supported(class) => {
                ledger.append_recommendation(keys::SHUFFLE_MANAGER, class);
            }
            ShuffleManagerLookup::Unsupported(version) => {
                debug!("No shuffle manager for version {}", version);
                ledger.append_comment(
                    keys::SHUFFLE_MANAGER,
                    format!(
                        "Cannot recommend RAPIDS Shuffle Manager for unsupported version '{version}'."
                    ),
                );
            }
            ShuffleManagerLookup::Undetermined => {
                ledger.append_comment(
                    keys::SHUFFLE_MANAGER,
                    "Could not recommend RapidsShuffleManager as the Spark version cannot be \
                     determined.",
                );
            }
        }
    }
}
