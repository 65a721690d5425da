//! Accelerator plugin switch

use super::Rule;
use crate::tuning::context::TuningContext;
use crate::tuning::definitions::keys;
use crate::tuning::ledger::Ledger;

pub const SQL_PLUGIN_CLASS: &str = "com.nvidia.spark.SQLPlugin";

/// Turn the accelerator on and check the plugin list
pub struct PluginRule;

impl Rule for PluginRule {
    fn name(&self) -> &'static str {
        "plugin"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        ledger.append_recommendation(keys::SQL_ENABLED, "true");

        let registered = ctx
            .get(ledger, keys::PLUGINS)
            .map(|plugins| plugins.split(',').any(|p| p.trim() == SQL_PLUGIN_CLASS))
            .unwrap_or(false);
        if !registered {
            ledger.append_optional_comment(
                keys::PLUGINS,
                format!("'{}' should include \"{SQL_PLUGIN_CLASS}\".", keys::PLUGINS),
            );
        }
    }
}
