//! Ledger seeding, enforced values and cluster defaults

use tracing::debug;

use super::Rule;
use crate::tuning::context::TuningContext;
use crate::tuning::definitions::TUNING_DEFINITIONS;
use crate::tuning::ledger::Ledger;

/// Track every known key the application already set
pub struct SeedRule;

impl Rule for SeedRule {
    fn name(&self) -> &'static str {
        "seed"
    }

    fn apply(&self, _ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        for definition in TUNING_DEFINITIONS {
            ledger.seed(definition.key);
        }
    }
}

/// Pin the target cluster's enforced properties
pub struct EnforceRule;

impl Rule for EnforceRule {
    fn name(&self) -> &'static str {
        "enforce"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        for (key, value) in ctx.enforced {
            debug!("Enforcing {}={}", key, value);
            ledger.enforce(key, value);
        }
    }
}

/// Explain every source cluster field that had to be defaulted
pub struct ClusterDefaultsRule;

impl Rule for ClusterDefaultsRule {
    fn name(&self) -> &'static str {
        "cluster-defaults"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        for comment in &ctx.cluster_comments {
            ledger.add_comment_once(comment.clone());
        }
    }
}
