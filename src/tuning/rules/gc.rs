//! JVM garbage collection warning

use super::Rule;
use crate::tuning::context::TuningContext;
use crate::tuning::ledger::Ledger;

/// Mean share of task time spent in GC above which a warning is emitted
pub const GC_TIME_FRACTION_THRESHOLD: f64 = 0.3;

pub const GC_COMMENT: &str = "Average JVM GC time is very high. Other Garbage Collectors can be \
     used for better performance.";

/// Pure: Mean of the per-task GC fractions, `None` without samples
pub fn mean_gc_fraction(fractions: &[f64]) -> Option<f64> {
    if fractions.is_empty() {
        return None;
    }
    Some(fractions.iter().sum::<f64>() / fractions.len() as f64)
}

pub struct GcRule;

impl Rule for GcRule {
    fn name(&self) -> &'static str {
        "gc"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        if mean_gc_fraction(ctx.app.jvm_gc_fractions())
            .is_some_and(|mean| mean > GC_TIME_FRACTION_THRESHOLD)
        {
            ledger.add_comment_once(GC_COMMENT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::tuning::rules::testing::Fixture;

    #[test]
    fn test_mean() {
        assert_eq!(mean_gc_fraction(&[]), None);
        assert_eq!(mean_gc_fraction(&[0.25, 0.75]), Some(0.5));
    }

    #[test]
    fn test_high_gc_warns() {
        let mut fixture = Fixture::new(Platform::OnPrem);
        fixture.app.jvm_gc_fractions = vec![0.5, 0.4, 0.1];
        let mut ctx = fixture.context();
        let mut ledger = fixture.ledger(&ctx);
        GcRule.apply(&mut ctx, &mut ledger);
        assert_eq!(ledger.comments(), &[GC_COMMENT.to_string()]);
    }

    #[test]
    fn test_low_gc_is_quiet() {
        let mut fixture = Fixture::new(Platform::OnPrem);
        fixture.app.jvm_gc_fractions = vec![0.1, 0.2];
        let mut ctx = fixture.context();
        let mut ledger = fixture.ledger(&ctx);
        GcRule.apply(&mut ctx, &mut ledger);
        assert!(ledger.comments().is_empty());
    }
}
