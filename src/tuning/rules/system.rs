//! JVM system property checks

use super::Rule;
use crate::tuning::context::TuningContext;
use crate::tuning::ledger::Ledger;

pub const FILE_ENCODING_KEY: &str = "file.encoding";

pub const FILE_ENCODING_COMMENT: &str = "file.encoding should be [UTF-8] because GPU only \
     supports the charset when using some expressions.";

/// Pure: Whether the JVM encoding is one the GPU handles
pub fn is_supported_encoding(encoding: &str) -> bool {
    matches!(encoding.trim().to_ascii_uppercase().as_str(), "UTF-8" | "UTF8")
}

/// Warn about JVM system properties the GPU cannot honour
pub struct SystemPropertiesRule;

impl Rule for SystemPropertiesRule {
    fn name(&self) -> &'static str {
        "system-properties"
    }

    fn apply(&self, ctx: &mut TuningContext<'_>, ledger: &mut Ledger) {
        if let Some(encoding) = ctx.app.system_property(FILE_ENCODING_KEY) {
            if !is_supported_encoding(encoding) {
                ledger.add_comment_once(FILE_ENCODING_COMMENT);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::tuning::rules::testing::Fixture;

    #[test]
    fn test_encodings() {
        assert!(is_supported_encoding("UTF-8"));
        assert!(is_supported_encoding("utf8"));
        assert!(!is_supported_encoding("ISO-8859-1"));
    }

    #[test]
    fn test_rule_warns_on_other_charset() {
        let mut fixture = Fixture::new(Platform::OnPrem);
        fixture
            .app
            .system_properties
            .insert(FILE_ENCODING_KEY.to_string(), "Cp1252".to_string());
        let mut ctx = fixture.context();
        let mut ledger = fixture.ledger(&ctx);
        SystemPropertiesRule.apply(&mut ctx, &mut ledger);
        assert_eq!(ledger.comments(), &[FILE_ENCODING_COMMENT.to_string()]);
    }
}
