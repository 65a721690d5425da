//! Effective configuration view
//!
//! Overlays recommended values on the application's own properties.

use std::collections::BTreeMap;

use super::entry::FILL_IN_VALUE;

/// Internal identifiers that never appear in user-facing output
pub const HIDDEN_KEYS: &[&str] = &["spark.app.id", "spark.rapids.tools.app.id"];

/// Pure: Merge source properties with recommended overrides
///
/// Recommendations win. A `[FILL_IN_VALUE]` placeholder does not replace a
/// concrete source value.
pub fn combine(
    source: &BTreeMap<String, String>,
    recommended: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = source.clone();
    for (key, value) in recommended {
        if value == FILL_IN_VALUE && merged.contains_key(key) {
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }
    merged.retain(|key, _| !HIDDEN_KEYS.contains(&key.as_str()));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_recommendations_win() {
        let source = map(&[
            ("spark.executor.cores", "4"),
            ("spark.sql.shuffle.partitions", "200"),
        ]);
        let recommended = map(&[("spark.executor.cores", "16"), ("spark.rapids.sql.enabled", "true")]);

        let merged = combine(&source, &recommended);
        assert_eq!(merged["spark.executor.cores"], "16");
        assert_eq!(merged["spark.sql.shuffle.partitions"], "200");
        assert_eq!(merged["spark.rapids.sql.enabled"], "true");
    }

    #[test]
    fn test_hidden_keys_are_dropped() {
        let source = map(&[("spark.app.id", "app-1"), ("spark.executor.cores", "4")]);
        let recommended = map(&[("spark.rapids.tools.app.id", "app-1")]);

        let merged = combine(&source, &recommended);
        assert!(!merged.contains_key("spark.app.id"));
        assert!(!merged.contains_key("spark.rapids.tools.app.id"));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_placeholder_keeps_source_value() {
        let source = map(&[("spark.executor.memory", "8g")]);
        let recommended = map(&[
            ("spark.executor.memory", FILL_IN_VALUE),
            ("spark.executor.memoryOverhead", FILL_IN_VALUE),
        ]);

        let merged = combine(&source, &recommended);
        assert_eq!(merged["spark.executor.memory"], "8g");
        assert_eq!(merged["spark.executor.memoryOverhead"], FILL_IN_VALUE);
    }
}
