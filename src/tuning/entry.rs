//! One configuration key tracked by the recommendation ledger

use serde::Serialize;

/// Placeholder rendered for keys the tuner could not compute a value for
pub const FILL_IN_VALUE: &str = "[FILL_IN_VALUE]";

/// Where a key ended up after the rule engine ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// A value is needed but could not be computed
    Unresolved,
    /// The recommendation differs from the application's value
    Tuned,
    /// The application's value is kept
    Unchanged,
    /// Suppressed by the skip set
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TuningEntry {
    pub key: String,
    pub original: Option<String>,
    pub recommended: Option<String>,
    /// The value came from the target cluster's enforced properties
    pub enforced: bool,
    #[serde(skip)]
    pub(crate) skipped: bool,
    #[serde(skip)]
    pub(crate) unresolved: bool,
    #[serde(skip)]
    pub(crate) explained: bool,
    #[serde(skip)]
    pub(crate) persistent_emitted: bool,
}

impl TuningEntry {
    pub(crate) fn new(key: &str, original: Option<String>, skipped: bool) -> Self {
        Self {
            key: key.to_string(),
            original,
            recommended: None,
            enforced: false,
            skipped,
            unresolved: false,
            explained: false,
            persistent_emitted: false,
        }
    }

    pub fn resolution(&self) -> Resolution {
        if self.skipped {
            return Resolution::Skipped;
        }
        if self.unresolved {
            return Resolution::Unresolved;
        }
        match (&self.recommended, &self.original) {
            (Some(rec), Some(orig)) if rec == orig => Resolution::Unchanged,
            (Some(_), _) => Resolution::Tuned,
            (None, Some(_)) => Resolution::Unchanged,
            (None, None) => Resolution::Unresolved,
        }
    }

    /// Value later rules should see, `None` while unresolved
    pub fn current_value(&self) -> Option<&str> {
        if self.unresolved {
            return None;
        }
        self.recommended.as_deref().or(self.original.as_deref())
    }

    /// Value written to the report, `None` when the key is not reported
    pub fn rendered_value(&self) -> Option<String> {
        match self.resolution() {
            Resolution::Skipped => None,
            Resolution::Unresolved => Some(FILL_IN_VALUE.to_string()),
            Resolution::Tuned | Resolution::Unchanged => self.current_value().map(str::to_string),
        }
    }
}
