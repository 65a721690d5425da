//! Recommendation ledger
//!
//! Owns every [`TuningEntry`] and the free comment list for one run. The rule
//! engine threads a `&mut Ledger` through each rule in order; [`Ledger::finalize`]
//! consumes it, so nothing can mutate the results afterwards.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

use super::definitions::{missing_comment, update_comment};
use super::entry::{Resolution, TuningEntry};
use super::properties::PropertyStore;
use super::units::{format_fraction, format_mib};

/// Keys that suppress recommendations and keys limited to static defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPolicy {
    pub skip: BTreeSet<String>,
    pub limited: BTreeSet<String>,
}

impl KeyPolicy {
    pub fn new<S, L>(skip: S, limited: L) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self {
            skip: skip.into_iter().map(Into::into).collect(),
            limited: limited.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    entries: BTreeMap<String, TuningEntry>,
    comments: Vec<String>,
    originals: BTreeMap<String, String>,
    policy: KeyPolicy,
    persistent: BTreeMap<String, String>,
}

impl Ledger {
    pub fn new(store: &PropertyStore, policy: KeyPolicy) -> Self {
        Self {
            entries: BTreeMap::new(),
            comments: Vec::new(),
            originals: store.all_source_properties().clone(),
            policy,
            persistent: BTreeMap::new(),
        }
    }

    fn entry_mut(&mut self, key: &str) -> &mut TuningEntry {
        let original = self.originals.get(key).cloned();
        let skipped = self.policy.skip.contains(key);
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| TuningEntry::new(key, original, skipped))
    }

    /// Track a key that the application already set
    pub fn seed(&mut self, key: &str) {
        if self.originals.contains_key(key) {
            self.entry_mut(key);
        }
    }

    /// Pin a user-enforced value; later recommendations for the key are ignored
    pub fn enforce(&mut self, key: &str, value: &str) {
        if self.is_skipped(key) {
            trace!("Enforced key {} is in the skip set", key);
            return;
        }
        let entry = self.entry_mut(key);
        let first = !entry.enforced;
        entry.enforced = true;
        entry.recommended = Some(value.to_string());
        entry.unresolved = false;
        entry.explained = true;
        if first {
            self.comments.push(format!(
                "'{key}' was user-enforced in the target cluster properties."
            ));
        }
    }

    /// Register a caveat emitted whenever the key is recommended
    pub fn register_persistent_comment(&mut self, key: &str, comment: impl Into<String>) {
        self.persistent.insert(key.to_string(), comment.into());
    }

    /// Record a recommendation; returns false when the key is skipped or enforced
    ///
    /// A registered persistent comment is emitted for enforced keys too.
    pub fn append_recommendation(&mut self, key: &str, value: impl Into<String>) -> bool {
        if self.is_skipped(key) {
            return false;
        }
        if self.is_enforced(key) {
            self.emit_persistent_comment(key);
            return false;
        }
        let value = value.into();
        let entry = self.entry_mut(key);
        entry.recommended = Some(value.clone());
        entry.unresolved = false;

        let mut new_comments = Vec::new();
        if !entry.explained {
            match entry.original.as_deref() {
                None => {
                    new_comments.push(missing_comment(key));
                    entry.explained = true;
                }
                Some(original) if original != value => {
                    if let Some(comment) = update_comment(key) {
                        new_comments.push(comment.to_string());
                        entry.explained = true;
                    }
                }
                Some(_) => {}
            }
        }
        trace!("Recommend {}={}", key, value);
        self.comments.extend(new_comments);
        self.emit_persistent_comment(key);
        true
    }

    fn emit_persistent_comment(&mut self, key: &str) {
        let Some(comment) = self.persistent.get(key).cloned() else {
            return;
        };
        let entry = self.entry_mut(key);
        if !entry.persistent_emitted {
            entry.persistent_emitted = true;
            self.comments.push(comment);
        }
    }

    /// Memory size in MiB; non-positive sizes are not computable
    pub fn append_recommendation_mib(&mut self, key: &str, mib: i64) -> bool {
        mib > 0 && self.append_recommendation(key, format_mib(mib as u64))
    }

    /// Whole count; non-positive counts are not computable
    pub fn append_recommendation_count(&mut self, key: &str, count: i64) -> bool {
        count > 0 && self.append_recommendation(key, count.to_string())
    }

    /// Fractional value; non-positive or non-finite values are not computable
    pub fn append_recommendation_fraction(&mut self, key: &str, value: f64) -> bool {
        value.is_finite() && value > 0.0 && self.append_recommendation(key, format_fraction(value))
    }

    /// Attach a comment and leave the key without a computed value
    pub fn append_comment(&mut self, key: &str, comment: impl Into<String>) {
        if self.is_skipped(key) {
            return;
        }
        self.comments.push(comment.into());
        let entry = self.entry_mut(key);
        if !entry.enforced {
            entry.unresolved = true;
        }
    }

    /// Attach a comment about a key without touching its value
    pub fn append_optional_comment(&mut self, key: &str, comment: impl Into<String>) {
        if !self.is_skipped(key) {
            self.comments.push(comment.into());
        }
    }

    /// Force a key to the fill-in placeholder, overriding an enforced value
    pub fn mark_unresolved(&mut self, key: &str) {
        if self.is_skipped(key) {
            return;
        }
        let entry = self.entry_mut(key);
        entry.unresolved = true;
        entry.recommended = None;
        entry.enforced = false;
    }

    /// General comment not tied to a key
    pub fn add_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
    }

    /// Add a general comment once
    pub fn add_comment_once(&mut self, comment: impl Into<String>) {
        let comment = comment.into();
        if !self.comments.contains(&comment) {
            self.comments.push(comment);
        }
    }

    pub fn is_skipped(&self, key: &str) -> bool {
        self.policy.skip.contains(key)
    }

    pub fn is_enforced(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|e| e.enforced)
    }

    /// False for keys limited to static defaults
    pub fn is_calculation_enabled(&self, key: &str) -> bool {
        !self.policy.limited.contains(key)
    }

    /// Value recommended so far, ignoring the source properties
    pub fn recommended(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .filter(|e| !e.unresolved && !e.skipped)
            .and_then(|e| e.recommended.as_deref())
    }

    pub fn entry(&self, key: &str) -> Option<&TuningEntry> {
        self.entries.get(key)
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Commit the run; the returned recommendations are immutable
    pub fn finalize(self) -> Recommendations {
        let entries = self
            .entries
            .into_values()
            .filter(|e| e.original.is_some() || e.recommended.is_some() || e.unresolved)
            .collect();
        let mut comments = self.comments;
        comments.sort();
        Recommendations { entries, comments }
    }
}

/// Which entries a report lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFilter {
    /// Entries whose value differs from the application's, plus placeholders
    #[default]
    ChangedOnly,
    /// Every entry that is not skipped
    All,
}

/// Finalized output of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendations {
    entries: Vec<TuningEntry>,
    comments: Vec<String>,
}

impl Recommendations {
    /// Output for a run that could not even start
    pub fn from_comments(mut comments: Vec<String>) -> Self {
        comments.sort();
        Self {
            entries: Vec::new(),
            comments,
        }
    }

    pub fn entries(&self) -> &[TuningEntry] {
        &self.entries
    }

    /// (key, value) pairs sorted by key
    pub fn properties(&self, filter: OutputFilter) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter(|e| match (filter, e.resolution()) {
                (_, Resolution::Skipped) => false,
                (OutputFilter::ChangedOnly, Resolution::Unchanged) => false,
                _ => true,
            })
            .filter_map(|e| e.rendered_value().map(|v| (e.key.clone(), v)))
            .collect()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .and_then(TuningEntry::rendered_value)
    }

    /// Comments sorted lexicographically
    pub fn comments(&self) -> &[String] {
        &self.comments
    }
}
