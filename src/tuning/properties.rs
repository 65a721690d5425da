//! Layered property lookup
//!
//! Precedence, highest first: the ledger (recommendations and user-enforced
//! values), the source properties, the definition table default. Source
//! properties are the application's properties with the cluster description's
//! software properties laid over them.

use std::collections::BTreeMap;

use super::definitions::default_value;
use super::ledger::Ledger;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStore {
    source: BTreeMap<String, String>,
}

impl PropertyStore {
    pub fn new(app: &BTreeMap<String, String>, cluster: &BTreeMap<String, String>) -> Self {
        let mut source = app.clone();
        source.extend(cluster.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { source }
    }

    /// Merged source properties, read-only
    pub fn all_source_properties(&self) -> &BTreeMap<String, String> {
        &self.source
    }

    pub fn source_value(&self, key: &str) -> Option<&str> {
        self.source.get(key).map(String::as_str)
    }

    /// Ledger value first, then the source
    pub fn get(&self, ledger: &Ledger, key: &str) -> Option<String> {
        match ledger.entry(key) {
            Some(entry) if !entry.skipped => entry.current_value().map(str::to_string),
            _ => self.source_value(key).map(str::to_string),
        }
    }

    /// Like [`PropertyStore::get`], falling back to the definition default
    pub fn get_or_default(&self, ledger: &Ledger, key: &str) -> Option<String> {
        self.get(ledger, key)
            .or_else(|| default_value(key).map(str::to_string))
    }
}
