//! The published configuration slot.

use std::sync::{Arc, PoisonError, RwLock};

use log::debug;
use serde_json::{Map, Value};

use crate::schema::UnifiedConfig;

/// Holds the most recently published configuration.
///
/// Every publish replaces the whole snapshot with a single pointer swap;
/// readers clone the `Arc` and keep a consistent snapshot for as long as
/// they hold it, even if a newer one is published meanwhile. Queries return
/// empty values when nothing has been published yet.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: RwLock<Option<Arc<UnifiedConfig>>>,
}

impl ConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published configuration, returning the new snapshot.
    pub fn publish(&self, config: UnifiedConfig) -> Arc<UnifiedConfig> {
        let snapshot = Arc::new(config);
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(snapshot.clone());
        debug!(
            "published configuration ({} rule sets, replaced: {})",
            snapshot.firewall_rulesets().len(),
            previous.is_some()
        );
        snapshot
    }

    /// The current snapshot, if anything has been published.
    pub fn snapshot(&self) -> Option<Arc<UnifiedConfig>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rule-set names of the current snapshot.
    pub fn firewall_rulesets(&self) -> Vec<String> {
        self.snapshot()
            .map(|config| config.firewall_rulesets())
            .unwrap_or_default()
    }

    /// A rule set by name from the current snapshot.
    pub fn firewall_ruleset(&self, name: &str) -> Value {
        self.query(|config| config.firewall_ruleset(name))
    }

    /// A group by `(type, name)` from the current snapshot; looked up
    /// under `"<type>-group"`.
    pub fn firewall_group(&self, group_type: &str, group_name: &str) -> Value {
        self.query(|config| config.firewall_group(group_type, group_name))
    }

    /// A top-level section by case-insensitive name from the current snapshot.
    pub fn section(&self, name: &str) -> Value {
        self.query(|config| config.section(name))
    }

    fn query(&self, f: impl FnOnce(&UnifiedConfig) -> Value) -> Value {
        match self.snapshot() {
            Some(config) => f(&config),
            None => Value::Object(Map::new()),
        }
    }
}
