//! The unified configuration schema read by every consumer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level sections carried over from a current-format document.
pub const SECTIONS: &[&str] = &["nat", "system", "service", "protocols", "policy"];

/// Configuration document in the unified (legacy-shaped) schema.
///
/// `firewall.name` maps rule-set names to `{"default-action", "rule"}` and
/// `firewall.group` maps `<type>-group` keys to named groups. Both are
/// always present. Key order follows the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnifiedConfig(Map<String, Value>);

impl UnifiedConfig {
    /// Wrap a document that already has the unified shape.
    pub(crate) fn from_map(document: Map<String, Value>) -> Self {
        Self(document)
    }

    /// Rule-set names, in document order.
    pub fn firewall_rulesets(&self) -> Vec<String> {
        self.firewall_object("name")
            .map(|names| names.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// One rule set, or an empty mapping.
    pub fn firewall_ruleset(&self, name: &str) -> Value {
        self.firewall_object("name")
            .and_then(|names| names.get(name))
            .cloned()
            .unwrap_or_else(empty)
    }

    /// A group by type (`address`, `network`, `port`, ...) and name, or an
    /// empty mapping.
    pub fn firewall_group(&self, group_type: &str, group_name: &str) -> Value {
        let key = format!("{}-group", group_type);
        self.firewall_object("group")
            .and_then(|groups| groups.get(&key))
            .and_then(|groups| groups.get(group_name))
            .cloned()
            .unwrap_or_else(empty)
    }

    /// A top-level section by case-insensitive name, or an empty mapping.
    pub fn section(&self, name: &str) -> Value {
        self.0
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_else(empty)
    }

    /// Borrow the whole document.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a plain JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    fn firewall_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.0.get("firewall")?.get(key)?.as_object()
    }
}

impl From<UnifiedConfig> for Value {
    fn from(config: UnifiedConfig) -> Self {
        config.into_value()
    }
}

fn empty() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> UnifiedConfig {
        let value = json!({
            "firewall": {
                "name": {
                    "WAN_IN": {"default-action": "drop", "rule": {"10": {"action": "accept"}}},
                    "LAN_IN": {"default-action": "accept", "rule": {}}
                },
                "group": {
                    "address-group": {"hosts": {"address": ["10.0.0.1"]}}
                }
            },
            "interfaces": {"ethernet": {"eth0": {}}}
        });
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_rulesets_in_document_order() {
        assert_eq!(sample().firewall_rulesets(), vec!["WAN_IN", "LAN_IN"]);
    }

    #[test]
    fn test_ruleset_lookup() {
        let config = sample();
        assert_eq!(config.firewall_ruleset("WAN_IN")["default-action"], "drop");
        assert_eq!(config.firewall_ruleset("MISSING"), json!({}));
    }

    #[test]
    fn test_group_lookup_appends_group_suffix() {
        let config = sample();
        assert_eq!(
            config.firewall_group("address", "hosts"),
            json!({"address": ["10.0.0.1"]})
        );
        assert_eq!(config.firewall_group("network", "hosts"), json!({}));
        assert_eq!(config.firewall_group("address", "nope"), json!({}));
    }

    #[test]
    fn test_section_is_case_insensitive() {
        let config = sample();
        assert_eq!(config.section("Interfaces"), json!({"ethernet": {"eth0": {}}}));
        assert_eq!(config.section("NAT"), json!({}));
    }

    #[test]
    fn test_empty_config_queries() {
        let config = UnifiedConfig::default();
        assert!(config.firewall_rulesets().is_empty());
        assert_eq!(config.firewall_ruleset("WAN_IN"), json!({}));
        assert_eq!(config.section("firewall"), json!({}));
    }

    #[test]
    fn test_serializes_transparently() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.starts_with(r#"{"firewall":"#));
    }
}
