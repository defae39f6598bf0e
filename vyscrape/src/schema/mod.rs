//! Schema adapter between router configuration formats.
//!
//! Firmware up to 1.3 ("legacy") renders firewall rule sets under
//! `firewall.name`. Firmware 1.4 and later ("current") moves them under a
//! per-address-family tree, `firewall.ipv4.name`. Neither carries a version
//! field, so the format is inferred from the document's shape and mapped onto
//! the legacy layout, which is what [`UnifiedConfig`] is.
//!
//! Normalization is pure and total: missing sections become empty mappings.
//! On the current path only the sections listed in [`SECTIONS`] and the IPv4
//! firewall tree survive; `firewall.ipv6` and any other top-level key are
//! dropped.

mod unified;

pub use unified::{SECTIONS, UnifiedConfig};

use std::fmt;

use serde_json::{Map, Value};

/// Source format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Firewall rule sets at `firewall.name`.
    Legacy,
    /// Firewall rule sets at `firewall.ipv4.name`.
    Current,
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Current => f.write_str("current"),
        }
    }
}

impl SchemaVersion {
    /// Infer the format from shape: current iff `firewall.ipv4` is a mapping.
    pub fn detect(raw: &Value) -> Self {
        let has_ipv4_tree = raw
            .get("firewall")
            .and_then(|firewall| firewall.get("ipv4"))
            .is_some_and(Value::is_object);

        if has_ipv4_tree {
            Self::Current
        } else {
            Self::Legacy
        }
    }
}

/// Map a raw document of either format onto the unified schema.
pub fn normalize(raw: Value) -> UnifiedConfig {
    normalize_detected(raw).1
}

/// Like [`normalize`], also reporting which format was detected.
pub fn normalize_detected(raw: Value) -> (SchemaVersion, UnifiedConfig) {
    let version = SchemaVersion::detect(&raw);
    let document = match raw {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let config = match version {
        SchemaVersion::Legacy => from_legacy(document),
        SchemaVersion::Current => from_current(document),
    };
    (version, config)
}

/// Legacy documents are already unified; only the firewall skeleton is filled in.
fn from_legacy(mut document: Map<String, Value>) -> UnifiedConfig {
    let firewall = document
        .entry("firewall")
        .or_insert_with(|| Value::Object(Map::new()));
    if !firewall.is_object() {
        *firewall = Value::Object(Map::new());
    }
    let Some(firewall) = firewall.as_object_mut() else {
        return UnifiedConfig::from_map(document);
    };
    firewall
        .entry("name")
        .or_insert_with(|| Value::Object(Map::new()));
    firewall
        .entry("group")
        .or_insert_with(|| Value::Object(Map::new()));
    UnifiedConfig::from_map(document)
}

fn from_current(mut document: Map<String, Value>) -> UnifiedConfig {
    let mut firewall = match document.remove("firewall") {
        Some(Value::Object(firewall)) => firewall,
        _ => Map::new(),
    };

    let rulesets = firewall
        .remove("ipv4")
        .and_then(|mut ipv4| ipv4.get_mut("name").map(Value::take))
        .map(|name| match name {
            Value::Object(rulesets) => rulesets
                .into_iter()
                .map(|(name, ruleset)| (name, flatten_ruleset(ruleset)))
                .collect(),
            _ => Map::new(),
        })
        .unwrap_or_default();

    let mut unified_firewall = Map::new();
    unified_firewall.insert("name".into(), Value::Object(rulesets));
    unified_firewall.insert("group".into(), take_section(&mut firewall, "group"));

    let mut unified = Map::new();
    unified.insert("firewall".into(), Value::Object(unified_firewall));
    for section in SECTIONS {
        unified.insert((*section).into(), take_section(&mut document, section));
    }
    UnifiedConfig::from_map(unified)
}

/// Keep only `default-action` and `rule` from a current-format rule set.
fn flatten_ruleset(ruleset: Value) -> Value {
    let mut ruleset = match ruleset {
        Value::Object(ruleset) => ruleset,
        _ => Map::new(),
    };

    let mut flat = Map::new();
    flat.insert(
        "default-action".into(),
        ruleset.remove("default-action").unwrap_or(Value::Null),
    );
    flat.insert(
        "rule".into(),
        ruleset
            .remove("rule")
            .unwrap_or_else(|| Value::Object(Map::new())),
    );
    Value::Object(flat)
}

fn take_section(document: &mut Map<String, Value>, key: &str) -> Value {
    document
        .remove(key)
        .unwrap_or_else(|| Value::Object(Map::new()))
}
